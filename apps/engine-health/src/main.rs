use anyhow::{Context, Result};
use clap::Parser;
use engine_health::cli::{Args, OutputFormat};
use engine_health::config::AnalysisConfig;
use engine_health::pipeline::{analyze, DatasetReport};
use engine_health::report::{render_dataset, AnalysisReport};
use engine_health::{ingest, table::TimeSeriesTable};
use std::path::Path;

fn load_test_set(test: &Path, rul: &Path) -> Result<TimeSeriesTable> {
    let table = ingest::load_test_data(test)
        .with_context(|| format!("failed to load test log {}", test.display()))?;
    let labels = ingest::load_rul_labels(rul)
        .with_context(|| format!("failed to load RUL labels {}", rul.display()))?;
    ingest::attach_rul_labels(&table, &labels).context("failed to attach RUL labels to test log")
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut config = AnalysisConfig::load(args.config.as_deref())?;
    args.apply_to(&mut config);
    config.validate().context("invalid analysis config")?;

    let train = ingest::load_train_data(&args.train)
        .with_context(|| format!("failed to load training log {}", args.train.display()))?;
    let train_report = analyze(&train, &config).context("training analysis failed")?;

    let test_report: Option<DatasetReport> = match (args.test.as_deref(), args.rul.as_deref()) {
        (Some(test), Some(rul)) => {
            let table = load_test_set(test, rul)?;
            Some(analyze(&table, &config).context("test analysis failed")?)
        }
        _ => None,
    };

    match args.format {
        OutputFormat::Text => {
            print!("{}", render_dataset("train", &train_report, args.top));
            if let Some(report) = test_report.as_ref() {
                println!();
                print!("{}", render_dataset("test", report, args.top));
            }
        }
        OutputFormat::Json => {
            let report = AnalysisReport::new(config, train_report, test_report);
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}
