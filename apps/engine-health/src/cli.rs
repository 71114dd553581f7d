use crate::config::AnalysisConfig;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[clap(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Fixed-width tables on stdout.
    Text,
    /// One pretty-printed JSON report on stdout.
    Json,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "engine-health",
    version,
    about = "Rank early-warning sensors and score engine health from run-to-failure logs"
)]
pub struct Args {
    /// Training log (whitespace-separated, one engine cycle per line).
    #[arg(long)]
    pub train: PathBuf,

    /// Test log; ranked against its RUL labels.
    #[arg(long, requires = "rul")]
    pub test: Option<PathBuf>,

    /// RUL labels for `--test`, one per engine in ascending engine order.
    #[arg(long, requires = "test")]
    pub rul: Option<PathBuf>,

    /// JSON config file (falls back to ENGINE_HEALTH_CONFIG_PATH).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Comma-separated sensors to analyze (overrides drift_sensors).
    #[arg(long, value_delimiter = ',')]
    pub signals: Vec<String>,

    /// Absolute z-score that counts as an exceedance.
    #[arg(long)]
    pub z_threshold: Option<f64>,

    /// Rows with more cycles to failure than this are healthy.
    #[arg(long)]
    pub healthy_cutoff: Option<i64>,

    /// Rows shown per table in text output.
    #[arg(long, default_value_t = 10)]
    pub top: usize,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

impl Args {
    /// Command-line flags win over every other config source.
    pub fn apply_to(&self, config: &mut AnalysisConfig) {
        let signals: Vec<String> = self
            .signals
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        if !signals.is_empty() {
            config.drift_sensors = signals;
        }
        if let Some(value) = self.z_threshold {
            config.z_threshold = value;
        }
        if let Some(value) = self.healthy_cutoff {
            config.healthy_cutoff = value;
        }
    }
}
