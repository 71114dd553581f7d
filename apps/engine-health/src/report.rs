use crate::analysis::{AlarmSummary, SensorRanking};
use crate::config::AnalysisConfig;
use crate::pipeline::{CompositeReport, DatasetReport};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Write;

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub generated_at: DateTime<Utc>,
    pub config: AnalysisConfig,
    pub train: DatasetReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test: Option<DatasetReport>,
}

impl AnalysisReport {
    pub fn new(config: AnalysisConfig, train: DatasetReport, test: Option<DatasetReport>) -> Self {
        Self {
            generated_at: Utc::now(),
            config,
            train,
            test,
        }
    }
}

fn format_warning(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.2}"),
        None => "None".to_string(),
    }
}

/// Right-aligned fixed-width table with a header row.
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let mut out = String::new();
    let mut push_line = |cells: Vec<&str>| {
        let line = cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{cell:>w$}", w = *width))
            .collect::<Vec<_>>()
            .join("  ");
        out.push_str(&line);
        out.push('\n');
    };
    push_line(headers.to_vec());
    for row in rows {
        push_line(row.iter().map(String::as_str).collect());
    }
    out
}

pub fn render_ranking(ranking: &[SensorRanking], top: usize) -> String {
    let rows: Vec<Vec<String>> = ranking
        .iter()
        .take(top)
        .map(|r| {
            vec![
                r.sensor.clone(),
                format_warning(r.median_warning_cycles),
                r.engines_with_alarm.to_string(),
            ]
        })
        .collect();
    render_table(&["sensor", "median_warning_cycles", "engines_with_alarm"], &rows)
}

pub fn render_summary(summary: &[AlarmSummary], top: usize) -> String {
    let rows: Vec<Vec<String>> = summary
        .iter()
        .take(top)
        .map(|s| {
            vec![
                s.sensor.clone(),
                format_warning(s.p25_warning),
                format_warning(s.median_warning),
                format_warning(s.p75_warning),
                s.engines_with_alarm.to_string(),
            ]
        })
        .collect();
    render_table(
        &[
            "sensor",
            "p25_warning",
            "median_warning",
            "p75_warning",
            "engines_with_alarm",
        ],
        &rows,
    )
}

pub fn render_false_positive_line(composite: &CompositeReport) -> String {
    match composite.false_positive_rate {
        Some(rate) => format!(
            "Composite healthy false-positive rate: {rate:.4} (target <= {})",
            composite.max_fp_rate
        ),
        None => format!(
            "Composite healthy false-positive rate: undefined, no healthy rows with a score (target <= {})",
            composite.max_fp_rate
        ),
    }
}

/// Text sections for one dataset, in the order an operator reads them.
pub fn render_dataset(label: &str, report: &DatasetReport, top: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{label}: {} engines, {} rows, {} healthy",
        report.engines, report.rows, report.healthy_rows
    );
    let _ = writeln!(out, "\n=== Sensor-level sustained alarms ===");
    out.push_str(&render_ranking(&report.ranking, top));
    let _ = writeln!(out, "\n=== Sensor alarm distribution summary ===");
    out.push_str(&render_summary(&report.summary, top));
    let _ = writeln!(out, "\n{}", render_false_positive_line(&report.composite));
    let _ = writeln!(out, "\nComposite alarm summary:");
    out.push_str(&render_summary(
        std::slice::from_ref(&report.composite.summary),
        1,
    ));
    out
}
