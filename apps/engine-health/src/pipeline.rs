//! End-to-end analysis of one labelled dataset.

use crate::analysis::{
    add_health_flag, add_rolling_health_score, composite_alarm_summary,
    compute_composite_health_score, healthy_false_positive_rate, ranking_from_summary,
    sensor_alarm_summary, zscore_relative_to_healthy, AlarmSummary, SensorRanking,
};
use crate::config::AnalysisConfig;
use crate::error::TableResult;
use crate::table::{TimeSeriesTable, HEALTH_SCORE_ROLL, IS_HEALTHY};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompositeReport {
    pub threshold: f64,
    pub roll_window: usize,
    pub false_positive_rate: Option<f64>,
    pub max_fp_rate: f64,
    /// `None` when the false-positive rate is undefined.
    pub within_budget: Option<bool>,
    pub summary: AlarmSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetReport {
    pub engines: usize,
    pub rows: usize,
    pub healthy_rows: usize,
    pub ranking: Vec<SensorRanking>,
    pub summary: Vec<AlarmSummary>,
    pub composite: CompositeReport,
}

/// Runs flagging, normalization, ranking and composite scoring on a table
/// that carries `cycles_to_failure`.
pub fn analyze(table: &TimeSeriesTable, config: &AnalysisConfig) -> TableResult<DatasetReport> {
    let sensors = config.drift_sensors.as_slice();

    let cycles = table.cycles()?;
    let table = table.retain_rows(|row| cycles[row] >= config.min_cycle);
    let flagged = add_health_flag(&table, config.healthy_cutoff)?;
    let healthy_rows = flagged.bool_column(IS_HEALTHY)?.iter().filter(|h| **h).count();
    let normalized = zscore_relative_to_healthy(&flagged, sensors, IS_HEALTHY)?;

    let summary = sensor_alarm_summary(
        &normalized,
        sensors,
        config.z_threshold,
        config.roll_window,
        config.sustain_count,
    )?;
    let ranking = ranking_from_summary(&summary);

    let scored = compute_composite_health_score(&normalized, sensors)?;
    let scored = add_rolling_health_score(&scored, config.health_score_roll_window)?;
    let false_positive_rate =
        healthy_false_positive_rate(&scored, HEALTH_SCORE_ROLL, config.health_score_threshold)?;
    let composite_summary = composite_alarm_summary(
        &scored,
        HEALTH_SCORE_ROLL,
        config.health_score_threshold,
        config.health_score_roll_window,
        config.health_score_sustain_count,
    )?;

    let within_budget = false_positive_rate.map(|rate| rate <= config.max_fp_rate);
    if within_budget == Some(false) {
        tracing::warn!(
            rate = ?false_positive_rate,
            max_fp_rate = config.max_fp_rate,
            "composite score exceeds the false-positive budget on healthy rows"
        );
    }

    Ok(DatasetReport {
        engines: scored.engine_count()?,
        rows: scored.len(),
        healthy_rows,
        ranking,
        summary,
        composite: CompositeReport {
            threshold: config.health_score_threshold,
            roll_window: config.health_score_roll_window,
            false_positive_rate,
            max_fp_rate: config.max_fp_rate,
            within_budget,
            summary: composite_summary,
        },
    })
}
