//! Per-engine baselining, sustained-alarm detection and sensor ranking.
//!
//! Every operation reads a [`TimeSeriesTable`](crate::table::TimeSeriesTable)
//! and returns a new value; input tables are never modified.

pub mod alarm;
pub mod baseline;
pub mod composite;
pub mod ranking;
pub mod stats;


pub use alarm::{engine_alarms, first_sustained_alarm, first_sustained_alarm_index, AlarmEvent};
pub use baseline::{add_health_flag, baseline_stats, zscore_relative_to_healthy, BaselineStats};
pub use composite::{
    add_rolling_health_score, composite_alarm_summary, compute_composite_health_score,
    healthy_false_positive_rate,
};
pub use ranking::{
    rank_early_warning_sensors, ranking_from_summary, sensor_alarm_summary, AlarmSummary,
    SensorRanking, DEFAULT_MIN_HITS, DEFAULT_WINDOW,
};
