use super::alarm::engine_alarms;
use super::stats::quartiles;
use crate::error::TableResult;
use crate::table::TimeSeriesTable;
use serde::Serialize;
use std::cmp::Ordering;

pub const DEFAULT_WINDOW: usize = 5;
pub const DEFAULT_MIN_HITS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorRanking {
    pub sensor: String,
    pub median_warning_cycles: Option<f64>,
    pub engines_with_alarm: usize,
}

/// Distribution of `cycles_to_failure` at first sustained alarm for one signal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlarmSummary {
    pub sensor: String,
    pub p25_warning: Option<f64>,
    pub median_warning: Option<f64>,
    pub p75_warning: Option<f64>,
    pub engines_with_alarm: usize,
}

/// Larger warnings first; absent warnings after every present one.
pub fn compare_warning(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.total_cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

pub fn summarize_signal(
    table: &TimeSeriesTable,
    signal: &str,
    threshold: f64,
    window: usize,
    min_hits: usize,
) -> TableResult<AlarmSummary> {
    let warnings: Vec<f64> = engine_alarms(table, signal, threshold, window, min_hits)?
        .into_iter()
        .map(|event| event.cycles_to_failure as f64)
        .collect();
    let q = quartiles(&warnings);
    Ok(AlarmSummary {
        sensor: signal.to_string(),
        p25_warning: q.p25,
        median_warning: q.median,
        p75_warning: q.p75,
        engines_with_alarm: warnings.len(),
    })
}

/// Alarm-distribution summary per signal, ordered like
/// [`rank_early_warning_sensors`]. Candidates with equal medians keep their
/// input order.
pub fn sensor_alarm_summary<S: AsRef<str>>(
    table: &TimeSeriesTable,
    signals: &[S],
    z_threshold: f64,
    window: usize,
    min_hits: usize,
) -> TableResult<Vec<AlarmSummary>> {
    let mut out = signals
        .iter()
        .map(|signal| summarize_signal(table, signal.as_ref(), z_threshold, window, min_hits))
        .collect::<TableResult<Vec<_>>>()?;
    out.sort_by(|a, b| compare_warning(a.median_warning, b.median_warning));
    Ok(out)
}

/// Ranking view of an already ordered [`sensor_alarm_summary`] result.
pub fn ranking_from_summary(summary: &[AlarmSummary]) -> Vec<SensorRanking> {
    let ranking: Vec<SensorRanking> = summary
        .iter()
        .map(|s| SensorRanking {
            sensor: s.sensor.clone(),
            median_warning_cycles: s.median_warning,
            engines_with_alarm: s.engines_with_alarm,
        })
        .collect();

    if let Some(best) = ranking.first() {
        tracing::info!(
            signals = ranking.len(),
            best = %best.sensor,
            median_warning_cycles = ?best.median_warning_cycles,
            "ranked early-warning sensors"
        );
    }
    ranking
}

/// Ranks signals by median remaining life at first sustained alarm, largest
/// (earliest warning) first. Signals that never alarm on any engine come last.
pub fn rank_early_warning_sensors<S: AsRef<str>>(
    table: &TimeSeriesTable,
    signals: &[S],
    z_threshold: f64,
    window: usize,
    min_hits: usize,
) -> TableResult<Vec<SensorRanking>> {
    let summary = sensor_alarm_summary(table, signals, z_threshold, window, min_hits)?;
    Ok(ranking_from_summary(&summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{Column, CYCLES_TO_FAILURE};

    /// Three engines of 6 cycles; `sensor_a` alarms early, `sensor_b` late,
    /// `sensor_c` never.
    fn fleet() -> TimeSeriesTable {
        let mut engine_ids = Vec::new();
        let mut cycles = Vec::new();
        let mut ctf = Vec::new();
        let mut a = Vec::new();
        let mut b = Vec::new();
        let mut c = Vec::new();
        for engine in 1..=3 {
            for cycle in 1..=6 {
                engine_ids.push(engine);
                cycles.push(cycle);
                ctf.push(6 - cycle + engine);
                a.push(if cycle >= 2 { 3.0 } else { 0.0 });
                b.push(if cycle >= 5 { -3.0 } else { 0.0 });
                c.push(0.1);
            }
        }
        TimeSeriesTable::new(engine_ids, cycles)
            .unwrap()
            .with_column(CYCLES_TO_FAILURE, Column::Int(ctf))
            .unwrap()
            .with_column("sensor_a", Column::floats(a))
            .unwrap()
            .with_column("sensor_b", Column::floats(b))
            .unwrap()
            .with_column("sensor_c", Column::floats(c))
            .unwrap()
    }

    #[test]
    fn compare_warning_places_absent_last() {
        let mut values = vec![None, Some(1.0), None, Some(f64::MAX), Some(-5.0)];
        values.sort_by(|a, b| compare_warning(*a, *b));
        assert_eq!(values, vec![Some(f64::MAX), Some(1.0), Some(-5.0), None, None]);
    }

    #[test]
    fn ranking_orders_by_descending_median_with_absent_last() {
        let table = fleet();
        let ranking =
            rank_early_warning_sensors(&table, &["sensor_c", "sensor_b", "sensor_a"], 2.0, 2, 2)
                .unwrap();

        let names: Vec<&str> = ranking.iter().map(|r| r.sensor.as_str()).collect();
        assert_eq!(names, vec!["sensor_a", "sensor_b", "sensor_c"]);

        // sensor_a alarms at cycle 3: ctf = 3 + engine -> [4, 5, 6]
        assert_eq!(ranking[0].median_warning_cycles, Some(5.0));
        assert_eq!(ranking[0].engines_with_alarm, 3);
        // sensor_b alarms at cycle 6: ctf = engine -> [1, 2, 3]
        assert_eq!(ranking[1].median_warning_cycles, Some(2.0));
        assert_eq!(ranking[2].median_warning_cycles, None);
        assert_eq!(ranking[2].engines_with_alarm, 0);
    }

    #[test]
    fn summary_reports_quartiles_and_absent_for_silent_signals() {
        let table = fleet();
        let summary = sensor_alarm_summary(&table, &["sensor_c", "sensor_a"], 2.0, 2, 2).unwrap();
        assert_eq!(
            summary,
            vec![
                AlarmSummary {
                    sensor: "sensor_a".to_string(),
                    p25_warning: Some(4.5),
                    median_warning: Some(5.0),
                    p75_warning: Some(5.5),
                    engines_with_alarm: 3,
                },
                AlarmSummary {
                    sensor: "sensor_c".to_string(),
                    p25_warning: None,
                    median_warning: None,
                    p75_warning: None,
                    engines_with_alarm: 0,
                },
            ]
        );
    }

    #[test]
    fn ranking_view_of_summary_matches_direct_ranking() {
        let table = fleet();
        let signals = ["sensor_c", "sensor_b", "sensor_a"];
        let summary = sensor_alarm_summary(&table, &signals, 2.0, 2, 2).unwrap();
        assert_eq!(
            ranking_from_summary(&summary),
            rank_early_warning_sensors(&table, &signals, 2.0, 2, 2).unwrap()
        );
    }

    #[test]
    fn ties_keep_candidate_order() {
        let table = fleet();
        let ranking =
            rank_early_warning_sensors(&table, &["sensor_a", "sensor_c", "sensor_a"], 2.0, 2, 2)
                .unwrap();
        let names: Vec<&str> = ranking.iter().map(|r| r.sensor.as_str()).collect();
        assert_eq!(names, vec!["sensor_a", "sensor_a", "sensor_c"]);
    }

    #[test]
    fn unknown_signal_is_a_structural_error() {
        let table = fleet();
        let err = rank_early_warning_sensors(&table, &["sensor_a", "sensor_z"], 2.0, 2, 2)
            .unwrap_err();
        assert_eq!(
            err,
            crate::error::TableError::MissingColumn("sensor_z".to_string())
        );
    }
}
