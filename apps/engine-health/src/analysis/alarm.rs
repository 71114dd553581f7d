use crate::error::TableResult;
use crate::table::{TimeSeriesTable, CYCLES_TO_FAILURE};
use serde::Serialize;

/// First sustained alarm of one signal on one engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlarmEvent {
    pub signal: String,
    pub engine_id: i64,
    pub cycle: i64,
    pub cycles_to_failure: i64,
}

/// Position of the first sustained exceedance in a cycle-ordered series.
///
/// A position qualifies once `window` observations have been seen and at
/// least `min_hits` of the trailing `window` values satisfy
/// `|value| > threshold`. Absent values never count as hits. A `window` of 0 is
/// treated as 1.
pub fn first_sustained_alarm_index(
    values: &[Option<f64>],
    threshold: f64,
    window: usize,
    min_hits: usize,
) -> Option<usize> {
    let window = window.max(1);
    if values.len() < window {
        return None;
    }

    let exceed: Vec<bool> = values
        .iter()
        .map(|value| value.is_some_and(|v| v.abs() > threshold))
        .collect();

    let mut hits = 0usize;
    for (idx, hit) in exceed.iter().enumerate() {
        if *hit {
            hits += 1;
        }
        if idx >= window && exceed[idx - window] {
            hits -= 1;
        }
        if idx + 1 >= window && hits >= min_hits {
            return Some(idx);
        }
    }
    None
}

/// `cycles_to_failure` at the first sustained alarm, or `None` when the engine
/// never alarms (including engines shorter than `window`).
///
/// `values` and `cycles_to_failure` are parallel slices of the same engine.
pub fn first_sustained_alarm(
    values: &[Option<f64>],
    cycles_to_failure: &[i64],
    threshold: f64,
    window: usize,
    min_hits: usize,
) -> Option<i64> {
    debug_assert_eq!(values.len(), cycles_to_failure.len());
    first_sustained_alarm_index(values, threshold, window, min_hits)
        .and_then(|idx| cycles_to_failure.get(idx).copied())
}

/// Runs the detector on every engine of `table` for `signal`.
///
/// Each engine's rows are put in cycle order first. Engines that never alarm
/// are left out.
pub fn engine_alarms(
    table: &TimeSeriesTable,
    signal: &str,
    threshold: f64,
    window: usize,
    min_hits: usize,
) -> TableResult<Vec<AlarmEvent>> {
    let values = table.numeric_column(signal)?;
    let cycles_to_failure = table.int_column(CYCLES_TO_FAILURE)?;
    let cycles = table.cycles()?;

    let mut events = Vec::new();
    let mut engines = 0usize;
    for group in table.engine_groups()? {
        engines += 1;
        let series: Vec<Option<f64>> = group.rows.iter().map(|row| values[*row]).collect();
        let Some(idx) = first_sustained_alarm_index(&series, threshold, window, min_hits) else {
            continue;
        };
        let row = group.rows[idx];
        events.push(AlarmEvent {
            signal: signal.to_string(),
            engine_id: group.engine_id,
            cycle: cycles[row],
            cycles_to_failure: cycles_to_failure[row],
        });
    }

    tracing::debug!(
        signal,
        engines,
        alarmed = events.len(),
        threshold,
        window,
        min_hits,
        "evaluated sustained alarms"
    );
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Column;

    fn series(bits: &[u8]) -> Vec<Option<f64>> {
        bits.iter()
            .map(|bit| Some(if *bit == 1 { 3.0 } else { 0.5 }))
            .collect()
    }

    #[test]
    fn trailing_window_reaches_min_hits_at_fifth_position() {
        let values = series(&[0, 0, 1, 1, 1, 0, 1, 0]);
        let ctf: Vec<i64> = (0..8).rev().collect();
        assert_eq!(first_sustained_alarm_index(&values, 2.0, 5, 3), Some(4));
        assert_eq!(first_sustained_alarm(&values, &ctf, 2.0, 5, 3), Some(3));
    }

    #[test]
    #[should_panic]
    #[cfg(debug_assertions)]
    fn mismatched_cycles_to_failure_is_a_caller_bug() {
        let values = series(&[1, 1, 1]);
        let _ = first_sustained_alarm(&values, &[5], 2.0, 2, 2);
    }

    #[test]
    fn no_alarm_before_window_is_filled() {
        let values = series(&[1, 1, 1, 1, 0, 0]);
        assert_eq!(first_sustained_alarm_index(&values, 2.0, 4, 1), Some(3));
        assert_eq!(first_sustained_alarm_index(&values[..3], 2.0, 4, 1), None);
    }

    #[test]
    fn alarm_position_is_never_before_window() {
        let values = series(&[1; 12]);
        for window in 1..=12 {
            for min_hits in 0..=window {
                let idx = first_sustained_alarm_index(&values, 2.0, window, min_hits).unwrap();
                assert_eq!(idx + 1, window);
            }
        }
    }

    #[test]
    fn scattered_hits_outside_window_do_not_alarm() {
        let values = series(&[1, 0, 0, 1, 0, 0, 1, 0, 0]);
        assert_eq!(first_sustained_alarm_index(&values, 2.0, 3, 2), None);
        assert_eq!(first_sustained_alarm_index(&values, 2.0, 4, 2), Some(3));
    }

    #[test]
    fn negative_deviations_count_and_absent_values_do_not() {
        let values = vec![Some(-2.5), None, Some(-3.0), None];
        assert_eq!(first_sustained_alarm_index(&values, 2.0, 2, 2), None);
        assert_eq!(first_sustained_alarm_index(&values, 2.0, 3, 2), Some(2));
    }

    #[test]
    fn exceedance_is_strict() {
        let values = vec![Some(2.0), Some(-2.0), Some(2.0)];
        assert_eq!(first_sustained_alarm_index(&values, 2.0, 1, 1), None);
    }

    #[test]
    fn engine_alarms_sort_each_engine_by_cycle() {
        let table = TimeSeriesTable::new(vec![1, 1, 1, 2, 2], vec![3, 1, 2, 1, 2])
            .unwrap()
            .with_column(CYCLES_TO_FAILURE, Column::Int(vec![0, 2, 1, 1, 0]))
            .unwrap()
            .with_column("sensor_1", Column::floats([5.0, 0.0, 5.0, 0.0, 0.0]))
            .unwrap();

        let events = engine_alarms(&table, "sensor_1", 2.0, 2, 2).unwrap();
        assert_eq!(
            events,
            vec![AlarmEvent {
                signal: "sensor_1".to_string(),
                engine_id: 1,
                cycle: 3,
                cycles_to_failure: 0,
            }]
        );
    }
}
