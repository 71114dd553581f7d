use super::ranking::{summarize_signal, AlarmSummary};
use crate::error::TableResult;
use crate::table::{Column, TimeSeriesTable, HEALTH_SCORE, HEALTH_SCORE_ROLL, IS_HEALTHY};
use std::collections::VecDeque;

/// Adds `health_score`: row-wise mean of `|value|` over `signals`.
///
/// Absent values are skipped rather than counted as zero; a row with no
/// present value gets an absent score.
pub fn compute_composite_health_score<S: AsRef<str>>(
    table: &TimeSeriesTable,
    signals: &[S],
) -> TableResult<TimeSeriesTable> {
    let columns = signals
        .iter()
        .map(|signal| table.numeric_column(signal.as_ref()))
        .collect::<TableResult<Vec<_>>>()?;

    let scores = (0..table.len())
        .map(|row| {
            let (sum, count) = columns
                .iter()
                .filter_map(|column| column[row])
                .fold((0.0, 0usize), |(sum, count), v| (sum + v.abs(), count + 1));
            (count > 0).then(|| sum / count as f64)
        })
        .collect();

    table.clone().with_column(HEALTH_SCORE, Column::Float(scores))
}

/// Trailing simple moving average with a strict warm-up.
///
/// Position `i` is defined only once `window` values have been seen and every
/// value in the trailing window is present.
pub fn rolling_mean(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    let window = window.max(1);
    let mut buf: VecDeque<Option<f64>> = VecDeque::with_capacity(window);
    let mut out = Vec::with_capacity(values.len());
    for value in values {
        buf.push_back(*value);
        if buf.len() > window {
            buf.pop_front();
        }
        if buf.len() < window {
            out.push(None);
            continue;
        }
        let present: Option<Vec<f64>> = buf.iter().copied().collect();
        out.push(present.map(|vals| vals.iter().sum::<f64>() / window as f64));
    }
    out
}

/// Adds `health_score_roll`, the per-engine trailing mean of `health_score`
/// over `window` cycles.
pub fn add_rolling_health_score(
    table: &TimeSeriesTable,
    window: usize,
) -> TableResult<TimeSeriesTable> {
    let scores = table.numeric_column(HEALTH_SCORE)?;
    let mut rolled: Vec<Option<f64>> = vec![None; table.len()];
    for group in table.engine_groups()? {
        let series: Vec<Option<f64>> = group.rows.iter().map(|row| scores[*row]).collect();
        for (row, value) in group.rows.iter().zip(rolling_mean(&series, window)) {
            rolled[*row] = value;
        }
    }
    table.clone().with_column(HEALTH_SCORE_ROLL, Column::Float(rolled))
}

/// Share of healthy rows whose `score_column` exceeds `threshold`.
///
/// Only healthy rows with a defined score are counted. `None` when there are
/// none. This is a diagnostic; nothing is gated on it.
pub fn healthy_false_positive_rate(
    table: &TimeSeriesTable,
    score_column: &str,
    threshold: f64,
) -> TableResult<Option<f64>> {
    let healthy = table.bool_column(IS_HEALTHY)?;
    let scores = table.numeric_column(score_column)?;

    let mut total = 0usize;
    let mut alarms = 0usize;
    for (score, is_healthy) in scores.iter().zip(healthy) {
        let (Some(score), true) = (score, *is_healthy) else {
            continue;
        };
        total += 1;
        if *score > threshold {
            alarms += 1;
        }
    }

    if total == 0 {
        tracing::warn!(score_column, "no healthy rows with a defined score");
        return Ok(None);
    }
    let rate = alarms as f64 / total as f64;
    tracing::debug!(
        score_column,
        threshold,
        healthy_rows = total,
        alarms,
        rate,
        "healthy false-positive rate"
    );
    Ok(Some(rate))
}

/// Alarm-distribution summary for a single synthetic signal such as
/// `health_score_roll`.
pub fn composite_alarm_summary(
    table: &TimeSeriesTable,
    value_col: &str,
    threshold: f64,
    window: usize,
    min_hits: usize,
) -> TableResult<AlarmSummary> {
    summarize_signal(table, value_col, threshold, window, min_hits)
}
