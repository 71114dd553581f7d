use super::stats::{mean, sample_std_dev};
use crate::error::{TableError, TableResult};
use crate::table::{Column, TimeSeriesTable, CYCLES_TO_FAILURE, IS_HEALTHY};
use std::collections::BTreeMap;

/// Adds `is_healthy = cycles_to_failure > healthy_cutoff`.
///
/// The flag is a snapshot: changing the cutoff or `cycles_to_failure` later
/// requires calling this again.
pub fn add_health_flag(
    table: &TimeSeriesTable,
    healthy_cutoff: i64,
) -> TableResult<TimeSeriesTable> {
    let cycles_to_failure = table.int_column(CYCLES_TO_FAILURE)?;
    let flags = cycles_to_failure
        .iter()
        .map(|ctf| *ctf > healthy_cutoff)
        .collect();
    table.clone().with_column(IS_HEALTHY, Column::Bool(flags))
}

/// Which statistics a z-score was taken against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaselineSource {
    Healthy,
    AllRows,
    Flat,
}

/// Per-engine statistics for one sensor. Never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BaselineStats {
    pub mu_healthy: Option<f64>,
    pub sigma_healthy: Option<f64>,
    pub mu_all: Option<f64>,
    pub sigma_all: Option<f64>,
}

impl BaselineStats {
    pub fn from_samples(all: &[f64], healthy: &[f64]) -> Self {
        Self {
            mu_healthy: mean(healthy),
            sigma_healthy: sample_std_dev(healthy),
            mu_all: mean(all),
            sigma_all: sample_std_dev(all),
        }
    }

    pub fn center(&self) -> Option<f64> {
        self.mu_healthy.or(self.mu_all)
    }

    pub fn scale(&self) -> Option<f64> {
        nonzero(self.sigma_healthy).or_else(|| nonzero(self.sigma_all))
    }

    pub fn source(&self) -> BaselineSource {
        if self.center().is_none() || self.scale().is_none() {
            BaselineSource::Flat
        } else if self.mu_healthy.is_some() && nonzero(self.sigma_healthy).is_some() {
            BaselineSource::Healthy
        } else {
            BaselineSource::AllRows
        }
    }

    /// z-score of `raw`; anything undefined collapses to 0.0 ("no deviation").
    pub fn zscore(&self, raw: Option<f64>) -> f64 {
        let (Some(raw), Some(mu), Some(sigma)) = (raw, self.center(), self.scale()) else {
            return 0.0;
        };
        let z = (raw - mu) / sigma;
        if z.is_finite() {
            z
        } else {
            0.0
        }
    }
}

fn nonzero(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v != 0.0)
}

/// Baseline statistics of `sensor` for every engine, keyed by engine id.
pub fn baseline_stats(
    table: &TimeSeriesTable,
    sensor: &str,
    healthy_col: &str,
) -> TableResult<BTreeMap<i64, BaselineStats>> {
    let values = table.numeric_column(sensor)?;
    let healthy = table.bool_column(healthy_col)?;
    let mut out = BTreeMap::new();
    for group in table.engine_groups()? {
        let mut all: Vec<f64> = Vec::with_capacity(group.rows.len());
        let mut healthy_values: Vec<f64> = Vec::new();
        for row in &group.rows {
            let Some(value) = values[*row] else {
                continue;
            };
            all.push(value);
            if healthy[*row] {
                healthy_values.push(value);
            }
        }
        out.insert(
            group.engine_id,
            BaselineStats::from_samples(&all, &healthy_values),
        );
    }
    Ok(out)
}

/// Rewrites each sensor as a per-engine z-score against its healthy baseline.
///
/// Returns a new table; `table` keeps its raw readings. The rewritten columns
/// are marked as z-scores, and passing an already-normalized column fails with
/// [`TableError::AlreadyNormalized`] since statistics of z-scores carry no
/// baseline meaning. All columns are validated before any work is done.
pub fn zscore_relative_to_healthy<S: AsRef<str>>(
    table: &TimeSeriesTable,
    sensors: &[S],
    healthy_col: &str,
) -> TableResult<TimeSeriesTable> {
    table.bool_column(healthy_col)?;
    for sensor in sensors {
        let sensor = sensor.as_ref();
        table.numeric_column(sensor)?;
        if table.is_normalized(sensor) {
            return Err(TableError::AlreadyNormalized(sensor.to_string()));
        }
    }

    let engine_ids = table.engine_ids()?;
    let mut out = table.clone();
    for sensor in sensors {
        let sensor = sensor.as_ref();
        let stats = baseline_stats(table, sensor, healthy_col)?;
        let raw = table.numeric_column(sensor)?;

        let z: Vec<Option<f64>> = raw
            .iter()
            .zip(engine_ids.iter())
            .map(|(value, engine_id)| {
                let baseline = stats.get(engine_id).copied().unwrap_or_default();
                Some(baseline.zscore(*value))
            })
            .collect();

        let mut healthy_engines = 0usize;
        let mut fallback_engines = 0usize;
        let mut flat_engines = 0usize;
        for baseline in stats.values() {
            match baseline.source() {
                BaselineSource::Healthy => healthy_engines += 1,
                BaselineSource::AllRows => fallback_engines += 1,
                BaselineSource::Flat => flat_engines += 1,
            }
        }
        tracing::debug!(
            sensor,
            healthy_engines,
            fallback_engines,
            flat_engines,
            "normalized sensor against healthy baseline"
        );

        out = out.with_column(sensor, Column::Float(z))?;
        out.mark_normalized(sensor);
    }
    Ok(out)
}
