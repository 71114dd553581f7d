use crate::analysis::{DEFAULT_MIN_HITS, DEFAULT_WINDOW};
use anyhow::{Context, Result};
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Sensors that visibly drift as an engine degrades.
pub const DEFAULT_DRIFT_SENSORS: [&str; 14] = [
    "sensor_2", "sensor_3", "sensor_4", "sensor_7", "sensor_8", "sensor_9", "sensor_11",
    "sensor_12", "sensor_13", "sensor_14", "sensor_15", "sensor_17", "sensor_20", "sensor_21",
];

fn config_path_from_env() -> Option<PathBuf> {
    std::env::var("ENGINE_HEALTH_CONFIG_PATH")
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisConfig {
    pub drift_sensors: Vec<String>,
    /// Rows with more cycles to failure than this count as healthy.
    pub healthy_cutoff: i64,
    pub z_threshold: f64,
    /// Rows before this cycle are dropped before analysis.
    pub min_cycle: i64,
    pub roll_window: usize,
    pub sustain_count: usize,
    pub health_score_threshold: f64,
    pub health_score_roll_window: usize,
    pub health_score_sustain_count: usize,
    /// Budget for the composite score's false-positive rate on healthy rows.
    pub max_fp_rate: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            drift_sensors: DEFAULT_DRIFT_SENSORS.iter().map(|s| s.to_string()).collect(),
            healthy_cutoff: 150,
            z_threshold: 2.0,
            min_cycle: 1,
            roll_window: DEFAULT_WINDOW,
            sustain_count: DEFAULT_MIN_HITS,
            health_score_threshold: 1.5,
            health_score_roll_window: 10,
            health_score_sustain_count: 5,
            max_fp_rate: 0.05,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigOverrides {
    #[serde(default)]
    drift_sensors: Option<Vec<String>>,
    #[serde(default)]
    healthy_cutoff: Option<i64>,
    #[serde(default)]
    z_threshold: Option<f64>,
    #[serde(default)]
    min_cycle: Option<i64>,
    #[serde(default)]
    roll_window: Option<usize>,
    #[serde(default)]
    sustain_count: Option<usize>,
    #[serde(default)]
    health_score_threshold: Option<f64>,
    #[serde(default)]
    health_score_roll_window: Option<usize>,
    #[serde(default)]
    health_score_sustain_count: Option<usize>,
    #[serde(default)]
    max_fp_rate: Option<f64>,
}

fn load_config_overrides(path: &Path) -> Option<ConfigOverrides> {
    if !path.exists() {
        tracing::warn!(path = %path.display(), "config file not found; using defaults");
        return None;
    }
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) => {
            tracing::warn!(
                path = %path.display(),
                error = %err,
                "failed to read config file; using defaults"
            );
            return None;
        }
    };
    match serde_json::from_str(&contents) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(
                path = %path.display(),
                error = %err,
                "failed to parse config file; using defaults"
            );
            None
        }
    }
}

fn parse_sensor_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl AnalysisConfig {
    /// Defaults, then the JSON file (explicit path or `ENGINE_HEALTH_CONFIG_PATH`),
    /// then `ENGINE_HEALTH_*` variables. `.env` is loaded first.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        dotenv().ok();

        let mut config = Self::default();
        let path = config_path.map(Path::to_path_buf).or_else(config_path_from_env);
        if let Some(path) = path.as_deref() {
            if let Some(overrides) = load_config_overrides(path) {
                config.apply_overrides(&overrides);
                tracing::debug!(path = %path.display(), "applied config file");
            }
        }
        config.apply_env_from(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(sensors) = overrides.drift_sensors.as_ref().filter(|s| !s.is_empty()) {
            self.drift_sensors = sensors.clone();
        }
        if let Some(value) = overrides.healthy_cutoff {
            self.healthy_cutoff = value;
        }
        if let Some(value) = overrides.z_threshold {
            self.z_threshold = value;
        }
        if let Some(value) = overrides.min_cycle {
            self.min_cycle = value;
        }
        if let Some(value) = overrides.roll_window {
            self.roll_window = value;
        }
        if let Some(value) = overrides.sustain_count {
            self.sustain_count = value;
        }
        if let Some(value) = overrides.health_score_threshold {
            self.health_score_threshold = value;
        }
        if let Some(value) = overrides.health_score_roll_window {
            self.health_score_roll_window = value;
        }
        if let Some(value) = overrides.health_score_sustain_count {
            self.health_score_sustain_count = value;
        }
        if let Some(value) = overrides.max_fp_rate {
            self.max_fp_rate = value;
        }
    }

    /// Applies `ENGINE_HEALTH_*` values returned by `lookup`. Blank values are
    /// ignored; unparseable ones are an error.
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if let Some(value) = get("ENGINE_HEALTH_DRIFT_SENSORS") {
            let sensors = parse_sensor_list(&value);
            if !sensors.is_empty() {
                self.drift_sensors = sensors;
            }
        }
        env_parse(&get, "ENGINE_HEALTH_HEALTHY_CUTOFF", &mut self.healthy_cutoff)?;
        env_parse(&get, "ENGINE_HEALTH_Z_THRESHOLD", &mut self.z_threshold)?;
        env_parse(&get, "ENGINE_HEALTH_MIN_CYCLE", &mut self.min_cycle)?;
        env_parse(&get, "ENGINE_HEALTH_ROLL_WINDOW", &mut self.roll_window)?;
        env_parse(&get, "ENGINE_HEALTH_SUSTAIN_COUNT", &mut self.sustain_count)?;
        env_parse(
            &get,
            "ENGINE_HEALTH_HEALTH_SCORE_THRESHOLD",
            &mut self.health_score_threshold,
        )?;
        env_parse(
            &get,
            "ENGINE_HEALTH_HEALTH_SCORE_ROLL_WINDOW",
            &mut self.health_score_roll_window,
        )?;
        env_parse(
            &get,
            "ENGINE_HEALTH_HEALTH_SCORE_SUSTAIN_COUNT",
            &mut self.health_score_sustain_count,
        )?;
        env_parse(&get, "ENGINE_HEALTH_MAX_FP_RATE", &mut self.max_fp_rate)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.drift_sensors.is_empty() {
            anyhow::bail!("drift_sensors must name at least one sensor");
        }
        if self.roll_window == 0 || self.health_score_roll_window == 0 {
            anyhow::bail!("alarm windows must be at least one cycle");
        }
        if self.sustain_count > self.roll_window {
            anyhow::bail!(
                "sustain_count ({}) cannot exceed roll_window ({})",
                self.sustain_count,
                self.roll_window
            );
        }
        if self.health_score_sustain_count > self.health_score_roll_window {
            anyhow::bail!(
                "health_score_sustain_count ({}) cannot exceed health_score_roll_window ({})",
                self.health_score_sustain_count,
                self.health_score_roll_window
            );
        }
        if !self.z_threshold.is_finite() || !self.health_score_threshold.is_finite() {
            anyhow::bail!("alarm thresholds must be finite");
        }
        if !(0.0..=1.0).contains(&self.max_fp_rate) {
            anyhow::bail!("max_fp_rate must be within [0, 1], got {}", self.max_fp_rate);
        }
        Ok(())
    }
}

fn env_parse<T, G>(get: &G, key: &str, slot: &mut T) -> Result<()>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    G: Fn(&str) -> Option<String>,
{
    if let Some(value) = get(key) {
        *slot = value
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value `{value}`"))?;
    }
    Ok(())
}
