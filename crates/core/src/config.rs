//! Configuration structures for the PM10 forecasting pipeline.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration for a forecasting run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Input file discovery and parsing.
    pub ingestion: IngestionConfig,
    /// Record cleaning limits.
    pub cleaning: CleaningConfig,
    /// Feature engineering parameters.
    pub features: FeatureConfig,
    /// Ensemble training parameters.
    pub model: ModelConfig,
    /// Forecast and response parameters.
    pub forecast: HorizonConfig,
}

impl ForecastConfig {
    /// Load a configuration from a JSON file. Missing fields keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: ForecastConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the pipeline meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.ingestion.delimiters.is_empty() {
            return Err(Error::config("at least one delimiter candidate is required"));
        }
        if self.ingestion.extensions.is_empty() {
            return Err(Error::config("at least one file extension is required"));
        }
        if self.cleaning.target_min > self.cleaning.target_max {
            return Err(Error::config(format!(
                "target_min {} exceeds target_max {}",
                self.cleaning.target_min, self.cleaning.target_max
            )));
        }
        if self.features.lags.iter().any(|&lag| lag == 0) {
            return Err(Error::config("lags must be positive"));
        }
        if self.features.rolling_windows.iter().any(|&w| w == 0) {
            return Err(Error::config("rolling windows must be positive"));
        }
        if !(self.model.test_fraction > 0.0 && self.model.test_fraction < 1.0) {
            return Err(Error::config(format!(
                "test_fraction must lie in (0, 1), got {}",
                self.model.test_fraction
            )));
        }
        if self.model.n_trees == 0 {
            return Err(Error::config("n_trees must be positive"));
        }
        if self.model.min_samples_leaf == 0 {
            return Err(Error::config("min_samples_leaf must be positive"));
        }
        if self.forecast.default_horizon == 0 {
            return Err(Error::config("default_horizon must be positive"));
        }
        if self.forecast.default_horizon > self.forecast.max_horizon {
            return Err(Error::config(format!(
                "default_horizon {} exceeds max_horizon {}",
                self.forecast.default_horizon, self.forecast.max_horizon
            )));
        }
        if self.forecast.status_window == 0 {
            return Err(Error::config("status_window must be positive"));
        }
        Ok(())
    }
}

/// Input discovery configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestionConfig {
    /// Accepted file extensions (lowercase, without dot).
    pub extensions: Vec<String>,
    /// Delimiter candidates in priority order.
    pub delimiters: Vec<char>,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["csv".to_string(), "tsv".to_string(), "txt".to_string()],
            delimiters: vec!['\t', ',', ';', '|'],
        }
    }
}

/// Record cleaning configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningConfig {
    /// Records stamped later than now + this many months are dropped.
    pub future_tolerance_months: u32,
    /// Minimum plausible PM10 value.
    pub target_min: f64,
    /// Sensor saturation cutoff.
    pub target_max: f64,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            future_tolerance_months: 12,
            target_min: 0.0,
            target_max: 1000.0,
        }
    }
}

/// Feature engineering configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Lag offsets in rows.
    pub lags: Vec<usize>,
    /// Trailing rolling-mean windows in rows.
    pub rolling_windows: Vec<usize>,
    /// Minimum rows that must survive feature building.
    pub min_rows: usize,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            lags: vec![1, 2, 3, 6, 12, 24],
            rolling_windows: vec![5, 10, 30, 60],
            min_rows: 100,
        }
    }
}

/// Ensemble training configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Fraction of the (chronologically last) rows held out for evaluation.
    pub test_fraction: f64,
    /// Number of trees in the forest.
    pub n_trees: usize,
    /// Maximum tree depth.
    pub max_depth: usize,
    /// Minimum samples required to split a node.
    pub min_samples_split: usize,
    /// Minimum samples per leaf.
    pub min_samples_leaf: usize,
    /// Draw a bootstrap sample per tree.
    pub bootstrap: bool,
    /// Random seed.
    pub seed: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            n_trees: 200,
            max_depth: 15,
            min_samples_split: 10,
            min_samples_leaf: 5,
            bootstrap: true,
            seed: 42,
        }
    }
}

/// Forecast horizon and response configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HorizonConfig {
    /// Horizon in hours when the caller does not provide one.
    pub default_horizon: usize,
    /// Largest horizon accepted from the caller.
    pub max_horizon: usize,
    /// Number of trailing observations averaged for the current status.
    pub status_window: usize,
}

impl Default for HorizonConfig {
    fn default() -> Self {
        Self {
            default_horizon: 72,
            max_horizon: 24 * 366,
            status_window: 100,
        }
    }
}
