//! Feature matrix construction.
//!
//! Combines auxiliary, calendar, lag and rolling features into a fixed
//! schema and drops every row with a missing value.

use crate::calendar::{CalendarFeatures, CALENDAR_FEATURES};
use crate::catalog::{resolve_auxiliary, AuxiliaryColumn};
use crate::rolling::{lagged, rolling_means};
use ndarray::{Array2, ArrayView1};
use pm10_core::config::FeatureConfig;
use pm10_core::{Error, FeatureSchema, Result, Timestamp, WorkingTable, TARGET_COLUMN};
use pm10_ingestion::cleaner::parse_number;
use tracing::{debug, info};

/// Name of the lag feature for `lag` rows.
pub fn lag_feature_name(lag: usize) -> String {
    format!("{}_lag_{}", TARGET_COLUMN, lag)
}

/// Name of the rolling-mean feature for `window` rows.
pub fn rolling_feature_name(window: usize) -> String {
    format!("{}_ma_{}", TARGET_COLUMN, window)
}

/// Feature-complete working table.
#[derive(Debug, Clone)]
pub struct FeatureFrame {
    /// Column layout of `matrix`.
    pub schema: FeatureSchema,
    /// Row timestamps, strictly increasing.
    pub timestamps: Vec<Timestamp>,
    /// Feature values, one row per timestamp.
    pub matrix: Array2<f64>,
    /// Raw target per row.
    pub targets: Vec<f64>,
}

impl FeatureFrame {
    /// Number of rows.
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Whether the frame has no rows.
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Feature vector and timestamp of the most recent row.
    pub fn last_row(&self) -> Option<(Timestamp, ArrayView1<'_, f64>)> {
        if self.is_empty() {
            return None;
        }
        let last = self.len() - 1;
        Some((self.timestamps[last], self.matrix.row(last)))
    }
}

/// Builds the feature frame from a cleaned table.
pub struct FeatureBuilder {
    lags: Vec<usize>,
    rolling_windows: Vec<usize>,
    min_rows: usize,
}

impl FeatureBuilder {
    /// Create a builder from configuration.
    pub fn new(config: &FeatureConfig) -> Self {
        Self {
            lags: config.lags.clone(),
            rolling_windows: config.rolling_windows.clone(),
            min_rows: config.min_rows,
        }
    }

    /// Schema produced for a given set of resolved auxiliary columns.
    pub fn schema_for(&self, auxiliary: &[AuxiliaryColumn]) -> FeatureSchema {
        let mut names: Vec<String> = auxiliary.iter().map(|a| a.token.to_string()).collect();
        names.extend(CALENDAR_FEATURES.iter().map(|s| s.to_string()));
        names.extend(self.lags.iter().map(|&l| lag_feature_name(l)));
        names.extend(self.rolling_windows.iter().map(|&w| rolling_feature_name(w)));
        FeatureSchema::new(names)
    }

    /// Build the feature frame.
    ///
    /// Lags and rolling means are computed over the full cleaned series
    /// before incomplete rows are dropped.
    pub fn build(&self, table: &WorkingTable) -> Result<FeatureFrame> {
        let mut excluded: Vec<&str> = table.timestamp_sources.iter().map(String::as_str).collect();
        excluded.push(table.target_source.as_str());
        let auxiliary = resolve_auxiliary(&table.columns, &excluded);
        let schema = self.schema_for(&auxiliary);
        debug!(features = ?schema.names(), "resolved feature schema");

        let targets = table.targets();
        let lag_columns: Vec<Vec<Option<f64>>> =
            self.lags.iter().map(|&l| lagged(&targets, l)).collect();
        let rolling_columns: Vec<Vec<f64>> = self
            .rolling_windows
            .iter()
            .map(|&w| rolling_means(&targets, w))
            .collect();

        let width = schema.len();
        let mut flat = Vec::with_capacity(table.len() * width);
        let mut timestamps = Vec::with_capacity(table.len());
        let mut kept_targets = Vec::with_capacity(table.len());
        let mut row = Vec::with_capacity(width);

        for (i, reading) in table.readings.iter().enumerate() {
            row.clear();
            row.extend(auxiliary.iter().map(|a| {
                reading.values[a.column]
                    .as_deref()
                    .and_then(parse_number)
            }));
            let calendar = CalendarFeatures::from_timestamp(&reading.timestamp);
            row.extend(calendar.values().iter().map(|&v| Some(v)));
            row.extend(lag_columns.iter().map(|col| col[i]));
            row.extend(rolling_columns.iter().map(|col| Some(col[i])));

            if row.iter().all(Option::is_some) {
                flat.extend(row.iter().flatten());
                timestamps.push(reading.timestamp);
                kept_targets.push(reading.pm10);
            }
        }

        let rows = kept_targets.len();
        info!(
            rows,
            dropped = table.len() - rows,
            features = width,
            "built feature matrix"
        );

        if rows < self.min_rows {
            return Err(Error::insufficient_data(format!(
                "{} usable rows after feature building, need at least {}",
                rows, self.min_rows
            )));
        }

        let matrix = Array2::from_shape_vec((rows, width), flat)
            .map_err(|e| Error::computation(format!("feature matrix shape: {}", e)))?;

        Ok(FeatureFrame {
            schema,
            timestamps,
            matrix,
            targets: kept_targets,
        })
    }
}
