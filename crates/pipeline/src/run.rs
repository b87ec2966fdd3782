//! Stage orchestration for the train and predict modes.

use crate::response::{PredictionResponse, ResponseAssembler, TrainingResponse};
use chrono::Local;
use pm10_core::{Error, ForecastConfig, Result, Timestamp, WorkingTable};
use pm10_features::{FeatureBuilder, FeatureFrame, SupervisedDataset};
use pm10_ingestion::{Cleaner, CleaningStats, Ingestor, SchemaNormalizer};
use pm10_model::{Forecaster, RegressionMetrics, Trainer, TrainingOutcome};
use std::path::Path;
use tracing::info;

/// Output of ingestion, cleaning and feature building.
#[derive(Debug, Clone)]
pub struct PreparedData {
    /// Cleaned, strictly time-ordered table.
    pub table: WorkingTable,
    /// Rows removed per cleaning rule.
    pub cleaning: CleaningStats,
    /// Feature-complete rows.
    pub frame: FeatureFrame,
    /// One-step-ahead training samples.
    pub dataset: SupervisedDataset,
    /// Files skipped during ingestion.
    pub warnings: Vec<String>,
}

/// A configured forecasting pipeline.
pub struct Pipeline {
    config: ForecastConfig,
    reference_time: Option<Timestamp>,
}

impl Pipeline {
    /// Create a pipeline after validating the configuration.
    pub fn new(config: ForecastConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            reference_time: None,
        })
    }

    /// Fix the clock used for the future-date filter and `generatedAt`.
    pub fn with_reference_time(mut self, now: Timestamp) -> Self {
        self.reference_time = Some(now);
        self
    }

    /// Active configuration.
    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    fn now(&self) -> Timestamp {
        self.reference_time
            .unwrap_or_else(|| Local::now().naive_local())
    }

    /// Run every stage up to the supervised dataset.
    pub fn prepare(&self, dir: &Path) -> Result<PreparedData> {
        let report = Ingestor::new(&self.config.ingestion).ingest_dir(dir)?;
        let normalized = SchemaNormalizer::new().normalize(report.table)?;
        let (table, cleaning) = Cleaner::new(&self.config.cleaning)
            .with_reference_time(self.now())
            .clean(normalized);

        let min_rows = self.config.features.min_rows;
        if table.len() < min_rows {
            return Err(Error::insufficient_data(format!(
                "{} rows after cleaning, need at least {}",
                table.len(),
                min_rows
            )));
        }

        let frame = FeatureBuilder::new(&self.config.features).build(&table)?;
        let dataset = SupervisedDataset::from_frame(&frame)?;
        info!(
            files = report.files.len(),
            cleaned = table.len(),
            samples = dataset.len(),
            "data prepared"
        );

        Ok(PreparedData {
            table,
            cleaning,
            frame,
            dataset,
            warnings: report.warnings,
        })
    }

    fn fit(&self, data: &PreparedData) -> Result<TrainingOutcome> {
        Trainer::new(&self.config.model).train(&data.dataset)
    }

    /// Train and report hold-out metrics.
    pub fn train(&self, dir: &Path) -> Result<TrainingResponse> {
        let data = self.prepare(dir)?;
        let outcome = self.fit(&data)?;
        // Reported metrics are recomputed from the hold-out predictions.
        let metrics =
            RegressionMetrics::compute(&outcome.holdout.actual, &outcome.holdout.predicted)?;
        Ok(TrainingResponse::new(metrics))
    }

    /// Train, forecast `hours` ahead and assemble the full response.
    ///
    /// `None` uses the configured default horizon.
    pub fn predict(&self, dir: &Path, hours: Option<usize>) -> Result<PredictionResponse> {
        let horizon = hours.unwrap_or(self.config.forecast.default_horizon);
        let max_horizon = self.config.forecast.max_horizon;
        if horizon == 0 {
            return Err(Error::config("forecast horizon must be positive"));
        }
        if horizon > max_horizon || i64::try_from(horizon).is_err() {
            return Err(Error::config(format!(
                "forecast horizon {} exceeds the maximum of {} hours",
                horizon, max_horizon
            )));
        }

        let data = self.prepare(dir)?;
        let outcome = self.fit(&data)?;
        let points = Forecaster::new(&outcome.bundle)
            .with_max_horizon(max_horizon)
            .forecast(&data.frame, horizon)?;

        ResponseAssembler::new(self.config.forecast.status_window).assemble(
            &data.frame.targets,
            &points,
            self.now(),
        )
    }
}
