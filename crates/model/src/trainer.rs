//! Chronological training of the scaler and forest.

use crate::forest::{ForestParams, RandomForest};
use crate::metrics::RegressionMetrics;
use crate::scaler::StandardScaler;
use ndarray::{s, ArrayView1};
use pm10_core::config::ModelConfig;
use pm10_core::{Error, FeatureSchema, Result};
use pm10_features::SupervisedDataset;
use tracing::{debug, info};

/// Fitted scaler, model and the schema they were trained with.
#[derive(Debug, Clone)]
pub struct ModelBundle {
    /// Fitted on the training partition only.
    pub scaler: StandardScaler,
    /// Fitted forest.
    pub model: RandomForest,
    /// Feature layout expected at inference.
    pub schema: FeatureSchema,
}

impl ModelBundle {
    /// Scale an unscaled feature vector and predict.
    pub fn predict_row(&self, row: ArrayView1<'_, f64>) -> Result<f64> {
        let scaled = self.scaler.transform_row(row)?;
        self.model.predict_row(scaled.view())
    }
}

/// Actual and predicted labels of the hold-out partition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Holdout {
    /// Observed next-hour PM10.
    pub actual: Vec<f64>,
    /// Model output for the same rows.
    pub predicted: Vec<f64>,
}

/// Everything produced by a training run.
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    /// Model bundle for forecasting.
    pub bundle: ModelBundle,
    /// Metrics on the hold-out partition.
    pub metrics: RegressionMetrics,
    /// Hold-out labels and predictions.
    pub holdout: Holdout,
    /// Rows in the training partition.
    pub train_rows: usize,
}

/// Fits a scaler and forest on a chronological split.
pub struct Trainer {
    test_fraction: f64,
    params: ForestParams,
}

impl Trainer {
    /// Create a trainer from configuration.
    pub fn new(config: &ModelConfig) -> Self {
        Self {
            test_fraction: config.test_fraction,
            params: ForestParams::from(config),
        }
    }

    /// Number of leading rows used for training out of `n`.
    ///
    /// The hold-out takes `ceil(n * test_fraction)` trailing rows.
    pub fn split_point(&self, n: usize) -> usize {
        let n_test = (n as f64 * self.test_fraction).ceil() as usize;
        n.saturating_sub(n_test)
    }

    /// Train on the leading rows and evaluate on the trailing rows.
    ///
    /// Rows are never shuffled.
    pub fn train(&self, dataset: &SupervisedDataset) -> Result<TrainingOutcome> {
        let n = dataset.len();
        let split = self.split_point(n);
        if split == 0 || split >= n {
            return Err(Error::insufficient_data(format!(
                "cannot split {} samples into train and test partitions",
                n
            )));
        }

        let x_train = dataset.x.slice(s![..split, ..]).to_owned();
        let x_test = dataset.x.slice(s![split.., ..]).to_owned();
        let y_train = dataset.y.slice(s![..split]).to_owned();
        let y_test = dataset.y.slice(s![split..]).to_vec();

        let scaler = StandardScaler::fit(&x_train)?;
        let x_train_scaled = scaler.transform(&x_train)?;
        let x_test_scaled = scaler.transform(&x_test)?;

        info!(
            train = split,
            test = n - split,
            features = dataset.schema.len(),
            "training forest"
        );
        let model = RandomForest::fit(&x_train_scaled, &y_train, &self.params)?;
        debug!(trees = model.n_trees(), "forest ready");

        let predicted = model.predict(&x_test_scaled)?.to_vec();
        let metrics = RegressionMetrics::compute(&y_test, &predicted)?;
        info!(
            mae = metrics.mae,
            rmse = metrics.rmse,
            r2 = metrics.r2,
            "hold-out metrics"
        );

        let importances = model.feature_importances();
        let mut ranked: Vec<(&String, f64)> = dataset
            .schema
            .names()
            .iter()
            .zip(importances)
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        debug!(top = ?&ranked[..ranked.len().min(5)], "feature importances");

        Ok(TrainingOutcome {
            bundle: ModelBundle {
                scaler,
                model,
                schema: dataset.schema.clone(),
            },
            metrics,
            holdout: Holdout {
                actual: y_test,
                predicted,
            },
            train_rows: split,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, Array2};

    fn dataset(n: usize) -> SupervisedDataset {
        let x = Array2::from_shape_fn((n, 2), |(i, j)| if j == 0 { i as f64 } else { (i % 24) as f64 });
        let y = Array1::from_iter((0..n).map(|i| 20.0 + (i % 24) as f64));
        SupervisedDataset {
            schema: FeatureSchema::new(vec!["a".to_string(), "hour".to_string()]),
            x,
            y,
        }
    }

    fn config() -> ModelConfig {
        ModelConfig {
            n_trees: 10,
            ..ModelConfig::default()
        }
    }

    #[test]
    fn test_split_point_is_chronological_80_20() {
        let trainer = Trainer::new(&ModelConfig::default());
        assert_eq!(trainer.split_point(100), 80);
        assert_eq!(trainer.split_point(99), 79);
        assert_eq!(trainer.split_point(101), 80);
    }

    #[test]
    fn test_train_produces_bundle_and_holdout() {
        let ds = dataset(200);
        let outcome = Trainer::new(&config()).train(&ds).unwrap();

        assert_eq!(outcome.train_rows, 160);
        assert_eq!(outcome.holdout.actual.len(), 40);
        assert_eq!(outcome.holdout.actual, ds.y.slice(s![160..]).to_vec());
        assert_eq!(outcome.bundle.schema, ds.schema);
        assert!(outcome.metrics.mae.is_finite());

        let recomputed =
            RegressionMetrics::compute(&outcome.holdout.actual, &outcome.holdout.predicted).unwrap();
        assert_eq!(recomputed, outcome.metrics);
    }

    #[test]
    fn test_bundle_predict_row_uses_scaler() {
        let ds = dataset(200);
        let outcome = Trainer::new(&config()).train(&ds).unwrap();
        let bundle = &outcome.bundle;
        let direct = bundle.predict_row(ds.x.row(170)).unwrap();
        assert!((direct - outcome.holdout.predicted[10]).abs() < 1e-12);
    }

    #[test]
    fn test_training_is_deterministic() {
        let ds = dataset(150);
        let a = Trainer::new(&config()).train(&ds).unwrap();
        let b = Trainer::new(&config()).train(&ds).unwrap();
        assert_eq!(a.metrics, b.metrics);
        assert_eq!(a.holdout, b.holdout);
    }

    #[test]
    fn test_too_few_rows() {
        let ds = dataset(1);
        assert!(matches!(
            Trainer::new(&config()).train(&ds),
            Err(Error::InsufficientData(_))
        ));
    }
}
