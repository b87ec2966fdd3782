//! Model training and forecasting for PM10.
//!
//! - `scaler`: per-feature standardization
//! - `tree` / `forest`: random forest regression with parallel tree growth
//! - `metrics`: MAE, RMSE and R² on the hold-out partition
//! - `trainer`: chronological split, fitting and evaluation
//! - `forecaster`: recursive hourly forecasting

pub mod forecaster;
pub mod forest;
pub mod metrics;
pub mod scaler;
pub mod trainer;
pub mod tree;

pub use forecaster::Forecaster;
pub use forest::{ForestParams, RandomForest};
pub use metrics::RegressionMetrics;
pub use scaler::StandardScaler;
pub use trainer::{Holdout, ModelBundle, Trainer, TrainingOutcome};
pub use tree::{RegressionTree, TreeParams};
