//! Regression accuracy metrics.
//!
//! Calculates hold-out error metrics from actual and predicted values.

use pm10_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Regression metrics on a hold-out partition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    /// Mean absolute error.
    pub mae: f64,
    /// Root mean squared error.
    pub rmse: f64,
    /// Coefficient of determination.
    #[serde(rename = "r2_score")]
    pub r2: f64,
}

impl RegressionMetrics {
    /// Calculate metrics from paired actual and predicted values.
    pub fn compute(actual: &[f64], predicted: &[f64]) -> Result<Self> {
        if actual.len() != predicted.len() {
            return Err(Error::computation(format!(
                "metric inputs differ in length: {} vs {}",
                actual.len(),
                predicted.len()
            )));
        }
        if actual.is_empty() {
            return Err(Error::computation("cannot compute metrics on zero samples"));
        }

        let n = actual.len() as f64;
        let mut abs_sum = 0.0;
        let mut sq_sum = 0.0;
        for (a, p) in actual.iter().zip(predicted) {
            let err = a - p;
            abs_sum += err.abs();
            sq_sum += err * err;
        }

        let mean = actual.iter().sum::<f64>() / n;
        let total_var: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();

        // Constant targets: perfect fit scores 1, anything else 0.
        let r2 = if total_var > 0.0 {
            1.0 - sq_sum / total_var
        } else if sq_sum == 0.0 {
            1.0
        } else {
            0.0
        };

        Ok(Self {
            mae: abs_sum / n,
            rmse: (sq_sum / n).sqrt(),
            r2,
        })
    }
}
