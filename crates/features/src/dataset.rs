//! One-step-ahead supervised dataset.

use crate::engine::FeatureFrame;
use ndarray::{s, Array1, Array2};
use pm10_core::{Error, FeatureSchema, Result};

/// Features at row `i` paired with the target at row `i + 1`.
#[derive(Debug, Clone)]
pub struct SupervisedDataset {
    /// Feature layout.
    pub schema: FeatureSchema,
    /// Feature matrix without the final frame row.
    pub x: Array2<f64>,
    /// Next-row targets.
    pub y: Array1<f64>,
}

impl SupervisedDataset {
    /// Shift the target by one row; the final row has no label and is dropped.
    pub fn from_frame(frame: &FeatureFrame) -> Result<Self> {
        let n = frame.len();
        if n < 2 {
            return Err(Error::insufficient_data(format!(
                "need at least 2 rows to build labels, got {}",
                n
            )));
        }
        let x = frame.matrix.slice(s![..n - 1, ..]).to_owned();
        let y = Array1::from_iter(frame.targets[1..].iter().copied());
        Ok(Self {
            schema: frame.schema.clone(),
            x,
            y,
        })
    }

    /// Number of labelled samples.
    pub fn len(&self) -> usize {
        self.y.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }
}
