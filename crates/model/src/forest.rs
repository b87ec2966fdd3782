//! Random forest regressor.
//!
//! Trees are grown independently in parallel; each tree draws its bootstrap
//! sample and split features from its own generator seeded with
//! `seed + tree_index`, so the fitted forest does not depend on scheduling.

use crate::tree::{RegressionTree, TreeParams};
use ndarray::{Array1, Array2, ArrayView1};
use pm10_core::config::ModelConfig;
use pm10_core::{Error, Result};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use tracing::debug;

/// Forest hyperparameters.
#[derive(Debug, Clone)]
pub struct ForestParams {
    /// Number of trees.
    pub n_trees: usize,
    /// Maximum tree depth.
    pub max_depth: usize,
    /// Minimum samples to split a node.
    pub min_samples_split: usize,
    /// Minimum samples per leaf.
    pub min_samples_leaf: usize,
    /// Draw a bootstrap sample per tree.
    pub bootstrap: bool,
    /// Base random seed.
    pub seed: u64,
}

impl From<&ModelConfig> for ForestParams {
    fn from(config: &ModelConfig) -> Self {
        Self {
            n_trees: config.n_trees,
            max_depth: config.max_depth,
            min_samples_split: config.min_samples_split,
            min_samples_leaf: config.min_samples_leaf,
            bootstrap: config.bootstrap,
            seed: config.seed,
        }
    }
}

/// Features tried per split: `floor(sqrt(p))`, at least one.
pub fn sqrt_features(n_features: usize) -> usize {
    ((n_features as f64).sqrt().floor() as usize).max(1)
}

/// Averaging ensemble of regression trees.
#[derive(Debug, Clone)]
pub struct RandomForest {
    trees: Vec<RegressionTree>,
    n_features: usize,
}

impl RandomForest {
    /// Fit the forest.
    pub fn fit(x: &Array2<f64>, y: &Array1<f64>, params: &ForestParams) -> Result<Self> {
        let n_samples = x.nrows();
        let n_features = x.ncols();
        if n_samples != y.len() {
            return Err(Error::computation(format!(
                "feature rows ({}) and labels ({}) differ",
                n_samples,
                y.len()
            )));
        }
        if n_samples == 0 || n_features == 0 {
            return Err(Error::computation("cannot fit forest on empty data"));
        }
        if params.n_trees == 0 {
            return Err(Error::computation("forest needs at least one tree"));
        }

        let tree_params = TreeParams {
            max_depth: params.max_depth,
            min_samples_split: params.min_samples_split,
            min_samples_leaf: params.min_samples_leaf,
            max_features: sqrt_features(n_features),
        };
        let labels = y.to_vec();

        let trees: Vec<RegressionTree> = (0..params.n_trees)
            .into_par_iter()
            .map(|tree_idx| {
                let mut rng = ChaCha8Rng::seed_from_u64(params.seed.wrapping_add(tree_idx as u64));
                let indices: Vec<usize> = if params.bootstrap {
                    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect()
                } else {
                    (0..n_samples).collect()
                };
                RegressionTree::fit(x, &labels, indices, &tree_params, &mut rng)
            })
            .collect();

        debug!(
            trees = trees.len(),
            max_depth = trees.iter().map(RegressionTree::depth).max().unwrap_or(0),
            "forest fitted"
        );

        Ok(Self { trees, n_features })
    }

    /// Number of trees.
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Number of features the forest expects.
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Predict a single feature vector.
    pub fn predict_row(&self, row: ArrayView1<'_, f64>) -> Result<f64> {
        if row.len() != self.n_features {
            return Err(Error::computation(format!(
                "forest expects {} features, got {}",
                self.n_features,
                row.len()
            )));
        }
        let sum: f64 = self.trees.iter().map(|t| t.predict_row(row)).sum();
        Ok(sum / self.trees.len() as f64)
    }

    /// Predict every row of `x`.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let predictions = (0..x.nrows())
            .into_par_iter()
            .map(|i| self.predict_row(x.row(i)))
            .collect::<Result<Vec<f64>>>()?;
        Ok(Array1::from_vec(predictions))
    }

    /// Mean impurity decrease per feature, normalized to sum to one.
    pub fn feature_importances(&self) -> Vec<f64> {
        let mut total = vec![0.0; self.n_features];
        for tree in &self.trees {
            let imp = tree.importances();
            let tree_sum: f64 = imp.iter().sum();
            if tree_sum > 0.0 {
                for (acc, v) in total.iter_mut().zip(imp) {
                    *acc += v / tree_sum;
                }
            }
        }
        let sum: f64 = total.iter().sum();
        if sum > 0.0 {
            for v in &mut total {
                *v /= sum;
            }
        }
        total
    }
}
