//! CART regression tree with per-split feature subsampling.

use ndarray::{Array2, ArrayView1};
use ordered_float::OrderedFloat;
use rand::seq::index::sample;
use rand::Rng;

/// Tree growth limits.
#[derive(Debug, Clone, Copy)]
pub struct TreeParams {
    /// Maximum depth (root is depth 0).
    pub max_depth: usize,
    /// Minimum samples required to split a node.
    pub min_samples_split: usize,
    /// Minimum samples per leaf.
    pub min_samples_leaf: usize,
    /// Features considered at each split.
    pub max_features: usize,
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

/// Best split found at a node.
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    /// Reduction in sum of squared errors.
    gain: f64,
}

/// Regression tree minimizing squared error.
#[derive(Debug, Clone)]
pub struct RegressionTree {
    root: Node,
    /// Unnormalized impurity decrease per feature.
    importances: Vec<f64>,
}

impl RegressionTree {
    /// Grow a tree on the rows listed in `indices` (duplicates allowed).
    pub fn fit<R: Rng>(
        x: &Array2<f64>,
        y: &[f64],
        indices: Vec<usize>,
        params: &TreeParams,
        rng: &mut R,
    ) -> Self {
        let mut builder = Builder {
            x,
            y,
            params,
            importances: vec![0.0; x.ncols()],
        };
        let root = builder.grow(indices, 0, rng);
        Self {
            root,
            importances: builder.importances,
        }
    }

    /// Predict one feature vector.
    pub fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        let mut node = &self.root;
        loop {
            match node {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[*feature] <= *threshold { left } else { right };
                }
            }
        }
    }

    /// Impurity decrease attributed to each feature.
    pub fn importances(&self) -> &[f64] {
        &self.importances
    }

    /// Depth of the deepest leaf.
    pub fn depth(&self) -> usize {
        fn depth(node: &Node) -> usize {
            match node {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + depth(left).max(depth(right)),
            }
        }
        depth(&self.root)
    }
}

struct Builder<'a> {
    x: &'a Array2<f64>,
    y: &'a [f64],
    params: &'a TreeParams,
    importances: Vec<f64>,
}

impl Builder<'_> {
    fn grow<R: Rng>(&mut self, indices: Vec<usize>, depth: usize, rng: &mut R) -> Node {
        let n = indices.len();
        if n == 0 {
            return Node::Leaf { value: 0.0 };
        }
        let sum: f64 = indices.iter().map(|&i| self.y[i]).sum();
        let value = sum / n as f64;

        let first = self.y[indices[0]];
        let pure = indices.iter().all(|&i| self.y[i] == first);
        if pure
            || depth >= self.params.max_depth
            || n < self.params.min_samples_split
            || n < 2 * self.params.min_samples_leaf
        {
            return Node::Leaf { value };
        }

        let Some(best) = self.best_split(&indices, sum, rng) else {
            return Node::Leaf { value };
        };

        self.importances[best.feature] += best.gain;

        let (left, right): (Vec<usize>, Vec<usize>) = indices
            .into_iter()
            .partition(|&i| self.x[[i, best.feature]] <= best.threshold);

        Node::Split {
            feature: best.feature,
            threshold: best.threshold,
            left: Box::new(self.grow(left, depth + 1, rng)),
            right: Box::new(self.grow(right, depth + 1, rng)),
        }
    }

    fn best_split<R: Rng>(&self, indices: &[usize], total: f64, rng: &mut R) -> Option<SplitCandidate> {
        let n = indices.len();
        let n_features = self.x.ncols();
        let k = self.params.max_features.clamp(1, n_features);
        let min_leaf = self.params.min_samples_leaf.max(1);
        let parent_score = total * total / n as f64;

        let mut sorted = indices.to_vec();
        let mut best: Option<SplitCandidate> = None;
        let mut visited = 0;

        // Features constant at this node do not count towards `k`.
        for feature in sample(rng, n_features, n_features).into_iter() {
            if visited == k {
                break;
            }
            sorted.sort_by_key(|&i| OrderedFloat(self.x[[i, feature]]));
            if self.x[[sorted[0], feature]] >= self.x[[sorted[n - 1], feature]] {
                continue;
            }
            visited += 1;

            let mut left_sum = 0.0;
            for pos in 1..n {
                left_sum += self.y[sorted[pos - 1]];
                if pos < min_leaf || n - pos < min_leaf {
                    continue;
                }
                let lo = self.x[[sorted[pos - 1], feature]];
                let hi = self.x[[sorted[pos], feature]];
                if lo >= hi {
                    continue;
                }
                let right_sum = total - left_sum;
                // SSE reduction: sum_l^2/n_l + sum_r^2/n_r - sum^2/n
                let score = left_sum * left_sum / pos as f64
                    + right_sum * right_sum / (n - pos) as f64;
                let gain = score - parent_score;
                if gain > 1e-12 && best.as_ref().map_or(true, |b| gain > b.gain) {
                    let mut threshold = (lo + hi) / 2.0;
                    if threshold >= hi {
                        threshold = lo;
                    }
                    best = Some(SplitCandidate {
                        feature,
                        threshold,
                        gain,
                    });
                }
            }
        }
        best
    }
}
