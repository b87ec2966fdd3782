//! Per-feature standardization.

use ndarray::{Array1, Array2, ArrayView1, Axis};
use pm10_core::{Error, Result};
use statrs::statistics::Statistics;

/// Z-score scaler: `(x - mean) / std`, fitted column by column.
///
/// Uses the population standard deviation; a constant column is scaled by 1.
#[derive(Debug, Clone)]
pub struct StandardScaler {
    mean: Array1<f64>,
    scale: Array1<f64>,
}

impl StandardScaler {
    /// Fit on the rows of `x`.
    pub fn fit(x: &Array2<f64>) -> Result<Self> {
        if x.nrows() == 0 {
            return Err(Error::computation("cannot fit scaler on zero rows"));
        }
        let mut mean = Array1::zeros(x.ncols());
        let mut scale = Array1::ones(x.ncols());
        for (j, column) in x.axis_iter(Axis(1)).enumerate() {
            mean[j] = column.iter().mean();
            let std = column.iter().population_std_dev();
            if std.is_finite() && std > 0.0 {
                scale[j] = std;
            }
        }
        Ok(Self { mean, scale })
    }

    /// Number of features the scaler was fitted on.
    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    fn check_width(&self, width: usize) -> Result<()> {
        if width != self.n_features() {
            return Err(Error::computation(format!(
                "scaler fitted on {} features, got {}",
                self.n_features(),
                width
            )));
        }
        Ok(())
    }

    /// Scale every row of `x`.
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.check_width(x.ncols())?;
        Ok((x - &self.mean) / &self.scale)
    }

    /// Scale a single feature vector.
    pub fn transform_row(&self, row: ArrayView1<'_, f64>) -> Result<Array1<f64>> {
        self.check_width(row.len())?;
        Ok((&row - &self.mean) / &self.scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_fit_transform_standardizes() {
        let x = array![[1.0, 10.0], [2.0, 10.0], [3.0, 10.0]];
        let scaler = StandardScaler::fit(&x).unwrap();
        let z = scaler.transform(&x).unwrap();

        // Column 0: mean 2, population std sqrt(2/3).
        let std0 = (2.0f64 / 3.0).sqrt();
        assert_abs_diff_eq!(z[[0, 0]], -1.0 / std0, epsilon = 1e-12);
        assert_abs_diff_eq!(z[[2, 0]], 1.0 / std0, epsilon = 1e-12);
        // Constant column is centred but not divided by zero.
        assert!(z.column(1).iter().all(|&v| v == 0.0));
        let shifted = scaler.transform_row(array![2.0, 12.0].view()).unwrap();
        assert_abs_diff_eq!(shifted[1], 2.0);
    }

    #[test]
    fn test_transform_row_matches_matrix() {
        let x = array![[1.0, 4.0], [3.0, 8.0], [5.0, 0.0]];
        let scaler = StandardScaler::fit(&x).unwrap();
        let z = scaler.transform(&x).unwrap();
        let r = scaler.transform_row(x.row(1)).unwrap();
        assert_abs_diff_eq!(r[0], z[[1, 0]], epsilon = 1e-12);
        assert_abs_diff_eq!(r[1], z[[1, 1]], epsilon = 1e-12);
    }

    #[test]
    fn test_width_mismatch_is_error() {
        let scaler = StandardScaler::fit(&array![[1.0, 2.0]]).unwrap();
        assert!(scaler.transform(&array![[1.0, 2.0, 3.0]]).is_err());
    }

    #[test]
    fn test_empty_fit_is_error() {
        let x = Array2::<f64>::zeros((0, 3));
        assert!(StandardScaler::fit(&x).is_err());
    }
}
