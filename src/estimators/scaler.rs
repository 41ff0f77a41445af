//! Per-feature standardisation with running-moment updates.
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::estimators::errors::{EstimatorError, EstimatorResult};

/// Centers each feature on its mean and divides by its standard deviation.
///
/// Features with zero variance keep a unit scale, so they transform to `0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Vec<f64>,
    var: Vec<f64>,
    n_samples_seen: usize,
}

impl StandardScaler {
    /// Fit the per-feature moments of `x` (rows are samples).
    ///
    /// # Errors
    /// [`EstimatorError::EmptyInput`] or [`EstimatorError::NonFiniteInput`].
    pub fn fit(x: ArrayView2<'_, f64>) -> EstimatorResult<Self> {
        check_matrix(x, None)?;
        let n = x.nrows();
        let mean = x.mean_axis(Axis(0)).unwrap_or_else(|| Array1::zeros(x.ncols()));
        let var = x.var_axis(Axis(0), 0.0);
        Ok(Self { mean: mean.to_vec(), var: var.to_vec(), n_samples_seen: n })
    }

    /// Merge the moments of a new batch into the running mean and variance.
    ///
    /// # Errors
    /// As [`StandardScaler::fit`], plus [`EstimatorError::DimensionMismatch`].
    pub fn partial_fit(&mut self, x: ArrayView2<'_, f64>) -> EstimatorResult<()> {
        check_matrix(x, Some(self.mean.len()))?;
        let batch = Self::fit(x)?;
        let (n_a, n_b) = (self.n_samples_seen as f64, batch.n_samples_seen as f64);
        let n = n_a + n_b;
        for j in 0..self.mean.len() {
            let delta = batch.mean[j] - self.mean[j];
            let m2 = self.var[j] * n_a + batch.var[j] * n_b + delta * delta * n_a * n_b / n;
            self.mean[j] += delta * n_b / n;
            self.var[j] = m2 / n;
        }
        self.n_samples_seen += batch.n_samples_seen;
        Ok(())
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    pub fn n_samples_seen(&self) -> usize {
        self.n_samples_seen
    }

    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    /// Check that the moments are usable after deserialisation.
    ///
    /// # Errors
    /// [`EstimatorError::DimensionMismatch`] when `var` and `mean` differ in
    /// length, [`EstimatorError::InvalidState`] for non-finite moments or a
    /// negative variance.
    pub fn validate(&self) -> EstimatorResult<()> {
        if self.var.len() != self.mean.len() {
            return Err(EstimatorError::DimensionMismatch {
                expected: self.mean.len(),
                found: self.var.len(),
            });
        }
        if self.mean.iter().any(|m| !m.is_finite()) {
            return Err(EstimatorError::InvalidState { reason: "scaler mean is not finite" });
        }
        if self.var.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(EstimatorError::InvalidState {
                reason: "scaler variance must be finite and non-negative",
            });
        }
        Ok(())
    }

    pub fn scale(&self) -> Vec<f64> {
        self.var.iter().map(|&v| unit_if_zero(v.sqrt())).collect()
    }

    /// Standardise every row of `x`.
    ///
    /// # Errors
    /// [`EstimatorError::DimensionMismatch`] for a wrong feature count.
    pub fn transform(&self, x: ArrayView2<'_, f64>) -> EstimatorResult<Array2<f64>> {
        if x.ncols() != self.n_features() {
            return Err(EstimatorError::DimensionMismatch {
                expected: self.n_features(),
                found: x.ncols(),
            });
        }
        let mut out = x.to_owned();
        for mut row in out.rows_mut() {
            self.standardise(row.view_mut());
        }
        Ok(out)
    }

    /// Standardise a single sample.
    ///
    /// # Errors
    /// [`EstimatorError::DimensionMismatch`] for a wrong feature count.
    pub fn transform_row(&self, row: ArrayView1<'_, f64>) -> EstimatorResult<Array1<f64>> {
        if row.len() != self.n_features() {
            return Err(EstimatorError::DimensionMismatch {
                expected: self.n_features(),
                found: row.len(),
            });
        }
        let mut out = row.to_owned();
        self.standardise(out.view_mut());
        Ok(out)
    }

    fn standardise(&self, mut row: ndarray::ArrayViewMut1<'_, f64>) {
        for ((v, &m), &var) in row.iter_mut().zip(&self.mean).zip(&self.var) {
            *v = (*v - m) / unit_if_zero(var.sqrt());
        }
    }
}

fn unit_if_zero(scale: f64) -> f64 {
    if scale > 0.0 && scale.is_finite() { scale } else { 1.0 }
}

/// Reject empty, non-finite or wrongly sized feature matrices.
pub(crate) fn check_matrix(x: ArrayView2<'_, f64>, n_features: Option<usize>) -> EstimatorResult<()> {
    if x.nrows() == 0 {
        return Err(EstimatorError::EmptyInput);
    }
    if let Some(expected) = n_features {
        if x.ncols() != expected {
            return Err(EstimatorError::DimensionMismatch { expected, found: x.ncols() });
        }
    }
    for ((row, column), v) in x.indexed_iter() {
        if !v.is_finite() {
            return Err(EstimatorError::NonFiniteInput { row, column: Some(column) });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, s};

    #[test]
    // Purpose
    // -------
    // A scaler whose variance vector lost an entry is rejected instead of
    // standardising only a prefix of the row.
    fn validate_flags_short_variance_and_non_finite_moments() {
        // Arrange
        let sc = StandardScaler::fit(array![[1.0, 2.0], [3.0, 6.0]].view()).unwrap();
        let mut short = sc.clone();
        short.var.pop();
        let mut nan_mean = sc.clone();
        nan_mean.mean[0] = f64::NAN;

        // Act / Assert
        assert_eq!(sc.validate(), Ok(()));
        assert_eq!(short.validate(), Err(EstimatorError::DimensionMismatch { expected: 2, found: 1 }));
        assert!(matches!(nan_mean.validate(), Err(EstimatorError::InvalidState { .. })));
    }

    #[test]
    fn transform_centers_and_scales() {
        let x = array![[1.0, 5.0], [3.0, 5.0]];
        let sc = StandardScaler::fit(x.view()).unwrap();
        let t = sc.transform(x.view()).unwrap();
        assert_eq!(t, array![[-1.0, 0.0], [1.0, 0.0]]);
        assert_eq!(sc.scale(), vec![1.0, 1.0]);
    }

    #[test]
    // Purpose
    // -------
    // Merging batches with `partial_fit` reproduces the moments of a single
    // fit over all rows.
    fn partial_fit_matches_full_fit() {
        // Arrange
        let x = array![[1.0, -2.0], [4.0, 0.5], [2.5, 3.0], [7.0, 1.0], [0.0, -1.0]];

        // Act
        let full = StandardScaler::fit(x.view()).unwrap();
        let mut inc = StandardScaler::fit(x.slice(s![..2, ..])).unwrap();
        inc.partial_fit(x.slice(s![2.., ..])).unwrap();

        // Assert
        assert_eq!(inc.n_samples_seen(), 5);
        for j in 0..2 {
            assert!((inc.mean()[j] - full.mean()[j]).abs() < 1e-12);
            assert!((inc.scale()[j] - full.scale()[j]).abs() < 1e-12);
        }
    }

    #[test]
    fn rejects_bad_input() {
        let sc = StandardScaler::fit(array![[1.0, 2.0]].view()).unwrap();
        assert_eq!(
            sc.transform_row(array![1.0].view()).unwrap_err(),
            EstimatorError::DimensionMismatch { expected: 2, found: 1 }
        );
        assert!(matches!(
            StandardScaler::fit(array![[f64::NAN]].view()),
            Err(EstimatorError::NonFiniteInput { row: 0, column: Some(0) })
        ));
        let empty = Array2::<f64>::zeros((0, 2));
        assert_eq!(StandardScaler::fit(empty.view()).unwrap_err(), EstimatorError::EmptyInput);
    }
}
