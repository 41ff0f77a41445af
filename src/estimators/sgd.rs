//! estimators::sgd — linear models trained by stochastic gradient descent.
//!
//! Purpose
//! -------
//! Provide the two estimator families used by the model store:
//! [`SgdClassifier`] (logistic loss, probability output) and
//! [`SgdRegressor`] (squared or Huber loss). Both share one linear core with
//! `none | l2 | l1 | elasticnet` penalties, full `fit` and a single-epoch
//! warm-start `partial_fit`.
//!
//! Key behaviors
//! -------------
//! - Learning rate `eta_t = eta0 / t^power_t`, `t` counting updates since
//!   the first fit and carried across `partial_fit` calls.
//! - Each update shrinks the weights for the L2 part of the penalty, takes
//!   the loss gradient step, then soft-thresholds for the L1 part. The
//!   intercept is never penalised.
//! - Rows are visited in a seeded random order per epoch. `fit` stops after
//!   `n_iter_no_change` epochs without improving the epoch loss by `tol`,
//!   or after `max_epochs`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Inputs are expected to be standardised; the models are not scale-aware.
//! - Classifier labels are `0.0` / `1.0`.
//! - Given the same seed and data, fitting is deterministic.
use ndarray::{ArrayView1, ArrayView2};
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use serde::{Deserialize, Serialize};

use crate::estimators::{
    errors::{EstimatorError, EstimatorResult},
    scaler::check_matrix,
};

/// Largest absolute loss derivative applied in one update.
const MAX_DLOSS: f64 = 1e12;

/// Regularisation penalty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Penalty {
    None,
    L2,
    L1,
    ElasticNet,
}

impl Penalty {
    pub const ALL: [Penalty; 4] = [Penalty::None, Penalty::L2, Penalty::L1, Penalty::ElasticNet];

    /// `(l2, l1)` strengths for `alpha` and `l1_ratio`.
    fn strengths(self, alpha: f64, l1_ratio: f64) -> (f64, f64) {
        match self {
            Penalty::None => (0.0, 0.0),
            Penalty::L2 => (alpha, 0.0),
            Penalty::L1 => (0.0, alpha),
            Penalty::ElasticNet => (alpha * (1.0 - l1_ratio), alpha * l1_ratio),
        }
    }
}

/// Loss of a regressor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "lowercase")]
pub enum RegressionLoss {
    Squared,
    Huber { epsilon: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Loss {
    Log,
    Squared,
    Huber(f64),
}

impl Loss {
    /// `(loss, dloss/dp)` at prediction `p` for target `y`.
    fn eval(self, p: f64, y: f64) -> (f64, f64) {
        match self {
            Loss::Log => {
                let ys = 2.0 * y - 1.0;
                let z = ys * p;
                let loss = if z > 18.0 { (-z).exp() } else { (1.0 + (-z).exp()).ln() };
                let dloss = if z > 18.0 {
                    -ys * (-z).exp()
                } else if z < -18.0 {
                    -ys
                } else {
                    -ys / (1.0 + z.exp())
                };
                (loss, dloss)
            }
            Loss::Squared => {
                let r = p - y;
                (0.5 * r * r, r)
            }
            Loss::Huber(eps) => {
                let r = p - y;
                if r.abs() <= eps {
                    (0.5 * r * r, r)
                } else {
                    (eps * (r.abs() - 0.5 * eps), eps * r.signum())
                }
            }
        }
    }
}

impl From<RegressionLoss> for Loss {
    fn from(loss: RegressionLoss) -> Self {
        match loss {
            RegressionLoss::Squared => Loss::Squared,
            RegressionLoss::Huber { epsilon } => Loss::Huber(epsilon),
        }
    }
}

/// SGD hyperparameters shared by both estimators.
///
/// Defaults: `penalty = l2`, `alpha = 1e-4`, `l1_ratio = 0.15`,
/// `eta0 = 0.01`, `power_t = 0.25`, `max_epochs = 200`, `tol = 1e-3`,
/// `n_iter_no_change = 5`, `seed = 0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SgdParams {
    pub penalty: Penalty,
    pub alpha: f64,
    pub l1_ratio: f64,
    pub eta0: f64,
    pub power_t: f64,
    pub max_epochs: usize,
    pub tol: f64,
    pub n_iter_no_change: usize,
    pub seed: u64,
}

impl SgdParams {
    /// Default schedule with the given penalty settings.
    ///
    /// # Errors
    /// [`EstimatorError::InvalidHyperparameter`] for a negative or non-finite
    /// `alpha`, or `l1_ratio` outside `[0, 1]`.
    pub fn new(penalty: Penalty, alpha: f64, l1_ratio: f64) -> EstimatorResult<Self> {
        let out = Self { penalty, alpha, l1_ratio, ..Self::default() };
        out.validate()?;
        Ok(out)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_max_epochs(mut self, max_epochs: usize) -> Self {
        self.max_epochs = max_epochs;
        self
    }

    /// Check every field.
    ///
    /// # Errors
    /// [`EstimatorError::InvalidHyperparameter`] naming the first bad field.
    pub fn validate(&self) -> EstimatorResult<()> {
        let bad = |name, value, reason| {
            Err(EstimatorError::InvalidHyperparameter { name, value, reason })
        };
        if !self.alpha.is_finite() || self.alpha < 0.0 {
            return bad("alpha", self.alpha, "must be finite and non-negative");
        }
        if !(0.0..=1.0).contains(&self.l1_ratio) {
            return bad("l1_ratio", self.l1_ratio, "must lie in [0, 1]");
        }
        if !self.eta0.is_finite() || self.eta0 <= 0.0 {
            return bad("eta0", self.eta0, "must be finite and positive");
        }
        if !self.power_t.is_finite() || self.power_t < 0.0 {
            return bad("power_t", self.power_t, "must be finite and non-negative");
        }
        if self.max_epochs == 0 {
            return bad("max_epochs", 0.0, "must be at least 1");
        }
        if !self.tol.is_finite() || self.tol < 0.0 {
            return bad("tol", self.tol, "must be finite and non-negative");
        }
        Ok(())
    }
}

impl Default for SgdParams {
    fn default() -> Self {
        Self {
            penalty: Penalty::L2,
            alpha: 1e-4,
            l1_ratio: 0.15,
            eta0: 0.01,
            power_t: 0.25,
            max_epochs: 200,
            tol: 1e-3,
            n_iter_no_change: 5,
            seed: 0,
        }
    }
}

/// Weights, intercept and update counter of a linear model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct LinearCore {
    coef: Vec<f64>,
    intercept: f64,
    t: f64,
}

impl LinearCore {
    fn new(n_features: usize, intercept: f64) -> Self {
        Self { coef: vec![0.0; n_features], intercept, t: 1.0 }
    }

    fn decision(&self, x: ArrayView1<'_, f64>) -> f64 {
        self.coef.iter().zip(x.iter()).map(|(w, v)| w * v).sum::<f64>() + self.intercept
    }

    /// One pass over the rows in seeded random order; returns the summed loss.
    fn epoch(
        &mut self, x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>, loss: Loss, params: &SgdParams,
        rng: &mut StdRng,
    ) -> f64 {
        let (l2, l1) = params.penalty.strengths(params.alpha, params.l1_ratio);
        let mut order: Vec<usize> = (0..x.nrows()).collect();
        order.shuffle(rng);
        let mut total = 0.0;
        for i in order {
            let row = x.row(i);
            let p = self.decision(row);
            let (l, d) = loss.eval(p, y[i]);
            total += l;
            let d = d.clamp(-MAX_DLOSS, MAX_DLOSS);
            let eta = params.eta0 / self.t.powf(params.power_t);
            if l2 > 0.0 {
                let shrink = (1.0 - eta * l2).max(0.0);
                self.coef.iter_mut().for_each(|w| *w *= shrink);
            }
            for (w, &v) in self.coef.iter_mut().zip(row.iter()) {
                *w -= eta * d * v;
            }
            self.intercept -= eta * d;
            if l1 > 0.0 {
                let cut = eta * l1;
                self.coef.iter_mut().for_each(|w| *w = w.signum() * (w.abs() - cut).max(0.0));
            }
            self.t += 1.0;
        }
        total
    }

    /// Epochs until the loss stops improving or `max_epochs` is reached.
    fn fit(&mut self, x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>, loss: Loss, params: &SgdParams) {
        let mut rng = StdRng::seed_from_u64(params.seed);
        let threshold = params.tol * x.nrows() as f64;
        let mut best = f64::INFINITY;
        let mut stale = 0;
        for _ in 0..params.max_epochs {
            let epoch_loss = self.epoch(x, y, loss, params, &mut rng);
            if epoch_loss > best - threshold {
                stale += 1;
            } else {
                stale = 0;
            }
            best = best.min(epoch_loss);
            if stale >= params.n_iter_no_change {
                break;
            }
        }
    }

    fn partial_fit(
        &mut self, x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>, loss: Loss, params: &SgdParams,
    ) {
        let mut rng = StdRng::seed_from_u64(params.seed.wrapping_add(self.t as u64));
        self.epoch(x, y, loss, params, &mut rng);
    }

    fn validate(&self) -> EstimatorResult<()> {
        if self.coef.iter().any(|w| !w.is_finite()) || !self.intercept.is_finite() {
            return Err(EstimatorError::InvalidState { reason: "weights must be finite" });
        }
        if !self.t.is_finite() || self.t < 1.0 {
            return Err(EstimatorError::InvalidState { reason: "update counter must be at least 1" });
        }
        Ok(())
    }
}

fn check_loss(loss: RegressionLoss) -> EstimatorResult<()> {
    if let RegressionLoss::Huber { epsilon } = loss {
        if !epsilon.is_finite() || epsilon < 0.0 {
            return Err(EstimatorError::InvalidHyperparameter {
                name: "epsilon",
                value: epsilon,
                reason: "must be finite and non-negative",
            });
        }
    }
    Ok(())
}

fn check_targets(x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>) -> EstimatorResult<()> {
    if x.nrows() != y.len() {
        return Err(EstimatorError::TargetLengthMismatch { samples: x.nrows(), targets: y.len() });
    }
    if let Some(row) = y.iter().position(|v| !v.is_finite()) {
        return Err(EstimatorError::NonFiniteInput { row, column: None });
    }
    Ok(())
}

fn check_labels(y: ArrayView1<'_, f64>) -> EstimatorResult<()> {
    match y.iter().position(|&v| v != 0.0 && v != 1.0) {
        Some(row) => Err(EstimatorError::InvalidLabel { row, value: y[row] }),
        None => Ok(()),
    }
}

/// Binary logistic-regression classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SgdClassifier {
    params: SgdParams,
    core: LinearCore,
}

impl SgdClassifier {
    /// Fit from scratch.
    ///
    /// # Errors
    /// Input validation errors, [`EstimatorError::InvalidLabel`] and
    /// [`EstimatorError::SingleClass`] when only one label occurs.
    pub fn fit(
        x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>, params: SgdParams,
    ) -> EstimatorResult<Self> {
        params.validate()?;
        check_matrix(x, None)?;
        check_targets(x, y)?;
        check_labels(y)?;
        let positives = y.iter().filter(|&&v| v == 1.0).count();
        if positives == 0 || positives == y.len() {
            return Err(EstimatorError::SingleClass);
        }
        let mut core = LinearCore::new(x.ncols(), 0.0);
        core.fit(x, y, Loss::Log, &params);
        Ok(Self { params, core })
    }

    /// One warm-start epoch over `x`. A single label is accepted.
    ///
    /// # Errors
    /// Input validation errors and [`EstimatorError::InvalidLabel`].
    pub fn partial_fit(&mut self, x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>) -> EstimatorResult<()> {
        check_matrix(x, Some(self.n_features()))?;
        check_targets(x, y)?;
        check_labels(y)?;
        self.core.partial_fit(x, y, Loss::Log, &self.params);
        Ok(())
    }

    /// Check hyperparameters and weights, e.g. after deserialisation.
    ///
    /// # Errors
    /// [`EstimatorError::InvalidHyperparameter`] or [`EstimatorError::InvalidState`].
    pub fn validate(&self) -> EstimatorResult<()> {
        self.params.validate()?;
        self.core.validate()
    }

    pub fn params(&self) -> &SgdParams {
        &self.params
    }

    pub fn n_features(&self) -> usize {
        self.core.coef.len()
    }

    pub fn coef(&self) -> &[f64] {
        &self.core.coef
    }

    /// Probability of the positive class for one standardised sample.
    ///
    /// # Errors
    /// [`EstimatorError::DimensionMismatch`] for a wrong feature count.
    pub fn predict_proba(&self, x: ArrayView1<'_, f64>) -> EstimatorResult<f64> {
        if x.len() != self.n_features() {
            return Err(EstimatorError::DimensionMismatch {
                expected: self.n_features(),
                found: x.len(),
            });
        }
        let z = self.core.decision(x);
        Ok(1.0 / (1.0 + (-z).exp()))
    }

    /// `predict_proba(x) >= 0.5`.
    ///
    /// # Errors
    /// As [`SgdClassifier::predict_proba`].
    pub fn predict(&self, x: ArrayView1<'_, f64>) -> EstimatorResult<bool> {
        Ok(self.predict_proba(x)? >= 0.5)
    }
}

/// Linear regressor with squared or Huber loss.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SgdRegressor {
    loss: RegressionLoss,
    params: SgdParams,
    core: LinearCore,
}

impl SgdRegressor {
    /// Fit from scratch; the intercept starts at the target mean.
    ///
    /// # Errors
    /// Input validation errors, or [`EstimatorError::InvalidHyperparameter`]
    /// for a negative Huber `epsilon`.
    pub fn fit(
        x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>, loss: RegressionLoss, params: SgdParams,
    ) -> EstimatorResult<Self> {
        params.validate()?;
        check_loss(loss)?;
        check_matrix(x, None)?;
        check_targets(x, y)?;
        let mut core = LinearCore::new(x.ncols(), y.mean().unwrap_or(0.0));
        core.fit(x, y, loss.into(), &params);
        Ok(Self { loss, params, core })
    }

    /// One warm-start epoch over `x`.
    ///
    /// # Errors
    /// Input validation errors.
    pub fn partial_fit(&mut self, x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>) -> EstimatorResult<()> {
        check_matrix(x, Some(self.n_features()))?;
        check_targets(x, y)?;
        self.core.partial_fit(x, y, self.loss.into(), &self.params);
        Ok(())
    }

    /// As [`SgdClassifier::validate`], plus the Huber `epsilon`.
    ///
    /// # Errors
    /// [`EstimatorError::InvalidHyperparameter`] or [`EstimatorError::InvalidState`].
    pub fn validate(&self) -> EstimatorResult<()> {
        self.params.validate()?;
        check_loss(self.loss)?;
        self.core.validate()
    }

    pub fn loss(&self) -> RegressionLoss {
        self.loss
    }

    pub fn params(&self) -> &SgdParams {
        &self.params
    }

    pub fn n_features(&self) -> usize {
        self.core.coef.len()
    }

    /// Prediction for one standardised sample.
    ///
    /// # Errors
    /// [`EstimatorError::DimensionMismatch`] for a wrong feature count.
    pub fn predict(&self, x: ArrayView1<'_, f64>) -> EstimatorResult<f64> {
        if x.len() != self.n_features() {
            return Err(EstimatorError::DimensionMismatch {
                expected: self.n_features(),
                found: x.len(),
            });
        }
        Ok(self.core.decision(x))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, Array2};
    use rand::Rng;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Separable classification and noiseless linear regression.
    // - Sparsity under a strong L1 penalty.
    // - Determinism for a fixed seed and warm-start updates.
    // - Hyperparameter and label validation.
    // -------------------------------------------------------------------------

    fn blobs(n: usize, seed: u64) -> (Array2<f64>, Array1<f64>) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut x = Array2::zeros((n, 2));
        let mut y = Array1::zeros(n);
        for i in 0..n {
            let label = (i % 2) as f64;
            let center = if label == 1.0 { 1.5 } else { -1.5 };
            x[[i, 0]] = center + rng.gen_range(-0.5..0.5);
            x[[i, 1]] = rng.gen_range(-1.0..1.0);
            y[i] = label;
        }
        (x, y)
    }

    fn line(n: usize) -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_fn((n, 2), |(i, j)| {
            let t = i as f64 / n as f64 * 4.0 - 2.0;
            if j == 0 { t } else { (3.0 * t).sin() }
        });
        let y = x.column(0).mapv(|v| 2.0 * v + 1.0);
        (x, y)
    }

    #[test]
    // Purpose
    // -------
    // Logistic SGD separates two well-separated blobs.
    //
    // Given
    // -----
    // - 100 samples, classes centered at x₀ = ±1.5.
    //
    // Expect
    // ------
    // - Training accuracy of 100% and a positive weight on x₀.
    fn classifier_separates_blobs() {
        // Arrange
        let (x, y) = blobs(100, 7);

        // Act
        let clf = SgdClassifier::fit(x.view(), y.view(), SgdParams::default()).unwrap();

        // Assert
        let correct = (0..x.nrows())
            .filter(|&i| clf.predict(x.row(i)).unwrap() == (y[i] == 1.0))
            .count();
        assert_eq!(correct, 100);
        assert!(clf.coef()[0] > 0.0);
        let p = clf.predict_proba(x.row(1)).unwrap();
        assert!(p > 0.5 && p < 1.0);
    }

    #[test]
    fn regressor_fits_line() {
        let (x, y) = line(80);
        let params = SgdParams {
            tol: 1e-9,
            ..SgdParams::new(Penalty::None, 0.0, 0.0).unwrap().with_max_epochs(500)
        };
        let reg = SgdRegressor::fit(x.view(), y.view(), RegressionLoss::Squared, params).unwrap();
        let mae = (0..x.nrows()).map(|i| (reg.predict(x.row(i)).unwrap() - y[i]).abs()).sum::<f64>()
            / x.nrows() as f64;
        assert!(mae < 0.1, "mae = {mae}");
    }

    #[test]
    // Purpose
    // -------
    // A strong L1 penalty keeps the weight of an irrelevant feature near zero
    // while the informative weight survives.
    fn l1_penalty_sparsifies() {
        let (x, y) = blobs(100, 3);
        let params = SgdParams::new(Penalty::L1, 0.1, 1.0).unwrap();
        let clf = SgdClassifier::fit(x.view(), y.view(), params).unwrap();
        assert!(clf.coef()[1].abs() < 0.05, "coef = {:?}", clf.coef());
        assert!(clf.coef()[0] > 0.2);
    }

    #[test]
    fn fitting_is_deterministic_for_a_seed() {
        let (x, y) = blobs(60, 11);
        let params = SgdParams::default().with_seed(42);
        let a = SgdClassifier::fit(x.view(), y.view(), params).unwrap();
        let b = SgdClassifier::fit(x.view(), y.view(), params).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    // Purpose
    // -------
    // `partial_fit` runs one epoch on top of the fitted weights, accepts a
    // single label, and keeps the feature dimension.
    fn partial_fit_updates_weights() {
        // Arrange
        let (x, y) = blobs(40, 5);
        let mut clf = SgdClassifier::fit(x.view(), y.view(), SgdParams::default()).unwrap();
        let before = clf.clone();
        let ones = Array1::from_elem(4, 1.0);

        // Act
        clf.partial_fit(x.slice(ndarray::s![..4, ..]), ones.view()).unwrap();

        // Assert
        assert_ne!(clf, before);
        assert_eq!(clf.n_features(), 2);
        assert!(clf.partial_fit(Array2::zeros((1, 3)).view(), ones.slice(ndarray::s![..1])).is_err());
    }

    #[test]
    fn validation_errors() {
        let (x, mut y) = blobs(10, 1);
        assert!(matches!(
            SgdParams::new(Penalty::ElasticNet, 1e-3, 1.5),
            Err(EstimatorError::InvalidHyperparameter { name: "l1_ratio", .. })
        ));
        y.fill(1.0);
        assert_eq!(
            SgdClassifier::fit(x.view(), y.view(), SgdParams::default()).unwrap_err(),
            EstimatorError::SingleClass
        );
        y[0] = 2.0;
        assert!(matches!(
            SgdClassifier::fit(x.view(), y.view(), SgdParams::default()),
            Err(EstimatorError::InvalidLabel { row: 0, .. })
        ));
        assert!(matches!(
            SgdRegressor::fit(
                x.view(),
                y.view(),
                RegressionLoss::Huber { epsilon: -1.0 },
                SgdParams::default()
            ),
            Err(EstimatorError::InvalidHyperparameter { name: "epsilon", .. })
        ));
    }
}
