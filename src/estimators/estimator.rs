//! Closed set of estimators a model artifact can carry.
use ndarray::{ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::estimators::{
    errors::EstimatorResult,
    sgd::{SgdClassifier, SgdRegressor},
};

/// A fitted classifier or regressor.
///
/// Serialized with an explicit `kind` tag so a stored artifact states which
/// family it holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Estimator {
    Classifier(SgdClassifier),
    Regressor(SgdRegressor),
}

impl Estimator {
    pub fn n_features(&self) -> usize {
        match self {
            Estimator::Classifier(c) => c.n_features(),
            Estimator::Regressor(r) => r.n_features(),
        }
    }

    pub fn is_classifier(&self) -> bool {
        matches!(self, Estimator::Classifier(_))
    }

    /// Validate the wrapped estimator's hyperparameters and weights.
    ///
    /// # Errors
    /// See [`SgdClassifier::validate`] and [`SgdRegressor::validate`].
    pub fn validate(&self) -> EstimatorResult<()> {
        match self {
            Estimator::Classifier(c) => c.validate(),
            Estimator::Regressor(r) => r.validate(),
        }
    }

    /// Warm-start update on standardised rows.
    ///
    /// # Errors
    /// Propagates the wrapped estimator's validation errors.
    pub fn partial_fit(&mut self, x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>) -> EstimatorResult<()> {
        match self {
            Estimator::Classifier(c) => c.partial_fit(x, y),
            Estimator::Regressor(r) => r.partial_fit(x, y),
        }
    }

    /// Probability of the positive class for classifiers, the predicted value
    /// for regressors.
    ///
    /// # Errors
    /// [`EstimatorError::DimensionMismatch`](crate::estimators::EstimatorError::DimensionMismatch)
    /// for a wrong feature count.
    pub fn predict(&self, x: ArrayView1<'_, f64>) -> EstimatorResult<f64> {
        match self {
            Estimator::Classifier(c) => c.predict_proba(x),
            Estimator::Regressor(r) => r.predict(x),
        }
    }
}

impl From<SgdClassifier> for Estimator {
    fn from(c: SgdClassifier) -> Self {
        Estimator::Classifier(c)
    }
}

impl From<SgdRegressor> for Estimator {
    fn from(r: SgdRegressor) -> Self {
        Estimator::Regressor(r)
    }
}
