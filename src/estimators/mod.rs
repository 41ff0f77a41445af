//! estimators — feature scaling and SGD-trained linear models.
//!
//! Purpose
//! -------
//! Hold the small learning machinery the population classifiers and
//! parameter regressors are built from: a [`StandardScaler`], a logistic
//! [`SgdClassifier`] and a squared/Huber [`SgdRegressor`]. All three support a
//! full `fit` and a warm-start `partial_fit` and serialize with serde.
//!
//! Conventions
//! -----------
//! - Rows are samples, columns are features, as `ArrayView2<f64>`.
//! - Estimators expect inputs already standardised by the scaler that was
//!   fitted alongside them; the pair travels together in a model artifact.
//! - Validation failures are [`EstimatorError`] values, never panics.
pub mod errors;
pub mod estimator;
pub mod scaler;
pub mod sgd;

pub use self::errors::{EstimatorError, EstimatorResult};
pub use self::estimator::Estimator;
pub use self::scaler::StandardScaler;
pub use self::sgd::{Penalty, RegressionLoss, SgdClassifier, SgdParams, SgdRegressor};
