//! prediction — inference with stored classifiers and regressors.
//!
//! Purpose
//! -------
//! Turn a profiled spectrum into population flags ([`SaxsClassifier`]) and
//! shape-parameter estimates ([`SaxsRegressor`]). Both read a shared,
//! immutable `Arc<ModelStore>`; neither mutates it.
//!
//! Key behaviors
//! -------------
//! - Each artifact selects its own ordered input features from the
//!   [`FeatureVector`](crate::profiling::FeatureVector), scales them with its
//!   stored scaler and evaluates its estimator.
//! - `unidentified` short-circuits classification.
//! - Regressor outputs are clamped to the physical parameter limits.
pub mod classifier;
pub mod errors;
pub mod evaluate;
pub mod regressor;

#[cfg(test)]
pub(crate) mod fixtures;

pub use self::classifier::{DECISION_THRESHOLD, SaxsClassifier};
pub use self::errors::{PredictError, PredictResult};
pub use self::evaluate::evaluate_target;
pub use self::regressor::SaxsRegressor;
