//! Evaluation of a single stored artifact on a feature vector.
use crate::{
    prediction::errors::{PredictError, PredictResult},
    populations::ModelTarget,
    profiling::FeatureVector,
    store::ModelStore,
};

/// Raw output of the artifact for `target`: P(class = 1) for classifiers,
/// the unclamped estimate for regressors.
///
/// # Errors
/// - [`PredictError::ModelNotLoaded`] if `store` has no such artifact.
/// - [`PredictError::MissingFeature`] if `features` lacks a trained key.
/// - [`PredictError::FeatureDimMismatch`] if the artifact is inconsistent.
pub fn evaluate_target(
    store: &ModelStore, target: ModelTarget, features: &FeatureVector,
) -> PredictResult<f64> {
    let artifact = store.get(target).ok_or(PredictError::ModelNotLoaded { target })?;
    let row = features
        .select(&artifact.features)
        .map_err(|key| PredictError::MissingFeature { target, key })?;
    artifact.predict(row.view()).map_err(|e| PredictError::from_estimator(target, e))
}
