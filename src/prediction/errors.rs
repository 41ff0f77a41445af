//! Errors raised while evaluating stored models on a spectrum.
use crate::{
    estimators::EstimatorError, populations::ModelTarget, profiling::FeatureKey,
    profiling::ProfileError,
};

/// Result alias for inference.
pub type PredictResult<T> = Result<T, PredictError>;

#[derive(Debug, Clone, PartialEq)]
pub enum PredictError {
    /// The store holds no artifact for a target that is needed.
    ModelNotLoaded { target: ModelTarget },

    /// The artifact's input width differs from the features supplied.
    FeatureDimMismatch { target: ModelTarget, expected: usize, found: usize },

    /// The feature vector lacks a key the artifact was trained on.
    MissingFeature { target: ModelTarget, key: FeatureKey },

    /// A detailed profile could not be computed.
    Profile(ProfileError),

    /// Any other estimator failure.
    Estimator { target: ModelTarget, error: EstimatorError },
}

impl std::error::Error for PredictError {}

impl std::fmt::Display for PredictError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PredictError::ModelNotLoaded { target } => {
                write!(f, "No model loaded for target '{target}'")
            }
            PredictError::FeatureDimMismatch { target, expected, found } => write!(
                f,
                "Model '{target}' expects {expected} features, {found} were supplied"
            ),
            PredictError::MissingFeature { target, key } => {
                write!(f, "Model '{target}' needs feature '{key}'")
            }
            PredictError::Profile(e) => write!(f, "{e}"),
            PredictError::Estimator { target, error } => write!(f, "Model '{target}': {error}"),
        }
    }
}

impl From<ProfileError> for PredictError {
    fn from(err: ProfileError) -> Self {
        PredictError::Profile(err)
    }
}

impl PredictError {
    /// Attach `target` to an estimator validation error.
    pub(crate) fn from_estimator(target: ModelTarget, err: EstimatorError) -> Self {
        match err {
            EstimatorError::DimensionMismatch { expected, found } => {
                PredictError::FeatureDimMismatch { target, expected, found }
            }
            error => PredictError::Estimator { target, error },
        }
    }
}

#[cfg(feature = "python-bindings")]
impl std::convert::From<PredictError> for pyo3::PyErr {
    fn from(err: PredictError) -> pyo3::PyErr {
        pyo3::exceptions::PyValueError::new_err(err.to_string())
    }
}
