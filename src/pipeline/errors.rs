//! Errors of the end-to-end analysis.
use crate::{fitting::FitError, prediction::PredictError, profiling::ProfileError};

/// Result alias for the pipeline.
pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Clone, PartialEq)]
pub enum PipelineError {
    Profile(ProfileError),
    Predict(PredictError),
    Fit(FitError),
}

impl std::error::Error for PipelineError {}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineError::Profile(e) => write!(f, "Profiling failed: {e}"),
            PipelineError::Predict(e) => write!(f, "Prediction failed: {e}"),
            PipelineError::Fit(e) => write!(f, "Intensity fit failed: {e}"),
        }
    }
}

impl From<ProfileError> for PipelineError {
    fn from(err: ProfileError) -> Self {
        PipelineError::Profile(err)
    }
}

impl From<PredictError> for PipelineError {
    fn from(err: PredictError) -> Self {
        PipelineError::Predict(err)
    }
}

impl From<FitError> for PipelineError {
    fn from(err: FitError) -> Self {
        PipelineError::Fit(err)
    }
}

#[cfg(feature = "python-bindings")]
impl std::convert::From<PipelineError> for pyo3::PyErr {
    fn from(err: PipelineError) -> pyo3::PyErr {
        match err {
            PipelineError::Profile(e) => e.into(),
            PipelineError::Predict(e) => e.into(),
            PipelineError::Fit(e) => e.into(),
        }
    }
}
