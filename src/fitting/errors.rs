//! Error types for intensity fitting.
use crate::{
    fitting::report::FitReport,
    optimization::errors::OptError,
    populations::{ParameterEstimate, ParameterKind},
};

/// Result alias for fitting operations.
pub type FitResult<T> = Result<T, FitError>;

#[derive(Debug, Clone, PartialEq)]
pub enum FitError {
    /// The flags select no population with an intensity model. Raised for
    /// unidentified spectra and for an all-false flag set.
    InvalidModel { reason: &'static str },

    /// The optimizer stopped without meeting a tolerance: the iteration cap
    /// was hit or the solver terminated abnormally. `best` holds the
    /// best-effort parameters.
    FitDivergence { best: ParameterEstimate, report: Box<FitReport> },

    /// A custom bound has a non-finite lower limit or an upper limit not
    /// strictly above the lower one.
    InvalidBounds { param: ParameterKind, lower: f64, upper: f64 },

    /// Fewer positive-intensity points than the fit needs.
    InsufficientData { found: usize, required: usize },

    /// Supplied intensity errors do not match the spectrum length.
    UncertaintyLengthMismatch { expected: usize, found: usize },

    /// An intensity error at a fitted point is not finite and positive.
    InvalidUncertainty { index: usize, value: f64 },

    /// Optimizer configuration or reparameterisation failure.
    Optimizer(OptError),
}

impl std::error::Error for FitError {}

impl std::fmt::Display for FitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FitError::InvalidModel { reason } => write!(f, "Invalid fit model: {reason}"),
            FitError::FitDivergence { report, .. } => write!(
                f,
                "Fit did not converge after {} iterations ({}); final objective {}",
                report.iterations, report.status, report.final_objective
            ),
            FitError::InvalidBounds { param, lower, upper } => {
                write!(f, "Invalid bounds for {param}: [{lower}, {upper}]")
            }
            FitError::InsufficientData { found, required } => write!(
                f,
                "Insufficient data: {found} positive-intensity points, at least {required} required"
            ),
            FitError::UncertaintyLengthMismatch { expected, found } => {
                write!(f, "Expected {expected} intensity errors, found {found}")
            }
            FitError::InvalidUncertainty { index, value } => {
                write!(f, "Intensity error at index {index} must be finite and > 0, got {value}")
            }
            FitError::Optimizer(e) => write!(f, "Optimizer error: {e}"),
        }
    }
}

impl From<OptError> for FitError {
    fn from(err: OptError) -> Self {
        FitError::Optimizer(err)
    }
}

#[cfg(feature = "python-bindings")]
impl std::convert::From<FitError> for pyo3::PyErr {
    fn from(err: FitError) -> pyo3::PyErr {
        pyo3::exceptions::PyValueError::new_err(err.to_string())
    }
}
