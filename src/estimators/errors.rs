//! Error types for the linear estimators and the feature scaler.

/// Result alias for estimator operations.
pub type EstimatorResult<T> = Result<T, EstimatorError>;

#[derive(Debug, Clone, PartialEq)]
pub enum EstimatorError {
    /// No samples were supplied.
    EmptyInput,

    /// Feature count differs from the fitted dimension.
    DimensionMismatch { expected: usize, found: usize },

    /// Sample count of features and targets differ.
    TargetLengthMismatch { samples: usize, targets: usize },

    /// A feature or target value is NaN or infinite.
    NonFiniteInput { row: usize, column: Option<usize> },

    /// Classifier labels must be `0.0` or `1.0`.
    InvalidLabel { row: usize, value: f64 },

    /// A classifier needs both labels to fit from scratch.
    SingleClass,

    /// A hyperparameter is outside its valid range.
    InvalidHyperparameter { name: &'static str, value: f64, reason: &'static str },

    /// Fitted state (moments or weights) is inconsistent or non-finite.
    InvalidState { reason: &'static str },
}

impl std::error::Error for EstimatorError {}

impl std::fmt::Display for EstimatorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EstimatorError::EmptyInput => write!(f, "At least one sample is required"),
            EstimatorError::DimensionMismatch { expected, found } => {
                write!(f, "Expected {expected} features, found {found}")
            }
            EstimatorError::TargetLengthMismatch { samples, targets } => {
                write!(f, "{samples} samples but {targets} targets")
            }
            EstimatorError::NonFiniteInput { row, column: Some(col) } => {
                write!(f, "Non-finite feature at row {row}, column {col}")
            }
            EstimatorError::NonFiniteInput { row, column: None } => {
                write!(f, "Non-finite target at row {row}")
            }
            EstimatorError::InvalidLabel { row, value } => {
                write!(f, "Label at row {row} must be 0 or 1, got {value}")
            }
            EstimatorError::SingleClass => {
                write!(f, "Classifier training data must contain both labels")
            }
            EstimatorError::InvalidHyperparameter { name, value, reason } => {
                write!(f, "Invalid hyperparameter {name} = {value}: {reason}")
            }
            EstimatorError::InvalidState { reason } => write!(f, "Invalid fitted state: {reason}"),
        }
    }
}
