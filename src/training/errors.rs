//! Errors of model training and of training-record sources.
use crate::{estimators::EstimatorError, populations::ModelTarget};

/// Result alias for training.
pub type TrainResult<T> = Result<T, TrainError>;

/// Result alias for record sources.
pub type DataResult<T> = Result<T, DataError>;

#[derive(Debug, Clone, PartialEq)]
pub enum TrainError {
    /// No record is eligible for the target.
    NoTrainableRows { target: ModelTarget },

    /// Classifier rows carry only one label.
    SingleClass { target: ModelTarget },

    /// Too few labelled rows for a regressor.
    TooFewLabels { target: ModelTarget, found: usize, required: usize },

    /// Regressor targets have zero spread; the normalised error is undefined.
    DegenerateTarget { target: ModelTarget },

    /// `update` was asked to refine a target the store does not hold.
    NoPriorModel { target: ModelTarget },

    /// Invalid training options or search grid.
    InvalidHyperparameters { reason: String },

    /// Estimator failure while fitting `target`.
    Estimator { target: ModelTarget, error: EstimatorError },
}

impl std::error::Error for TrainError {}

impl std::fmt::Display for TrainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrainError::NoTrainableRows { target } => {
                write!(f, "No trainable rows for '{target}'")
            }
            TrainError::SingleClass { target } => {
                write!(f, "Rows for '{target}' carry a single label")
            }
            TrainError::TooFewLabels { target, found, required } => write!(
                f,
                "'{target}' has {found} labelled rows, at least {required} are required"
            ),
            TrainError::DegenerateTarget { target } => {
                write!(f, "Targets of '{target}' have zero spread")
            }
            TrainError::NoPriorModel { target } => {
                write!(f, "No prior model for '{target}' to update")
            }
            TrainError::InvalidHyperparameters { reason } => {
                write!(f, "Invalid hyperparameters: {reason}")
            }
            TrainError::Estimator { target, error } => write!(f, "Training '{target}': {error}"),
        }
    }
}

#[cfg(feature = "python-bindings")]
impl std::convert::From<TrainError> for pyo3::PyErr {
    fn from(err: TrainError) -> pyo3::PyErr {
        pyo3::exceptions::PyValueError::new_err(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DataError {
    /// A dataset file could not be opened or read.
    Io { path: String, reason: String },

    /// The CSV reader failed.
    Csv { reason: String },

    /// A required column is absent from a header.
    MissingColumn { column: String },

    /// A cell does not parse for its column.
    InvalidCell { row: usize, column: String, value: String },

    /// The source has no dataset with this id.
    UnknownDataset { id: String },
}

impl std::error::Error for DataError {}

impl std::fmt::Display for DataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataError::Io { path, reason } => write!(f, "I/O error on '{path}': {reason}"),
            DataError::Csv { reason } => write!(f, "CSV error: {reason}"),
            DataError::MissingColumn { column } => write!(f, "Missing column '{column}'"),
            DataError::InvalidCell { row, column, value } => {
                write!(f, "Invalid value '{value}' in column '{column}' at row {row}")
            }
            DataError::UnknownDataset { id } => write!(f, "Unknown dataset '{id}'"),
        }
    }
}

impl From<csv::Error> for DataError {
    fn from(err: csv::Error) -> Self {
        DataError::Csv { reason: err.to_string() }
    }
}

#[cfg(feature = "python-bindings")]
impl std::convert::From<DataError> for pyo3::PyErr {
    fn from(err: DataError) -> pyo3::PyErr {
        match err {
            DataError::Io { .. } => pyo3::exceptions::PyOSError::new_err(err.to_string()),
            _ => pyo3::exceptions::PyValueError::new_err(err.to_string()),
        }
    }
}
