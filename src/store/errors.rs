//! Errors and non-fatal diagnostics of model persistence.
use crate::populations::ModelTarget;

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Fatal persistence failures.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    /// The file could not be read or written.
    Io { path: String, reason: String },

    /// The top-level document is not a model store.
    Malformed { reason: String },

    /// The store could not be rendered as YAML.
    Serialize { reason: String },
}

impl std::error::Error for StoreError {}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Io { path, reason } => write!(f, "I/O error on '{path}': {reason}"),
            StoreError::Malformed { reason } => write!(f, "Malformed model store: {reason}"),
            StoreError::Serialize { reason } => {
                write!(f, "Failed to serialize model store: {reason}")
            }
        }
    }
}

#[cfg(feature = "python-bindings")]
impl std::convert::From<StoreError> for pyo3::PyErr {
    fn from(err: StoreError) -> pyo3::PyErr {
        match err {
            StoreError::Io { .. } => pyo3::exceptions::PyIOError::new_err(err.to_string()),
            _ => pyo3::exceptions::PyValueError::new_err(err.to_string()),
        }
    }
}

/// Conditions reported by `load` that do not prevent using the store.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreWarning {
    /// A document or artifact was written by another crate version.
    /// `target == None` refers to the document header.
    VersionMismatch { target: Option<ModelTarget>, found: String, expected: String },
}

impl std::fmt::Display for StoreWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreWarning::VersionMismatch { target: Some(t), found, expected } => {
                write!(f, "Artifact '{t}' was written by version {found}, running {expected}")
            }
            StoreWarning::VersionMismatch { target: None, found, expected } => {
                write!(f, "Model store was written by version {found}, running {expected}")
            }
        }
    }
}

/// A target entry that could not be restored. Siblings still load.
#[derive(Debug, Clone, PartialEq)]
pub struct CorruptArtifact {
    /// Key as found in the document; may not name a known target.
    pub target: String,
    pub reason: String,
}

impl std::fmt::Display for CorruptArtifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Corrupt artifact '{}': {}", self.target, self.reason)
    }
}
