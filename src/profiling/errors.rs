/// Result alias for profiling.
pub type ProfileResult<T> = Result<T, ProfileError>;

#[derive(Debug, Clone, PartialEq)]
pub enum ProfileError {
    /// Fewer points than the profiler needs.
    InsufficientData { found: usize, required: usize },

    /// Intensity is identically zero; no scale-invariant descriptor exists.
    DegenerateSpectrum,
}

impl std::error::Error for ProfileError {}

impl std::fmt::Display for ProfileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProfileError::InsufficientData { found, required } => write!(
                f,
                "Insufficient data for profiling: found {found} points, need at least {required}"
            ),
            ProfileError::DegenerateSpectrum => {
                write!(f, "Degenerate spectrum: intensity is identically zero")
            }
        }
    }
}

#[cfg(feature = "python-bindings")]
impl std::convert::From<ProfileError> for pyo3::PyErr {
    fn from(err: ProfileError) -> pyo3::PyErr {
        pyo3::exceptions::PyValueError::new_err(err.to_string())
    }
}
