//! Error types for spectrum construction.
//!
//! [`SpectrumError`] covers every rejection performed by
//! [`Spectrum::new`](crate::spectrum::Spectrum::new) and
//! [`Spectrum::scale_intensity`](crate::spectrum::Spectrum::scale_intensity).
//! Indices are 0-based and refer to the position of the offending point.

/// Result alias for spectrum operations.
pub type SpectrumResult<T> = Result<T, SpectrumError>;

#[derive(Debug, Clone, PartialEq)]
pub enum SpectrumError {
    /// No points were supplied.
    EmptySpectrum,

    /// `q` and intensity arrays have different lengths.
    LengthMismatch { q_len: usize, intensity_len: usize },

    /// A scattering vector magnitude is NaN or infinite.
    NonFiniteQ { index: usize, value: f64 },

    /// An intensity value is NaN or infinite.
    NonFiniteIntensity { index: usize, value: f64 },

    /// An intensity value is below zero.
    NegativeIntensity { index: usize, value: f64 },

    /// `q[index]` does not exceed `q[index - 1]`.
    NonIncreasingQ { index: usize, previous: f64, value: f64 },

    /// Rescaling factor must be finite and strictly positive.
    InvalidScale { factor: f64 },
}

impl std::error::Error for SpectrumError {}

impl std::fmt::Display for SpectrumError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpectrumError::EmptySpectrum => write!(f, "Spectrum must contain at least one point"),
            SpectrumError::LengthMismatch { q_len, intensity_len } => write!(
                f,
                "Length mismatch: q has {q_len} points but intensity has {intensity_len}"
            ),
            SpectrumError::NonFiniteQ { index, value } => {
                write!(f, "Non-finite q at index {index}: {value}")
            }
            SpectrumError::NonFiniteIntensity { index, value } => {
                write!(f, "Non-finite intensity at index {index}: {value}")
            }
            SpectrumError::NegativeIntensity { index, value } => {
                write!(f, "Negative intensity at index {index}: {value}")
            }
            SpectrumError::NonIncreasingQ { index, previous, value } => write!(
                f,
                "q must be strictly increasing: q[{index}] = {value} follows {previous}"
            ),
            SpectrumError::InvalidScale { factor } => {
                write!(f, "Invalid intensity scale factor {factor}: must be finite and > 0")
            }
        }
    }
}

#[cfg(feature = "python-bindings")]
impl std::convert::From<SpectrumError> for pyo3::PyErr {
    fn from(err: SpectrumError) -> pyo3::PyErr {
        pyo3::exceptions::PyValueError::new_err(err.to_string())
    }
}
