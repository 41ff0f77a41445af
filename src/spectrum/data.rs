//! Validated SAXS spectrum container.
//!
//! Purpose
//! -------
//! Provide a single immutable container for a measured scattering curve
//! `(q, I(q))` so that profiling, classification and fitting can rely on basic
//! invariants without re-checking them.
//!
//! Key behaviors
//! -------------
//! - [`Spectrum::new`] rejects empty, mismatched, non-finite, negative or
//!   non-monotone input.
//! - [`Spectrum::scale_intensity`] returns a rescaled copy; the original is
//!   never mutated.
//!
//! Invariants & assumptions
//! ------------------------
//! - `q` is finite and strictly increasing, in inverse Ångström.
//! - `I` is finite and non-negative. Zero intensities are allowed; the
//!   profiler and fitter ignore them where a logarithm is required.
//!
//! Testing notes
//! -------------
//! - Unit tests cover every rejection path of `Spectrum::new`, the pair
//!   constructor and rescaling.
use crate::spectrum::errors::{SpectrumError, SpectrumResult};
use ndarray::{Array1, ArrayView1};

/// `Spectrum` — validated `(q, I)` pairs.
///
/// Fields are private; use the accessors. Construction is the only place the
/// invariants are checked.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    q: Array1<f64>,
    intensity: Array1<f64>,
}

impl Spectrum {
    /// Build a spectrum from owned `q` and intensity arrays.
    ///
    /// # Errors
    /// - [`SpectrumError::EmptySpectrum`] when both arrays are empty.
    /// - [`SpectrumError::LengthMismatch`] when the lengths differ.
    /// - [`SpectrumError::NonFiniteQ`] / [`SpectrumError::NonFiniteIntensity`]
    ///   for NaN or infinite entries.
    /// - [`SpectrumError::NegativeIntensity`] for `I < 0`.
    /// - [`SpectrumError::NonIncreasingQ`] when `q` is not strictly increasing.
    pub fn new(q: Array1<f64>, intensity: Array1<f64>) -> SpectrumResult<Self> {
        if q.len() != intensity.len() {
            return Err(SpectrumError::LengthMismatch {
                q_len: q.len(),
                intensity_len: intensity.len(),
            });
        }
        if q.is_empty() {
            return Err(SpectrumError::EmptySpectrum);
        }
        for (index, &value) in q.iter().enumerate() {
            if !value.is_finite() {
                return Err(SpectrumError::NonFiniteQ { index, value });
            }
            if index > 0 && value <= q[index - 1] {
                return Err(SpectrumError::NonIncreasingQ {
                    index,
                    previous: q[index - 1],
                    value,
                });
            }
        }
        for (index, &value) in intensity.iter().enumerate() {
            if !value.is_finite() {
                return Err(SpectrumError::NonFiniteIntensity { index, value });
            }
            if value < 0.0 {
                return Err(SpectrumError::NegativeIntensity { index, value });
            }
        }
        Ok(Self { q, intensity })
    }

    /// Build a spectrum from `(q, I)` pairs.
    pub fn from_pairs(pairs: &[(f64, f64)]) -> SpectrumResult<Self> {
        let q: Array1<f64> = pairs.iter().map(|&(q, _)| q).collect();
        let intensity: Array1<f64> = pairs.iter().map(|&(_, i)| i).collect();
        Self::new(q, intensity)
    }

    /// Return a copy with every intensity multiplied by `factor`.
    ///
    /// # Errors
    /// [`SpectrumError::InvalidScale`] when `factor` is not finite or `<= 0`.
    pub fn scale_intensity(&self, factor: f64) -> SpectrumResult<Self> {
        if !factor.is_finite() || factor <= 0.0 {
            return Err(SpectrumError::InvalidScale { factor });
        }
        Ok(Self { q: self.q.clone(), intensity: &self.intensity * factor })
    }

    pub fn q(&self) -> ArrayView1<'_, f64> {
        self.q.view()
    }

    pub fn intensity(&self) -> ArrayView1<'_, f64> {
        self.intensity.view()
    }

    pub fn len(&self) -> usize {
        self.q.len()
    }

    pub fn is_empty(&self) -> bool {
        self.q.is_empty()
    }

    /// `(q_min, q_max)`; always defined because a spectrum is never empty.
    pub fn q_range(&self) -> (f64, f64) {
        (self.q[0], self.q[self.q.len() - 1])
    }

    /// Points with strictly positive intensity as `(q, ln I)`.
    pub fn positive_log_points(&self) -> (Vec<f64>, Vec<f64>) {
        self.q
            .iter()
            .zip(self.intensity.iter())
            .filter(|&(_, &i)| i > 0.0)
            .map(|(&q, &i)| (q, i.ln()))
            .unzip()
    }

    /// Number of points with strictly positive intensity.
    pub fn n_positive(&self) -> usize {
        self.intensity.iter().filter(|&&i| i > 0.0).count()
    }
}
