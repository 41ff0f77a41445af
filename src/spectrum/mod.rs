//! spectrum — validated scattering curves.
//!
//! A [`Spectrum`] is the entry point of every inference path: it is built once
//! from raw `(q, I)` arrays, validated, and then only read. Rescaled copies are
//! produced by [`Spectrum::scale_intensity`].

pub mod data;
pub mod errors;

pub use self::data::Spectrum;
pub use self::errors::{SpectrumError, SpectrumResult};
