//! populations — tagged registry of scatterer populations and parameters.
//!
//! - [`PopulationKind`], [`ParameterKind`], [`ModelTarget`]: closed variant
//!   sets with their capability tables.
//! - [`PopulationFlags`], [`PopulationConfidence`], [`ParameterEstimate`]:
//!   per-spectrum values keyed by those variants.

pub mod flags;
pub mod kinds;

pub use self::flags::{ParameterEstimate, PopulationConfidence, PopulationFlags};
pub use self::kinds::{ModelTarget, ParameterKind, PopulationKind, UnknownKeyError};
