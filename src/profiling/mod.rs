//! profiling — scale-invariant spectrum descriptors.
//!
//! Purpose
//! -------
//! Turn a validated [`Spectrum`](crate::spectrum::Spectrum) into the numeric
//! descriptors consumed by the classifiers and regressors.
//!
//! Key behaviors
//! -------------
//! - [`profile`] computes the fixed base schema [`FeatureKey::BASE`].
//! - [`detailed_profile`] computes population-specific extensions used by the
//!   `sigma_sphere` and `rg_gp` regressors.
//!
//! Invariants & assumptions
//! ------------------------
//! - Pure and deterministic: identical input yields bit-identical output.
//! - Every descriptor is finite and invariant under intensity rescaling.
//! - Spectra shorter than [`MIN_PROFILE_POINTS`] or with identically zero
//!   intensity are rejected with a [`ProfileError`].

pub mod detailed;
pub mod errors;
pub mod features;
pub mod profile;
pub mod stats;

pub use self::detailed::detailed_profile;
pub use self::errors::{ProfileError, ProfileResult};
pub use self::features::{FeatureKey, FeatureVector};
pub use self::profile::{MIN_PROFILE_POINTS, profile};
