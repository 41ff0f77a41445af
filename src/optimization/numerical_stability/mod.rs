//! numerical_stability — numerically robust transforms for bounded fitting.
//!
//! Purpose
//! -------
//! Collect the scalar transforms and the coordinate-wise bound maps that let
//! an unconstrained L-BFGS run optimise physically bounded parameters.
//!
//! Key behaviors
//! -------------
//! - Stable scalar transforms ([`safe_softplus`], [`safe_softplus_inv`],
//!   [`safe_logistic`], [`safe_logit`]).
//! - [`BoundedTransform`]: maps a vector of `[lo, hi]` / `[lo, ∞)` parameters
//!   to and from optimizer space.
//!
//! Conventions
//! -----------
//! - This module never logs or performs I/O; it is pure numerical helpers
//!   suitable for use inside the cost function.

pub mod bounds;
pub mod transformations;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::bounds::{BoundedTransform, CoordinateMap};
pub use self::transformations::{
    LOGIT_EPS, safe_logistic, safe_logit, safe_softplus, safe_softplus_inv,
};

pub mod prelude {
    pub use super::bounds::BoundedTransform;
    pub use super::transformations::{safe_logistic, safe_logit, safe_softplus, safe_softplus_inv};
}
