//! least_squares — argmin-powered L-BFGS minimizer for fit objectives.
//!
//! Purpose
//! -------
//! Provide a small, Argmin-backed minimization layer. Callers implement
//! [`Objective`] and call [`minimize`] to run L-BFGS with a configurable line
//! search, tolerances, a mandatory iteration cap and finite-difference
//! gradients when no analytic gradient is supplied.
//!
//! Key behaviors
//! -------------
//! - [`adapter::ArgMinAdapter`] exposes an [`Objective`] to Argmin as a cost
//!   and gradient.
//! - [`minimize`] validates the start point, builds the solver via
//!   [`builders`] and runs it via [`run::run_lbfgs`].
//! - [`OptimOutcome`] reports `converged == false` when the iteration cap is
//!   reached, so callers can tell divergence from a tolerance hit.
//!
//! Invariants & assumptions
//! ------------------------
//! - Parameters live in an unconstrained space [`Theta`]; bounded physical
//!   parameters are mapped by the caller.
//! - [`Objective::value`] reports invalid inputs as [`OptError`](crate::optimization::errors::OptError)
//!   values, never panics.
//!
//! Testing notes
//! -------------
//! - Unit tests in submodules cover FD fallback in [`adapter`], solver
//!   construction in [`builders`], option validation in [`traits`] and
//!   end-to-end convergence on toy objectives in [`api`].
//! - The SAXS fitter exercises the full path in `fitting` and the
//!   integration tests.

pub mod adapter;
pub mod api;
pub mod builders;
pub mod run;
pub mod traits;
pub mod types;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::api::minimize;
pub use self::traits::{LineSearcher, Objective, OptimOutcome, OptimizerOptions, Tolerances};
pub use self::types::{Cost, DEFAULT_LBFGS_MEM, FnEvalMap, Grad, Theta};

pub mod prelude {
    pub use super::api::minimize;
    pub use super::traits::{LineSearcher, Objective, OptimOutcome, OptimizerOptions, Tolerances};
    pub use super::types::{Cost, Grad, Theta};
}
