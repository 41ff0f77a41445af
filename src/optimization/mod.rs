//! optimization — bounded least-squares minimization and numerical helpers.
//!
//! Purpose
//! -------
//! Provide the optimization layer used by the SAXS fitter: an Argmin-backed
//! L-BFGS minimizer (`least_squares`), numerically stable transforms that map
//! bounded physical parameters into an unconstrained space
//! (`numerical_stability`), and a single error surface (`errors::OptError`).
//!
//! Invariants & assumptions
//! ------------------------
//! - Solvers operate on an unconstrained `θ`; bounds are enforced by the
//!   coordinate maps in `numerical_stability::bounds`, never by the solver.
//! - Invalid states are reported as `OptError`, not panics.
//!
//! Conventions
//! -----------
//! - Objectives are minimized as-is; there is no sign flip.
//! - Public entrypoints that can fail return `OptResult<T>`; raw Argmin
//!   errors are converted at the boundary.
//! - Apart from the optional slog observer, this layer performs no I/O.

pub mod errors;
pub mod least_squares;
pub mod numerical_stability;

pub mod prelude {
    pub use super::errors::{OptError, OptResult};
    pub use super::least_squares::prelude::*;
    pub use super::numerical_stability::prelude::*;
}
