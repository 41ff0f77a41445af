//! fitting::options — configuration for the intensity fitter.
//!
//! Purpose
//! -------
//! Bundle optimizer settings with the objective weighting choice so that
//! [`SaxsFitter`](crate::fitting::SaxsFitter) takes a single options handle.
use crate::optimization::{
    errors::OptResult,
    least_squares::{LineSearcher, OptimizerOptions, Tolerances},
};

/// FitOptions — fitter configuration.
///
/// Fields
/// ------
/// - `optimizer`: [`OptimizerOptions`]
///   L-BFGS configuration: tolerances, the mandatory iteration cap, line
///   search, history size and the `obs_slog` verbosity switch.
/// - `error_weighted`: `bool`
///   When `true` (default) each log residual is weighted by the inverse
///   variance of `ln I`; when `false` all points weigh the same.
///
/// Notes
/// -----
/// - The default optimizer uses `tol_grad = 1e-8`, `tol_cost = 1e-12`,
///   `max_iter = 500` and More–Thuente line search.
#[derive(Debug, Clone, PartialEq)]
pub struct FitOptions {
    pub optimizer: OptimizerOptions,
    pub error_weighted: bool,
}

impl FitOptions {
    /// Package already-validated optimizer options with a weighting choice.
    pub fn new(optimizer: OptimizerOptions, error_weighted: bool) -> Self {
        Self { optimizer, error_weighted }
    }

    /// Default options with a different iteration cap.
    ///
    /// # Errors
    /// [`OptError::InvalidMaxIter`](crate::optimization::errors::OptError::InvalidMaxIter)
    /// when `max_iter == 0`.
    pub fn with_max_iter(max_iter: usize) -> OptResult<Self> {
        let base = Tolerances::default();
        let tols = Tolerances::new(base.tol_grad, base.tol_cost, max_iter)?;
        let optimizer = OptimizerOptions::new(tols, LineSearcher::MoreThuente, false, None)?;
        Ok(Self { optimizer, error_weighted: true })
    }
}

impl Default for FitOptions {
    fn default() -> Self {
        Self { optimizer: OptimizerOptions::default(), error_weighted: true }
    }
}
