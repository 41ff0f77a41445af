//! High-level entry point for minimizing a user-provided [`Objective`].
use crate::optimization::{
    errors::OptResult,
    least_squares::{
        OptimOutcome, Theta,
        adapter::ArgMinAdapter,
        builders::{build_optimizer_hager_zhang, build_optimizer_more_thuente},
        run::run_lbfgs,
        traits::{LineSearcher, Objective, OptimizerOptions},
    },
};

/// Minimize `c(θ)` using L-BFGS with the chosen line search.
///
/// # Behavior
/// - Validates the initial guess via `f.check(theta0, data)`.
/// - Builds an L-BFGS solver with the line search named by
///   `opts.line_searcher`.
/// - Delegates to [`run_lbfgs`], which applies the iteration cap.
///
/// # Errors
/// - Propagates any error from `f.check`.
/// - Propagates builder and runtime errors.
///
/// # Example
/// ```no_run
/// use ndarray::array;
/// use rust_saxs::optimization::errors::OptResult;
/// use rust_saxs::optimization::least_squares::{minimize, Objective, OptimizerOptions, Theta};
///
/// struct Bowl;
/// impl Objective for Bowl {
///     type Data = ();
///     fn value(&self, theta: &Theta, _: &()) -> OptResult<f64> {
///         Ok(theta.dot(theta))
///     }
///     fn check(&self, _: &Theta, _: &()) -> OptResult<()> {
///         Ok(())
///     }
/// }
///
/// let out = minimize(&Bowl, array![0.1, -0.2], &(), &OptimizerOptions::default())?;
/// println!("θ̂ = {:?}", out.theta_hat);
/// # Ok::<(), rust_saxs::optimization::errors::OptError>(())
/// ```
pub fn minimize<F: Objective>(
    f: &F, theta0: Theta, data: &F::Data, opts: &OptimizerOptions,
) -> OptResult<OptimOutcome> {
    f.check(&theta0, data)?;
    let problem = ArgMinAdapter::new(f, data);
    match opts.line_searcher {
        LineSearcher::MoreThuente => {
            let solver = build_optimizer_more_thuente(opts)?;
            run_lbfgs(theta0, opts, problem, solver)
        }
        LineSearcher::HagerZhang => {
            let solver = build_optimizer_hager_zhang(opts)?;
            run_lbfgs(theta0, opts, problem, solver)
        }
    }
}
