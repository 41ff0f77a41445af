//! least_squares::builders — L-BFGS solver construction helpers.
//!
//! Purpose
//! -------
//! Hide Argmin's generic wiring behind two builders, one per line search,
//! and apply the crate-level tolerances and memory size from
//! [`OptimizerOptions`].
//!
//! Conventions
//! -----------
//! - Builders never set `theta0` or `max_iters`; the runner applies those.
//! - Tolerance errors raised by Argmin surface as [`OptError`](crate::optimization::errors::OptError)
//!   through the crate's `From<argmin::core::Error>` conversion.
use argmin::solver::quasinewton::LBFGS;

use crate::optimization::{
    errors::OptResult,
    least_squares::{
        traits::OptimizerOptions,
        types::{
            Cost, DEFAULT_LBFGS_MEM, Grad, HagerZhangLS, LbfgsHagerZhang, LbfgsMoreThuente,
            MoreThuenteLS, Theta,
        },
    },
};

/// Build an L-BFGS solver with Hager–Zhang line search.
///
/// # Errors
/// Returns an error when Argmin rejects a configured tolerance.
pub fn build_optimizer_hager_zhang(opts: &OptimizerOptions) -> OptResult<LbfgsHagerZhang> {
    let hager_zhang = HagerZhangLS::new();
    let mem = opts.lbfgs_mem.unwrap_or(DEFAULT_LBFGS_MEM);
    let lbfgs = LbfgsHagerZhang::new(hager_zhang, mem);
    configure_lbfgs(lbfgs, opts)
}

/// Build an L-BFGS solver with More–Thuente line search.
///
/// # Errors
/// Returns an error when Argmin rejects a configured tolerance.
pub fn build_optimizer_more_thuente(opts: &OptimizerOptions) -> OptResult<LbfgsMoreThuente> {
    let more_thuente = MoreThuenteLS::new();
    let mem = opts.lbfgs_mem.unwrap_or(DEFAULT_LBFGS_MEM);
    let lbfgs = LbfgsMoreThuente::new(more_thuente, mem);
    configure_lbfgs(lbfgs, opts)
}

/// Apply the optional gradient and cost-change tolerances to a solver.
///
/// A `None` tolerance leaves Argmin's default in place.
pub fn configure_lbfgs<L>(
    mut solver: LBFGS<L, Theta, Grad, Cost>, opts: &OptimizerOptions,
) -> OptResult<LBFGS<L, Theta, Grad, Cost>> {
    if let Some(g) = opts.tols.tol_grad {
        solver = solver.with_tolerance_grad(g)?;
    }
    if let Some(c) = opts.tols.tol_cost {
        solver = solver.with_tolerance_cost(c)?;
    }
    Ok(solver)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::least_squares::traits::{LineSearcher, Tolerances};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Construction with both line searches, default and explicit memory.
    // - Tolerance wiring through `configure_lbfgs`.
    // -------------------------------------------------------------------------

    #[test]
    fn builders_accept_default_and_explicit_memory() {
        let tols = Tolerances::new(Some(1e-6), Some(1e-8), 50).expect("Tolerances should be valid");
        let hz = OptimizerOptions::new(tols, LineSearcher::HagerZhang, false, None)
            .expect("Options should be valid");
        let mt = OptimizerOptions::new(tols, LineSearcher::MoreThuente, false, Some(11))
            .expect("Options should be valid");

        assert!(build_optimizer_hager_zhang(&hz).is_ok());
        assert!(build_optimizer_more_thuente(&mt).is_ok());
    }

    #[test]
    // Purpose
    // -------
    // `configure_lbfgs` succeeds both with tolerances present and absent.
    //
    // Given
    // -----
    // - Raw solvers built with `DEFAULT_LBFGS_MEM`.
    //
    // Expect
    // ------
    // - `Ok(_)` in both cases.
    fn configure_lbfgs_handles_present_and_absent_tolerances() {
        // Arrange
        let with_tols = OptimizerOptions::default();
        let no_tols = OptimizerOptions::new(
            Tolerances::new(None, None, 10).expect("Tolerances should be valid"),
            LineSearcher::MoreThuente,
            false,
            None,
        )
        .expect("Options should be valid");

        // Act
        let a = configure_lbfgs(LBFGS::new(HagerZhangLS::new(), DEFAULT_LBFGS_MEM), &with_tols);
        let b = configure_lbfgs(LBFGS::new(MoreThuenteLS::new(), DEFAULT_LBFGS_MEM), &no_tols);

        // Assert
        assert!(a.is_ok());
        assert!(b.is_ok());
    }
}
