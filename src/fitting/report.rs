//! Fit results and diagnostics.
use crate::populations::ParameterEstimate;

/// Diagnostics of one fit.
///
/// - `converged`: the optimizer met a tolerance before the iteration cap.
/// - `status`: optimizer termination status as text.
/// - `initial_objective` / `final_objective`: weighted mean squared log
///   residual at the start and at the returned parameters.
/// - `iterations`: optimizer iterations performed; `0` when the solver
///   stopped with an error.
/// - `n_free_params`: parameters varied by the fit.
/// - `fit_snr`: `mean(I_model) / std(I - I_model)` over the whole spectrum;
///   infinite for an exact fit.
#[derive(Debug, Clone, PartialEq)]
pub struct FitReport {
    pub converged: bool,
    pub status: String,
    pub initial_objective: f64,
    pub final_objective: f64,
    pub iterations: usize,
    pub n_free_params: usize,
    pub fit_snr: f64,
}

/// Refined parameters together with their [`FitReport`].
#[derive(Debug, Clone, PartialEq)]
pub struct FitOutcome {
    pub params: ParameterEstimate,
    pub report: FitReport,
}
