//! fitting::fitter — bounded least-squares refinement of SAXS parameters.
//!
//! Purpose
//! -------
//! Refine the composite scattering model against a measured spectrum by
//! minimising the weighted mean squared log residual with L-BFGS over an
//! unconstrained reparameterisation of the bounded parameters.
//!
//! Key behaviors
//! -------------
//! - [`SaxsFitter::fit`] varies every parameter that is not fixed, within
//!   default or custom bounds.
//! - [`SaxsFitter::fit_intensity_params`] varies only the intensity-scale
//!   parameters (`I0_floor`, `I0_sphere`, `G_gp`, `I_pkcenter`) and holds the
//!   shape parameters at their supplied values.
//! - Missing intensity-scale parameters are seeded from the spectrum; other
//!   missing parameters start at their defaults.
//!
//! Invariants & assumptions
//! ------------------------
//! - The flags must select at least one population with an intensity model;
//!   unidentified spectra are rejected with [`FitError::InvalidModel`].
//! - Parameters of unflagged populations are ignored on input and absent
//!   from the output.
//! - The optimizer always runs under an iteration cap. Reaching it yields
//!   [`FitError::FitDivergence`] carrying the best-effort parameters.
//!
//! Downstream usage
//! ----------------
//! - The pipeline calls [`fit_intensity_params`] on regressor output.
//! - Callers that want to refine shapes call [`SaxsFitter::fit`] directly.
use std::collections::BTreeSet;

use ndarray::ArrayView1;

use crate::{
    fitting::{
        data::FitData,
        errors::{FitError, FitResult},
        layout::{ParameterBounds, ParameterLayout},
        objective::SaxsObjective,
        options::FitOptions,
        peaks,
        report::{FitOutcome, FitReport},
        seeds::seed_intensity_params,
    },
    optimization::least_squares::minimize,
    physics::intensity::compute_saxs,
    populations::{ParameterEstimate, ParameterKind, PopulationFlags},
    spectrum::Spectrum,
};

/// Fewest positive-intensity points accepted by a fit.
pub const MIN_FIT_POINTS: usize = 3;

#[derive(Debug, Clone)]
pub struct SaxsFitter {
    spectrum: Spectrum,
    flags: PopulationFlags,
    data: FitData,
    opts: FitOptions,
}

impl SaxsFitter {
    /// Prepare a fitter with counting-statistics errors `σ = √I`.
    ///
    /// # Errors
    /// [`FitError::InvalidModel`] when `flags` is unidentified or selects no
    /// population.
    pub fn new(spectrum: &Spectrum, flags: PopulationFlags, opts: FitOptions) -> FitResult<Self> {
        Self::build(spectrum, flags, None, opts)
    }

    /// Prepare a fitter with explicit intensity errors.
    ///
    /// # Errors
    /// As [`SaxsFitter::new`], plus the uncertainty checks of [`FitData::new`].
    pub fn with_errors(
        spectrum: &Spectrum, flags: PopulationFlags, errors: ArrayView1<'_, f64>, opts: FitOptions,
    ) -> FitResult<Self> {
        Self::build(spectrum, flags, Some(errors), opts)
    }

    fn build(
        spectrum: &Spectrum, flags: PopulationFlags, errors: Option<ArrayView1<'_, f64>>,
        opts: FitOptions,
    ) -> FitResult<Self> {
        if flags.is_unidentified() {
            return Err(FitError::InvalidModel {
                reason: "Unidentified spectra have no scattering model.",
            });
        }
        if flags.identified().is_empty() {
            return Err(FitError::InvalidModel { reason: "No population is flagged." });
        }
        let data = FitData::new(spectrum, errors, opts.error_weighted)?;
        Ok(Self { spectrum: spectrum.clone(), flags, data, opts })
    }

    pub fn flags(&self) -> &PopulationFlags {
        &self.flags
    }

    /// Default value of every parameter present under the fitter's flags.
    pub fn default_params(&self) -> ParameterEstimate {
        ParameterEstimate::defaults_for(&self.flags)
    }

    /// Objective value at `params`; missing parameters read as defaults.
    pub fn evaluate(&self, params: &ParameterEstimate) -> f64 {
        let mut full = self.default_params();
        full.merge(&params.restricted_to(&self.flags));
        let model = compute_saxs(self.data.q_fit(), &self.flags, &full);
        self.data.objective(&model)
    }

    /// Peak parameters from the most prominent diffraction peak.
    pub fn estimate_peak_params(&self, params: Option<&ParameterEstimate>) -> ParameterEstimate {
        peaks::estimate_peak_params(&self.spectrum, &self.flags, params)
    }

    /// Start point for a fit: defaults, then `params`, then seeds for the
    /// intensity-scale parameters `params` did not supply, then `fixed`.
    fn start_point(
        &self, params: &ParameterEstimate, fixed: &ParameterEstimate,
    ) -> ParameterEstimate {
        let given = params.restricted_to(&self.flags);
        let mut start = self.default_params();
        start.merge(&given);
        start.merge(&fixed.restricted_to(&self.flags));
        let seeds = seed_intensity_params(&self.spectrum, &self.flags, &start);
        for (param, value) in seeds.iter() {
            if !given.contains(param) && !fixed.contains(param) {
                start.insert(param, value);
            }
        }
        start
    }

    /// General fit.
    ///
    /// - `params`: initial guess; entries outside the flagged populations are
    ///   ignored.
    /// - `fixed`: parameters held constant at the given values, taking
    ///   precedence over `params`.
    /// - `bounds`: custom limits for free parameters.
    ///
    /// # Errors
    /// - [`FitError::InvalidBounds`] for malformed custom bounds.
    /// - [`FitError::InsufficientData`] when fewer positive points than
    ///   `max(n_free + 1, MIN_FIT_POINTS)` are available.
    /// - [`FitError::FitDivergence`] when the optimizer stops without
    ///   converging. If the solver itself fails, `best` is the lowest-cost
    ///   point it evaluated and the report counts zero iterations.
    pub fn fit(
        &self, params: &ParameterEstimate, fixed: &ParameterEstimate, bounds: &ParameterBounds,
    ) -> FitResult<FitOutcome> {
        let start = self.start_point(params, fixed);
        let fixed_keys: BTreeSet<ParameterKind> =
            fixed.restricted_to(&self.flags).keys().collect();
        let layout = ParameterLayout::new(&start, &fixed_keys, bounds)?;
        let n_free = layout.n_free();
        let required = (n_free + 1).max(MIN_FIT_POINTS);
        if self.data.n_points() < required {
            return Err(FitError::InsufficientData { found: self.data.n_points(), required });
        }

        let objective = SaxsObjective::new(self.flags.clone(), layout);
        let initial = objective.layout().start().clone();
        let initial_objective = objective.evaluate(&initial, &self.data);
        if n_free == 0 {
            let report = FitReport {
                converged: true,
                status: "No free parameters".to_string(),
                initial_objective,
                final_objective: initial_objective,
                iterations: 0,
                n_free_params: 0,
                fit_snr: self.fit_snr(&initial),
            };
            return Ok(FitOutcome { params: initial, report });
        }

        let theta0 = objective.layout().theta0();
        match minimize(&objective, theta0, &self.data, &self.opts.optimizer) {
            Ok(out) => {
                let best = objective.layout().params_at(&out.theta_hat)?;
                let final_objective = objective.evaluate(&best, &self.data);
                let report = FitReport {
                    converged: out.converged,
                    status: out.status,
                    initial_objective,
                    final_objective,
                    iterations: out.iterations,
                    n_free_params: n_free,
                    fit_snr: self.fit_snr(&best),
                };
                if report.converged {
                    Ok(FitOutcome { params: best, report })
                } else {
                    log::warn!(
                        "fit stopped without converging after {} iterations: {}",
                        report.iterations,
                        report.status
                    );
                    Err(FitError::FitDivergence { best, report: Box::new(report) })
                }
            }
            Err(e) => {
                log::warn!("fit terminated abnormally: {e}");
                let best = match objective.best() {
                    Some((_, theta)) => objective.layout().params_at(&theta)?,
                    None => initial,
                };
                let report = FitReport {
                    converged: false,
                    status: e.to_string(),
                    initial_objective,
                    final_objective: objective.evaluate(&best, &self.data),
                    iterations: 0,
                    n_free_params: n_free,
                    fit_snr: self.fit_snr(&best),
                };
                Err(FitError::FitDivergence { best, report: Box::new(report) })
            }
        }
    }

    /// Fit only the intensity-scale parameters; shape parameters are held at
    /// the values in `initial`, or their defaults when absent.
    ///
    /// # Errors
    /// As [`SaxsFitter::fit`].
    pub fn fit_intensity_params(&self, initial: &ParameterEstimate) -> FitResult<FitOutcome> {
        let fixed: ParameterEstimate = self
            .default_params()
            .keys()
            .filter(|k| !k.is_intensity_scale())
            .map(|k| (k, initial.get(k).unwrap_or_else(|| k.default_value())))
            .collect();
        self.fit(initial, &fixed, &ParameterBounds::new())
    }

    fn fit_snr(&self, params: &ParameterEstimate) -> f64 {
        let model = compute_saxs(self.data.q(), &self.flags, params);
        self.data.fit_snr(&model)
    }
}

/// Fit the intensity-scale parameters of `params` against `spectrum`.
///
/// # Errors
/// As [`SaxsFitter::new`] and [`SaxsFitter::fit_intensity_params`].
pub fn fit_intensity_params(
    spectrum: &Spectrum, flags: &PopulationFlags, params: &ParameterEstimate, opts: &FitOptions,
) -> FitResult<FitOutcome> {
    SaxsFitter::new(spectrum, flags.clone(), opts.clone())?.fit_intensity_params(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{physics::intensity::spherical_normal, populations::PopulationKind};
    use ndarray::Array1;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Recovery of intensity parameters on a noiseless spherical spectrum.
    // - Fixed parameters, custom bounds and the iteration cap.
    // - Model and data validation errors.
    //
    // They intentionally DO NOT cover:
    // - Regressor-seeded fits (see the integration tests).
    // -------------------------------------------------------------------------

    fn sphere_params() -> ParameterEstimate {
        [
            (ParameterKind::I0Floor, 0.5),
            (ParameterKind::I0Sphere, 1000.0),
            (ParameterKind::R0Sphere, 40.0),
            (ParameterKind::SigmaSphere, 0.05),
        ]
        .into_iter()
        .collect()
    }

    fn sphere_spectrum() -> Spectrum {
        let q = Array1::linspace(0.01, 0.3, 200);
        let i = spherical_normal(q.view(), 1000.0, 40.0, 0.05) + 0.5;
        Spectrum::new(q, i).unwrap()
    }

    fn sphere_flags() -> PopulationFlags {
        PopulationFlags::with_populations(&[PopulationKind::SphericalNormal])
    }

    fn shape_only() -> ParameterEstimate {
        [(ParameterKind::R0Sphere, 40.0), (ParameterKind::SigmaSphere, 0.05)]
            .into_iter()
            .collect()
    }

    #[test]
    // Purpose
    // -------
    // Intensity-only fitting recovers the generating floor and sphere
    // amplitude when the shape is known.
    //
    // Given
    // -----
    // - Noiseless spectrum with r0 = 40, σ = 0.05, I0 = 1000, floor = 0.5.
    // - Shape parameters supplied; intensities seeded heuristically.
    //
    // Expect
    // ------
    // - Converged fit with I0 and floor within 5% and shape untouched.
    fn intensity_fit_recovers_sphere_amplitudes() {
        // Arrange
        let fitter =
            SaxsFitter::new(&sphere_spectrum(), sphere_flags(), FitOptions::default()).unwrap();

        // Act
        let out = fitter.fit_intensity_params(&shape_only()).unwrap();

        // Assert
        let p = &out.params;
        let i0 = p.get(ParameterKind::I0Sphere).unwrap();
        let floor = p.get(ParameterKind::I0Floor).unwrap();
        assert!((i0 - 1000.0).abs() / 1000.0 < 0.05, "I0 = {i0}");
        assert!((floor - 0.5).abs() / 0.5 < 0.05, "floor = {floor}");
        assert_eq!(p.get(ParameterKind::R0Sphere), Some(40.0));
        assert_eq!(out.report.n_free_params, 2);
        assert!(out.report.converged);
        assert!(out.report.final_objective <= out.report.initial_objective);
    }

    #[test]
    fn evaluate_is_zero_at_generating_parameters() {
        let fitter =
            SaxsFitter::new(&sphere_spectrum(), sphere_flags(), FitOptions::default()).unwrap();
        assert!(fitter.evaluate(&sphere_params()) < 1e-20);
        assert!(fitter.evaluate(&fitter.default_params()) > 1.0);
    }

    #[test]
    // Purpose
    // -------
    // Fixing every parameter skips the optimizer and returns the fixed set.
    fn fully_fixed_fit_returns_start() {
        let fitter =
            SaxsFitter::new(&sphere_spectrum(), sphere_flags(), FitOptions::default()).unwrap();

        let out = fitter
            .fit(&ParameterEstimate::new(), &sphere_params(), &ParameterBounds::new())
            .unwrap();

        assert_eq!(out.params, sphere_params());
        assert_eq!(out.report.iterations, 0);
        assert_eq!(out.report.n_free_params, 0);
        assert!(out.report.fit_snr > 1e6);
    }

    #[test]
    // Purpose
    // -------
    // A one-iteration cap on a full fit from defaults reports divergence with
    // best-effort parameters inside their limits.
    fn iteration_cap_yields_divergence() {
        // Arrange
        let opts = FitOptions::with_max_iter(1).unwrap();
        let fitter = SaxsFitter::new(&sphere_spectrum(), sphere_flags(), opts).unwrap();

        // Act
        let err = fitter
            .fit(&ParameterEstimate::new(), &ParameterEstimate::new(), &ParameterBounds::new())
            .unwrap_err();

        // Assert
        match err {
            FitError::FitDivergence { best, report } => {
                assert!(!report.converged);
                assert_eq!(report.n_free_params, 4);
                let r0 = best.get(ParameterKind::R0Sphere).unwrap();
                assert!((1.0..=1000.0).contains(&r0));
            }
            other => panic!("expected FitDivergence, got {other:?}"),
        }
    }

    #[test]
    fn custom_upper_bound_is_respected() {
        let fitter =
            SaxsFitter::new(&sphere_spectrum(), sphere_flags(), FitOptions::default()).unwrap();
        let bounds: ParameterBounds = [(ParameterKind::I0Sphere, (0.0, Some(500.0)))].into();
        let fixed = shape_only();

        let best = match fitter.fit(&ParameterEstimate::new(), &fixed, &bounds) {
            Ok(out) => out.params,
            Err(FitError::FitDivergence { best, .. }) => best,
            Err(other) => panic!("unexpected error {other:?}"),
        };

        assert!(best.get(ParameterKind::I0Sphere).unwrap() <= 500.0);
    }

    #[test]
    fn rejects_models_without_populations() {
        let s = sphere_spectrum();
        for flags in [PopulationFlags::unidentified(), PopulationFlags::new()] {
            assert!(matches!(
                SaxsFitter::new(&s, flags, FitOptions::default()),
                Err(FitError::InvalidModel { .. })
            ));
        }
    }

    #[test]
    fn rejects_spectra_with_too_few_positive_points() {
        let s = Spectrum::new(Array1::linspace(0.01, 0.1, 4), ndarray::array![1.0, 0.0, 0.0, 2.0])
            .unwrap();
        let err = fit_intensity_params(&s, &sphere_flags(), &shape_only(), &FitOptions::default())
            .unwrap_err();
        assert_eq!(err, FitError::InsufficientData { found: 2, required: 3 });
    }
}
