//! Analytic scattering intensities.
//!
//! - Guinier–Porod: the unified crossover model of Hammouda (2010), continuous
//!   in value and slope at `q1 = (1/rg) sqrt(3D/2)`.
//! - Normal-distributed spheres: sphere form factor averaged over radii
//!   sampled across `r0 (1 ± 5σ)` with Gaussian number weights times the
//!   `r^6` volume-squared factor, normalised so that `I(0) = I0`.
//! - Diffraction peaks: Lorentzian line shapes.
//!
//! All functions are pure; non-physical shape parameters degrade gracefully
//! (e.g. `σ -> 0` gives the monodisperse sphere).
use crate::populations::{ParameterEstimate, ParameterKind, PopulationFlags, PopulationKind};
use ndarray::{Array1, ArrayView1};
use statrs::distribution::{Continuous, Normal};

/// Number of radii sampled for a polydisperse sphere population.
pub const SPHERE_RADIUS_SAMPLES: usize = 61;
/// Half-width of the sampled radius interval in units of `σ r0`.
pub const SPHERE_WIDTH_SIGMAS: f64 = 5.0;
/// Below this fractional width the population is treated as monodisperse.
const MONODISPERSE_SIGMA: f64 = 1e-6;

/// Normalised sphere form factor `[3 (sin x - x cos x) / x^3]^2`.
#[inline]
pub fn sphere_form_factor(x: f64) -> f64 {
    if x.abs() < 1e-3 {
        return 1.0 - x * x / 5.0;
    }
    let amp = 3.0 * (x.sin() - x * x.cos()) / x.powi(3);
    amp * amp
}

/// Guinier–Porod intensity with prefactor `g`, radius of gyration `rg` and
/// Porod exponent `d`.
pub fn guinier_porod(q: ArrayView1<'_, f64>, g: f64, rg: f64, d: f64) -> Array1<f64> {
    if rg <= 0.0 {
        return Array1::from_elem(q.len(), g);
    }
    let q1 = (1.0 / rg) * (1.5 * d).sqrt();
    let d_fac = g * (-d / 2.0).exp() * (1.5 * d).powf(d / 2.0) / rg.powf(d);
    q.mapv(|qv| {
        if qv <= q1 { g * (-(qv * qv) * rg * rg / 3.0).exp() } else { d_fac / qv.powf(d) }
    })
}

/// Intensity of a population of spheres with mean radius `r0` and fractional
/// standard deviation `sigma`, scaled to `i0` at `q = 0`.
pub fn spherical_normal(q: ArrayView1<'_, f64>, i0: f64, r0: f64, sigma: f64) -> Array1<f64> {
    let monodisperse = || q.mapv(|qv| i0 * sphere_form_factor(qv * r0));
    if sigma <= MONODISPERSE_SIGMA || r0 <= 0.0 {
        return monodisperse();
    }
    let normal = match Normal::new(r0, sigma * r0) {
        Ok(n) => n,
        Err(_) => return monodisperse(),
    };
    let r_lo = (r0 * (1.0 - SPHERE_WIDTH_SIGMAS * sigma)).max(r0 * 1e-3);
    let r_hi = r0 * (1.0 + SPHERE_WIDTH_SIGMAS * sigma);
    let radii = Array1::linspace(r_lo, r_hi, SPHERE_RADIUS_SAMPLES);
    let weights = radii.mapv(|r| normal.pdf(r) * r.powi(6));
    let norm = weights.sum();
    if !(norm > 0.0) {
        return monodisperse();
    }
    q.mapv(|qv| {
        let s: f64 =
            radii.iter().zip(weights.iter()).map(|(&r, &w)| w * sphere_form_factor(qv * r)).sum();
        i0 * s / norm
    })
}

/// Lorentzian peak of height `i_pk` at `q_pk` with half-width `hwhm`.
pub fn lorentzian_peak(q: ArrayView1<'_, f64>, q_pk: f64, i_pk: f64, hwhm: f64) -> Array1<f64> {
    let h2 = hwhm * hwhm;
    q.mapv(|qv| i_pk * h2 / ((qv - q_pk).powi(2) + h2))
}

/// Contribution of one population, reading missing parameters from their
/// defaults. `None` for `unidentified`, which has no intensity model.
pub fn population_intensity(
    population: PopulationKind, q: ArrayView1<'_, f64>, params: &ParameterEstimate,
) -> Option<Array1<f64>> {
    let p = |k: ParameterKind| params.get(k).unwrap_or_else(|| k.default_value());
    match population {
        PopulationKind::Unidentified => None,
        PopulationKind::GuinierPorod => Some(guinier_porod(
            q,
            p(ParameterKind::GGp),
            p(ParameterKind::RgGp),
            p(ParameterKind::DGp),
        )),
        PopulationKind::SphericalNormal => Some(spherical_normal(
            q,
            p(ParameterKind::I0Sphere),
            p(ParameterKind::R0Sphere),
            p(ParameterKind::SigmaSphere),
        )),
        PopulationKind::DiffractionPeaks => Some(lorentzian_peak(
            q,
            p(ParameterKind::QPkcenter),
            p(ParameterKind::IPkcenter),
            p(ParameterKind::PkHwhm),
        )),
    }
}

/// Composite model `I0_floor + Σ contributions` over the flagged populations.
///
/// An unidentified spectrum has no model and yields zeros.
pub fn compute_saxs(
    q: ArrayView1<'_, f64>, flags: &PopulationFlags, params: &ParameterEstimate,
) -> Array1<f64> {
    if flags.is_unidentified() {
        return Array1::zeros(q.len());
    }
    let floor = params.get(ParameterKind::I0Floor).unwrap_or(0.0);
    let mut out = Array1::from_elem(q.len(), floor);
    for pop in flags.identified() {
        if let Some(contribution) = population_intensity(pop, q, params) {
            out += &contribution;
        }
    }
    out
}
