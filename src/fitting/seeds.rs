//! Heuristic starting values for the intensity-scale parameters.
//!
//! - `I0_floor`: half the smallest intensity in the high-q tail.
//! - `G_gp` / `I0_sphere`: the low-q intensity above the floor, shared
//!   equally between the flagged scatterers and divided by each model's
//!   unit-amplitude value at low q.
//! - `I_pkcenter`: a tenth of the intensity at the peak center.
//!
//! Every seed is a positive multiple of the measured intensity, so seeds
//! follow a rescaling of the spectrum exactly.
use ndarray::Array1;

use crate::{
    physics::intensity::{guinier_porod, spherical_normal},
    populations::{ParameterEstimate, ParameterKind, PopulationFlags, PopulationKind},
    profiling::stats::{fraction_count, mean},
    spectrum::Spectrum,
};

/// Relative floor applied to seeds, in units of the largest intensity.
const MIN_RELATIVE_SEED: f64 = 1e-9;

/// Seeds for the intensity-scale parameters of `flags`, using the shape
/// parameters in `shape` (defaults where absent).
///
/// Returns an empty estimate for unidentified spectra or spectra without a
/// positive intensity.
pub fn seed_intensity_params(
    spectrum: &Spectrum, flags: &PopulationFlags, shape: &ParameterEstimate,
) -> ParameterEstimate {
    let mut out = ParameterEstimate::new();
    let (q, i): (Vec<f64>, Vec<f64>) = spectrum
        .q()
        .iter()
        .zip(spectrum.intensity().iter())
        .filter(|&(_, &iv)| iv > 0.0)
        .map(|(&qv, &iv)| (qv, iv))
        .unzip();
    if flags.is_unidentified() || i.is_empty() {
        return out;
    }
    let n = i.len();
    let i_max = i.iter().copied().fold(0.0, f64::max);
    let tiny = MIN_RELATIVE_SEED * i_max;
    let p = |k: ParameterKind| shape.get(k).unwrap_or_else(|| k.default_value());

    let tail = fraction_count(n, 0.1, 1);
    let tail_min = i[n - tail..].iter().copied().fold(f64::INFINITY, f64::min);
    let floor = 0.5 * tail_min;
    out.insert(ParameterKind::I0Floor, floor.max(tiny));

    let head = fraction_count(n, 0.05, 1);
    let q_low = mean(&q[..head]);
    let i_low = mean(&i[..head]);
    let excess = if i_low > 2.0 * floor { i_low - floor } else { 0.5 * i_low };
    let scatterers = [PopulationKind::GuinierPorod, PopulationKind::SphericalNormal]
        .into_iter()
        .filter(|&pop| flags.get(pop))
        .count();
    let share = excess / scatterers.max(1) as f64;
    let q_probe = Array1::from_elem(1, q_low);

    if flags.get(PopulationKind::GuinierPorod) {
        let unit = guinier_porod(
            q_probe.view(),
            1.0,
            p(ParameterKind::RgGp),
            p(ParameterKind::DGp),
        )[0];
        out.insert(ParameterKind::GGp, amplitude(share, unit).max(tiny));
    }
    if flags.get(PopulationKind::SphericalNormal) {
        let unit = spherical_normal(
            q_probe.view(),
            1.0,
            p(ParameterKind::R0Sphere),
            p(ParameterKind::SigmaSphere),
        )[0];
        out.insert(ParameterKind::I0Sphere, amplitude(share, unit).max(tiny));
    }
    if flags.get(PopulationKind::DiffractionPeaks) {
        let q_pk = p(ParameterKind::QPkcenter);
        let nearest = q
            .iter()
            .enumerate()
            .min_by(|a, b| (a.1 - q_pk).abs().total_cmp(&(b.1 - q_pk).abs()))
            .map_or(0, |(idx, _)| idx);
        out.insert(ParameterKind::IPkcenter, (0.1 * i[nearest]).max(tiny));
    }
    out
}

fn amplitude(target: f64, unit: f64) -> f64 {
    if unit.is_finite() && unit > 0.0 { target / unit } else { target }
}
