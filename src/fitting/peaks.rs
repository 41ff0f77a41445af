//! Diffraction-peak detection and parameter estimation.
use crate::{
    populations::{ParameterEstimate, ParameterKind, PopulationFlags, PopulationKind},
    profiling::stats::{mean, polyfit, population_std},
    spectrum::Spectrum,
};

/// Half-width, in points, of the window used by [`peaks_by_window`].
pub const PEAK_WINDOW: usize = 20;

/// Relative half-width of the q-range used for the peak-width fit.
const WIDTH_FIT_SPAN: f64 = 0.05;

/// A local maximum and its prominence within the search window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakCandidate {
    pub index: usize,
    pub prominence: f64,
}

/// Local maxima of `intensity` over `±window` points, sorted by decreasing
/// prominence (height above the window minimum).
///
/// End points never qualify; on a plateau only the first point does.
pub fn peaks_by_window(intensity: &[f64], window: usize) -> Vec<PeakCandidate> {
    let n = intensity.len();
    let mut out = Vec::new();
    for idx in 1..n.saturating_sub(1) {
        let lo = idx.saturating_sub(window);
        let hi = (idx + window + 1).min(n);
        let v = intensity[idx];
        let slice = &intensity[lo..hi];
        if intensity[idx - 1] >= v || slice.iter().any(|&x| x > v) {
            continue;
        }
        let floor = slice.iter().copied().fold(f64::INFINITY, f64::min);
        let prominence = v - floor;
        if prominence > 0.0 {
            out.push(PeakCandidate { index: idx, prominence });
        }
    }
    out.sort_by(|a, b| b.prominence.total_cmp(&a.prominence));
    out
}

/// Estimate `q_pkcenter`, `I_pkcenter` and `pk_hwhm` from the most
/// prominent peak.
///
/// Returns `params` (or the defaults for `flags`) unchanged when
/// `diffraction_peaks` is not flagged or no peak is found. `I_pkcenter` is a
/// tenth of the intensity at the peak. The width comes from a quadratic fit
/// of the standardised intensity within ±5% of `q_pk`: a vertex curvature
/// `a` in standardised units gives a half width of `|1/a| · std(q) / 2`.
pub fn estimate_peak_params(
    spectrum: &Spectrum, flags: &PopulationFlags, params: Option<&ParameterEstimate>,
) -> ParameterEstimate {
    let mut out = params.cloned().unwrap_or_else(|| ParameterEstimate::defaults_for(flags));
    if flags.is_unidentified() || !flags.get(PopulationKind::DiffractionPeaks) {
        return out;
    }
    let q = spectrum.q();
    let intensity = spectrum.intensity();
    let i_vec = intensity.to_vec();
    let Some(best) = peaks_by_window(&i_vec, PEAK_WINDOW).into_iter().next() else {
        log::debug!("no diffraction peak candidate found");
        return out;
    };
    let q_pk = q[best.index];
    out.insert(ParameterKind::QPkcenter, ParameterKind::QPkcenter.clamp(q_pk));
    out.insert(ParameterKind::IPkcenter, ParameterKind::IPkcenter.clamp(0.1 * i_vec[best.index]));

    let (qs, is): (Vec<f64>, Vec<f64>) = q
        .iter()
        .zip(intensity.iter())
        .filter(|&(&qv, _)| {
            qv > (1.0 - WIDTH_FIT_SPAN) * q_pk && qv < (1.0 + WIDTH_FIT_SPAN) * q_pk
        })
        .map(|(&qv, &iv)| (qv, iv))
        .unzip();
    if let Some(hwhm) = quadratic_half_width(&qs, &is) {
        out.insert(ParameterKind::PkHwhm, ParameterKind::PkHwhm.clamp(hwhm));
    }
    out
}

fn quadratic_half_width(q: &[f64], intensity: &[f64]) -> Option<f64> {
    let q_std = population_std(q);
    let i_std = population_std(intensity);
    if q.len() < 3 || q_std <= 0.0 || i_std <= 0.0 {
        return None;
    }
    let (q_mean, i_mean) = (mean(q), mean(intensity));
    let qs: Vec<f64> = q.iter().map(|&v| (v - q_mean) / q_std).collect();
    let is: Vec<f64> = intensity.iter().map(|&v| (v - i_mean) / i_std).collect();
    let coeffs = polyfit(&qs, &is, 2)?;
    let a = coeffs[2];
    if a == 0.0 || !a.is_finite() {
        return None;
    }
    Some(0.5 * (1.0 / a).abs() * q_std)
}
