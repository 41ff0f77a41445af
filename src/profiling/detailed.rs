//! Population-specific descriptors appended for individual regressors.
//!
//! - spherical_normal: position and depth of the first form-factor minimum in
//!   the Porod representation `I q^4`, plus the roughness of the high-q tail.
//! - guinier_porod: a Guinier radius estimate, the Porod exponent and the
//!   quality of the Guinier fit.
//!
//! All values are invariant under intensity rescaling; `guinier_rg_estimate`
//! is an absolute length in Ångström.
use crate::populations::PopulationKind;
use crate::profiling::{
    errors::ProfileResult,
    features::{FeatureKey, FeatureVector},
    profile::{check_profilable, log_log_points},
    stats::{finite_or_zero, fraction_count, line_fit, moving_average},
};
use crate::spectrum::Spectrum;

const GUINIER_FRACTION: f64 = 0.1;
const GUINIER_MIN_POINTS: usize = 5;
const POROD_FRACTION: f64 = 0.2;
const SMOOTHING_FRACTION: f64 = 0.02;

/// Detailed descriptors of `spectrum` for `population`.
///
/// Populations without a detailed profile yield an empty vector.
///
/// # Errors
/// Same as [`profile`](crate::profiling::profile).
pub fn detailed_profile(
    spectrum: &Spectrum, population: PopulationKind,
) -> ProfileResult<FeatureVector> {
    check_profilable(spectrum)?;
    let fv = match population {
        PopulationKind::SphericalNormal => spherical_normal_profile(spectrum),
        PopulationKind::GuinierPorod => guinier_porod_profile(spectrum),
        PopulationKind::Unidentified | PopulationKind::DiffractionPeaks => FeatureVector::new(),
    };
    Ok(fv.iter().map(|(k, v)| (k, finite_or_zero(v))).collect())
}

fn spherical_normal_profile(spectrum: &Spectrum) -> FeatureVector {
    let q = spectrum.q();
    let (q_min, q_max) = spectrum.q_range();
    let porod: Vec<f64> =
        q.iter().zip(spectrum.intensity().iter()).map(|(q, i)| i * q.powi(4)).collect();
    let half_window = ((porod.len() as f64 * SMOOTHING_FRACTION) as usize).max(1);
    let smooth = moving_average(&porod, half_window);

    let mut out = FeatureVector::new();
    match first_local_minimum(&smooth) {
        Some(j) => {
            out.insert(FeatureKey::QFirstMinimum, (q[j] - q_min) / (q_max - q_min));
            let following_max = smooth[j..].iter().copied().fold(0.0, f64::max);
            let depth = if following_max > 0.0 { smooth[j] / following_max } else { 0.0 };
            out.insert(FeatureKey::MinimumDepth, depth);
        }
        None => {
            out.insert(FeatureKey::QFirstMinimum, 0.0);
            out.insert(FeatureKey::MinimumDepth, 0.0);
        }
    }

    let (q_pos, log_i) = spectrum.positive_log_points();
    let (ln_q, ln_i) = log_log_points(&q_pos, &log_i);
    let m = fraction_count(ln_q.len(), POROD_FRACTION, 3);
    let start = ln_q.len() - m;
    out.insert(
        FeatureKey::PorodSlopeResidual,
        line_fit(&ln_q[start..], &ln_i[start..]).map_or(0.0, |f| f.rms_residual),
    );
    out
}

fn guinier_porod_profile(spectrum: &Spectrum) -> FeatureVector {
    let (q_pos, log_i) = spectrum.positive_log_points();
    let mut out = FeatureVector::new();

    let m = fraction_count(q_pos.len(), GUINIER_FRACTION, GUINIER_MIN_POINTS);
    let q2: Vec<f64> = q_pos[..m].iter().map(|q| q * q).collect();
    match line_fit(&q2, &log_i[..m]) {
        Some(fit) => {
            let rg = if fit.slope < 0.0 { (-3.0 * fit.slope).sqrt() } else { 0.0 };
            out.insert(FeatureKey::GuinierRgEstimate, rg);
            out.insert(FeatureKey::GuinierFitQuality, fit.r_squared);
        }
        None => {
            out.insert(FeatureKey::GuinierRgEstimate, 0.0);
            out.insert(FeatureKey::GuinierFitQuality, 0.0);
        }
    }

    let (ln_q, ln_i) = log_log_points(&q_pos, &log_i);
    let k = fraction_count(ln_q.len(), POROD_FRACTION, 3);
    let start = ln_q.len() - k;
    out.insert(
        FeatureKey::PorodExponent,
        line_fit(&ln_q[start..], &ln_i[start..]).map_or(0.0, |f| -f.slope),
    );
    out
}

/// Index of the first interior point lower than its left neighbour and not
/// higher than its right neighbour, after the curve has started to rise.
fn first_local_minimum(y: &[f64]) -> Option<usize> {
    let first_max = (1..y.len().saturating_sub(1)).find(|&k| y[k] >= y[k - 1] && y[k] > y[k + 1])?;
    (first_max + 1..y.len() - 1).find(|&k| y[k] < y[k - 1] && y[k] <= y[k + 1])
}
