//! Base spectrum profiler.
//!
//! Purpose
//! -------
//! Reduce a [`Spectrum`] to the fixed 20-entry [`FeatureVector`] consumed by
//! every classifier and regressor.
//!
//! Invariants & assumptions
//! ------------------------
//! - Every descriptor is invariant under `I -> c I` for `c > 0`: descriptors
//!   are ratios of intensities, differences of log intensities, correlation
//!   coefficients or intensity-weighted centroids.
//! - Every descriptor is finite. Degenerate sub-computations (constant
//!   series, too few positive points) contribute `0.0`.
//! - Log-based descriptors only use points with `I > 0`; descriptors that
//!   also take `ln q` additionally require `q > 0`.
//!
//! Testing notes
//! -------------
//! - Unit tests cover the error paths, schema completeness, finiteness on
//!   curves with zeros, scale invariance and a few descriptors with known
//!   values.
use crate::profiling::{
    errors::{ProfileError, ProfileResult},
    features::{FeatureKey, FeatureVector},
    stats::{
        dft_magnitudes, finite_or_zero, fraction_count, line_fit, mean, pearson, polyfit,
        population_std,
    },
};
use crate::spectrum::Spectrum;

/// Minimum number of points accepted by the profilers.
pub const MIN_PROFILE_POINTS: usize = 10;

/// Fraction of the lowest-frequency DFT bins counted as "low" power.
const LOW_FREQUENCY_FRACTION: f64 = 0.1;
/// Fraction of points used for the low-q and high-q log slopes.
const SLOPE_FRACTION: f64 = 0.2;
/// Fraction of points averaged for the low/high intensity ratio.
const INTENSITY_RATIO_FRACTION: f64 = 0.1;

/// Validate point count and non-zero intensity; shared with the detailed
/// profilers.
pub(crate) fn check_profilable(spectrum: &Spectrum) -> ProfileResult<()> {
    if spectrum.len() < MIN_PROFILE_POINTS {
        return Err(ProfileError::InsufficientData {
            found: spectrum.len(),
            required: MIN_PROFILE_POINTS,
        });
    }
    if spectrum.n_positive() == 0 {
        return Err(ProfileError::DegenerateSpectrum);
    }
    Ok(())
}

/// Compute the base descriptors of `spectrum`.
///
/// # Errors
/// - [`ProfileError::InsufficientData`] below [`MIN_PROFILE_POINTS`] points.
/// - [`ProfileError::DegenerateSpectrum`] when every intensity is zero.
pub fn profile(spectrum: &Spectrum) -> ProfileResult<FeatureVector> {
    check_profilable(spectrum)?;
    let q = spectrum.q().to_vec();
    let intensity = spectrum.intensity().to_vec();
    let n = q.len();
    let (q_min, q_max) = spectrum.q_range();
    let q_span = q_max - q_min;

    let (i_argmax, i_max) = intensity
        .iter()
        .copied()
        .enumerate()
        .fold((0, f64::MIN), |best, (k, v)| if v > best.1 { (k, v) } else { best });
    let i_mean = mean(&intensity);

    let (log_q_pos, log_i) = spectrum.positive_log_points();
    let log_i_min = log_i.iter().copied().fold(f64::INFINITY, f64::min);
    let log_i_max = log_i.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let mut out = FeatureVector::new();
    let mut put = |key: FeatureKey, value: f64| out.insert(key, finite_or_zero(value));

    // ---- Intensity shape ----
    put(FeatureKey::ImaxOverImean, i_max / i_mean);
    put(FeatureKey::ImaxSharpness, imax_sharpness(&intensity, i_argmax, i_max));
    let total_variation: f64 = intensity.windows(2).map(|w| (w[1] - w[0]).abs()).sum();
    put(FeatureKey::IFluctuation, total_variation / (n as f64 * i_max));
    let log_variation: f64 = log_i.windows(2).map(|w| (w[1] - w[0]).abs()).sum();
    put(FeatureKey::LogiFluctuation, log_variation / n as f64);
    let log_std = population_std(&log_i);
    put(
        FeatureKey::LogiMaxOverStd,
        if log_std > 0.0 { (log_i_max - mean(&log_i)) / log_std } else { 0.0 },
    );

    // ---- Frequency content ----
    let normalised: Vec<f64> = intensity.iter().map(|v| v / i_max).collect();
    let spectral = SpectralSummary::from_signal(&normalised);
    put(FeatureKey::RFftIcentroid, spectral.centroid);
    put(FeatureKey::RFftImax, spectral.peak_frequency);
    put(FeatureKey::FftLowPowerFraction, spectral.low_power_fraction);

    // ---- q-space centroids ----
    let i_sum: f64 = intensity.iter().sum();
    let qi_sum: f64 = q.iter().zip(&intensity).map(|(a, b)| a * b).sum();
    put(FeatureKey::QIcentroid, qi_sum / i_sum);
    let log_weights: Vec<f64> = log_i.iter().map(|v| v - log_i_min).collect();
    let w_sum: f64 = log_weights.iter().sum();
    put(
        FeatureKey::QLogicentroid,
        if w_sum > 0.0 {
            log_q_pos.iter().zip(&log_weights).map(|(a, b)| a * b).sum::<f64>() / w_sum
        } else {
            0.0
        },
    );
    put(FeatureKey::QAtImax, (q[i_argmax] - q_min) / q_span);

    // ---- Correlations ----
    let q2: Vec<f64> = q.iter().map(|v| v * v).collect();
    let exp_q: Vec<f64> = q.iter().map(|v| (v / q_max).exp()).collect();
    let inv_exp_q: Vec<f64> = q.iter().map(|v| (-v / q_max).exp()).collect();
    put(FeatureKey::PearsonQ, pearson(&intensity, &q));
    put(FeatureKey::PearsonQ2, pearson(&intensity, &q2));
    put(FeatureKey::PearsonExpq, pearson(&intensity, &exp_q));
    put(FeatureKey::PearsonInvexpq, pearson(&intensity, &inv_exp_q));

    let (ln_q, ln_i_for_q) = log_log_points(&log_q_pos, &log_i);
    put(FeatureKey::PearsonLogqLogi, pearson(&ln_i_for_q, &ln_q));

    // ---- Log-space shape ----
    let q_norm: Vec<f64> = log_q_pos.iter().map(|v| (v - q_min) / q_span).collect();
    put(
        FeatureKey::LogiCurvature,
        polyfit(&q_norm, &log_i, 2).map_or(0.0, |c| c[2]),
    );
    let m = fraction_count(ln_q.len(), SLOPE_FRACTION, 3);
    put(
        FeatureKey::LowQLogslope,
        line_fit(&ln_q[..m], &ln_i_for_q[..m]).map_or(0.0, |f| f.slope),
    );
    let start = ln_q.len() - m;
    put(
        FeatureKey::HighQLogslope,
        line_fit(&ln_q[start..], &ln_i_for_q[start..]).map_or(0.0, |f| f.slope),
    );

    let k = fraction_count(n, INTENSITY_RATIO_FRACTION, 1);
    let low = mean(&intensity[..k]);
    let high = mean(&intensity[n - k..]);
    put(
        FeatureKey::LowOverHighIntensity,
        if low > 0.0 && high > 0.0 { (low / high).ln() } else { 0.0 },
    );

    Ok(out)
}

/// `(ln q, ln I)` for positive-intensity points with `q > 0`.
pub(crate) fn log_log_points(q: &[f64], log_i: &[f64]) -> (Vec<f64>, Vec<f64>) {
    q.iter().zip(log_i).filter(|(q, _)| **q > 0.0).map(|(q, li)| (q.ln(), *li)).unzip()
}

/// Peak height over the mean intensity within a window around the peak.
fn imax_sharpness(intensity: &[f64], argmax: usize, i_max: f64) -> f64 {
    let half = (intensity.len() / 10).max(1);
    let lo = argmax.saturating_sub(half);
    let hi = (argmax + half + 1).min(intensity.len());
    let local = mean(&intensity[lo..hi]);
    if local > 0.0 { i_max / local } else { 0.0 }
}

struct SpectralSummary {
    centroid: f64,
    peak_frequency: f64,
    low_power_fraction: f64,
}

impl SpectralSummary {
    /// Summaries over the non-DC bins; frequencies are normalised so the
    /// Nyquist bin sits at `1.0`.
    fn from_signal(signal: &[f64]) -> Self {
        let mags = dft_magnitudes(signal);
        let n_bins = mags.len() - 1;
        if n_bins == 0 {
            return Self { centroid: 0.0, peak_frequency: 0.0, low_power_fraction: 0.0 };
        }
        let freq = |k: usize| k as f64 / n_bins as f64;
        let non_dc = &mags[1..];
        let mag_sum: f64 = non_dc.iter().sum();
        if !(mag_sum > 0.0) {
            return Self { centroid: 0.0, peak_frequency: 0.0, low_power_fraction: 0.0 };
        }
        let centroid =
            non_dc.iter().enumerate().map(|(k, m)| freq(k + 1) * m).sum::<f64>() / mag_sum;
        let peak_bin = non_dc
            .iter()
            .enumerate()
            .fold((0, f64::MIN), |best, (k, &m)| if m > best.1 { (k, m) } else { best })
            .0;
        let power_total: f64 = non_dc.iter().map(|m| m * m).sum();
        let n_low = fraction_count(n_bins, LOW_FREQUENCY_FRACTION, 1);
        let power_low: f64 = non_dc[..n_low].iter().map(|m| m * m).sum();
        Self {
            centroid,
            peak_frequency: freq(peak_bin + 1),
            low_power_fraction: power_low / power_total,
        }
    }
}
