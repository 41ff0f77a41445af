//! Small numerical helpers shared by the profilers.
//!
//! Every helper returns `0.0` (or `None`) for degenerate input instead of NaN,
//! so that callers can guarantee finite descriptors.
use nalgebra::{DMatrix, DVector};
use statrs::statistics::Statistics;

/// Replace a non-finite value with `0.0`.
#[inline]
pub fn finite_or_zero(x: f64) -> f64 {
    if x.is_finite() { x } else { 0.0 }
}

pub fn mean(x: &[f64]) -> f64 {
    if x.is_empty() {
        return 0.0;
    }
    finite_or_zero(x.iter().mean())
}

pub fn population_std(x: &[f64]) -> f64 {
    if x.len() < 2 {
        return 0.0;
    }
    finite_or_zero(x.iter().population_std_dev())
}

/// Pearson correlation of `x` and `y`; `0.0` when either side is constant.
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    if x.len() != y.len() || x.len() < 2 {
        return 0.0;
    }
    let sx = x.iter().population_std_dev();
    let sy = y.iter().population_std_dev();
    if !(sx > 0.0 && sy > 0.0) {
        return 0.0;
    }
    let cov = x.iter().population_covariance(y.iter());
    finite_or_zero(cov / (sx * sy)).clamp(-1.0, 1.0)
}

/// Ordinary least-squares line `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineFit {
    pub slope: f64,
    pub intercept: f64,
    /// Coefficient of determination; `0.0` when `y` is constant.
    pub r_squared: f64,
    /// Root-mean-square residual.
    pub rms_residual: f64,
}

pub fn line_fit(x: &[f64], y: &[f64]) -> Option<LineFit> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let mx = mean(x);
    let my = mean(y);
    let sxx: f64 = x.iter().map(|&v| (v - mx) * (v - mx)).sum();
    if !(sxx > 0.0) {
        return None;
    }
    let sxy: f64 = x.iter().zip(y).map(|(&a, &b)| (a - mx) * (b - my)).sum();
    let slope = sxy / sxx;
    let intercept = my - slope * mx;
    let ss_res: f64 =
        x.iter().zip(y).map(|(&a, &b)| (b - (slope * a + intercept)).powi(2)).sum();
    let ss_tot: f64 = y.iter().map(|&b| (b - my).powi(2)).sum();
    let r_squared = if ss_tot > 0.0 { 1.0 - ss_res / ss_tot } else { 0.0 };
    let fit = LineFit {
        slope,
        intercept,
        r_squared: finite_or_zero(r_squared),
        rms_residual: finite_or_zero((ss_res / x.len() as f64).sqrt()),
    };
    if fit.slope.is_finite() && fit.intercept.is_finite() { Some(fit) } else { None }
}

/// Least-squares polynomial coefficients, lowest order first.
pub fn polyfit(x: &[f64], y: &[f64], degree: usize) -> Option<Vec<f64>> {
    let n = x.len();
    if n != y.len() || n <= degree {
        return None;
    }
    let a = DMatrix::from_fn(n, degree + 1, |i, j| x[i].powi(j as i32));
    let b = DVector::from_column_slice(y);
    let coeffs = a.svd(true, true).solve(&b, 1e-12).ok()?;
    if coeffs.iter().all(|c| c.is_finite()) { Some(coeffs.iter().copied().collect()) } else { None }
}

/// Magnitudes of the one-sided discrete Fourier transform, bins `0..=n/2`.
pub fn dft_magnitudes(signal: &[f64]) -> Vec<f64> {
    let n = signal.len();
    if n == 0 {
        return Vec::new();
    }
    let step = 2.0 * std::f64::consts::PI / n as f64;
    (0..=n / 2)
        .map(|k| {
            let (re, im) = signal.iter().enumerate().fold((0.0, 0.0), |(re, im), (t, &v)| {
                let phase = step * (k * t % n) as f64;
                (re + v * phase.cos(), im - v * phase.sin())
            });
            (re * re + im * im).sqrt()
        })
        .collect()
}

/// Centered moving average; the window shrinks at the edges.
pub fn moving_average(x: &[f64], half_window: usize) -> Vec<f64> {
    (0..x.len())
        .map(|i| {
            let lo = i.saturating_sub(half_window);
            let hi = (i + half_window + 1).min(x.len());
            mean(&x[lo..hi])
        })
        .collect()
}

/// Number of points in a leading or trailing fraction, never fewer than `min`
/// and never more than `n`.
pub fn fraction_count(n: usize, fraction: f64, min: usize) -> usize {
    (((n as f64) * fraction).round() as usize).max(min).min(n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pearson_handles_perfect_and_degenerate_cases() {
        let x = [1.0, 2.0, 3.0, 4.0];
        assert!((pearson(&x, &[2.0, 4.0, 6.0, 8.0]) - 1.0).abs() < 1e-12);
        assert!((pearson(&x, &[8.0, 6.0, 4.0, 2.0]) + 1.0).abs() < 1e-12);
        assert_eq!(pearson(&x, &[1.0, 1.0, 1.0, 1.0]), 0.0);
        assert_eq!(pearson(&x, &[1.0]), 0.0);
    }

    #[test]
    fn line_fit_recovers_exact_line() {
        let x = [0.0, 1.0, 2.0, 3.0];
        let y: Vec<f64> = x.iter().map(|v| -2.0 * v + 1.5).collect();

        let fit = line_fit(&x, &y).unwrap();

        assert!((fit.slope + 2.0).abs() < 1e-12);
        assert!((fit.intercept - 1.5).abs() < 1e-12);
        assert!((fit.r_squared - 1.0).abs() < 1e-12);
        assert!(fit.rms_residual < 1e-12);
        assert!(line_fit(&[1.0, 1.0], &[0.0, 1.0]).is_none());
    }

    #[test]
    fn polyfit_recovers_quadratic() {
        let x: Vec<f64> = (0..10).map(|i| i as f64 / 9.0).collect();
        let y: Vec<f64> = x.iter().map(|v| 0.5 - v + 3.0 * v * v).collect();

        let c = polyfit(&x, &y, 2).unwrap();

        assert!((c[0] - 0.5).abs() < 1e-9);
        assert!((c[1] + 1.0).abs() < 1e-9);
        assert!((c[2] - 3.0).abs() < 1e-9);
    }

    #[test]
    // Purpose
    // -------
    // A pure cosine at bin 3 puts all non-DC power in bin 3.
    fn dft_magnitudes_locates_pure_tone() {
        let n = 32;
        let signal: Vec<f64> = (0..n)
            .map(|t| (2.0 * std::f64::consts::PI * 3.0 * t as f64 / n as f64).cos())
            .collect();

        let mags = dft_magnitudes(&signal);

        assert_eq!(mags.len(), n / 2 + 1);
        let argmax = (1..mags.len()).max_by(|&a, &b| mags[a].total_cmp(&mags[b])).unwrap();
        assert_eq!(argmax, 3);
        assert!((mags[3] - n as f64 / 2.0).abs() < 1e-9);
    }

    #[test]
    fn moving_average_shrinks_at_edges() {
        let out = moving_average(&[1.0, 2.0, 3.0, 4.0], 1);
        assert_eq!(out, vec![1.5, 2.0, 3.0, 3.5]);
    }
}
