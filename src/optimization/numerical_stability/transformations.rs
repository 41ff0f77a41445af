//! Numerical stability utilities.
//!
//! Provides safe implementations of the nonlinear transforms used to map an
//! unconstrained optimizer vector onto bounded physical parameters. Guarded
//! cutoffs (`|x| > 20.0`) keep `f64` arithmetic in a well-conditioned regime.
//!
//! # Provided items
//! - [`LOGIT_EPS`]: clamp margin keeping logistic arguments away from 0 and 1.
//! - [`safe_softplus`] / [`safe_softplus_inv`]: ℝ ↔ (0, ∞).
//! - [`safe_logistic`] / [`safe_logit`]: ℝ ↔ (0, 1).

/// Margin used to clamp probabilities before taking a logit.
///
/// A parameter initialised exactly on a box edge maps to `logit(ε)` or
/// `logit(1 - ε)` instead of ±∞.
pub const LOGIT_EPS: f64 = 1e-9;

/// Numerically stable softplus: `softplus(x) = ln(1 + exp(x))`.
///
/// - For sufficiently large `x`, `softplus(x) ≈ x + ln1p(exp(-x)) ≈ x`.
/// - Otherwise, it falls back to `ln1p(exp(x))`.
pub fn safe_softplus(x: f64) -> f64 {
    if x > 20.0 { x } else { x.exp().ln_1p() }
}

/// Stable inverse of softplus on `(0, ∞)`: solves for `t` in
/// `softplus(t) = x`, returning `t = ln(exp(x) - 1)`.
///
/// - For sufficiently large `x`, `ln(exp(x) - 1) ≈ x`.
/// - Otherwise, it uses `ln(expm1(x))`.
///
/// `x` must be finite and `> 0`; callers clamp before inverting.
pub fn safe_softplus_inv(x: f64) -> f64 {
    if x > 20.0 { x } else { x.exp_m1().ln() }
}

/// Numerically stable logistic `1 / (1 + exp(-x))`.
///
/// Evaluates `exp` only on non-positive arguments so neither branch
/// overflows.
pub fn safe_logistic(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Logit `ln(p / (1 - p))` with `p` clamped into `[LOGIT_EPS, 1 - LOGIT_EPS]`.
pub fn safe_logit(p: f64) -> f64 {
    let p = p.clamp(LOGIT_EPS, 1.0 - LOGIT_EPS);
    (p / (1.0 - p)).ln()
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // Agreement with naïve formulas on safe grids, tail behaviour and
    // inverse round trips.
    // -------------------------------------------------------------------------

    #[test]
    fn softplus_matches_naive_formula_and_inverts() {
        for &x in &[-10.0, -1.0, 0.0, 0.5, 3.0, 15.0] {
            let naive = (1.0 + f64::exp(x)).ln();
            assert!((safe_softplus(x) - naive).abs() < 1e-12);
            assert!((safe_softplus_inv(safe_softplus(x)) - x).abs() < 1e-8);
        }
        assert_eq!(safe_softplus(50.0), 50.0);
    }

    #[test]
    // Purpose
    // -------
    // The logistic never overflows and is symmetric: σ(-x) = 1 - σ(x).
    fn logistic_is_stable_and_symmetric() {
        for &x in &[-800.0, -30.0, -2.0, 0.0, 2.0, 30.0, 800.0] {
            let s = safe_logistic(x);
            assert!(s.is_finite() && (0.0..=1.0).contains(&s));
            assert!((safe_logistic(-x) - (1.0 - s)).abs() < 1e-12);
        }
        assert_eq!(safe_logistic(0.0), 0.5);
    }

    #[test]
    fn logit_inverts_logistic_and_clamps_edges() {
        for &x in &[-5.0, -0.3, 0.0, 1.7, 6.0] {
            assert!((safe_logit(safe_logistic(x)) - x).abs() < 1e-8);
        }
        assert!(safe_logit(0.0).is_finite());
        assert!(safe_logit(1.0).is_finite());
    }
}
