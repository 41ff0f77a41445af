//! Coordinate-wise maps between bounded parameters and the unconstrained
//! optimizer vector `θ`.
//!
//! - `[lo, hi]` boxes use `x = lo + (hi - lo) · logistic(t)`.
//! - `[lo, ∞)` half-lines use `x = lo + s · softplus(t)`, where the scale `s`
//!   is the distance of the initial value from `lo`, so that `t` starts at
//!   `softplus⁻¹(1)` whatever the magnitude of the parameter.
//!
//! The inverse maps clamp into the open domain, so a start value sitting on a
//! bound is moved just inside it.
use crate::optimization::{
    errors::{OptError, OptResult},
    numerical_stability::transformations::{
        safe_logistic, safe_logit, safe_softplus, safe_softplus_inv,
    },
};
use ndarray::Array1;

/// Smallest softplus argument used when inverting a start value on `lo`.
const MIN_SOFTPLUS_ARG: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CoordinateMap {
    Interval { lower: f64, upper: f64 },
    LowerBounded { lower: f64, scale: f64 },
}

impl CoordinateMap {
    pub fn to_constrained(&self, t: f64) -> f64 {
        match *self {
            CoordinateMap::Interval { lower, upper } => lower + (upper - lower) * safe_logistic(t),
            CoordinateMap::LowerBounded { lower, scale } => lower + scale * safe_softplus(t),
        }
    }

    pub fn to_unconstrained(&self, x: f64) -> f64 {
        match *self {
            CoordinateMap::Interval { lower, upper } => safe_logit((x - lower) / (upper - lower)),
            CoordinateMap::LowerBounded { lower, scale } => {
                safe_softplus_inv(((x - lower) / scale).max(MIN_SOFTPLUS_ARG))
            }
        }
    }
}

/// Vector of [`CoordinateMap`]s, one per free parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundedTransform {
    maps: Vec<CoordinateMap>,
}

impl BoundedTransform {
    /// Build maps for `bounds` around the start values `x0`.
    ///
    /// # Errors
    /// - [`OptError::ThetaLengthMismatch`] when `bounds` and `x0` differ in length.
    /// - [`OptError::InvalidBounds`] for a non-finite lower bound or an upper
    ///   bound not strictly above the lower one.
    /// - [`OptError::InvalidThetaInput`] for a non-finite start value.
    pub fn new(bounds: &[(f64, Option<f64>)], x0: &[f64]) -> OptResult<Self> {
        if bounds.len() != x0.len() {
            return Err(OptError::ThetaLengthMismatch { expected: bounds.len(), actual: x0.len() });
        }
        let mut maps = Vec::with_capacity(bounds.len());
        for (index, (&(lower, upper), &x)) in bounds.iter().zip(x0).enumerate() {
            if !x.is_finite() {
                return Err(OptError::InvalidThetaInput { index, value: x });
            }
            let map = match upper {
                Some(upper) => {
                    if !lower.is_finite() || !upper.is_finite() || upper <= lower {
                        return Err(OptError::InvalidBounds { index, lower, upper });
                    }
                    CoordinateMap::Interval { lower, upper }
                }
                None => {
                    if !lower.is_finite() {
                        return Err(OptError::InvalidBounds { index, lower, upper: f64::INFINITY });
                    }
                    let gap = x - lower;
                    let scale = if gap > 0.0 { gap } else { lower.abs().max(1.0) };
                    CoordinateMap::LowerBounded { lower, scale }
                }
            };
            maps.push(map);
        }
        Ok(Self { maps })
    }

    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }

    pub fn to_unconstrained(&self, x: &[f64]) -> Array1<f64> {
        self.maps.iter().zip(x).map(|(m, &v)| m.to_unconstrained(v)).collect()
    }

    /// Map `θ` back to parameter space.
    ///
    /// # Errors
    /// [`OptError::ThetaLengthMismatch`] when `theta` has the wrong length.
    pub fn to_constrained(&self, theta: &Array1<f64>) -> OptResult<Vec<f64>> {
        if theta.len() != self.maps.len() {
            return Err(OptError::ThetaLengthMismatch {
                expected: self.maps.len(),
                actual: theta.len(),
            });
        }
        Ok(self.maps.iter().zip(theta.iter()).map(|(m, &t)| m.to_constrained(t)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    // Purpose
    // -------
    // Interior start values survive a round trip through θ-space and every θ
    // maps inside the bounds.
    fn round_trip_and_range() {
        let bounds = [(0.0, Some(4.0)), (1.0, None), (0.0, None)];
        let x0 = [2.5, 1e4, 0.3];
        let tr = BoundedTransform::new(&bounds, &x0).unwrap();

        let theta = tr.to_unconstrained(&x0);
        let back = tr.to_constrained(&theta).unwrap();
        for (a, b) in back.iter().zip(&x0) {
            assert!((a - b).abs() <= 1e-9 * b.abs().max(1.0));
        }

        let far = Array1::from(vec![-50.0, -50.0, 50.0]);
        let x = tr.to_constrained(&far).unwrap();
        assert!(x[0] >= 0.0 && x[0] <= 4.0);
        assert!(x[1] >= 1.0);
        assert!(x[2] > 0.0);
    }

    #[test]
    // Purpose
    // -------
    // The softplus scale puts every half-line start value at the same θ.
    fn lower_bounded_start_is_scale_free() {
        let tr = BoundedTransform::new(&[(0.0, None), (0.0, None)], &[1e-3, 1e5]).unwrap();
        let theta = tr.to_unconstrained(&[1e-3, 1e5]);
        assert!((theta[0] - theta[1]).abs() < 1e-12);
    }

    #[test]
    fn start_on_bound_moves_inside() {
        let tr = BoundedTransform::new(&[(0.0, None), (0.0, Some(0.5))], &[0.0, 0.0]).unwrap();
        let theta = tr.to_unconstrained(&[0.0, 0.0]);
        assert!(theta.iter().all(|t| t.is_finite()));
    }

    #[test]
    fn rejects_invalid_bounds() {
        let err = BoundedTransform::new(&[(1.0, Some(1.0))], &[1.0]).unwrap_err();
        assert_eq!(err, OptError::InvalidBounds { index: 0, lower: 1.0, upper: 1.0 });
        assert!(matches!(
            BoundedTransform::new(&[(0.0, None)], &[f64::NAN]),
            Err(OptError::InvalidThetaInput { index: 0, .. })
        ));
        assert!(matches!(
            BoundedTransform::new(&[(0.0, None)], &[]),
            Err(OptError::ThetaLengthMismatch { .. })
        ));
    }
}
