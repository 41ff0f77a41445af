//! Mapping between a [`ParameterEstimate`] and the optimizer vector `θ`.
//!
//! Fixed parameters are held out of `θ`; each free parameter occupies one
//! coordinate in canonical [`ParameterKind`] order and is mapped into its box
//! by [`BoundedTransform`].
use std::collections::{BTreeMap, BTreeSet};

use crate::{
    fitting::errors::{FitError, FitResult},
    optimization::{errors::OptResult, least_squares::Theta, numerical_stability::BoundedTransform},
    populations::{ParameterEstimate, ParameterKind},
};

/// Custom `(lower, upper)` limits per parameter; `None` means unbounded above.
/// Parameters without an entry use [`ParameterKind::limits`].
pub type ParameterBounds = BTreeMap<ParameterKind, (f64, Option<f64>)>;

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterLayout {
    base: ParameterEstimate,
    free: Vec<ParameterKind>,
    transform: BoundedTransform,
}

impl ParameterLayout {
    /// Lay out `start`, holding the parameters in `fixed` at their values.
    ///
    /// Free start values are clamped into their bounds.
    ///
    /// # Errors
    /// - [`FitError::InvalidBounds`] for a non-finite lower bound or an upper
    ///   bound not strictly above the lower one.
    /// - [`FitError::Optimizer`] when a start value is not finite.
    pub fn new(
        start: &ParameterEstimate, fixed: &BTreeSet<ParameterKind>, bounds: &ParameterBounds,
    ) -> FitResult<Self> {
        let mut base = start.clone();
        let mut free = Vec::new();
        let mut limits = Vec::new();
        let mut x0 = Vec::new();
        for (param, value) in start.iter() {
            if fixed.contains(&param) {
                continue;
            }
            let (lower, upper) = bounds.get(&param).copied().unwrap_or_else(|| param.limits());
            let valid = lower.is_finite() && upper.map_or(true, |u| u.is_finite() && u > lower);
            if !valid {
                return Err(FitError::InvalidBounds {
                    param,
                    lower,
                    upper: upper.unwrap_or(f64::INFINITY),
                });
            }
            let clamped = match upper {
                Some(u) => value.max(lower).min(u),
                None => value.max(lower),
            };
            base.insert(param, clamped);
            free.push(param);
            limits.push((lower, upper));
            x0.push(clamped);
        }
        let transform = BoundedTransform::new(&limits, &x0)?;
        Ok(Self { base, free, transform })
    }

    pub fn n_free(&self) -> usize {
        self.free.len()
    }

    pub fn free(&self) -> &[ParameterKind] {
        &self.free
    }

    /// Start values with free parameters clamped into their bounds.
    pub fn start(&self) -> &ParameterEstimate {
        &self.base
    }

    /// Unconstrained start vector.
    pub fn theta0(&self) -> Theta {
        let x0: Vec<f64> = self.free.iter().filter_map(|&p| self.base.get(p)).collect();
        self.transform.to_unconstrained(&x0)
    }

    /// Full parameter set at `theta`.
    ///
    /// # Errors
    /// [`OptError::ThetaLengthMismatch`](crate::optimization::errors::OptError::ThetaLengthMismatch)
    /// when `theta` has the wrong length.
    pub fn params_at(&self, theta: &Theta) -> OptResult<ParameterEstimate> {
        let values = self.transform.to_constrained(theta)?;
        let mut out = self.base.clone();
        for (&param, value) in self.free.iter().zip(values) {
            out.insert(param, value);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start() -> ParameterEstimate {
        [
            (ParameterKind::I0Floor, 0.5),
            (ParameterKind::I0Sphere, 1000.0),
            (ParameterKind::R0Sphere, 40.0),
            (ParameterKind::SigmaSphere, 0.05),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    // Purpose
    // -------
    // Fixed parameters stay out of θ and the start point survives the round
    // trip through θ-space.
    fn fixed_parameters_are_held_out() {
        // Arrange
        let fixed: BTreeSet<_> = [ParameterKind::R0Sphere, ParameterKind::SigmaSphere].into();

        // Act
        let layout = ParameterLayout::new(&start(), &fixed, &ParameterBounds::new()).unwrap();
        let back = layout.params_at(&layout.theta0()).unwrap();

        // Assert
        assert_eq!(layout.free(), &[ParameterKind::I0Floor, ParameterKind::I0Sphere]);
        assert_eq!(back.get(ParameterKind::R0Sphere), Some(40.0));
        assert!((back.get(ParameterKind::I0Sphere).unwrap() - 1000.0).abs() < 1e-6);
        assert!((back.get(ParameterKind::I0Floor).unwrap() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn start_outside_custom_bounds_is_clamped() {
        let bounds: ParameterBounds = [(ParameterKind::R0Sphere, (10.0, Some(30.0)))].into();
        let layout = ParameterLayout::new(&start(), &BTreeSet::new(), &bounds).unwrap();
        assert_eq!(layout.start().get(ParameterKind::R0Sphere), Some(30.0));
        let r0 = layout.params_at(&layout.theta0()).unwrap().get(ParameterKind::R0Sphere).unwrap();
        assert!(r0 <= 30.0 && r0 > 29.9);
    }

    #[test]
    fn invalid_custom_bounds_are_rejected() {
        let bounds: ParameterBounds = [(ParameterKind::I0Sphere, (5.0, Some(1.0)))].into();
        let err = ParameterLayout::new(&start(), &BTreeSet::new(), &bounds).unwrap_err();
        assert_eq!(
            err,
            FitError::InvalidBounds { param: ParameterKind::I0Sphere, lower: 5.0, upper: 1.0 }
        );
    }
}
