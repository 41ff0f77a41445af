//! Adapter that exposes a user [`Objective`] as an `argmin` problem.
//!
//! The objective is minimized as-is. Analytic gradients are validated and
//! passed through; without one, the cost closure is finite-differenced.
use std::cell::RefCell;

use crate::optimization::{
    errors::OptError,
    least_squares::{
        traits::Objective,
        types::{Cost, Grad, Theta},
        validation::validate_grad,
    },
};
use argmin::core::{CostFunction, Error, Gradient};
use finitediff::FiniteDiff;

/// Bridges a user [`Objective`] to `argmin`'s `CostFunction` and `Gradient`.
#[derive(Debug, Clone)]
pub struct ArgMinAdapter<'a, F: Objective> {
    pub f: &'a F,
    pub data: &'a F::Data,
}

impl<'a, F: Objective> CostFunction for ArgMinAdapter<'a, F> {
    type Param = Theta;
    type Output = Cost;

    /// Evaluate `c(θ)`.
    ///
    /// # Errors
    /// Propagates any `OptError` from the user's `value`, and returns
    /// [`OptError::NonFiniteCost`] for a NaN or infinite result.
    fn cost(&self, theta: &Self::Param) -> Result<Self::Output, Error> {
        let output = self.f.value(theta, self.data)?;
        if !output.is_finite() {
            return Err((OptError::NonFiniteCost { value: output }).into());
        }
        Ok(output)
    }
}

impl<'a, F: Objective> Gradient for ArgMinAdapter<'a, F> {
    type Param = Theta;
    type Gradient = Grad;

    /// Evaluate `∇c(θ)`.
    ///
    /// Without an analytic gradient, central differences are tried first.
    /// If a cost evaluation failed inside the FD closure, or the central
    /// gradient is non-finite, forward differences are used instead.
    ///
    /// The FD closure must return `f64`, so the first error raised inside it
    /// is parked in `closure_err` and `NaN` is returned.
    ///
    /// # Errors
    /// - Propagates user errors from `grad` other than `GradientNotImplemented`.
    /// - Propagates cost errors raised during forward differencing.
    /// - Returns validation errors for wrong dimension or non-finite entries.
    fn gradient(&self, theta: &Self::Param) -> Result<Self::Gradient, Error> {
        let dim = theta.len();
        match self.f.grad(theta, self.data) {
            Ok(g) => {
                validate_grad(&g, dim)?;
                Ok(g)
            }
            Err(OptError::GradientNotImplemented) => {
                let closure_err: RefCell<Option<Error>> = RefCell::new(None);
                let cost_func = |theta: &Theta| -> f64 {
                    match self.cost(theta) {
                        Ok(val) => val,
                        Err(e) => {
                            let mut slot = closure_err.borrow_mut();
                            if slot.is_none() {
                                *slot = Some(e);
                            }
                            f64::NAN
                        }
                    }
                };
                let fd_grad = theta.central_diff(&cost_func);
                if closure_err.borrow().is_some() {
                    return run_fd_diff(theta, &cost_func, &closure_err);
                }
                match validate_grad(&fd_grad, dim) {
                    Ok(()) => Ok(fd_grad),
                    Err(_) => run_fd_diff(theta, &cost_func, &closure_err),
                }
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl<'a, F: Objective> ArgMinAdapter<'a, F> {
    /// Construct a new adapter over a user [`Objective`] and its data.
    pub fn new(f: &'a F, data: &'a F::Data) -> Self {
        Self { f, data }
    }
}

/// Forward-difference gradient of `func` at `theta`, with error capture.
///
/// Clears `closure_err`, differentiates, surfaces any captured error and
/// validates the result.
fn run_fd_diff<G: Fn(&Theta) -> f64>(
    theta: &Theta, func: &G, closure_err: &RefCell<Option<Error>>,
) -> Result<Grad, Error> {
    closure_err.replace(None);
    let fd_grad = theta.forward_diff(func);
    if let Some(err) = closure_err.take() {
        return Err(err);
    }
    validate_grad(&fd_grad, theta.len())?;
    Ok(fd_grad)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::errors::OptResult;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Cost pass-through and rejection of non-finite costs.
    // - Analytic gradient pass-through and FD fallback.
    // - Propagation of user errors raised inside the FD closure.
    //
    // They intentionally DO NOT cover:
    // - Solver behavior (see `api` tests).
    // -------------------------------------------------------------------------

    struct Quadratic;

    impl Objective for Quadratic {
        type Data = f64;

        fn value(&self, theta: &Theta, shift: &f64) -> OptResult<Cost> {
            Ok(theta.iter().map(|t| (t - shift).powi(2)).sum())
        }

        fn check(&self, _theta: &Theta, _data: &f64) -> OptResult<()> {
            Ok(())
        }
    }

    struct WithGradient;

    impl Objective for WithGradient {
        type Data = ();

        fn value(&self, theta: &Theta, _: &()) -> OptResult<Cost> {
            Ok(theta.dot(theta))
        }

        fn check(&self, _theta: &Theta, _data: &()) -> OptResult<()> {
            Ok(())
        }

        fn grad(&self, theta: &Theta, _: &()) -> OptResult<Grad> {
            Ok(theta.mapv(|t| 2.0 * t))
        }
    }

    struct FailsAwayFromOrigin;

    impl Objective for FailsAwayFromOrigin {
        type Data = ();

        fn value(&self, theta: &Theta, _: &()) -> OptResult<Cost> {
            if theta.iter().any(|t| t.abs() > 0.5) {
                return Err(OptError::InvalidThetaInput { index: 0, value: theta[0] });
            }
            Ok(theta.dot(theta))
        }

        fn check(&self, _theta: &Theta, _data: &()) -> OptResult<()> {
            Ok(())
        }
    }

    #[test]
    // Purpose
    // -------
    // Without an analytic gradient, the FD gradient of a shifted quadratic
    // matches 2(θ - shift).
    fn fd_gradient_matches_quadratic() {
        // Arrange
        let adapter = ArgMinAdapter::new(&Quadratic, &1.0);
        let theta = array![0.0, 3.0];

        // Act
        let g = adapter.gradient(&theta).unwrap();

        // Assert
        assert!((g[0] + 2.0).abs() < 1e-5);
        assert!((g[1] - 4.0).abs() < 1e-5);
        assert_eq!(adapter.cost(&theta).unwrap(), 5.0);
    }

    #[test]
    fn analytic_gradient_is_not_negated() {
        let adapter = ArgMinAdapter::new(&WithGradient, &());
        let g = adapter.gradient(&array![1.0, -2.0]).unwrap();
        assert_eq!(g, array![2.0, -4.0]);
    }

    #[test]
    // Purpose
    // -------
    // A user error raised during differencing surfaces as an error instead
    // of a NaN gradient.
    fn cost_error_inside_fd_is_propagated() {
        let adapter = ArgMinAdapter::new(&FailsAwayFromOrigin, &());
        let result = adapter.gradient(&array![0.5]);
        assert!(result.is_err());
    }
}
