//! The SAXS fit objective as an optimizer [`Objective`].
use std::sync::Mutex;

use crate::{
    fitting::{data::FitData, layout::ParameterLayout},
    optimization::{
        errors::{OptError, OptResult},
        least_squares::{Cost, Objective, Theta},
    },
    physics::intensity::compute_saxs,
    populations::{ParameterEstimate, PopulationFlags},
};

/// Weighted mean squared log residual of the composite model, as a function
/// of the free parameters in `layout`.
///
/// Every finite evaluation is compared against the lowest seen so far, so a
/// solver that stops with an error still leaves its best point behind.
#[derive(Debug)]
pub struct SaxsObjective {
    flags: PopulationFlags,
    layout: ParameterLayout,
    best: Mutex<Option<(Cost, Theta)>>,
}

impl SaxsObjective {
    pub fn new(flags: PopulationFlags, layout: ParameterLayout) -> Self {
        Self { flags, layout, best: Mutex::new(None) }
    }

    pub fn layout(&self) -> &ParameterLayout {
        &self.layout
    }

    /// Objective value at a full parameter set.
    pub fn evaluate(&self, params: &ParameterEstimate, data: &FitData) -> f64 {
        let model = compute_saxs(data.q_fit(), &self.flags, params);
        data.objective(&model)
    }

    /// Lowest finite value passed through [`Objective::value`] and its `θ`.
    pub fn best(&self) -> Option<(Cost, Theta)> {
        self.best.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).clone()
    }

    fn record(&self, cost: Cost, theta: &Theta) {
        if !cost.is_finite() {
            return;
        }
        let mut best = self.best.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if best.as_ref().map_or(true, |(c, _)| cost < *c) {
            *best = Some((cost, theta.clone()));
        }
    }
}

impl Objective for SaxsObjective {
    type Data = FitData;

    fn value(&self, theta: &Theta, data: &FitData) -> OptResult<Cost> {
        let params = self.layout.params_at(theta)?;
        let cost = self.evaluate(&params, data);
        self.record(cost, theta);
        Ok(cost)
    }

    fn check(&self, theta: &Theta, _data: &FitData) -> OptResult<()> {
        if theta.len() != self.layout.n_free() {
            return Err(OptError::ThetaLengthMismatch {
                expected: self.layout.n_free(),
                actual: theta.len(),
            });
        }
        if let Some((index, &value)) = theta.iter().enumerate().find(|(_, t)| !t.is_finite()) {
            return Err(OptError::InvalidThetaInput { index, value });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        fitting::layout::ParameterBounds,
        physics::spherical_normal,
        populations::{ParameterKind, PopulationKind},
        spectrum::Spectrum,
    };
    use ndarray::Array1;
    use std::collections::BTreeSet;

    fn sphere_params(i0: f64) -> ParameterEstimate {
        [
            (ParameterKind::I0Floor, 0.5),
            (ParameterKind::I0Sphere, i0),
            (ParameterKind::R0Sphere, 40.0),
            (ParameterKind::SigmaSphere, 0.05),
        ]
        .into_iter()
        .collect()
    }

    fn layout_at(i0: f64) -> ParameterLayout {
        let fixed: BTreeSet<_> = [ParameterKind::R0Sphere, ParameterKind::SigmaSphere].into();
        ParameterLayout::new(&sphere_params(i0), &fixed, &ParameterBounds::new()).unwrap()
    }

    #[test]
    // Purpose
    // -------
    // The objective remembers the lowest value it has returned and the θ
    // that produced it, whatever order the points arrive in.
    //
    // Given
    // -----
    // - A noise-free sphere curve with I0 = 1000.
    // - θ for I0 = 100, then for the true I0, then for I0 = 10.
    //
    // Expect
    // ------
    // - Nothing recorded before the first evaluation.
    // - The recorded best is the true-I0 point after all three.
    fn lowest_evaluation_is_recorded() {
        // Arrange
        let q = Array1::linspace(0.01, 0.3, 120);
        let i = spherical_normal(q.view(), 1000.0, 40.0, 0.05).mapv(|v| v + 0.5);
        let data = FitData::new(&Spectrum::new(q, i).unwrap(), None, true).unwrap();
        let flags = PopulationFlags::with_populations(&[PopulationKind::SphericalNormal]);
        let objective = SaxsObjective::new(flags, layout_at(100.0));
        let truth = layout_at(1000.0).theta0();
        assert!(objective.best().is_none());

        // Act
        let start = objective.value(&objective.layout().theta0(), &data).unwrap();
        let at_truth = objective.value(&truth, &data).unwrap();
        objective.value(&layout_at(10.0).theta0(), &data).unwrap();

        // Assert
        assert!(at_truth < start);
        let (cost, theta) = objective.best().unwrap();
        assert_eq!(cost, at_truth);
        assert_eq!(theta, truth);
    }
}
