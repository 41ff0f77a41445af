//! Per-spectrum population flags, classifier confidences and parameter
//! estimates.
//!
//! Invariants & assumptions
//! ------------------------
//! - [`PopulationFlags`]: `unidentified == true` implies every other flag is
//!   false. Every mutator re-establishes this: setting `unidentified` clears
//!   the others, setting any other population clears `unidentified`.
//! - [`PopulationConfidence`]: values are probabilities in `[0, 1]`; `None`
//!   marks a classifier that was not evaluated.
//! - [`ParameterEstimate`]: an ordered map keyed by [`ParameterKind`]. It does
//!   not enforce ownership on insert; [`ParameterEstimate::restricted_to`]
//!   drops parameters whose population is not flagged.
use crate::populations::kinds::{ParameterKind, PopulationKind};
use std::collections::BTreeMap;

/// Presence flags for the fixed population set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PopulationFlags {
    flags: [bool; 4],
}

impl PopulationFlags {
    /// All populations absent.
    pub fn new() -> Self {
        Self::default()
    }

    /// Only `unidentified` set.
    pub fn unidentified() -> Self {
        let mut out = Self::new();
        out.set(PopulationKind::Unidentified, true);
        out
    }

    /// Flags with the given scatterer populations present.
    pub fn with_populations(populations: &[PopulationKind]) -> Self {
        let mut out = Self::new();
        for &p in populations {
            out.set(p, true);
        }
        out
    }

    pub fn get(&self, kind: PopulationKind) -> bool {
        self.flags[kind.index()]
    }

    pub fn set(&mut self, kind: PopulationKind, value: bool) {
        self.flags[kind.index()] = value;
        if value {
            if kind == PopulationKind::Unidentified {
                for p in PopulationKind::SCATTERERS {
                    self.flags[p.index()] = false;
                }
            } else {
                self.flags[PopulationKind::Unidentified.index()] = false;
            }
        }
    }

    pub fn is_unidentified(&self) -> bool {
        self.get(PopulationKind::Unidentified)
    }

    /// Flagged scatterer populations in canonical order.
    pub fn identified(&self) -> Vec<PopulationKind> {
        PopulationKind::SCATTERERS.into_iter().filter(|&p| self.get(p)).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PopulationKind, bool)> + '_ {
        PopulationKind::ALL.into_iter().map(move |p| (p, self.get(p)))
    }
}

/// Classifier probabilities per population.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PopulationConfidence {
    values: [Option<f64>; 4],
}

impl PopulationConfidence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, kind: PopulationKind) -> Option<f64> {
        self.values[kind.index()]
    }

    pub fn set(&mut self, kind: PopulationKind, value: Option<f64>) {
        self.values[kind.index()] = value;
    }

    pub fn iter(&self) -> impl Iterator<Item = (PopulationKind, Option<f64>)> + '_ {
        PopulationKind::ALL.into_iter().map(move |p| (p, self.get(p)))
    }
}

/// Partial assignment of physical parameter values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParameterEstimate {
    values: BTreeMap<ParameterKind, f64>,
}

impl ParameterEstimate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every parameter present for `flags`, at its default value.
    ///
    /// Unidentified spectra get an empty estimate. Otherwise the floor and the
    /// owned parameters of each flagged population are included.
    pub fn defaults_for(flags: &PopulationFlags) -> Self {
        let mut out = Self::new();
        if flags.is_unidentified() {
            return out;
        }
        out.insert(ParameterKind::I0Floor, ParameterKind::I0Floor.default_value());
        for pop in flags.identified() {
            for &param in pop.owned_parameters() {
                out.insert(param, param.default_value());
            }
        }
        out
    }

    pub fn get(&self, kind: ParameterKind) -> Option<f64> {
        self.values.get(&kind).copied()
    }

    pub fn insert(&mut self, kind: ParameterKind, value: f64) -> Option<f64> {
        self.values.insert(kind, value)
    }

    pub fn remove(&mut self, kind: ParameterKind) -> Option<f64> {
        self.values.remove(&kind)
    }

    pub fn contains(&self, kind: ParameterKind) -> bool {
        self.values.contains_key(&kind)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = ParameterKind> + '_ {
        self.values.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ParameterKind, f64)> + '_ {
        self.values.iter().map(|(&k, &v)| (k, v))
    }

    /// Overwrite entries with the values present in `other`.
    pub fn merge(&mut self, other: &ParameterEstimate) {
        for (k, v) in other.iter() {
            self.values.insert(k, v);
        }
    }

    /// Copy keeping only parameters that exist under `flags`.
    pub fn restricted_to(&self, flags: &PopulationFlags) -> Self {
        if flags.is_unidentified() {
            return Self::new();
        }
        let values = self
            .values
            .iter()
            .filter(|(k, _)| k.owner().map_or(true, |owner| flags.get(owner)))
            .map(|(&k, &v)| (k, v))
            .collect();
        Self { values }
    }
}

impl FromIterator<(ParameterKind, f64)> for ParameterEstimate {
    fn from_iter<T: IntoIterator<Item = (ParameterKind, f64)>>(iter: T) -> Self {
        Self { values: iter.into_iter().collect() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // The unidentified-exclusivity invariant and estimate restriction.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Setting `unidentified` clears every scatterer flag and vice versa.
    fn flags_keep_unidentified_exclusive() {
        let mut flags = PopulationFlags::with_populations(&[
            PopulationKind::SphericalNormal,
            PopulationKind::DiffractionPeaks,
        ]);
        assert_eq!(
            flags.identified(),
            vec![PopulationKind::SphericalNormal, PopulationKind::DiffractionPeaks]
        );

        flags.set(PopulationKind::Unidentified, true);
        assert!(flags.is_unidentified());
        assert!(flags.identified().is_empty());

        flags.set(PopulationKind::GuinierPorod, true);
        assert!(!flags.is_unidentified());
        assert_eq!(flags.identified(), vec![PopulationKind::GuinierPorod]);
    }

    #[test]
    fn clearing_a_flag_does_not_touch_others() {
        let mut flags = PopulationFlags::with_populations(&[PopulationKind::GuinierPorod]);
        flags.set(PopulationKind::SphericalNormal, false);
        assert!(flags.get(PopulationKind::GuinierPorod));
    }

    #[test]
    // Purpose
    // -------
    // Defaults include the floor plus each flagged population's parameters.
    fn defaults_for_follow_flags() {
        let flags = PopulationFlags::with_populations(&[PopulationKind::GuinierPorod]);

        let est = ParameterEstimate::defaults_for(&flags);

        let keys: Vec<_> = est.keys().collect();
        assert_eq!(
            keys,
            vec![ParameterKind::I0Floor, ParameterKind::GGp, ParameterKind::RgGp, ParameterKind::DGp]
        );
        assert!(ParameterEstimate::defaults_for(&PopulationFlags::unidentified()).is_empty());
    }

    #[test]
    fn restricted_to_drops_unflagged_populations() {
        let est: ParameterEstimate = [
            (ParameterKind::I0Floor, 0.1),
            (ParameterKind::R0Sphere, 30.0),
            (ParameterKind::RgGp, 12.0),
        ]
        .into_iter()
        .collect();
        let flags = PopulationFlags::with_populations(&[PopulationKind::SphericalNormal]);

        let out = est.restricted_to(&flags);

        assert_eq!(out.get(ParameterKind::R0Sphere), Some(30.0));
        assert_eq!(out.get(ParameterKind::I0Floor), Some(0.1));
        assert!(!out.contains(ParameterKind::RgGp));
    }
}
