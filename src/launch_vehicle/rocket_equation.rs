//! Tsiolkovsky rocket equation solver.
//!
//! `Δv = Isp · g0 · ln(m0 / mf)` relates four quantities; given any three
//! the fourth follows. Every operand may be a scalar or an array, evaluated
//! elementwise with length-1 operands broadcast against longer ones.
//!
//! # Example
//!
//! ```rust
//! use isst::launch_vehicle::rocket_equation::RocketEquation;
//!
//! // Ariane 5 ECA core stage: how much propellant can 3600 m/s cost?
//! let solution = RocketEquation::new()
//!     .delta_v(3600.0)
//!     .isp(310.0)
//!     .final_mass(vec![20_000.0, 25_000.0])
//!     .solve()
//!     .unwrap();
//! assert_eq!(solution.initial_mass.len(), 2);
//! assert!(solution.initial_mass[0] > 20_000.0);
//! ```

use serde::{Deserialize, Serialize};

use crate::engine::jidoka::FiniteGuard;
use crate::error::{IsstError, IsstResult};

/// Standard gravity used by the rocket equation (m/s²).
pub const G0: f64 = 9.81;

/// A scalar or array operand of the rocket equation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Operand(Vec<f64>);

impl Operand {
    /// Values of the operand.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.0
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if the operand holds no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Element `i`, repeating a scalar operand.
    fn at(&self, i: usize) -> f64 {
        if self.0.len() == 1 {
            self.0[0]
        } else {
            self.0[i]
        }
    }
}

impl From<f64> for Operand {
    fn from(value: f64) -> Self {
        Self(vec![value])
    }
}

impl From<Vec<f64>> for Operand {
    fn from(values: Vec<f64>) -> Self {
        Self(values)
    }
}

impl From<&[f64]> for Operand {
    fn from(values: &[f64]) -> Self {
        Self(values.to_vec())
    }
}

impl<const N: usize> From<[f64; N]> for Operand {
    fn from(values: [f64; N]) -> Self {
        Self(values.to_vec())
    }
}

/// The quantity being solved for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Unknown {
    /// Delta-V (m/s).
    DeltaV,
    /// Specific impulse (s).
    SpecificImpulse,
    /// Initial (wet) mass (kg).
    InitialMass,
    /// Final (dry) mass (kg).
    FinalMass,
}

impl Unknown {
    /// Parameter name used in error messages.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::DeltaV => "delta_v",
            Self::SpecificImpulse => "isp",
            Self::InitialMass => "initial_mass",
            Self::FinalMass => "final_mass",
        }
    }
}

/// Rocket equation inputs; exactly one field must be left unset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RocketEquation {
    /// Delta-V (m/s).
    pub delta_v: Option<Operand>,
    /// Specific impulse (s).
    pub isp: Option<Operand>,
    /// Initial (wet) mass (kg).
    pub initial_mass: Option<Operand>,
    /// Final (dry) mass (kg).
    pub final_mass: Option<Operand>,
}

/// Complete set of rocket equation parameters, one entry per element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RocketSolution {
    /// Which quantity was solved for.
    pub solved_for: Unknown,
    /// Delta-V (m/s).
    pub delta_v: Vec<f64>,
    /// Specific impulse (s).
    pub isp: Vec<f64>,
    /// Initial (wet) mass (kg).
    pub initial_mass: Vec<f64>,
    /// Final (dry) mass (kg).
    pub final_mass: Vec<f64>,
}

impl RocketEquation {
    /// Empty equation with every quantity unknown.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set delta-V (m/s).
    #[must_use]
    pub fn delta_v(mut self, value: impl Into<Operand>) -> Self {
        self.delta_v = Some(value.into());
        self
    }

    /// Set specific impulse (s).
    #[must_use]
    pub fn isp(mut self, value: impl Into<Operand>) -> Self {
        self.isp = Some(value.into());
        self
    }

    /// Set initial mass (kg).
    #[must_use]
    pub fn initial_mass(mut self, value: impl Into<Operand>) -> Self {
        self.initial_mass = Some(value.into());
        self
    }

    /// Set final mass (kg).
    #[must_use]
    pub fn final_mass(mut self, value: impl Into<Operand>) -> Self {
        self.final_mass = Some(value.into());
        self
    }

    /// Identify the single unset quantity.
    ///
    /// # Errors
    ///
    /// Returns `RocketEquation` if zero or more than one quantity is unset.
    pub fn unknown(&self) -> IsstResult<Unknown> {
        let missing: Vec<Unknown> = [
            (Unknown::DeltaV, self.delta_v.is_none()),
            (Unknown::SpecificImpulse, self.isp.is_none()),
            (Unknown::InitialMass, self.initial_mass.is_none()),
            (Unknown::FinalMass, self.final_mass.is_none()),
        ]
        .into_iter()
        .filter_map(|(unknown, absent)| absent.then_some(unknown))
        .collect();

        match missing.as_slice() {
            [single] => Ok(*single),
            [] => Err(IsstError::rocket(
                "all four parameters supplied; leave exactly one unset to solve for it",
            )),
            many => {
                let names: Vec<&str> = many.iter().map(|u| u.name()).collect();
                Err(IsstError::rocket(format!(
                    "cannot solve with {} unknowns ({}); exactly one parameter must be unset",
                    many.len(),
                    names.join(", ")
                )))
            }
        }
    }

    /// Solve for the unset quantity elementwise.
    ///
    /// Known operands are returned broadcast to the common length.
    ///
    /// # Errors
    ///
    /// - `RocketEquation` if the unknown count is not exactly one
    /// - `ShapeMismatch` if operand lengths cannot be broadcast
    /// - `NonFiniteValue` if an element has no real solution
    ///   (e.g. non-positive mass ratio)
    pub fn solve(&self) -> IsstResult<RocketSolution> {
        let unknown = self.unknown()?;
        let known: Vec<&Operand> = [&self.delta_v, &self.isp, &self.initial_mass, &self.final_mass]
            .into_iter()
            .flatten()
            .collect();
        let n = broadcast_len(&known)?;

        let expand = |op: &Option<Operand>| -> Vec<f64> {
            op.as_ref()
                .map(|o| (0..n).map(|i| o.at(i)).collect())
                .unwrap_or_default()
        };
        let mut delta_v = expand(&self.delta_v);
        let mut isp = expand(&self.isp);
        let mut initial_mass = expand(&self.initial_mass);
        let mut final_mass = expand(&self.final_mass);

        let solved: Vec<f64> = (0..n)
            .map(|i| match unknown {
                Unknown::DeltaV => self::delta_v(isp[i], initial_mass[i], final_mass[i]),
                Unknown::SpecificImpulse => {
                    specific_impulse(delta_v[i], initial_mass[i], final_mass[i])
                }
                Unknown::InitialMass => self::initial_mass(delta_v[i], isp[i], final_mass[i]),
                Unknown::FinalMass => self::final_mass(delta_v[i], isp[i], initial_mass[i]),
            })
            .collect();

        FiniteGuard::new().check_values(unknown.name(), &solved)?;

        match unknown {
            Unknown::DeltaV => delta_v = solved,
            Unknown::SpecificImpulse => isp = solved,
            Unknown::InitialMass => initial_mass = solved,
            Unknown::FinalMass => final_mass = solved,
        }

        Ok(RocketSolution {
            solved_for: unknown,
            delta_v,
            isp,
            initial_mass,
            final_mass,
        })
    }
}

/// Solve the rocket equation from optional operands.
///
/// Thin wrapper over [`RocketEquation::solve`] for callers that already
/// hold `Option`s.
///
/// # Errors
///
/// See [`RocketEquation::solve`].
pub fn solve_rocket_equation(
    delta_v: Option<Operand>,
    isp: Option<Operand>,
    initial_mass: Option<Operand>,
    final_mass: Option<Operand>,
) -> IsstResult<RocketSolution> {
    RocketEquation {
        delta_v,
        isp,
        initial_mass,
        final_mass,
    }
    .solve()
}

/// Common length of the operands under scalar broadcasting.
fn broadcast_len(operands: &[&Operand]) -> IsstResult<usize> {
    let n = operands
        .iter()
        .map(|o| o.len())
        .find(|&len| len != 1)
        .unwrap_or(1);
    for op in operands {
        if op.len() != 1 && op.len() != n {
            return Err(IsstError::shape("rocket equation operands", n, op.len()));
        }
    }
    Ok(n)
}

/// Mass ratio `m0 / mf` needed for `delta_v` at `isp`.
#[must_use]
pub fn mass_ratio(delta_v: f64, isp: f64) -> f64 {
    (delta_v / (G0 * isp)).exp()
}

/// Delta-V from specific impulse and masses.
#[must_use]
pub fn delta_v(isp: f64, initial_mass: f64, final_mass: f64) -> f64 {
    isp * G0 * (initial_mass / final_mass).ln()
}

/// Specific impulse needed to reach `delta_v` with the given masses.
#[must_use]
pub fn specific_impulse(delta_v: f64, initial_mass: f64, final_mass: f64) -> f64 {
    (delta_v / G0) / (initial_mass / final_mass).ln()
}

/// Initial mass required to leave `final_mass` after `delta_v`.
#[must_use]
pub fn initial_mass(delta_v: f64, isp: f64, final_mass: f64) -> f64 {
    mass_ratio(delta_v, isp) * final_mass
}

/// Final mass remaining from `initial_mass` after `delta_v`.
#[must_use]
pub fn final_mass(delta_v: f64, isp: f64, initial_mass: f64) -> f64 {
    initial_mass / mass_ratio(delta_v, isp)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_solve_delta_v_scalar() {
        let solution = RocketEquation::new()
            .isp(300.0)
            .initial_mass(1000.0)
            .final_mass(1000.0 / std::f64::consts::E)
            .solve()
            .unwrap();
        assert_eq!(solution.solved_for, Unknown::DeltaV);
        assert!((solution.delta_v[0] - 300.0 * G0).abs() < 1e-9);
    }

    #[test]
    fn test_solve_each_unknown_consistent() {
        let (dv, isp, m0) = (3600.0, 310.0, 180_000.0);
        let mf = final_mass(dv, isp, m0);

        let s = solve_rocket_equation(None, Some(isp.into()), Some(m0.into()), Some(mf.into()))
            .unwrap();
        assert!((s.delta_v[0] - dv).abs() < 1e-6);

        let s = solve_rocket_equation(Some(dv.into()), None, Some(m0.into()), Some(mf.into()))
            .unwrap();
        assert!((s.isp[0] - isp).abs() < 1e-9);

        let s = solve_rocket_equation(Some(dv.into()), Some(isp.into()), None, Some(mf.into()))
            .unwrap();
        assert!((s.initial_mass[0] - m0).abs() < 1e-6);

        let s = solve_rocket_equation(Some(dv.into()), Some(isp.into()), Some(m0.into()), None)
            .unwrap();
        assert!((s.final_mass[0] - mf).abs() < 1e-6);
    }

    #[test]
    fn test_round_trip_recovers_final_mass() {
        let isp = [282.0, 348.0, 446.0];
        let m0 = [425_000.0, 114_000.0, 19_000.0];
        let mf = [25_000.0, 4_000.0, 4_500.0];

        let forward = RocketEquation::new()
            .isp(isp)
            .initial_mass(m0)
            .final_mass(mf)
            .solve()
            .unwrap();
        let back = RocketEquation::new()
            .delta_v(forward.delta_v.clone())
            .isp(isp)
            .initial_mass(m0)
            .solve()
            .unwrap();

        for (got, want) in back.final_mass.iter().zip(mf) {
            assert!((got - want).abs() / want < 1e-12, "{got} vs {want}");
        }
    }

    #[test]
    fn test_scalar_broadcasts_against_array() {
        let solution = RocketEquation::new()
            .delta_v(vec![1000.0, 2000.0, 3000.0])
            .isp(300.0)
            .final_mass(1000.0)
            .solve()
            .unwrap();
        assert_eq!(solution.initial_mass.len(), 3);
        assert_eq!(solution.isp, vec![300.0; 3]);
        assert!(solution.initial_mass[0] < solution.initial_mass[1]);
        assert!(solution.initial_mass[1] < solution.initial_mass[2]);
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let err = RocketEquation::new()
            .delta_v(vec![1000.0, 2000.0, 3000.0])
            .isp(vec![300.0, 310.0])
            .final_mass(1000.0)
            .solve()
            .unwrap_err();
        assert!(matches!(err, IsstError::ShapeMismatch { expected: 3, found: 2, .. }));
    }

    #[test]
    fn test_zero_unknowns_rejected() {
        let err = RocketEquation::new()
            .delta_v(1.0)
            .isp(1.0)
            .initial_mass(2.0)
            .final_mass(1.0)
            .solve()
            .unwrap_err();
        assert!(matches!(err, IsstError::RocketEquation { .. }));
        assert!(err.to_string().contains("exactly one"));
    }

    #[test]
    fn test_two_unknowns_rejected_with_names() {
        let err = RocketEquation::new().isp(300.0).final_mass(1.0).solve().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("2 unknowns"), "{msg}");
        assert!(msg.contains("delta_v"));
        assert!(msg.contains("initial_mass"));
    }

    #[test]
    fn test_all_unknowns_rejected() {
        let err = RocketEquation::new().solve().unwrap_err();
        assert!(err.to_string().contains("4 unknowns"));
    }

    #[test]
    fn test_non_physical_masses_hit_guard() {
        let err = RocketEquation::new()
            .isp(300.0)
            .initial_mass(-10.0)
            .final_mass(5.0)
            .solve()
            .unwrap_err();
        assert!(err.is_jidoka_violation());

        // Equal masses leave Isp undefined.
        let err = RocketEquation::new()
            .delta_v(100.0)
            .initial_mass(5.0)
            .final_mass(5.0)
            .solve()
            .unwrap_err();
        assert!(err.is_jidoka_violation());
    }

    #[test]
    fn test_mass_ratio_matches_equation() {
        let mu = mass_ratio(2050.0, 446.0);
        assert!((delta_v(446.0, mu, 1.0) - 2050.0).abs() < 1e-9);
    }

    #[test]
    fn test_operand_conversions() {
        assert_eq!(Operand::from(2.0).values(), &[2.0]);
        assert_eq!(Operand::from(vec![1.0, 2.0]).len(), 2);
        assert_eq!(Operand::from(&[1.0, 2.0, 3.0][..]).len(), 3);
        assert!(Operand::from(Vec::new()).is_empty());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Solving for delta-V then re-solving for mf recovers mf.
        #[test]
        fn prop_round_trip(
            isp in 150.0f64..500.0,
            mf in 100.0f64..1.0e6,
            ratio in 1.01f64..30.0,
        ) {
            let m0 = mf * ratio;
            let forward = RocketEquation::new()
                .isp(isp)
                .initial_mass(m0)
                .final_mass(mf)
                .solve();
            prop_assert!(forward.is_ok());
            let dv = forward.map(|s| s.delta_v[0]).unwrap_or_default();

            let back = RocketEquation::new()
                .delta_v(dv)
                .isp(isp)
                .initial_mass(m0)
                .solve();
            prop_assert!(back.is_ok());
            let recovered = back.map(|s| s.final_mass[0]).unwrap_or_default();
            prop_assert!((recovered - mf).abs() / mf < 1e-10);
        }
    }
}
