//! Multi-stage vehicle sizing.
//!
//! Closes a stack of stages from the top down: each stage carries the
//! mission payload plus every stage above it, its mass ratio follows from
//! the rocket equation, and propellant/structure come from the structural
//! fraction. With diameters and propellant densities the tanks and
//! accessories are sized as well.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::engine::jidoka::FiniteGuard;
use crate::error::{IsstError, IsstResult};
use crate::launch_vehicle::rocket_equation::mass_ratio;
use crate::launch_vehicle::structures::{
    size_accessories, size_propellant_mass, size_structural_mass, size_tank, AccessorySizing,
    TankGeometry, DEFAULT_DOME_ASPECT_RATIO,
};

/// Design parameters of one stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct StageSpec {
    /// Delta-V allocated to the stage (m/s).
    #[validate(range(min = 0.0))]
    pub delta_v: f64,
    /// Specific impulse (s).
    #[validate(range(min = 1.0))]
    pub isp: f64,
    /// Structural fraction σ = m_s / (m_s + m_p).
    #[validate(range(min = 0.0, max = 1.0))]
    pub structural_fraction: f64,
    /// Stage diameter (m), needed for tank sizing.
    #[serde(default)]
    #[validate(range(min = 0.01))]
    pub diameter: Option<f64>,
    /// Bulk propellant density (kg/m³), needed for tank sizing.
    #[serde(default)]
    #[validate(range(min = 1.0))]
    pub propellant_density: Option<f64>,
    /// Dome aspect ratio used for cylindrical tanks.
    #[serde(default = "default_dome_aspect_ratio")]
    #[validate(range(min = 0.1))]
    pub dome_aspect_ratio: f64,
}

fn default_dome_aspect_ratio() -> f64 {
    DEFAULT_DOME_ASPECT_RATIO
}

impl Default for StageSpec {
    fn default() -> Self {
        Self {
            delta_v: 3600.0,
            isp: 310.0,
            structural_fraction: 0.08,
            diameter: None,
            propellant_density: None,
            dome_aspect_ratio: DEFAULT_DOME_ASPECT_RATIO,
        }
    }
}

/// A stack of stages, ordered bottom to top, with its payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct VehicleSpec {
    /// Mission payload mass (kg).
    #[validate(range(min = 0.0))]
    pub payload_mass: f64,
    /// Stages, first-burning stage first.
    #[validate(length(min = 1))]
    #[validate(nested)]
    pub stages: Vec<StageSpec>,
}

impl Default for VehicleSpec {
    /// Ariane 5 ECA core and upper stage.
    fn default() -> Self {
        Self {
            payload_mass: 10_000.0,
            stages: vec![
                StageSpec {
                    delta_v: 3600.0,
                    isp: 310.0,
                    structural_fraction: 0.08,
                    diameter: Some(5.4),
                    propellant_density: Some(330.0),
                    dome_aspect_ratio: DEFAULT_DOME_ASPECT_RATIO,
                },
                StageSpec {
                    delta_v: 2050.0,
                    isp: 446.0,
                    structural_fraction: 0.23,
                    diameter: Some(5.4),
                    propellant_density: Some(350.0),
                    dome_aspect_ratio: DEFAULT_DOME_ASPECT_RATIO,
                },
            ],
        }
    }
}

/// Sized masses and geometry of one stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageSizing {
    /// Mass carried on top of the stage (kg).
    pub payload_mass: f64,
    /// Mass ratio m0/mf.
    pub mass_ratio: f64,
    /// Propellant mass (kg).
    pub propellant_mass: f64,
    /// Structural mass (kg).
    pub structural_mass: f64,
    /// Mass at stage ignition, including everything above (kg).
    pub initial_mass: f64,
    /// Mass at stage burnout, including everything above (kg).
    pub final_mass: f64,
    /// Tank geometry when diameter and density are known.
    pub tank: Option<TankGeometry>,
}

/// Result of [`size_vehicle`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleSizing {
    /// Per-stage sizing, bottom to top.
    pub stages: Vec<StageSizing>,
    /// Gross lift-off mass (kg).
    pub gross_lift_off_mass: f64,
    /// Accessory heights when every stage has a tank.
    pub accessories: Option<AccessorySizing>,
}

impl VehicleSizing {
    /// Total propellant across all stages (kg).
    #[must_use]
    pub fn total_propellant_mass(&self) -> f64 {
        self.stages.iter().map(|s| s.propellant_mass).sum()
    }

    /// Payload fraction of the gross lift-off mass.
    #[must_use]
    pub fn payload_fraction(&self, payload_mass: f64) -> f64 {
        payload_mass / self.gross_lift_off_mass
    }
}

/// Size every stage of `spec` from the top down.
///
/// # Errors
///
/// - `Validation` if the spec violates its field ranges
/// - `InfeasibleStage` if a stage's `μ·σ >= 1`
/// - `NonFiniteValue` if a mass overflows
pub fn size_vehicle(spec: &VehicleSpec) -> IsstResult<VehicleSizing> {
    spec.validate()?;
    let guard = FiniteGuard::new();

    let mut carried = spec.payload_mass;
    let mut stages = Vec::with_capacity(spec.stages.len());
    for (index, stage) in spec.stages.iter().enumerate().rev() {
        let mu = mass_ratio(stage.delta_v, stage.isp);
        if mu * stage.structural_fraction >= 1.0 {
            return Err(IsstError::InfeasibleStage {
                stage: index,
                mass_ratio: mu,
                structural_fraction: stage.structural_fraction,
            });
        }

        let propellant_mass = guard.check_value(
            &format!("stages[{index}].propellant_mass"),
            size_propellant_mass(mu, stage.structural_fraction, carried),
        )?;
        let structural_mass = size_structural_mass(propellant_mass, stage.structural_fraction);
        let tank = match (stage.diameter, stage.propellant_density) {
            (Some(diameter), Some(density)) => Some(size_tank(
                propellant_mass / density,
                diameter,
                stage.dome_aspect_ratio,
            )),
            _ => None,
        };

        let initial_mass = carried + propellant_mass + structural_mass;
        tracing::debug!(
            stage = index,
            mass_ratio = mu,
            propellant_mass,
            structural_mass,
            initial_mass,
            "sized stage"
        );
        stages.push(StageSizing {
            payload_mass: carried,
            mass_ratio: mu,
            propellant_mass,
            structural_mass,
            initial_mass,
            final_mass: carried + structural_mass,
            tank,
        });
        carried = initial_mass;
    }
    stages.reverse();

    let accessories = stage_geometry(spec, &stages)
        .map(|(ars, diameters)| size_accessories(&ars, &diameters))
        .transpose()?;

    Ok(VehicleSizing {
        stages,
        gross_lift_off_mass: carried,
        accessories,
    })
}

/// Dome aspect ratios and diameters, if every stage has a sized tank.
fn stage_geometry(spec: &VehicleSpec, stages: &[StageSizing]) -> Option<(Vec<f64>, Vec<f64>)> {
    spec.stages
        .iter()
        .zip(stages)
        .map(|(stage, sizing)| Some((sizing.tank?.dome_aspect_ratio, stage.diameter?)))
        .collect::<Option<Vec<_>>>()
        .map(|pairs| pairs.into_iter().unzip())
}
