//! Launch-vehicle structural sizing formulas.
//!
//! Stateless first-order relations used when closing a stage design:
//! propellant and structural mass from the mass ratio, tank cylinder
//! length from propellant volume, accessory heights from dome geometry,
//! and the 95th-percentile wind envelope used for ascent loads.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::error::{IsstError, IsstResult};

/// Default dome aspect ratio (radius / dome height) of an ellipsoidal tank.
pub const DEFAULT_DOME_ASPECT_RATIO: f64 = std::f64::consts::SQRT_2;

/// Tolerance used to decide that a dome is spherical.
const SPHERICAL_DOME_TOLERANCE: f64 = 1e-8;

/// Propellant mass for a stage carrying `payload_mass`.
///
/// `m_p = m_pl · (μ − 1) · (1 − σ) / (1 − μ·σ)` where `μ` is the mass ratio
/// and `σ` the structural fraction. Only meaningful while `μ·σ < 1`.
#[must_use]
pub fn size_propellant_mass(mass_ratio: f64, structural_fraction: f64, payload_mass: f64) -> f64 {
    payload_mass * (mass_ratio - 1.0) * (1.0 - structural_fraction)
        / (1.0 - mass_ratio * structural_fraction)
}

/// Structural mass implied by `propellant_mass` at structural fraction `σ`.
#[must_use]
pub fn size_structural_mass(propellant_mass: f64, structural_fraction: f64) -> f64 {
    propellant_mass * structural_fraction / (1.0 - structural_fraction)
}

/// Tank geometry returned by [`size_tank`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TankGeometry {
    /// Cylindrical barrel height (m).
    pub cylinder_height: f64,
    /// Dome aspect ratio; exactly 1 for a spherical tank.
    pub dome_aspect_ratio: f64,
}

impl TankGeometry {
    /// True when the propellant fits in a single sphere.
    #[must_use]
    pub fn is_spherical(&self) -> bool {
        self.cylinder_height == 0.0 && (self.dome_aspect_ratio - 1.0).abs() < f64::EPSILON
    }
}

/// Size a cylindrical tank with two elliptical domes.
///
/// When `propellant_volume` is smaller than the sphere of the stage
/// diameter, or than the two domes alone, the tank collapses to a sphere:
/// zero barrel, aspect ratio 1. Domes taller than a hemisphere
/// (`aspect_ratio < 1`) hold more than the sphere, so the barrel never
/// goes negative.
#[must_use]
pub fn size_tank(propellant_volume: f64, diameter: f64, aspect_ratio: f64) -> TankGeometry {
    let r = diameter / 2.0;
    let sphere_volume = 4.0 / 3.0 * PI * r.powi(3);
    let dome_volume = 2.0 / aspect_ratio * 2.0 / 3.0 * PI * r.powi(3);

    if propellant_volume < sphere_volume.max(dome_volume) {
        TankGeometry {
            cylinder_height: 0.0,
            dome_aspect_ratio: 1.0,
        }
    } else {
        TankGeometry {
            cylinder_height: (propellant_volume - dome_volume) / (PI * r * r),
            dome_aspect_ratio: aspect_ratio,
        }
    }
}

/// Per-stage accessory heights returned by [`size_accessories`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessorySizing {
    /// Dome aspect ratios, as given.
    pub dome_aspect_ratios: Vec<f64>,
    /// Stage diameters (m), as given.
    pub stage_diameters: Vec<f64>,
    /// Dome heights (m).
    pub dome_heights: Vec<f64>,
    /// Payload fairing height (m), from the uppermost stage diameter.
    pub fairing_height: f64,
    /// Skirt heights (m).
    pub skirt_heights: Vec<f64>,
    /// Intertank heights (m).
    pub intertank_heights: Vec<f64>,
    /// Interstage heights (m).
    pub interstage_heights: Vec<f64>,
}

/// Size domes, skirts, intertanks, interstages and the payload fairing.
///
/// Stages are ordered bottom to top; the fairing follows the last diameter.
/// A stage with a spherical dome gets a taller interstage (1.25·d).
///
/// # Errors
///
/// Returns `ShapeMismatch` if the slices differ in length and a `Config`
/// error if no stages are given.
pub fn size_accessories(
    dome_aspect_ratios: &[f64],
    stage_diameters: &[f64],
) -> IsstResult<AccessorySizing> {
    if stage_diameters.len() != dome_aspect_ratios.len() {
        return Err(IsstError::shape(
            "size_accessories dome aspect ratios",
            stage_diameters.len(),
            dome_aspect_ratios.len(),
        ));
    }
    let Some(&top_diameter) = stage_diameters.last() else {
        return Err(IsstError::config("size_accessories requires at least one stage"));
    };

    let dome_heights: Vec<f64> = stage_diameters
        .iter()
        .zip(dome_aspect_ratios)
        .map(|(d, ar)| (d / 2.0) / ar)
        .collect();
    let skirt_heights = stage_diameters
        .iter()
        .zip(&dome_heights)
        .map(|(d, h)| 1.0 / (3.0 * d) + h)
        .collect();
    let intertank_heights = stage_diameters
        .iter()
        .zip(&dome_heights)
        .map(|(d, h)| 1.0 / (4.0 * d) * 2.0 * h)
        .collect();

    let mut interstage_heights = stage_diameters.to_vec();
    for ii in 0..stage_diameters.len() {
        if (dome_aspect_ratios[ii] - 1.0).abs() <= SPHERICAL_DOME_TOLERANCE {
            interstage_heights[ii] = 1.25 * stage_diameters[ii];
        }
    }

    Ok(AccessorySizing {
        dome_aspect_ratios: dome_aspect_ratios.to_vec(),
        stage_diameters: stage_diameters.to_vec(),
        dome_heights,
        fairing_height: top_diameter * 2.0,
        skirt_heights,
        intertank_heights,
        interstage_heights,
    })
}

/// Surface wind speed of the envelope (m/s).
const WIND_SURFACE: f64 = 9.144;
/// Jet-stream plateau wind speed (m/s).
const WIND_PLATEAU: f64 = 76.2;
/// Wind speed above the decay band (m/s).
const WIND_HIGH_ALTITUDE: f64 = 24.384;
/// Top of the linear ramp (km).
const RAMP_TOP_KM: f64 = 9.6;
/// Top of the plateau (km).
const PLATEAU_TOP_KM: f64 = 14.0;
/// Top of the linear decay (km).
const DECAY_TOP_KM: f64 = 20.0;

/// 95th-percentile wind speed (m/s) at `altitude_km`.
///
/// Linear ramp from 9.144 m/s at the surface to the 76.2 m/s jet-stream
/// plateau at 9.6 km, constant to 14 km, linear decay to 24.384 m/s at
/// 20 km, then constant. Segment slopes are taken from the breakpoint
/// values so the envelope is continuous.
#[must_use]
pub fn wind_envelope(altitude_km: f64) -> f64 {
    if altitude_km <= RAMP_TOP_KM {
        let slope = (WIND_PLATEAU - WIND_SURFACE) / RAMP_TOP_KM;
        slope * altitude_km + WIND_SURFACE
    } else if altitude_km <= PLATEAU_TOP_KM {
        WIND_PLATEAU
    } else if altitude_km <= DECAY_TOP_KM {
        let slope = (WIND_PLATEAU - WIND_HIGH_ALTITUDE) / (DECAY_TOP_KM - PLATEAU_TOP_KM);
        WIND_PLATEAU - slope * (altitude_km - PLATEAU_TOP_KM)
    } else {
        WIND_HIGH_ALTITUDE
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_propellant_mass_known_value() {
        // μ = 4, σ = 0.1, payload 1000 kg: 1000·3·0.9/0.6 = 4500 kg
        let m_p = size_propellant_mass(4.0, 0.1, 1000.0);
        assert!((m_p - 4500.0).abs() < 1e-9);
    }

    #[test]
    fn test_propellant_and_structure_close_mass_ratio() {
        let (mu, sigma, m_pl) = (3.2, 0.08, 10_000.0);
        let m_p = size_propellant_mass(mu, sigma, m_pl);
        let m_s = size_structural_mass(m_p, sigma);
        let ratio = (m_pl + m_p + m_s) / (m_pl + m_s);
        assert!((ratio - mu).abs() < 1e-9, "mass ratio {ratio}");
        // Structural fraction holds by construction
        assert!((m_s / (m_s + m_p) - sigma).abs() < 1e-12);
    }

    #[test]
    fn test_unit_mass_ratio_needs_no_propellant() {
        assert!(size_propellant_mass(1.0, 0.2, 500.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_tank_below_sphere_is_spherical() {
        let d = 4.0;
        let sphere = 4.0 / 3.0 * PI * 8.0;
        let tank = size_tank(sphere * 0.5, d, DEFAULT_DOME_ASPECT_RATIO);
        assert_eq!(tank.cylinder_height, 0.0);
        assert_eq!(tank.dome_aspect_ratio, 1.0);
        assert!(tank.is_spherical());
    }

    #[test]
    fn test_tall_domes_never_give_negative_barrel() {
        // AR 0.5 domes hold twice the sphere of a 4 m tank
        let d = 4.0;
        let sphere = 4.0 / 3.0 * PI * 8.0;
        let tank = size_tank(1.01 * sphere, d, 0.5);
        assert_eq!(tank.cylinder_height, 0.0);
        assert_eq!(tank.dome_aspect_ratio, 1.0);

        let tank = size_tank(2.5 * sphere, d, 0.5);
        assert!((tank.dome_aspect_ratio - 0.5).abs() < f64::EPSILON);
        let rebuilt = tank.cylinder_height * PI * 4.0 + 2.0 / 0.5 * 2.0 / 3.0 * PI * 8.0;
        assert!((rebuilt - 2.5 * sphere).abs() < 1e-9);
    }

    #[test]
    fn test_tank_cylinder_volume_balance() {
        let d = 5.4;
        let r = d / 2.0;
        let ar = DEFAULT_DOME_ASPECT_RATIO;
        let volume = 200.0;
        let tank = size_tank(volume, d, ar);
        assert!((tank.dome_aspect_ratio - ar).abs() < f64::EPSILON);
        assert!(tank.cylinder_height > 0.0);
        let rebuilt = tank.cylinder_height * PI * r * r + 2.0 / ar * 2.0 / 3.0 * PI * r.powi(3);
        assert!((rebuilt - volume).abs() < 1e-9);
        assert!(!tank.is_spherical());
    }

    #[test]
    fn test_accessories_heights() {
        let ars = [DEFAULT_DOME_ASPECT_RATIO, 1.0];
        let ds = [5.4, 3.0];
        let sizing = size_accessories(&ars, &ds).unwrap();

        assert!((sizing.dome_heights[0] - 2.7 / DEFAULT_DOME_ASPECT_RATIO).abs() < 1e-12);
        assert!((sizing.dome_heights[1] - 1.5).abs() < 1e-12);
        assert!((sizing.fairing_height - 6.0).abs() < 1e-12);
        assert!((sizing.skirt_heights[1] - (1.0 / 9.0 + 1.5)).abs() < 1e-12);
        assert!((sizing.intertank_heights[1] - (1.0 / 12.0 * 3.0)).abs() < 1e-12);
        // Ellipsoidal dome keeps d, spherical dome stretches to 1.25·d
        assert!((sizing.interstage_heights[0] - 5.4).abs() < 1e-12);
        assert!((sizing.interstage_heights[1] - 3.75).abs() < 1e-12);
        assert_eq!(sizing.stage_diameters, ds.to_vec());
    }

    #[test]
    fn test_accessories_shape_mismatch() {
        let err = size_accessories(&[1.0], &[3.0, 4.0]).unwrap_err();
        assert!(matches!(err, IsstError::ShapeMismatch { expected: 2, found: 1, .. }));
    }

    #[test]
    fn test_accessories_empty() {
        assert!(size_accessories(&[], &[]).is_err());
    }

    #[test]
    fn test_wind_envelope_breakpoints() {
        assert!((wind_envelope(9.6) - 76.2).abs() < 1e-3);
        assert!((wind_envelope(14.0) - 76.2).abs() < f64::EPSILON);
        assert!((wind_envelope(20.0) - 24.384).abs() < 1e-3);
        assert!((wind_envelope(25.0) - 24.384).abs() < f64::EPSILON);
        assert!((wind_envelope(0.0) - 9.144).abs() < f64::EPSILON);
    }

    #[test]
    fn test_wind_envelope_continuity() {
        let eps = 1e-9;
        for h in [9.6, 14.0, 20.0] {
            let below = wind_envelope(h - eps);
            let above = wind_envelope(h + eps);
            assert!((below - above).abs() < 1e-3, "jump at {h} km: {below} vs {above}");
        }
    }

    #[test]
    fn test_wind_envelope_shape() {
        assert!(wind_envelope(5.0) < wind_envelope(9.0));
        assert!(wind_envelope(16.0) > wind_envelope(19.0));
    }
}
