//! Launch-vehicle analysis.
//!
//! - Rocket equation: solve for any one of Δv, Isp, m0, mf
//! - Structures: propellant/structural mass, tanks, accessories, wind envelope
//! - Vehicle: top-down sizing of a multi-stage stack

pub mod rocket_equation;
pub mod structures;
pub mod vehicle;

pub use rocket_equation::{solve_rocket_equation, Operand, RocketEquation, RocketSolution, Unknown, G0};
pub use structures::{
    size_accessories, size_propellant_mass, size_structural_mass, size_tank, wind_envelope,
    AccessorySizing, TankGeometry, DEFAULT_DOME_ASPECT_RATIO,
};
pub use vehicle::{size_vehicle, StageSizing, StageSpec, VehicleSizing, VehicleSpec};
