//! # isst
//!
//! Integrated System Sizing & Risk Toolkit.
//!
//! Aerospace systems-engineering analysis routines:
//! - Rocket equation solver over scalar or array operands
//! - Launch-vehicle structural, tank and accessory sizing, wind envelope
//! - Bayesian aggregation of schedule, cost and technical risk
//!
//! ## Example
//!
//! ```rust
//! use isst::prelude::*;
//!
//! let solution = RocketEquation::new()
//!     .isp(446.0)
//!     .initial_mass(19_000.0)
//!     .final_mass(4_500.0)
//!     .solve()
//!     .unwrap();
//! assert_eq!(solution.solved_for, Unknown::DeltaV);
//! ```

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(
    clippy::module_name_repetitions,
    clippy::similar_names,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::suboptimal_flops,
    clippy::imprecise_flops,
    clippy::too_many_lines,
    clippy::missing_const_for_fn,
    clippy::needless_range_loop,
)]

pub mod config;
pub mod engine;
pub mod error;
pub mod launch_vehicle;
pub mod risk;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::{AnalysisConfig, AnalysisConfigBuilder};
    pub use crate::engine::jidoka::FiniteGuard;
    pub use crate::engine::rng::SeededRng;
    pub use crate::error::{IsstError, IsstResult};
    pub use crate::launch_vehicle::{size_vehicle, RocketEquation, Unknown, VehicleSpec};
    pub use crate::risk::{DesignSystem, MonteCarloSampler, Risk, RiskTable, Sampler};
}

/// Re-export for public API
pub use error::{IsstError, IsstResult};
