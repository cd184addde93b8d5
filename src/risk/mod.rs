//! Bayesian risk aggregation.
//!
//! Three-point estimates of each risk's schedule, cost and technical impact
//! become Beta-distributed variables; likelihood-weighted sums over the
//! register give the dimension totals.
//!
//! # Example
//!
//! ```rust
//! use isst::risk::{DesignSystem, MonteCarloSampler, Risk, RiskTable, UtilityBreakpoint};
//!
//! let table = |name: &str| {
//!     RiskTable::new(name, vec![UtilityBreakpoint::new(0.0, 1.0), UtilityBreakpoint::new(1.0, 0.0)])
//! };
//! let system = DesignSystem::builder("Lander")
//!     .risk(Risk::new("Throttle valve", 1.0))
//!     .schedule_risk_table(table("Schedule").unwrap())
//!     .cost_risk_table(table("Cost").unwrap())
//!     .technical_risk_tables(Vec::new())
//!     .build()
//!     .unwrap();
//!
//! let mut sampler = MonteCarloSampler::new(8927, 500, 2).unwrap();
//! let posterior = system.analyze_system(&mut sampler).unwrap();
//! let schedule = posterior.get("Total Schedule Impact").unwrap().summarize(0).unwrap();
//! assert!((schedule.mean - 0.5).abs() < 0.05);
//! ```

pub mod analysis;
pub mod model;
pub mod pert;
pub mod posterior;
pub mod sampler;
pub mod storage;

pub use analysis::DimensionReport;
pub use model::{
    DesignSystem, DesignSystemBuilder, Dimension, Risk, RiskLevelCounts, RiskTable,
    TriangularEstimate, UtilityBreakpoint,
};
pub use pert::{pert_mean, pert_std, BetaPrior, BetaShape, DimensionScaling};
pub use posterior::{PosteriorSamples, PosteriorSummary, VariableDraws};
pub use sampler::{BetaVariable, MonteCarloSampler, RiskModelSpec, Sampler, WeightedTotal};
pub use storage::impact_columns;
