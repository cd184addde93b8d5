//! Numerical engine shared by the solvers and the risk sampler.
//!
//! - Deterministic RNG (PCG with partitioned seeds)
//! - Jidoka guards for stop-on-error

pub mod jidoka;
pub mod rng;

pub use jidoka::FiniteGuard;
pub use rng::SeededRng;
