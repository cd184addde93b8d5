//! Error types for isst.
//!
//! All fallible operations return `Result<T, IsstError>` instead of panicking,
//! so a malformed risk register or an under-determined rocket equation is
//! reported to the caller rather than aborting the analysis.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for isst operations.
pub type IsstResult<T> = Result<T, IsstError>;

/// Unified error type for all isst operations.
#[derive(Debug, Error)]
pub enum IsstError {
    // ===== Jidoka Violations =====
    /// Numerical instability detected (NaN or Inf).
    #[error("Jidoka: non-finite value detected at {location}")]
    NonFiniteValue {
        /// Location where the non-finite value was detected.
        location: String,
    },

    /// Finite value outside the range a guard accepts.
    #[error("Jidoka: {location} = {value:.6e} outside [{lower:.6e}, {upper:.6e}]")]
    OutOfBounds {
        /// Location of the offending value.
        location: String,
        /// Value that was rejected.
        value: f64,
        /// Inclusive lower bound.
        lower: f64,
        /// Inclusive upper bound.
        upper: f64,
    },

    // ===== Solver Errors =====
    /// Rocket equation called with the wrong number of unknowns.
    #[error("Rocket equation: {message}")]
    RocketEquation {
        /// Description of the usage error.
        message: String,
    },

    /// Array operands whose lengths cannot be combined.
    #[error("Shape mismatch in {context}: expected {expected}, found {found}")]
    ShapeMismatch {
        /// Operation that detected the mismatch.
        context: String,
        /// Expected length.
        expected: usize,
        /// Length actually supplied.
        found: usize,
    },

    /// A stage whose mass ratio cannot be reached with its structural fraction.
    #[error("Stage {stage} infeasible: mass ratio {mass_ratio:.4} with structural fraction {structural_fraction:.4}")]
    InfeasibleStage {
        /// Zero-based stage index, counted from the bottom of the stack.
        stage: usize,
        /// Required mass ratio m0/mf.
        mass_ratio: f64,
        /// Stage structural fraction.
        structural_fraction: f64,
    },

    // ===== Risk Model Errors =====
    /// Three-point estimate that is not ordered or not finite.
    #[error("Invalid estimate for risk '{risk}' ({dimension}): {message}")]
    InvalidEstimate {
        /// Risk name.
        risk: String,
        /// Risk dimension (schedule, cost, or a technical category).
        dimension: String,
        /// What is wrong with the estimate.
        message: String,
    },

    /// Malformed risk table or design system.
    #[error("Risk table error: {0}")]
    RiskTable(String),

    /// Sampling backend failure.
    #[error("Sampling error: {0}")]
    Sampling(String),

    // ===== Configuration Errors =====
    /// Invalid configuration parameter.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// YAML parsing error.
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// Validation error.
    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    // ===== Storage Errors =====
    /// Design system directory does not exist.
    #[error("Risk table directory not found: {}", path.display())]
    MissingDirectory {
        /// Expected directory.
        path: PathBuf,
    },

    /// Risk table file does not exist.
    #[error("Risk table file not found: {}", path.display())]
    MissingFile {
        /// Expected file.
        path: PathBuf,
    },

    /// A risk has no row in a risk table file.
    #[error("Risk '{risk}' missing from {}", path.display())]
    MissingRisk {
        /// Risk name.
        risk: String,
        /// File that was searched.
        path: PathBuf,
    },

    /// CSV encoding or decoding error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl IsstError {
    /// Create a configuration error with a message.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a rocket equation usage error.
    #[must_use]
    pub fn rocket(message: impl Into<String>) -> Self {
        Self::RocketEquation {
            message: message.into(),
        }
    }

    /// Create a shape mismatch error.
    #[must_use]
    pub fn shape(context: impl Into<String>, expected: usize, found: usize) -> Self {
        Self::ShapeMismatch {
            context: context.into(),
            expected,
            found,
        }
    }

    /// Create a risk table error.
    #[must_use]
    pub fn risk_table(message: impl Into<String>) -> Self {
        Self::RiskTable(message.into())
    }

    /// Create a sampling error.
    #[must_use]
    pub fn sampling(message: impl Into<String>) -> Self {
        Self::Sampling(message.into())
    }

    /// Create a serialization error.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization(message.into())
    }

    /// Check if this error is a Jidoka violation (requires immediate stop).
    #[must_use]
    pub const fn is_jidoka_violation(&self) -> bool {
        matches!(self, Self::NonFiniteValue { .. } | Self::OutOfBounds { .. })
    }

    /// Check if this error came from the storage layer.
    #[must_use]
    pub const fn is_storage_error(&self) -> bool {
        matches!(
            self,
            Self::MissingDirectory { .. }
                | Self::MissingFile { .. }
                | Self::MissingRisk { .. }
                | Self::Csv(_)
                | Self::Io(_)
        )
    }
}
