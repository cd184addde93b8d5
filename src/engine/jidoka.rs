//! Jidoka (自働化) - stop on the first anomalous number.
//!
//! Solvers and the risk sampler run every produced value through a
//! [`FiniteGuard`] so a NaN or infinity never leaks into a result. A
//! log of zero or a division by a vanishing range stops the computation
//! with a location instead of silently poisoning downstream totals.

use crate::error::{IsstError, IsstResult};

/// Guard that rejects non-finite values, optionally within bounds.
///
/// # Example
///
/// ```rust
/// use isst::engine::jidoka::FiniteGuard;
///
/// let guard = FiniteGuard::new();
/// assert!(guard.check_value("delta_v", 3600.0).is_ok());
/// assert!(guard.check_value("delta_v", f64::NAN).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct FiniteGuard {
    /// Inclusive lower bound for checked values.
    lower_bound: f64,
    /// Inclusive upper bound for checked values.
    upper_bound: f64,
}

impl Default for FiniteGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl FiniteGuard {
    /// Guard that accepts any finite value.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            lower_bound: f64::MIN,
            upper_bound: f64::MAX,
        }
    }

    /// Restrict accepted values to `[lower, upper]`.
    #[must_use]
    pub const fn with_bounds(mut self, lower: f64, upper: f64) -> Self {
        self.lower_bound = lower;
        self.upper_bound = upper;
        self
    }

    /// Check a single value.
    ///
    /// # Errors
    ///
    /// Returns `NonFiniteValue` if the value is NaN or infinite, or
    /// `OutOfBounds` if it lies outside the guard's bounds.
    pub fn check_value(&self, location: &str, value: f64) -> IsstResult<f64> {
        if !value.is_finite() {
            return Err(IsstError::NonFiniteValue {
                location: location.to_string(),
            });
        }
        if value < self.lower_bound || value > self.upper_bound {
            return Err(IsstError::OutOfBounds {
                location: location.to_string(),
                value,
                lower: self.lower_bound,
                upper: self.upper_bound,
            });
        }
        Ok(value)
    }

    /// Check every value in a slice, reporting the first offending index.
    ///
    /// # Errors
    ///
    /// Returns the first error produced by [`Self::check_value`].
    pub fn check_values(&self, location: &str, values: &[f64]) -> IsstResult<()> {
        for (i, &v) in values.iter().enumerate() {
            if !v.is_finite() || v < self.lower_bound || v > self.upper_bound {
                return self.check_value(&format!("{location}[{i}]"), v).map(|_| ());
            }
        }
        Ok(())
    }
}
