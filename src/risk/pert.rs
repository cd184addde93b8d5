//! Per-dimension scaling, PERT moments and Beta moment fitting.
//!
//! Every function here is pure. A dimension's estimates are min-max scaled
//! into `[0, 1]` using the global extremes over all risks, summarized with
//! PERT moments, and matched to a Beta distribution with the same mean and
//! variance. Draws are mapped back with [`DimensionScaling::rescale`].

use serde::{Deserialize, Serialize};

use crate::error::{IsstError, IsstResult};
use crate::risk::model::TriangularEstimate;

/// Standard deviations at or below this are treated as a point mass.
pub const DEGENERATE_STD: f64 = 1e-12;

/// Global min-max scaling of one dimension.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DimensionScaling {
    /// Smallest minimum over all risks.
    pub minimum: f64,
    /// Largest maximum minus smallest minimum.
    pub range: f64,
}

impl DimensionScaling {
    /// Scaling spanning every estimate's `[minimum, maximum]`.
    ///
    /// # Errors
    ///
    /// Returns `Sampling` if `estimates` is empty.
    pub fn from_estimates<'a, I>(estimates: I) -> IsstResult<Self>
    where
        I: IntoIterator<Item = &'a TriangularEstimate>,
    {
        let (lo, hi) = estimates
            .into_iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), e| {
                (lo.min(e.minimum), hi.max(e.maximum))
            });
        if lo > hi {
            return Err(IsstError::sampling("cannot scale a dimension with no estimates"));
        }
        Ok(Self {
            minimum: lo,
            range: hi - lo,
        })
    }

    /// True when every estimate collapses onto one value.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.range <= 0.0
    }

    /// Map a raw impact into `[0, 1]`; a degenerate scale maps to 0.
    #[must_use]
    pub fn normalize(&self, impact: f64) -> f64 {
        if self.is_degenerate() {
            0.0
        } else {
            (impact - self.minimum) / self.range
        }
    }

    /// Map a unit-interval draw back to raw impact.
    #[must_use]
    pub fn rescale(&self, unit: f64) -> f64 {
        unit * self.range + self.minimum
    }

    /// Normalize all three points of an estimate.
    #[must_use]
    pub fn normalize_estimate(&self, estimate: &TriangularEstimate) -> TriangularEstimate {
        TriangularEstimate {
            minimum: self.normalize(estimate.minimum),
            maximum: self.normalize(estimate.maximum),
            most_likely: self.normalize(estimate.most_likely),
        }
    }
}

/// PERT mean `(min + 4·ml + max) / 6`.
#[must_use]
pub fn pert_mean(minimum: f64, most_likely: f64, maximum: f64) -> f64 {
    (minimum + 4.0 * most_likely + maximum) / 6.0
}

/// PERT standard deviation `sqrt((mean − min)(max − mean) / 7)`.
#[must_use]
pub fn pert_std(minimum: f64, mean: f64, maximum: f64) -> f64 {
    ((mean - minimum) * (maximum - mean) / 7.0).max(0.0).sqrt()
}

/// Shape parameters of a Beta distribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BetaShape {
    /// α > 0.
    pub alpha: f64,
    /// β > 0.
    pub beta: f64,
}

impl BetaShape {
    /// Fit by the method of moments.
    ///
    /// Returns `None` unless `0 < mean < 1` and `0 < std² < mean·(1 − mean)`.
    #[must_use]
    pub fn from_moments(mean: f64, std: f64) -> Option<Self> {
        let variance = std * std;
        let bound = mean * (1.0 - mean);
        if !(mean > 0.0 && mean < 1.0 && variance > 0.0 && variance < bound) {
            return None;
        }
        let kappa = bound / variance - 1.0;
        Some(Self {
            alpha: mean * kappa,
            beta: (1.0 - mean) * kappa,
        })
    }

    /// Mean `α / (α + β)`.
    #[must_use]
    pub fn mean(&self) -> f64 {
        self.alpha / (self.alpha + self.beta)
    }

    /// Variance `αβ / ((α + β)²(α + β + 1))`.
    #[must_use]
    pub fn variance(&self) -> f64 {
        let total = self.alpha + self.beta;
        self.alpha * self.beta / (total * total * (total + 1.0))
    }
}

/// Prior on one risk's normalized impact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BetaPrior {
    /// Beta distribution on `[0, 1]`.
    Beta(BetaShape),
    /// All mass at one normalized value.
    PointMass(f64),
}

impl BetaPrior {
    /// Prior matching the PERT moments of a normalized estimate.
    ///
    /// # Errors
    ///
    /// Returns `Sampling` if a non-degenerate moment pair admits no Beta
    /// fit (variance at or above `mean·(1 − mean)`).
    pub fn from_normalized(estimate: &TriangularEstimate) -> IsstResult<Self> {
        let mean = pert_mean(estimate.minimum, estimate.most_likely, estimate.maximum);
        let std = pert_std(estimate.minimum, mean, estimate.maximum);
        if std <= DEGENERATE_STD {
            return Ok(Self::PointMass(mean));
        }
        BetaShape::from_moments(mean, std)
            .map(Self::Beta)
            .ok_or_else(|| {
                IsstError::sampling(format!(
                    "no Beta distribution has mean {mean} and std {std}"
                ))
            })
    }

    /// Prior mean on the unit interval.
    #[must_use]
    pub fn mean(&self) -> f64 {
        match self {
            Self::Beta(shape) => shape.mean(),
            Self::PointMass(value) => *value,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_scaling_from_estimates() {
        let estimates = [
            TriangularEstimate::new(2.0, 3.0, 5.0),
            TriangularEstimate::new(1.0, 4.0, 9.0),
        ];
        let scaling = DimensionScaling::from_estimates(&estimates).unwrap();
        assert!((scaling.minimum - 1.0).abs() < f64::EPSILON);
        assert!((scaling.range - 8.0).abs() < f64::EPSILON);
        assert!((scaling.normalize(5.0) - 0.5).abs() < f64::EPSILON);
        assert!((scaling.rescale(0.5) - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_scaling_empty_rejected() {
        let none: [TriangularEstimate; 0] = [];
        assert!(DimensionScaling::from_estimates(&none).is_err());
    }

    #[test]
    fn test_degenerate_scaling() {
        let estimates = [TriangularEstimate::new(3.0, 3.0, 3.0)];
        let scaling = DimensionScaling::from_estimates(&estimates).unwrap();
        assert!(scaling.is_degenerate());
        assert!((scaling.normalize(3.0) - 0.0).abs() < f64::EPSILON);
        assert!((scaling.rescale(0.0) - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_pert_symmetric_unit_estimate() {
        let mean = pert_mean(0.0, 0.5, 1.0);
        let std = pert_std(0.0, mean, 1.0);
        assert!((mean - 0.5).abs() < f64::EPSILON);
        assert!((std - (0.25f64 / 7.0).sqrt()).abs() < 1e-15);

        let shape = BetaShape::from_moments(mean, std).unwrap();
        assert!((shape.alpha - 3.0).abs() < 1e-12);
        assert!((shape.beta - 3.0).abs() < 1e-12);
        assert!((shape.mean() - 0.5).abs() < 1e-12);
        assert!((shape.variance() - std * std).abs() < 1e-12);
    }

    #[test]
    fn test_from_moments_rejects_impossible() {
        assert!(BetaShape::from_moments(0.0, 0.1).is_none());
        assert!(BetaShape::from_moments(1.0, 0.1).is_none());
        assert!(BetaShape::from_moments(0.5, 0.0).is_none());
        // Variance 0.25 equals the Bernoulli bound
        assert!(BetaShape::from_moments(0.5, 0.5).is_none());
    }

    #[test]
    fn test_prior_point_mass() {
        let prior = BetaPrior::from_normalized(&TriangularEstimate::new(0.4, 0.4, 0.4)).unwrap();
        assert_eq!(prior, BetaPrior::PointMass(0.4));

        // Touching an edge zeroes one PERT factor
        let prior = BetaPrior::from_normalized(&TriangularEstimate::new(0.0, 0.0, 0.0)).unwrap();
        assert!((prior.mean() - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_prior_skewed() {
        let prior = BetaPrior::from_normalized(&TriangularEstimate::new(0.0, 0.2, 1.0)).unwrap();
        assert!(matches!(prior, BetaPrior::Beta(shape) if shape.alpha < shape.beta));
        assert!((prior.mean() - pert_mean(0.0, 0.2, 1.0)).abs() < 1e-12);
    }
}
