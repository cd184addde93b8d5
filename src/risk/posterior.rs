//! Posterior draws and their summaries.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{IsstError, IsstResult};

/// Draws of one model variable, stored chain-major.
///
/// Element `k` of draw `d` in chain `c` lives at
/// `(c · draws + d) · width + k`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDraws {
    name: String,
    labels: Vec<String>,
    chains: usize,
    draws: usize,
    values: Vec<f64>,
}

impl VariableDraws {
    /// Wrap flattened draws.
    ///
    /// `labels` name each element (one per risk, or one for a total).
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if `values.len() != chains · draws · labels.len()`.
    pub fn new(
        name: impl Into<String>,
        labels: Vec<String>,
        chains: usize,
        draws: usize,
        values: Vec<f64>,
    ) -> IsstResult<Self> {
        let name = name.into();
        let expected = chains * draws * labels.len();
        if values.len() != expected {
            return Err(IsstError::shape(
                format!("draws of '{name}'"),
                expected,
                values.len(),
            ));
        }
        Ok(Self {
            name,
            labels,
            chains,
            draws,
            values,
        })
    }

    /// Variable name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Element labels.
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Elements per draw.
    #[must_use]
    pub fn width(&self) -> usize {
        self.labels.len()
    }

    /// Number of chains.
    #[must_use]
    pub const fn chains(&self) -> usize {
        self.chains
    }

    /// Draws per chain.
    #[must_use]
    pub const fn draws(&self) -> usize {
        self.draws
    }

    /// All values of element `k` over every chain and draw.
    pub fn element(&self, k: usize) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().skip(k).step_by(self.width().max(1)).copied()
    }

    /// One draw's elements.
    #[must_use]
    pub fn draw(&self, chain: usize, draw: usize) -> Option<&[f64]> {
        if chain >= self.chains || draw >= self.draws {
            return None;
        }
        let start = (chain * self.draws + draw) * self.width();
        self.values.get(start..start + self.width())
    }

    /// Summary of element `k`, or `None` if out of range.
    #[must_use]
    pub fn summarize(&self, k: usize) -> Option<PosteriorSummary> {
        let label = self.labels.get(k)?;
        let values: Vec<f64> = self.element(k).collect();
        Some(PosteriorSummary::from_values(label, &values))
    }

    /// Summaries of every element.
    #[must_use]
    pub fn summaries(&self) -> Vec<PosteriorSummary> {
        (0..self.width()).filter_map(|k| self.summarize(k)).collect()
    }
}

/// Point and interval summary of one scalar quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PosteriorSummary {
    /// Quantity label, e.g. `Schedule[Valve leak]`.
    pub label: String,
    /// Posterior mean.
    pub mean: f64,
    /// Posterior standard deviation.
    pub sd: f64,
    /// Monte Carlo standard error of the mean.
    pub std_error: f64,
    /// 95% confidence interval of the mean (mean ± 1.96 · `std_error`).
    pub confidence_interval: (f64, f64),
    /// 3% quantile.
    pub q03: f64,
    /// 97% quantile.
    pub q97: f64,
    /// Number of draws.
    pub samples: usize,
}

impl PosteriorSummary {
    /// Summarize a set of draws.
    #[must_use]
    pub fn from_values(label: &str, values: &[f64]) -> Self {
        let n = values.len().max(1) as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
        let sd = variance.sqrt();
        let std_error = sd / n.sqrt();
        let ci_half = 1.96 * std_error;

        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        Self {
            label: label.to_string(),
            mean,
            sd,
            std_error,
            confidence_interval: (mean - ci_half, mean + ci_half),
            q03: quantile(&sorted, 0.03),
            q97: quantile(&sorted, 0.97),
            samples: values.len(),
        }
    }

    /// Check if `value` is within the confidence interval.
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.confidence_interval.0 && value <= self.confidence_interval.1
    }
}

/// Linear-interpolated quantile of sorted values; NaN when empty.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    match sorted {
        [] => f64::NAN,
        [only] => *only,
        _ => {
            let pos = q * (sorted.len() - 1) as f64;
            let lo = pos.floor() as usize;
            let hi = pos.ceil() as usize;
            let t = pos - lo as f64;
            sorted[lo] + t * (sorted[hi] - sorted[lo])
        }
    }
}

/// Posterior draws of every impact variable and every total.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PosteriorSamples {
    variables: Vec<VariableDraws>,
    totals: Vec<VariableDraws>,
}

impl PosteriorSamples {
    /// Assemble from per-variable and per-total draws.
    #[must_use]
    pub fn new(variables: Vec<VariableDraws>, totals: Vec<VariableDraws>) -> Self {
        Self { variables, totals }
    }

    /// Per-risk impact variables.
    #[must_use]
    pub fn variables(&self) -> &[VariableDraws] {
        &self.variables
    }

    /// Likelihood-weighted totals.
    #[must_use]
    pub fn totals(&self) -> &[VariableDraws] {
        &self.totals
    }

    /// Look up a variable or total by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&VariableDraws> {
        self.variables
            .iter()
            .chain(&self.totals)
            .find(|v| v.name() == name)
    }

    /// Summaries of every element of every variable, then every total.
    #[must_use]
    pub fn summary(&self) -> Vec<PosteriorSummary> {
        self.variables
            .iter()
            .chain(&self.totals)
            .flat_map(VariableDraws::summaries)
            .collect()
    }

    /// Write the draws as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns `Serialization` or `Io` on failure.
    pub fn write_json(&self, path: &Path) -> IsstResult<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| IsstError::serialization(e.to_string()))?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Read draws written by [`write_json`](Self::write_json).
    ///
    /// # Errors
    ///
    /// Returns `Io` or `Serialization` on failure.
    pub fn read_json(path: &Path) -> IsstResult<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(|e| IsstError::serialization(e.to_string()))
    }
}
