//! Risk aggregation over a [`DesignSystem`].
//!
//! For every dimension the estimates of all risks are scaled onto the unit
//! interval with the dimension's global extremes, each risk gets a Beta
//! prior with its PERT moments, and the likelihood-weighted sum over risks
//! becomes the dimension total.

use serde::{Deserialize, Serialize};

use crate::error::{IsstError, IsstResult};
use crate::risk::model::{Dimension, DesignSystem};
use crate::risk::pert::{BetaPrior, DimensionScaling};
use crate::risk::posterior::{PosteriorSamples, PosteriorSummary};
use crate::risk::sampler::{BetaVariable, RiskModelSpec, Sampler, WeightedTotal};

/// Expected total impact of one dimension and where it lands on the table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionReport {
    /// Dimension label.
    pub dimension: String,
    /// Posterior summary of the likelihood-weighted total.
    pub total: PosteriorSummary,
    /// Utility of the mean total.
    pub utility: f64,
    /// Level of the mean total.
    pub level: usize,
}

impl DesignSystem {
    /// Fit the scaled Beta variable of one dimension.
    ///
    /// # Errors
    ///
    /// - `Sampling` if the system has no risks
    /// - `InvalidEstimate` if an estimate is unordered or not finite
    pub fn fit_dimension(&self, dimension: &Dimension) -> IsstResult<BetaVariable> {
        if self.risks().is_empty() {
            return Err(IsstError::sampling(format!(
                "design system '{}' has no risks to analyze",
                self.name()
            )));
        }

        let mut estimates = Vec::with_capacity(self.risks().len());
        for risk in self.risks() {
            let estimate = risk.estimate(dimension).ok_or_else(|| {
                IsstError::shape(
                    format!("technical estimates of risk '{}'", risk.name),
                    self.technical_risk_tables().len(),
                    risk.technical.len(),
                )
            })?;
            estimate.check().map_err(|message| IsstError::InvalidEstimate {
                risk: risk.name.clone(),
                dimension: dimension.label().to_string(),
                message,
            })?;
            estimates.push(*estimate);
        }

        let scaling = DimensionScaling::from_estimates(&estimates)?;
        if scaling.is_degenerate() {
            tracing::warn!(
                system = self.name(),
                dimension = dimension.label(),
                value = scaling.minimum,
                "every estimate collapses to one value; sampling a point mass"
            );
        }

        let priors = estimates
            .iter()
            .map(|e| BetaPrior::from_normalized(&scaling.normalize_estimate(e)))
            .collect::<IsstResult<Vec<_>>>()?;
        tracing::debug!(
            dimension = dimension.label(),
            minimum = scaling.minimum,
            range = scaling.range,
            risks = priors.len(),
            "fitted dimension"
        );

        Ok(BetaVariable {
            name: dimension.variable_name(),
            dimension: dimension.clone(),
            labels: self
                .risks()
                .iter()
                .map(|r| format!("{}[{}]", dimension.label(), r.name))
                .collect(),
            scaling,
            priors,
        })
    }

    /// Declare the full risk model: one variable and one total per dimension.
    ///
    /// # Errors
    ///
    /// See [`fit_dimension`](Self::fit_dimension).
    pub fn build_model(&self) -> IsstResult<RiskModelSpec> {
        let likelihoods = self.likelihoods();
        let mut model = RiskModelSpec::new();
        for dimension in self.dimensions() {
            let variable = self.fit_dimension(&dimension)?;
            let source = variable.name.clone();
            model.add_variable(variable)?;
            model.add_total(WeightedTotal {
                name: dimension.total_name(),
                source,
                weights: likelihoods.clone(),
            })?;
        }
        Ok(model)
    }

    /// Build the risk model and sample its posterior with `sampler`.
    ///
    /// # Errors
    ///
    /// Returns model construction errors or the sampler's errors.
    pub fn analyze_system<S: Sampler + ?Sized>(
        &self,
        sampler: &mut S,
    ) -> IsstResult<PosteriorSamples> {
        tracing::info!(
            system = self.name(),
            risks = self.risks().len(),
            technical_categories = self.technical_risk_tables().len(),
            "analyzing design system"
        );
        let model = self.build_model()?;
        let posterior = sampler.sample(&model)?;
        tracing::info!(
            system = self.name(),
            variables = posterior.variables().len(),
            "posterior sampled"
        );
        Ok(posterior)
    }

    /// Map each dimension's posterior total onto its utility table.
    ///
    /// # Errors
    ///
    /// Returns `Sampling` if a dimension total is missing from `posterior`.
    pub fn dimension_reports(&self, posterior: &PosteriorSamples) -> IsstResult<Vec<DimensionReport>> {
        self.dimensions()
            .iter()
            .map(|dimension| {
                let name = dimension.total_name();
                let total = posterior
                    .get(&name)
                    .and_then(|draws| draws.summarize(0))
                    .ok_or_else(|| IsstError::sampling(format!("posterior has no '{name}'")))?;
                let table = self.table(dimension).ok_or_else(|| {
                    IsstError::risk_table(format!("no table for '{}'", dimension.label()))
                })?;
                Ok(DimensionReport {
                    dimension: dimension.label().to_string(),
                    utility: table.utility(total.mean),
                    level: table.level(total.mean),
                    total,
                })
            })
            .collect()
    }
}
