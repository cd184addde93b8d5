//! Probabilistic risk model and sampling backends.
//!
//! [`RiskModelSpec`] declares the model: one Beta-distributed variable per
//! dimension (one element per risk, each with its own prior and the
//! dimension's scaling) and deterministic likelihood-weighted totals over
//! those variables. A [`Sampler`] turns the declaration into posterior
//! draws.
//!
//! The model has no observed data, so the posterior is the prior and
//! [`MonteCarloSampler`] draws from it directly.

use serde::{Deserialize, Serialize};

use crate::engine::jidoka::FiniteGuard;
use crate::engine::rng::SeededRng;
use crate::error::{IsstError, IsstResult};
use crate::risk::model::Dimension;
use crate::risk::pert::{BetaPrior, DimensionScaling};
use crate::risk::posterior::{PosteriorSamples, VariableDraws};

/// Default master seed for risk sampling.
pub const DEFAULT_SEED: u64 = 8927;
/// Default draws per chain.
pub const DEFAULT_DRAWS: usize = 1000;
/// Default number of chains.
pub const DEFAULT_CHAINS: usize = 4;

/// Scaled Beta variable: one element per risk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetaVariable {
    /// Variable name, e.g. `Schedule` or `Technical[Mass]`.
    pub name: String,
    /// Dimension the variable models.
    pub dimension: Dimension,
    /// Element labels, one per risk.
    pub labels: Vec<String>,
    /// Mapping from the unit interval to raw impact.
    pub scaling: DimensionScaling,
    /// Prior on each element's normalized impact.
    pub priors: Vec<BetaPrior>,
}

/// Deterministic total `Σ_i weights[i] · source[i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedTotal {
    /// Total name.
    pub name: String,
    /// Name of the summed variable.
    pub source: String,
    /// Weight of each element of the source.
    pub weights: Vec<f64>,
}

/// Declarative risk model handed to a [`Sampler`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskModelSpec {
    variables: Vec<BetaVariable>,
    totals: Vec<WeightedTotal>,
}

impl RiskModelSpec {
    /// Empty model.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a Beta variable.
    ///
    /// # Errors
    ///
    /// - `Sampling` if the name is already taken
    /// - `ShapeMismatch` if labels and priors differ in length
    pub fn add_variable(&mut self, variable: BetaVariable) -> IsstResult<()> {
        self.ensure_unique(&variable.name)?;
        if variable.labels.len() != variable.priors.len() {
            return Err(IsstError::shape(
                format!("priors of '{}'", variable.name),
                variable.labels.len(),
                variable.priors.len(),
            ));
        }
        self.variables.push(variable);
        Ok(())
    }

    /// Declare a weighted total over an existing variable.
    ///
    /// # Errors
    ///
    /// - `Sampling` if the name is taken or the source is undeclared
    /// - `ShapeMismatch` if the weights do not match the source width
    pub fn add_total(&mut self, total: WeightedTotal) -> IsstResult<()> {
        self.ensure_unique(&total.name)?;
        let source = self.variable(&total.source).ok_or_else(|| {
            IsstError::sampling(format!(
                "total '{}' sums undeclared variable '{}'",
                total.name, total.source
            ))
        })?;
        if source.priors.len() != total.weights.len() {
            return Err(IsstError::shape(
                format!("weights of '{}'", total.name),
                source.priors.len(),
                total.weights.len(),
            ));
        }
        self.totals.push(total);
        Ok(())
    }

    /// Declared variables.
    #[must_use]
    pub fn variables(&self) -> &[BetaVariable] {
        &self.variables
    }

    /// Declared totals.
    #[must_use]
    pub fn totals(&self) -> &[WeightedTotal] {
        &self.totals
    }

    /// Variable by name.
    #[must_use]
    pub fn variable(&self, name: &str) -> Option<&BetaVariable> {
        self.variables.iter().find(|v| v.name == name)
    }

    fn ensure_unique(&self, name: &str) -> IsstResult<()> {
        let taken = self.variables.iter().any(|v| v.name == name)
            || self.totals.iter().any(|t| t.name == name);
        if taken {
            return Err(IsstError::sampling(format!("'{name}' is declared twice")));
        }
        Ok(())
    }
}

/// Sampling backend.
pub trait Sampler {
    /// Draw posterior samples of every variable and total in `model`.
    ///
    /// # Errors
    ///
    /// Returns an error if the model cannot be sampled or a draw is not
    /// finite.
    fn sample(&mut self, model: &RiskModelSpec) -> IsstResult<PosteriorSamples>;
}

/// Direct Monte Carlo sampling from the priors.
///
/// Chains run sequentially on partitions of one seeded RNG, so results
/// are reproducible for a given seed.
#[derive(Debug, Clone)]
pub struct MonteCarloSampler {
    rng: SeededRng,
    draws: usize,
    chains: usize,
}

impl Default for MonteCarloSampler {
    fn default() -> Self {
        Self {
            rng: SeededRng::new(DEFAULT_SEED),
            draws: DEFAULT_DRAWS,
            chains: DEFAULT_CHAINS,
        }
    }
}

impl MonteCarloSampler {
    /// Create a sampler.
    ///
    /// # Errors
    ///
    /// Returns `Sampling` if `draws` or `chains` is zero.
    pub fn new(seed: u64, draws: usize, chains: usize) -> IsstResult<Self> {
        if draws == 0 || chains == 0 {
            return Err(IsstError::sampling(format!(
                "need at least one draw and one chain (draws={draws}, chains={chains})"
            )));
        }
        Ok(Self {
            rng: SeededRng::new(seed),
            draws,
            chains,
        })
    }

    /// Draws per chain.
    #[must_use]
    pub const fn draws(&self) -> usize {
        self.draws
    }

    /// Number of chains.
    #[must_use]
    pub const fn chains(&self) -> usize {
        self.chains
    }

    fn draw_unit(rng: &mut SeededRng, prior: &BetaPrior) -> f64 {
        match prior {
            BetaPrior::Beta(shape) => rng.gen_beta(shape.alpha, shape.beta),
            BetaPrior::PointMass(value) => *value,
        }
    }
}

impl Sampler for MonteCarloSampler {
    fn sample(&mut self, model: &RiskModelSpec) -> IsstResult<PosteriorSamples> {
        let variables = model.variables();
        let sources: Vec<usize> = model
            .totals()
            .iter()
            .map(|t| {
                variables
                    .iter()
                    .position(|v| v.name == t.source)
                    .ok_or_else(|| IsstError::sampling(format!("unknown source '{}'", t.source)))
            })
            .collect::<IsstResult<_>>()?;

        let n = self.chains * self.draws;
        let mut var_values: Vec<Vec<f64>> = variables
            .iter()
            .map(|v| Vec::with_capacity(n * v.priors.len()))
            .collect();
        let mut total_values: Vec<Vec<f64>> = vec![Vec::with_capacity(n); model.totals().len()];

        let unit_guard = FiniteGuard::new().with_bounds(0.0, 1.0);
        for mut stream in self.rng.partition(self.chains) {
            for _ in 0..self.draws {
                for (variable, values) in variables.iter().zip(&mut var_values) {
                    for prior in &variable.priors {
                        let unit = unit_guard
                            .check_value(&variable.name, Self::draw_unit(&mut stream, prior))?;
                        values.push(variable.scaling.rescale(unit));
                    }
                }
                for ((total, &source), values) in
                    model.totals().iter().zip(&sources).zip(&mut total_values)
                {
                    let width = total.weights.len();
                    let latest = &var_values[source][var_values[source].len() - width..];
                    values.push(latest.iter().zip(&total.weights).map(|(x, w)| x * w).sum());
                }
            }
        }

        let guard = FiniteGuard::new();
        let mut draws = Vec::with_capacity(variables.len());
        for (variable, values) in variables.iter().zip(var_values) {
            guard.check_values(&variable.name, &values)?;
            draws.push(VariableDraws::new(
                &variable.name,
                variable.labels.clone(),
                self.chains,
                self.draws,
                values,
            )?);
        }
        let mut totals = Vec::with_capacity(total_values.len());
        for (total, values) in model.totals().iter().zip(total_values) {
            guard.check_values(&total.name, &values)?;
            totals.push(VariableDraws::new(
                &total.name,
                vec![total.name.clone()],
                self.chains,
                self.draws,
                values,
            )?);
        }

        Ok(PosteriorSamples::new(draws, totals))
    }
}
