//! Risk register data model.
//!
//! A [`DesignSystem`] owns the program's risks and the utility tables for
//! schedule, cost and each technical category. Construction checks the
//! register is coherent (unique names, one technical estimate per category)
//! so the analysis never has to reconcile mismatched shapes.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{IsstError, IsstResult};

/// Label of the schedule dimension.
pub const SCHEDULE: &str = "Schedule";
/// Label of the cost dimension.
pub const COST: &str = "Cost";

/// Three-point (PERT) impact estimate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TriangularEstimate {
    /// Optimistic impact.
    pub minimum: f64,
    /// Pessimistic impact.
    pub maximum: f64,
    /// Most likely impact.
    pub most_likely: f64,
}

impl Default for TriangularEstimate {
    fn default() -> Self {
        Self {
            minimum: 0.0,
            maximum: 1.0,
            most_likely: 0.5,
        }
    }
}

impl TriangularEstimate {
    /// Create an estimate from (minimum, most likely, maximum).
    #[must_use]
    pub const fn new(minimum: f64, most_likely: f64, maximum: f64) -> Self {
        Self {
            minimum,
            maximum,
            most_likely,
        }
    }

    /// Check the estimate is finite and ordered.
    ///
    /// # Errors
    ///
    /// Returns a description of the first problem found.
    pub fn check(&self) -> Result<(), String> {
        if !(self.minimum.is_finite() && self.maximum.is_finite() && self.most_likely.is_finite())
        {
            return Err("estimate values must be finite".to_string());
        }
        if self.minimum > self.maximum {
            return Err(format!(
                "minimum {} exceeds maximum {}",
                self.minimum, self.maximum
            ));
        }
        if self.most_likely < self.minimum || self.most_likely > self.maximum {
            return Err(format!(
                "most likely {} outside [{}, {}]",
                self.most_likely, self.minimum, self.maximum
            ));
        }
        Ok(())
    }
}

/// One entry of the program risk register.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Risk {
    /// Unique risk name; also the row key of the risk tables.
    #[validate(length(min = 1))]
    pub name: String,
    /// Probability that the risk is realized.
    #[validate(range(min = 0.0, max = 1.0))]
    pub baseline_likelihood: f64,
    /// Schedule impact estimate.
    #[serde(default)]
    pub schedule: TriangularEstimate,
    /// Cost impact estimate.
    #[serde(default)]
    pub cost: TriangularEstimate,
    /// Technical impact estimates, one per technical category.
    #[serde(default)]
    pub technical: Vec<TriangularEstimate>,
}

impl Risk {
    /// Create a risk with default (0, 0.5, 1) schedule and cost estimates.
    #[must_use]
    pub fn new(name: impl Into<String>, baseline_likelihood: f64) -> Self {
        Self {
            name: name.into(),
            baseline_likelihood,
            schedule: TriangularEstimate::default(),
            cost: TriangularEstimate::default(),
            technical: Vec::new(),
        }
    }

    /// Set the schedule estimate.
    #[must_use]
    pub const fn with_schedule(mut self, estimate: TriangularEstimate) -> Self {
        self.schedule = estimate;
        self
    }

    /// Set the cost estimate.
    #[must_use]
    pub const fn with_cost(mut self, estimate: TriangularEstimate) -> Self {
        self.cost = estimate;
        self
    }

    /// Set the technical estimates.
    #[must_use]
    pub fn with_technical(mut self, estimates: Vec<TriangularEstimate>) -> Self {
        self.technical = estimates;
        self
    }

    /// Estimate for `dimension`, if the risk has one.
    #[must_use]
    pub fn estimate(&self, dimension: &Dimension) -> Option<&TriangularEstimate> {
        match dimension {
            Dimension::Schedule => Some(&self.schedule),
            Dimension::Cost => Some(&self.cost),
            Dimension::Technical { index, .. } => self.technical.get(*index),
        }
    }

    /// Mutable estimate for `dimension`, if the risk has one.
    pub fn estimate_mut(&mut self, dimension: &Dimension) -> Option<&mut TriangularEstimate> {
        match dimension {
            Dimension::Schedule => Some(&mut self.schedule),
            Dimension::Cost => Some(&mut self.cost),
            Dimension::Technical { index, .. } => self.technical.get_mut(*index),
        }
    }
}

/// A risk dimension: schedule, cost, or one technical category.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dimension {
    /// Schedule impact.
    Schedule,
    /// Cost impact.
    Cost,
    /// Technical impact in one category.
    Technical {
        /// Position of the category among the technical tables.
        index: usize,
        /// Category name.
        category: String,
    },
}

impl Dimension {
    /// Human-readable label, used in risk table headers.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Schedule => SCHEDULE,
            Self::Cost => COST,
            Self::Technical { category, .. } => category,
        }
    }

    /// Name of the scaled impact variable in the probabilistic model.
    #[must_use]
    pub fn variable_name(&self) -> String {
        match self {
            Self::Technical { category, .. } => format!("Technical[{category}]"),
            other => other.label().to_string(),
        }
    }

    /// Name of the likelihood-weighted total in the probabilistic model.
    #[must_use]
    pub fn total_name(&self) -> String {
        format!("Total {} Impact", self.label())
    }
}

/// One point of a utility curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UtilityBreakpoint {
    /// Raw impact value.
    pub impact: f64,
    /// Normalized utility at that impact.
    pub utility: f64,
}

impl UtilityBreakpoint {
    /// Create a breakpoint.
    #[must_use]
    pub const fn new(impact: f64, utility: f64) -> Self {
        Self { impact, utility }
    }
}

/// Names end up as directory and file names under the storage root.
fn check_file_name(kind: &str, name: &str) -> IsstResult<()> {
    if name == "." || name == ".." || name.contains(['/', '\\', '\0']) {
        return Err(IsstError::risk_table(format!(
            "{kind} name '{}' cannot be used as a file name",
            name.escape_default()
        )));
    }
    Ok(())
}

#[derive(Deserialize)]
struct UncheckedRiskTable {
    name: String,
    utility_breakpoints: Vec<UtilityBreakpoint>,
}

impl TryFrom<UncheckedRiskTable> for RiskTable {
    type Error = IsstError;

    fn try_from(table: UncheckedRiskTable) -> IsstResult<Self> {
        Self::new(table.name, table.utility_breakpoints)
    }
}

/// Utility curve mapping raw impact to normalized utility for one dimension.
///
/// Breakpoints are strictly ascending in impact; each breakpoint starts a
/// risk level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "UncheckedRiskTable")]
pub struct RiskTable {
    name: String,
    utility_breakpoints: Vec<UtilityBreakpoint>,
}

impl RiskTable {
    /// Create a table.
    ///
    /// # Errors
    ///
    /// Returns `RiskTable` if the name is empty, there are no breakpoints,
    /// or breakpoints are not finite and strictly ascending in impact.
    pub fn new(
        name: impl Into<String>,
        utility_breakpoints: Vec<UtilityBreakpoint>,
    ) -> IsstResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(IsstError::risk_table("table name must not be empty"));
        }
        check_file_name("table", &name)?;
        if utility_breakpoints.is_empty() {
            return Err(IsstError::risk_table(format!(
                "table '{name}' needs at least one utility breakpoint"
            )));
        }
        if utility_breakpoints
            .iter()
            .any(|b| !(b.impact.is_finite() && b.utility.is_finite()))
        {
            return Err(IsstError::risk_table(format!(
                "table '{name}' has non-finite breakpoints"
            )));
        }
        if utility_breakpoints
            .windows(2)
            .any(|pair| pair[1].impact <= pair[0].impact)
        {
            return Err(IsstError::risk_table(format!(
                "table '{name}' breakpoints must be strictly ascending in impact"
            )));
        }
        Ok(Self {
            name,
            utility_breakpoints,
        })
    }

    /// Table name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Utility breakpoints, ascending in impact.
    #[must_use]
    pub fn utility_breakpoints(&self) -> &[UtilityBreakpoint] {
        &self.utility_breakpoints
    }

    /// Number of risk levels (one per breakpoint).
    #[must_use]
    pub fn levels(&self) -> usize {
        self.utility_breakpoints.len()
    }

    /// Level of `impact`: index of the last breakpoint at or below it.
    ///
    /// Impacts below the first breakpoint fall in level 0.
    #[must_use]
    pub fn level(&self, impact: f64) -> usize {
        self.utility_breakpoints
            .partition_point(|b| b.impact <= impact)
            .saturating_sub(1)
    }

    /// Utility of `impact`, interpolated linearly and clamped at both ends.
    #[must_use]
    pub fn utility(&self, impact: f64) -> f64 {
        let points = &self.utility_breakpoints;
        let upper = points.partition_point(|b| b.impact <= impact);
        if upper == 0 {
            return points[0].utility;
        }
        if upper == points.len() {
            return points[points.len() - 1].utility;
        }
        let (lo, hi) = (points[upper - 1], points[upper]);
        let t = (impact - lo.impact) / (hi.impact - lo.impact);
        lo.utility + t * (hi.utility - lo.utility)
    }
}

/// Count of risks per level, using each risk's most-likely impact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskLevelCounts {
    /// Risks per schedule level.
    pub schedule: Vec<usize>,
    /// Risks per cost level.
    pub cost: Vec<usize>,
    /// Risks per level, per technical category.
    pub technical: Vec<Vec<usize>>,
}

/// A design system: its risk register and utility tables.
#[derive(Debug, Clone, PartialEq)]
pub struct DesignSystem {
    name: String,
    risks: Vec<Risk>,
    schedule_risk_table: RiskTable,
    cost_risk_table: RiskTable,
    technical_risk_tables: Vec<RiskTable>,
    schedule_levels: usize,
    cost_levels: usize,
    max_technical_levels: Vec<usize>,
}

impl DesignSystem {
    /// Create a design system.
    ///
    /// Risks without technical estimates get the default estimate for
    /// every technical category.
    ///
    /// # Errors
    ///
    /// - `RiskTable` if the name is empty, risk names repeat, or technical
    ///   category names collide with each other or with schedule/cost
    /// - `ShapeMismatch` if a risk has technical estimates but not exactly
    ///   one per technical table
    /// - `InvalidEstimate` if a baseline likelihood is outside `[0, 1]`
    pub fn new(
        name: impl Into<String>,
        mut risks: Vec<Risk>,
        schedule_risk_table: RiskTable,
        cost_risk_table: RiskTable,
        technical_risk_tables: Vec<RiskTable>,
    ) -> IsstResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(IsstError::risk_table("design system name must not be empty"));
        }
        check_file_name("design system", &name)?;

        let mut categories = HashSet::from([SCHEDULE, COST]);
        for table in &technical_risk_tables {
            if !categories.insert(table.name()) {
                return Err(IsstError::risk_table(format!(
                    "technical category '{}' is not unique",
                    table.name()
                )));
            }
        }

        let mut seen = HashSet::new();
        for risk in &mut risks {
            if !seen.insert(risk.name.clone()) {
                return Err(IsstError::risk_table(format!(
                    "risk '{}' appears more than once",
                    risk.name
                )));
            }
            if !(0.0..=1.0).contains(&risk.baseline_likelihood) {
                return Err(IsstError::InvalidEstimate {
                    risk: risk.name.clone(),
                    dimension: "likelihood".to_string(),
                    message: format!(
                        "baseline likelihood {} outside [0, 1]",
                        risk.baseline_likelihood
                    ),
                });
            }
            if risk.technical.is_empty() {
                risk.technical = vec![TriangularEstimate::default(); technical_risk_tables.len()];
            } else if risk.technical.len() != technical_risk_tables.len() {
                return Err(IsstError::shape(
                    format!("technical estimates of risk '{}'", risk.name),
                    technical_risk_tables.len(),
                    risk.technical.len(),
                ));
            }
        }

        let mut running_max = 0;
        let max_technical_levels = technical_risk_tables
            .iter()
            .map(|table| {
                running_max = running_max.max(table.levels());
                running_max
            })
            .collect();

        Ok(Self {
            name,
            schedule_levels: schedule_risk_table.levels(),
            cost_levels: cost_risk_table.levels(),
            risks,
            schedule_risk_table,
            cost_risk_table,
            technical_risk_tables,
            max_technical_levels,
        })
    }

    /// Start a builder; every table category must be supplied.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> DesignSystemBuilder {
        DesignSystemBuilder {
            name: name.into(),
            ..DesignSystemBuilder::default()
        }
    }

    /// System name; also the risk table directory name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Risk register.
    #[must_use]
    pub fn risks(&self) -> &[Risk] {
        &self.risks
    }

    pub(crate) fn risks_mut(&mut self) -> &mut [Risk] {
        &mut self.risks
    }

    /// Schedule utility table.
    #[must_use]
    pub const fn schedule_risk_table(&self) -> &RiskTable {
        &self.schedule_risk_table
    }

    /// Cost utility table.
    #[must_use]
    pub const fn cost_risk_table(&self) -> &RiskTable {
        &self.cost_risk_table
    }

    /// Technical utility tables.
    #[must_use]
    pub fn technical_risk_tables(&self) -> &[RiskTable] {
        &self.technical_risk_tables
    }

    /// Number of schedule levels.
    #[must_use]
    pub const fn schedule_levels(&self) -> usize {
        self.schedule_levels
    }

    /// Number of cost levels.
    #[must_use]
    pub const fn cost_levels(&self) -> usize {
        self.cost_levels
    }

    /// Running maximum of technical level counts over the tables.
    #[must_use]
    pub fn max_technical_levels(&self) -> &[usize] {
        &self.max_technical_levels
    }

    /// Every dimension, schedule and cost first.
    #[must_use]
    pub fn dimensions(&self) -> Vec<Dimension> {
        let mut dimensions = vec![Dimension::Schedule, Dimension::Cost];
        dimensions.extend(
            self.technical_risk_tables
                .iter()
                .enumerate()
                .map(|(index, table)| Dimension::Technical {
                    index,
                    category: table.name().to_string(),
                }),
        );
        dimensions
    }

    /// Utility table for `dimension`.
    #[must_use]
    pub fn table(&self, dimension: &Dimension) -> Option<&RiskTable> {
        match dimension {
            Dimension::Schedule => Some(&self.schedule_risk_table),
            Dimension::Cost => Some(&self.cost_risk_table),
            Dimension::Technical { index, .. } => self.technical_risk_tables.get(*index),
        }
    }

    /// Baseline likelihood of every risk, in register order.
    #[must_use]
    pub fn likelihoods(&self) -> Vec<f64> {
        self.risks.iter().map(|r| r.baseline_likelihood).collect()
    }

    /// Bin each risk's most-likely impact into the level of its table.
    #[must_use]
    pub fn risk_level_counts(&self) -> RiskLevelCounts {
        let histogram = |table: &RiskTable, dimension: &Dimension| {
            let mut counts = vec![0; table.levels()];
            for estimate in self.risks.iter().filter_map(|r| r.estimate(dimension)) {
                counts[table.level(estimate.most_likely)] += 1;
            }
            counts
        };

        RiskLevelCounts {
            schedule: histogram(&self.schedule_risk_table, &Dimension::Schedule),
            cost: histogram(&self.cost_risk_table, &Dimension::Cost),
            technical: self
                .dimensions()
                .iter()
                .skip(2)
                .zip(&self.technical_risk_tables)
                .map(|(dimension, table)| histogram(table, dimension))
                .collect(),
        }
    }
}

/// Builder for [`DesignSystem`].
#[derive(Debug, Default)]
pub struct DesignSystemBuilder {
    name: String,
    risks: Vec<Risk>,
    schedule_risk_table: Option<RiskTable>,
    cost_risk_table: Option<RiskTable>,
    technical_risk_tables: Option<Vec<RiskTable>>,
}

impl DesignSystemBuilder {
    /// Add a risk.
    #[must_use]
    pub fn risk(mut self, risk: Risk) -> Self {
        self.risks.push(risk);
        self
    }

    /// Replace the risk register.
    #[must_use]
    pub fn risks(mut self, risks: Vec<Risk>) -> Self {
        self.risks = risks;
        self
    }

    /// Set the schedule table.
    #[must_use]
    pub fn schedule_risk_table(mut self, table: RiskTable) -> Self {
        self.schedule_risk_table = Some(table);
        self
    }

    /// Set the cost table.
    #[must_use]
    pub fn cost_risk_table(mut self, table: RiskTable) -> Self {
        self.cost_risk_table = Some(table);
        self
    }

    /// Set the technical tables (may be empty, but must be set).
    #[must_use]
    pub fn technical_risk_tables(mut self, tables: Vec<RiskTable>) -> Self {
        self.technical_risk_tables = Some(tables);
        self
    }

    /// Build the design system.
    ///
    /// # Errors
    ///
    /// Returns `RiskTable` if any table category is missing, otherwise
    /// the errors of [`DesignSystem::new`].
    pub fn build(self) -> IsstResult<DesignSystem> {
        let schedule = self
            .schedule_risk_table
            .ok_or_else(|| IsstError::risk_table("schedule risk table is required"))?;
        let cost = self
            .cost_risk_table
            .ok_or_else(|| IsstError::risk_table("cost risk table is required"))?;
        let technical = self
            .technical_risk_tables
            .ok_or_else(|| IsstError::risk_table("technical risk tables are required"))?;
        DesignSystem::new(self.name, self.risks, schedule, cost, technical)
    }
}
