//! Analysis configuration with YAML schema and validation.
//!
//! Implements Poka-Yoke (mistake-proofing) through:
//! - Type-safe configuration structs
//! - Field validation via `validator`
//! - Semantic validation of the risk register before any analysis runs

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{IsstError, IsstResult};
use crate::launch_vehicle::vehicle::VehicleSpec;
use crate::risk::model::{DesignSystem, Risk, RiskTable};
use crate::risk::sampler::{MonteCarloSampler, DEFAULT_CHAINS, DEFAULT_DRAWS, DEFAULT_SEED};

/// Top-level analysis configuration.
///
/// Loaded from YAML files with full schema validation.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Schema version for forward compatibility.
    #[validate(length(min = 1))]
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    /// Design system under analysis.
    #[validate(nested)]
    pub system: SystemConfig,

    /// Posterior sampling settings.
    #[validate(nested)]
    #[serde(default)]
    pub sampling: SamplingConfig,

    /// Risk table storage settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Optional launch vehicle to size alongside the risk analysis.
    #[validate(nested)]
    #[serde(default)]
    pub vehicle: Option<VehicleSpec>,
}

fn default_schema_version() -> String {
    "1.0".to_string()
}

impl AnalysisConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - YAML parsing fails
    /// - Validation fails
    pub fn load<P: AsRef<Path>>(path: P) -> IsstResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML string.
    ///
    /// # Errors
    ///
    /// Returns error if parsing or validation fails.
    pub fn from_yaml(yaml: &str) -> IsstResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.check()?;
        Ok(config)
    }

    /// Serialize to YAML.
    ///
    /// # Errors
    ///
    /// Returns `YamlParse` if serialization fails.
    pub fn to_yaml(&self) -> IsstResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Create a builder around a design system description.
    #[must_use]
    pub fn builder(system: SystemConfig) -> AnalysisConfigBuilder {
        AnalysisConfigBuilder {
            system,
            sampling: SamplingConfig::default(),
            storage: StorageConfig::default(),
            vehicle: None,
        }
    }

    /// Run field and semantic validation.
    fn check(&self) -> IsstResult<()> {
        self.validate()?;
        self.validate_semantic()
    }

    /// Validate semantic constraints beyond schema.
    fn validate_semantic(&self) -> IsstResult<()> {
        if self.schema_version.split('.').next() != Some("1") {
            return Err(IsstError::config(format!(
                "unsupported schema version '{}'",
                self.schema_version
            )));
        }

        for risk in &self.system.risks {
            let estimates = [("Schedule", &risk.schedule), ("Cost", &risk.cost)]
                .into_iter()
                .chain(
                    self.system
                        .technical_tables
                        .iter()
                        .map(RiskTable::name)
                        .zip(&risk.technical),
                );
            for (dimension, estimate) in estimates {
                estimate.check().map_err(|message| IsstError::InvalidEstimate {
                    risk: risk.name.clone(),
                    dimension: dimension.to_string(),
                    message,
                })?;
            }
        }

        // Catches duplicates and shape mismatches with their own messages.
        self.design_system().map(|_| ())
    }

    /// Build the validated design system.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`DesignSystem::new`].
    pub fn design_system(&self) -> IsstResult<DesignSystem> {
        DesignSystem::new(
            self.system.name.clone(),
            self.system.risks.clone(),
            self.system.schedule_table.clone(),
            self.system.cost_table.clone(),
            self.system.technical_tables.clone(),
        )
    }

    /// Monte Carlo sampler seeded from the sampling settings.
    ///
    /// # Errors
    ///
    /// Returns `Sampling` if draws or chains is zero.
    pub fn sampler(&self) -> IsstResult<MonteCarloSampler> {
        MonteCarloSampler::new(self.sampling.seed, self.sampling.draws, self.sampling.chains)
    }
}

/// Design system description.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct SystemConfig {
    /// System name; also the risk table directory name.
    #[validate(length(min = 1))]
    pub name: String,
    /// Risk register.
    #[validate(nested)]
    #[serde(default)]
    pub risks: Vec<Risk>,
    /// Schedule utility table.
    pub schedule_table: RiskTable,
    /// Cost utility table.
    pub cost_table: RiskTable,
    /// Technical utility tables; required even when empty.
    pub technical_tables: Vec<RiskTable>,
}

/// Posterior sampling settings.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct SamplingConfig {
    /// Master seed for all RNG.
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Draws per chain.
    #[validate(range(min = 1))]
    #[serde(default = "default_draws")]
    pub draws: usize,
    /// Independent chains.
    #[validate(range(min = 1, max = 64))]
    #[serde(default = "default_chains")]
    pub chains: usize,
}

const fn default_seed() -> u64 {
    DEFAULT_SEED
}

const fn default_draws() -> usize {
    DEFAULT_DRAWS
}

const fn default_chains() -> usize {
    DEFAULT_CHAINS
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            draws: DEFAULT_DRAWS,
            chains: DEFAULT_CHAINS,
        }
    }
}

/// Risk table storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Directory holding one sub-directory per design system.
    #[serde(default = "default_root")]
    pub root: PathBuf,
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
        }
    }
}

/// Configuration builder for programmatic construction.
#[derive(Debug)]
pub struct AnalysisConfigBuilder {
    system: SystemConfig,
    sampling: SamplingConfig,
    storage: StorageConfig,
    vehicle: Option<VehicleSpec>,
}

impl AnalysisConfigBuilder {
    /// Set the random seed.
    #[must_use]
    pub const fn seed(mut self, seed: u64) -> Self {
        self.sampling.seed = seed;
        self
    }

    /// Set draws per chain.
    #[must_use]
    pub const fn draws(mut self, draws: usize) -> Self {
        self.sampling.draws = draws;
        self
    }

    /// Set the number of chains.
    #[must_use]
    pub const fn chains(mut self, chains: usize) -> Self {
        self.sampling.chains = chains;
        self
    }

    /// Set the storage root directory.
    #[must_use]
    pub fn storage_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.storage.root = root.into();
        self
    }

    /// Size a launch vehicle alongside the analysis.
    #[must_use]
    pub fn vehicle(mut self, vehicle: VehicleSpec) -> Self {
        self.vehicle = Some(vehicle);
        self
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`AnalysisConfig::from_yaml`] validation.
    pub fn build(self) -> IsstResult<AnalysisConfig> {
        let config = AnalysisConfig {
            schema_version: default_schema_version(),
            system: self.system,
            sampling: self.sampling,
            storage: self.storage,
            vehicle: self.vehicle,
        };
        config.check()?;
        Ok(config)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::risk::model::{TriangularEstimate, UtilityBreakpoint};

    const YAML: &str = r"
system:
  name: Lander
  risks:
    - name: Throttle valve
      baseline_likelihood: 0.3
      schedule: {minimum: 1.0, maximum: 6.0, most_likely: 2.0}
      technical:
        - {minimum: 0.0, maximum: 40.0, most_likely: 10.0}
    - name: Radar lock
      baseline_likelihood: 0.1
  schedule_table:
    name: Schedule
    utility_breakpoints:
      - {impact: 0.0, utility: 1.0}
      - {impact: 12.0, utility: 0.0}
  cost_table:
    name: Cost
    utility_breakpoints:
      - {impact: 0.0, utility: 1.0}
  technical_tables:
    - name: Mass
      utility_breakpoints:
        - {impact: 0.0, utility: 1.0}
        - {impact: 50.0, utility: 0.0}
";

    fn system() -> SystemConfig {
        AnalysisConfig::from_yaml(YAML).unwrap().system
    }

    #[test]
    fn test_config_yaml_parse_with_defaults() {
        let config = AnalysisConfig::from_yaml(YAML).unwrap();
        assert_eq!(config.schema_version, "1.0");
        assert_eq!(config.sampling.seed, 8927);
        assert_eq!(config.sampling.draws, 1000);
        assert_eq!(config.sampling.chains, 4);
        assert_eq!(config.storage.root, PathBuf::from("."));
        assert!(config.vehicle.is_none());

        let sys = config.design_system().unwrap();
        assert_eq!(sys.risks().len(), 2);
        assert_eq!(sys.risks()[1].technical, vec![TriangularEstimate::default()]);
        assert_eq!(sys.schedule_levels(), 2);
        assert_eq!(sys.max_technical_levels(), &[2]);
    }

    #[test]
    fn test_config_builder() {
        let config = AnalysisConfig::builder(system())
            .seed(12345)
            .draws(50)
            .chains(2)
            .storage_root("/tmp/tables")
            .vehicle(VehicleSpec::default())
            .build()
            .unwrap();
        assert_eq!(config.sampling.seed, 12345);
        assert_eq!(config.sampling.draws, 50);
        assert_eq!(config.storage.root, PathBuf::from("/tmp/tables"));
        assert!(config.vehicle.is_some());
        assert_eq!(config.sampler().unwrap().chains(), 2);
    }

    #[test]
    fn test_builder_validates_sampling() {
        assert!(AnalysisConfig::builder(system()).draws(0).build().is_err());
        assert!(AnalysisConfig::builder(system()).chains(65).build().is_err());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let yaml = format!("{YAML}verbose: true\n");
        assert!(matches!(AnalysisConfig::from_yaml(&yaml), Err(IsstError::YamlParse(_))));
    }

    #[test]
    fn test_missing_technical_tables_rejected() {
        let yaml = YAML
            .split("  technical_tables:")
            .next()
            .unwrap()
            .replace("      technical:\n        - {minimum: 0.0, maximum: 40.0, most_likely: 10.0}\n", "");
        assert!(matches!(AnalysisConfig::from_yaml(&yaml), Err(IsstError::YamlParse(_))));
    }

    #[test]
    fn test_likelihood_range_validated() {
        let yaml = YAML.replace("baseline_likelihood: 0.3", "baseline_likelihood: 1.5");
        assert!(matches!(AnalysisConfig::from_yaml(&yaml), Err(IsstError::Validation(_))));
    }

    #[test]
    fn test_unordered_estimate_rejected() {
        let yaml = YAML.replace("most_likely: 2.0", "most_likely: 9.0");
        let err = AnalysisConfig::from_yaml(&yaml).unwrap_err();
        assert!(matches!(
            &err,
            IsstError::InvalidEstimate { risk, dimension, .. }
                if risk == "Throttle valve" && dimension == "Schedule"
        ));
    }

    #[test]
    fn test_unsorted_table_rejected() {
        let yaml = YAML.replace("impact: 12.0", "impact: -1.0");
        assert!(AnalysisConfig::from_yaml(&yaml).is_err());
    }

    #[test]
    fn test_duplicate_risk_rejected() {
        let yaml = YAML.replace("Radar lock", "Throttle valve");
        let err = AnalysisConfig::from_yaml(&yaml).unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_unsupported_schema_version() {
        let yaml = format!("schema_version: \"2.0\"\n{YAML}");
        assert!(matches!(AnalysisConfig::from_yaml(&yaml), Err(IsstError::Config { .. })));
    }

    #[test]
    fn test_yaml_round_trip() {
        let config = AnalysisConfig::from_yaml(YAML).unwrap();
        let again = AnalysisConfig::from_yaml(&config.to_yaml().unwrap()).unwrap();
        assert_eq!(again.system.risks, config.system.risks);
        assert_eq!(again.system.technical_tables, config.system.technical_tables);
    }

    #[test]
    fn test_programmatic_system() {
        let system = SystemConfig {
            name: "Probe".to_string(),
            risks: vec![Risk::new("Antenna", 0.5)],
            schedule_table: RiskTable::new("Schedule", vec![UtilityBreakpoint::new(0.0, 1.0)])
                .unwrap(),
            cost_table: RiskTable::new("Cost", vec![UtilityBreakpoint::new(0.0, 1.0)]).unwrap(),
            technical_tables: Vec::new(),
        };
        let config = AnalysisConfig::builder(system).build().unwrap();
        assert!(config.design_system().unwrap().technical_risk_tables().is_empty());
    }
}
