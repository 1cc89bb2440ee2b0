//! Analysis configuration
//!
//! Holds the category taxonomy, evaluator thresholds, forecaster parameters and
//! allocator policies.
//!
//! ## Configuration Resolution
//!
//! Config is loaded with a layered resolution:
//! 1. An explicit path, when given and present
//! 2. The override in the data dir (~/.local/share/pennywise/config.toml)
//! 3. Embedded defaults (compiled into binary)
//!
//! Keys missing from a file keep their default values.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::CategoryGroup;
use crate::taxonomy::Taxonomy;

/// Embedded default config (compiled into binary)
pub const DEFAULT_CONFIG: &str = include_str!("../../../config/pennywise.toml");

/// Thresholds used when scoring a month
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluatorConfig {
    /// Highest acceptable share of unnecessary spending
    pub unnecessary_max_ratio: f64,
    /// Lowest acceptable savings ratio
    pub savings_min_ratio: f64,
    /// Top category share above which a warning is raised
    pub top_category_max_ratio: f64,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            unnecessary_max_ratio: 0.30,
            savings_min_ratio: 0.20,
            top_category_max_ratio: 0.30,
        }
    }
}

/// Regression and trend classification parameters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecasterConfig {
    /// Distinct months required before the regressor is used
    pub min_months: usize,
    /// Trees in the random forest
    pub n_trees: usize,
    /// Bootstrap sampling seed
    pub seed: u64,
    /// Multiplier on residual standard deviation for the confidence half-width
    pub confidence_z: f64,
    /// |change| above this is a strong trend
    pub strong_change: f64,
    /// |change| above this is a mild trend
    pub mild_change: f64,
}

impl Default for ForecasterConfig {
    fn default() -> Self {
        Self {
            min_months: 3,
            n_trees: 100,
            seed: 42,
            confidence_z: 1.96,
            strong_change: 0.20,
            mild_change: 0.05,
        }
    }
}

/// Priority weight and retained-ratio floor for one group
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroupPolicy {
    pub weight: f64,
    /// Minimum retained ratio (1 - maximum cut)
    pub lower: f64,
}

impl GroupPolicy {
    pub const fn new(weight: f64, lower: f64) -> Self {
        Self { weight, lower }
    }
}

/// What the allocation LP maximizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Objective {
    /// Σ weight × ratio
    Ratio,
    /// Σ weight × predicted × ratio
    Spend,
}

impl Objective {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ratio => "ratio",
            Self::Spend => "spend",
        }
    }
}

impl fmt::Display for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Allocation solver settings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocatorConfig {
    pub necessary: GroupPolicy,
    pub other: GroupPolicy,
    pub unnecessary: GroupPolicy,
    /// Policy for group labels outside the known three
    pub fallback: GroupPolicy,
    /// Share of the mean ratio blended into each solved ratio
    pub smoothing: f64,
    pub objective: Objective,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            necessary: GroupPolicy::new(3.0, 0.75),
            other: GroupPolicy::new(2.0, 0.60),
            unnecessary: GroupPolicy::new(1.0, 0.40),
            fallback: GroupPolicy::new(1.0, 0.40),
            smoothing: 0.30,
            objective: Objective::Ratio,
        }
    }
}

impl AllocatorConfig {
    pub fn policy(&self, group: Option<CategoryGroup>) -> GroupPolicy {
        match group {
            Some(CategoryGroup::Necessary) => self.necessary,
            Some(CategoryGroup::Other) => self.other,
            Some(CategoryGroup::Unnecessary) => self.unnecessary,
            None => self.fallback,
        }
    }
}

/// Full configuration for the analysis pipeline
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisConfig {
    pub taxonomy: Taxonomy,
    pub evaluator: EvaluatorConfig,
    pub forecaster: ForecasterConfig,
    pub allocator: AllocatorConfig,
}

/// Where a loaded configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Embedded,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Embedded => write!(f, "built-in defaults"),
        }
    }
}

impl AnalysisConfig {
    /// Load using the layered resolution described in the module docs
    pub fn load(override_path: Option<&Path>) -> Result<(Self, ConfigSource)> {
        let candidate = match override_path {
            Some(path) if path.exists() => Some(path.to_path_buf()),
            Some(path) => {
                debug!(path = %path.display(), "Config override not found, using defaults");
                None
            }
            None => default_config_path().filter(|p| p.exists()),
        };

        match candidate {
            Some(path) => {
                let content = fs::read_to_string(&path)
                    .map_err(|e| Error::Config(format!("Failed to read config: {}", e)))?;
                let config = parse_config(&content)?;
                debug!(path = %path.display(), "Loaded analysis config");
                Ok((config, ConfigSource::File(path)))
            }
            None => Ok((parse_config(DEFAULT_CONFIG)?, ConfigSource::Embedded)),
        }
    }

    /// Parse from TOML content
    pub fn from_toml(content: &str) -> Result<Self> {
        parse_config(content)
    }

    pub fn validate(&self) -> Result<()> {
        let ev = &self.evaluator;
        for (name, value) in [
            ("evaluator.unnecessary_max_ratio", ev.unnecessary_max_ratio),
            ("evaluator.savings_min_ratio", ev.savings_min_ratio),
            ("evaluator.top_category_max_ratio", ev.top_category_max_ratio),
        ] {
            if !value.is_finite() {
                return Err(Error::Config(format!("{} must be finite", name)));
            }
        }

        let fc = &self.forecaster;
        if fc.min_months == 0 {
            return Err(Error::Config("forecaster.min_months must be at least 1".into()));
        }
        if fc.n_trees == 0 {
            return Err(Error::Config("forecaster.n_trees must be at least 1".into()));
        }
        if !(fc.confidence_z.is_finite() && fc.confidence_z >= 0.0) {
            return Err(Error::Config("forecaster.confidence_z must be >= 0".into()));
        }
        if !(fc.mild_change >= 0.0 && fc.strong_change >= fc.mild_change) {
            return Err(Error::Config(
                "forecaster thresholds must satisfy 0 <= mild_change <= strong_change".into(),
            ));
        }

        let al = &self.allocator;
        for (name, policy) in [
            ("necessary", al.necessary),
            ("other", al.other),
            ("unnecessary", al.unnecessary),
            ("fallback", al.fallback),
        ] {
            if !(policy.weight.is_finite() && policy.weight >= 0.0) {
                return Err(Error::Config(format!(
                    "allocator.groups.{}.weight must be >= 0",
                    name
                )));
            }
            if !(0.0..=1.0).contains(&policy.lower) {
                return Err(Error::Config(format!(
                    "allocator.groups.{}.lower must be within [0, 1]",
                    name
                )));
            }
        }
        if !(0.0..=1.0).contains(&al.smoothing) {
            return Err(Error::Config("allocator.smoothing must be within [0, 1]".into()));
        }

        Ok(())
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("pennywise").join("config.toml"))
}

/// Raw config structure for TOML parsing
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    taxonomy: Option<RawTaxonomy>,
    evaluator: Option<RawEvaluator>,
    forecaster: Option<RawForecaster>,
    allocator: Option<RawAllocator>,
}

#[derive(Debug, Deserialize)]
struct RawTaxonomy {
    necessary: Option<Vec<String>>,
    unnecessary: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct RawEvaluator {
    unnecessary_max_ratio: Option<f64>,
    savings_min_ratio: Option<f64>,
    top_category_max_ratio: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawForecaster {
    min_months: Option<usize>,
    n_trees: Option<usize>,
    seed: Option<u64>,
    confidence_z: Option<f64>,
    strong_change: Option<f64>,
    mild_change: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawAllocator {
    objective: Option<Objective>,
    smoothing: Option<f64>,
    groups: Option<RawGroups>,
}

#[derive(Debug, Deserialize)]
struct RawGroups {
    necessary: Option<RawPolicy>,
    other: Option<RawPolicy>,
    unnecessary: Option<RawPolicy>,
    fallback: Option<RawPolicy>,
}

#[derive(Debug, Deserialize)]
struct RawPolicy {
    weight: Option<f64>,
    lower: Option<f64>,
}

impl RawPolicy {
    fn apply(self, policy: &mut GroupPolicy) {
        if let Some(weight) = self.weight {
            policy.weight = weight;
        }
        if let Some(lower) = self.lower {
            policy.lower = lower;
        }
    }
}

/// Parse config from TOML content
fn parse_config(content: &str) -> Result<AnalysisConfig> {
    let raw: RawConfig = toml::from_str(content)
        .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

    let mut config = AnalysisConfig::default();

    if let Some(taxonomy) = raw.taxonomy {
        let necessary = taxonomy.necessary.unwrap_or_else(|| {
            crate::taxonomy::DEFAULT_NECESSARY
                .iter()
                .map(|s| s.to_string())
                .collect()
        });
        let unnecessary = taxonomy.unnecessary.unwrap_or_else(|| {
            crate::taxonomy::DEFAULT_UNNECESSARY
                .iter()
                .map(|s| s.to_string())
                .collect()
        });
        config.taxonomy = Taxonomy::from_lists(necessary.as_slice(), unnecessary.as_slice());
    }

    if let Some(ev) = raw.evaluator {
        if let Some(v) = ev.unnecessary_max_ratio {
            config.evaluator.unnecessary_max_ratio = v;
        }
        if let Some(v) = ev.savings_min_ratio {
            config.evaluator.savings_min_ratio = v;
        }
        if let Some(v) = ev.top_category_max_ratio {
            config.evaluator.top_category_max_ratio = v;
        }
    }

    if let Some(fc) = raw.forecaster {
        if let Some(v) = fc.min_months {
            config.forecaster.min_months = v;
        }
        if let Some(v) = fc.n_trees {
            config.forecaster.n_trees = v;
        }
        if let Some(v) = fc.seed {
            config.forecaster.seed = v;
        }
        if let Some(v) = fc.confidence_z {
            config.forecaster.confidence_z = v;
        }
        if let Some(v) = fc.strong_change {
            config.forecaster.strong_change = v;
        }
        if let Some(v) = fc.mild_change {
            config.forecaster.mild_change = v;
        }
    }

    if let Some(al) = raw.allocator {
        if let Some(objective) = al.objective {
            config.allocator.objective = objective;
        }
        if let Some(smoothing) = al.smoothing {
            config.allocator.smoothing = smoothing;
        }
        if let Some(groups) = al.groups {
            if let Some(p) = groups.necessary {
                p.apply(&mut config.allocator.necessary);
            }
            if let Some(p) = groups.other {
                p.apply(&mut config.allocator.other);
            }
            if let Some(p) = groups.unnecessary {
                p.apply(&mut config.allocator.unnecessary);
            }
            if let Some(p) = groups.fallback {
                p.apply(&mut config.allocator.fallback);
            }
        }
    }

    config.validate()?;
    Ok(config)
}
