//! Pool definitions: static admission criteria and optimization intent

use crate::error::{check_finite, PolicyError, PolicyResult};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Typed extra parameters attached to optimization and health-check entries
pub type Params = BTreeMap<String, Value>;

/// Power management policy of a pool
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PowerPolicy {
    #[default]
    Adaptive,
    /// Any other policy name, carried through untouched
    Other(String),
}

impl From<String> for PowerPolicy {
    fn from(value: String) -> Self {
        if value == "adaptive" {
            PowerPolicy::Adaptive
        } else {
            PowerPolicy::Other(value)
        }
    }
}

impl From<&str> for PowerPolicy {
    fn from(value: &str) -> Self {
        PowerPolicy::from(value.to_string())
    }
}

impl From<PowerPolicy> for String {
    fn from(policy: PowerPolicy) -> Self {
        policy.to_string()
    }
}

impl std::fmt::Display for PowerPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PowerPolicy::Adaptive => write!(f, "adaptive"),
            PowerPolicy::Other(name) => write!(f, "{}", name),
        }
    }
}

/// What an optimization strategy tunes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizationKind {
    Clock,
    Memory,
    Power,
}

impl std::fmt::Display for OptimizationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptimizationKind::Clock => write!(f, "clock"),
            OptimizationKind::Memory => write!(f, "memory"),
            OptimizationKind::Power => write!(f, "power"),
        }
    }
}

/// One optimization directive of a pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationStrategy {
    pub kind: OptimizationKind,
    /// Strategy-specific settings (e.g. `boost = true`, `target_mhz = 2100`)
    #[serde(flatten)]
    pub params: Params,
}

impl OptimizationStrategy {
    pub fn new(kind: OptimizationKind) -> Self {
        Self {
            kind,
            params: Params::new(),
        }
    }

    pub fn clock() -> Self {
        Self::new(OptimizationKind::Clock)
    }

    pub fn memory() -> Self {
        Self::new(OptimizationKind::Memory)
    }

    pub fn power() -> Self {
        Self::new(OptimizationKind::Power)
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

/// A named health check run against the devices of a pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthCheck {
    pub name: String,
    #[serde(flatten)]
    pub params: Params,
}

impl HealthCheck {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Params::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

/// A named class of devices and the criteria a device must meet to join it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PoolRecord", into = "PoolRecord")]
pub struct Pool {
    name: String,
    gpu_types: Vec<String>,
    min_memory_gb: f64,
    max_temp_c: f64,
    power_policy: PowerPolicy,
    health_threshold: f64,
    opt_strategies: Vec<OptimizationStrategy>,
    health_checks: Vec<HealthCheck>,
}

impl Pool {
    pub fn builder(name: impl Into<String>) -> PoolBuilder {
        PoolBuilder {
            record: PoolRecord::named(name.into()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Device-name substrings this pool accepts; empty accepts every device
    pub fn accepted_name_substrings(&self) -> &[String] {
        &self.gpu_types
    }

    pub fn min_memory_gb(&self) -> f64 {
        self.min_memory_gb
    }

    pub fn max_temp_c(&self) -> f64 {
        self.max_temp_c
    }

    pub fn power_policy(&self) -> &PowerPolicy {
        &self.power_policy
    }

    pub fn health_threshold(&self) -> f64 {
        self.health_threshold
    }

    pub fn opt_strategies(&self) -> &[OptimizationStrategy] {
        &self.opt_strategies
    }

    pub fn health_checks(&self) -> &[HealthCheck] {
        &self.health_checks
    }
}

/// Unvalidated pool fields, as written in a policy document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PoolRecord {
    pub name: String,
    #[serde(default, alias = "gpu_type", deserialize_with = "one_or_many")]
    pub gpu_types: Vec<String>,
    #[serde(default)]
    pub min_memory_gb: f64,
    #[serde(default = "default_max_temp_c")]
    pub max_temp_c: f64,
    #[serde(default)]
    pub power_policy: PowerPolicy,
    #[serde(default = "default_health_threshold")]
    pub health_threshold: f64,
    #[serde(default)]
    pub opt_strategies: Vec<OptimizationStrategy>,
    #[serde(default)]
    pub health_checks: Vec<HealthCheck>,
}

fn default_max_temp_c() -> f64 {
    100.0
}

fn default_health_threshold() -> f64 {
    0.9
}

/// Accept either a single device type or a list of them
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(single) => vec![single],
        OneOrMany::Many(list) => list,
    })
}

impl PoolRecord {
    fn named(name: String) -> Self {
        Self {
            name,
            gpu_types: Vec::new(),
            min_memory_gb: 0.0,
            max_temp_c: default_max_temp_c(),
            power_policy: PowerPolicy::Adaptive,
            health_threshold: default_health_threshold(),
            opt_strategies: Vec::new(),
            health_checks: Vec::new(),
        }
    }
}

impl TryFrom<PoolRecord> for Pool {
    type Error = PolicyError;

    fn try_from(record: PoolRecord) -> PolicyResult<Self> {
        if record.name.trim().is_empty() {
            return Err(PolicyError::invalid("name", "pool name must not be empty"));
        }
        if record.gpu_types.iter().any(|t| t.is_empty()) {
            return Err(PolicyError::invalid(
                "gpu_types",
                "entries must not be empty strings",
            ));
        }
        let min_memory_gb = check_finite("min_memory_gb", record.min_memory_gb, Some(0.0))?;
        let max_temp_c = check_finite("max_temp_c", record.max_temp_c, None)?;
        let health_threshold = check_finite("health_threshold", record.health_threshold, Some(0.0))?;
        if health_threshold > 1.0 {
            return Err(PolicyError::invalid(
                "health_threshold",
                format!("must be within [0, 1], got {}", health_threshold),
            ));
        }
        if record
            .opt_strategies
            .iter()
            .any(|s| s.params.contains_key("kind"))
        {
            return Err(PolicyError::invalid(
                "opt_strategies",
                "`kind` is reserved and cannot be a parameter",
            ));
        }
        for check in &record.health_checks {
            if check.name.trim().is_empty() {
                return Err(PolicyError::invalid(
                    "health_checks",
                    "health check name must not be empty",
                ));
            }
            if check.params.contains_key("name") {
                return Err(PolicyError::invalid(
                    "health_checks",
                    "`name` is reserved and cannot be a parameter",
                ));
            }
        }

        Ok(Self {
            name: record.name,
            gpu_types: record.gpu_types,
            min_memory_gb,
            max_temp_c,
            power_policy: record.power_policy,
            health_threshold,
            opt_strategies: record.opt_strategies,
            health_checks: record.health_checks,
        })
    }
}

impl From<Pool> for PoolRecord {
    fn from(pool: Pool) -> Self {
        Self {
            name: pool.name,
            gpu_types: pool.gpu_types,
            min_memory_gb: pool.min_memory_gb,
            max_temp_c: pool.max_temp_c,
            power_policy: pool.power_policy,
            health_threshold: pool.health_threshold,
            opt_strategies: pool.opt_strategies,
            health_checks: pool.health_checks,
        }
    }
}

/// Builder for [`Pool`]; validation happens in [`PoolBuilder::build`]
#[derive(Debug, Clone)]
pub struct PoolBuilder {
    record: PoolRecord,
}

impl PoolBuilder {
    /// Add an accepted device-name substring
    pub fn gpu_type(mut self, gpu_type: impl Into<String>) -> Self {
        self.record.gpu_types.push(gpu_type.into());
        self
    }

    pub fn gpu_types<I, S>(mut self, gpu_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.record
            .gpu_types
            .extend(gpu_types.into_iter().map(Into::into));
        self
    }

    pub fn min_memory_gb(mut self, min_memory_gb: f64) -> Self {
        self.record.min_memory_gb = min_memory_gb;
        self
    }

    pub fn max_temp_c(mut self, max_temp_c: f64) -> Self {
        self.record.max_temp_c = max_temp_c;
        self
    }

    pub fn power_policy(mut self, power_policy: impl Into<PowerPolicy>) -> Self {
        self.record.power_policy = power_policy.into();
        self
    }

    pub fn health_threshold(mut self, health_threshold: f64) -> Self {
        self.record.health_threshold = health_threshold;
        self
    }

    pub fn opt_strategy(mut self, strategy: OptimizationStrategy) -> Self {
        self.record.opt_strategies.push(strategy);
        self
    }

    pub fn health_check(mut self, check: HealthCheck) -> Self {
        self.record.health_checks.push(check);
        self
    }

    pub fn build(self) -> PolicyResult<Pool> {
        Pool::try_from(self.record)
    }
}
