//! Policy documents

use crate::error::{PolicyError, PolicyResult};
use crate::pool::Pool;
use crate::rule::Ruleset;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Top-level policy document: a set of pools and scheduling rulesets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PolicyRecord", into = "PolicyRecord")]
pub struct Policy {
    name: String,
    version: String,
    pools: Vec<Pool>,
    schedules: Vec<Ruleset>,
}

impl Policy {
    /// Create an empty policy at version "1.0"
    pub fn new(name: impl Into<String>) -> PolicyResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(PolicyError::invalid("name", "policy name must not be empty"));
        }
        Ok(Self {
            name,
            version: default_version(),
            pools: Vec::new(),
            schedules: Vec::new(),
        })
    }

    /// Parse a policy from a TOML document
    pub fn from_toml_str(content: &str) -> PolicyResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load a policy from a TOML file
    pub fn from_file(path: &Path) -> PolicyResult<Self> {
        debug!(path = %path.display(), "Loading policy file");
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_pool(mut self, pool: Pool) -> Self {
        self.pools.push(pool);
        self
    }

    pub fn with_schedule(mut self, schedule: Ruleset) -> Self {
        self.schedules.push(schedule);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Pools in document order
    pub fn pools(&self) -> &[Pool] {
        &self.pools
    }

    /// Rulesets in document order
    pub fn schedules(&self) -> &[Ruleset] {
        &self.schedules
    }
}

/// Unvalidated policy fields, as written in a policy document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyRecord {
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub pools: Vec<Pool>,
    #[serde(default)]
    pub schedules: Vec<Ruleset>,
}

fn default_version() -> String {
    "1.0".to_string()
}

impl TryFrom<PolicyRecord> for Policy {
    type Error = PolicyError;

    fn try_from(record: PolicyRecord) -> PolicyResult<Self> {
        let mut policy = Policy::new(record.name)?.with_version(record.version);
        policy.pools = record.pools;
        policy.schedules = record.schedules;
        Ok(policy)
    }
}

impl From<Policy> for PolicyRecord {
    fn from(policy: Policy) -> Self {
        Self {
            name: policy.name,
            version: policy.version,
            pools: policy.pools,
            schedules: policy.schedules,
        }
    }
}
