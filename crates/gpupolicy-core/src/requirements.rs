//! Per-request allocation requirements

use crate::error::{check_finite, PolicyError, PolicyResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Caller-supplied constraints layered on top of pool admission.
///
/// Deserializes from any open mapping; keys other than `min_memory`,
/// `max_temp` and `tags` are ignored. A missing key imposes no constraint.
/// Thresholds are validated on construction, so NaN or infinite bounds
/// never reach the evaluator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RequirementsRecord", into = "RequirementsRecord")]
pub struct Requirements {
    min_memory: Option<f64>,
    max_temp: Option<f64>,
    tags: BTreeSet<String>,
}

impl Requirements {
    pub fn builder() -> RequirementsBuilder {
        RequirementsBuilder {
            record: RequirementsRecord::default(),
        }
    }

    /// Minimum memory in GB
    pub fn min_memory(&self) -> Option<f64> {
        self.min_memory
    }

    /// Maximum temperature in °C
    pub fn max_temp(&self) -> Option<f64> {
        self.max_temp
    }

    /// Tags the device must carry; empty when no tag is required
    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    /// True when no constraint is set
    pub fn is_empty(&self) -> bool {
        self.min_memory.is_none() && self.max_temp.is_none() && self.tags.is_empty()
    }
}

/// Unvalidated requirement fields, as sent by a caller
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequirementsRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_memory: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_temp: Option<f64>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<String>,
}

impl TryFrom<RequirementsRecord> for Requirements {
    type Error = PolicyError;

    fn try_from(record: RequirementsRecord) -> PolicyResult<Self> {
        let min_memory = record
            .min_memory
            .map(|v| check_finite("min_memory", v, None))
            .transpose()?;
        let max_temp = record
            .max_temp
            .map(|v| check_finite("max_temp", v, None))
            .transpose()?;

        Ok(Self {
            min_memory,
            max_temp,
            tags: record.tags,
        })
    }
}

impl From<Requirements> for RequirementsRecord {
    fn from(requirements: Requirements) -> Self {
        Self {
            min_memory: requirements.min_memory,
            max_temp: requirements.max_temp,
            tags: requirements.tags,
        }
    }
}

/// Builder for [`Requirements`]; validation happens in [`RequirementsBuilder::build`]
#[derive(Debug, Clone)]
pub struct RequirementsBuilder {
    record: RequirementsRecord,
}

impl RequirementsBuilder {
    pub fn min_memory(mut self, min_memory: f64) -> Self {
        self.record.min_memory = Some(min_memory);
        self
    }

    pub fn max_temp(mut self, max_temp: f64) -> Self {
        self.record.max_temp = Some(max_temp);
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.record.tags.insert(tag.into());
        self
    }

    pub fn build(self) -> PolicyResult<Requirements> {
        Requirements::try_from(self.record)
    }
}
