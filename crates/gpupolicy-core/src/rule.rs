//! Scheduling rules and rulesets

use crate::error::{PolicyError, PolicyResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The closed set of rule kinds the engine understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    Priority,
    Balance,
    Distribution,
    Preemption,
}

impl FromStr for RuleKind {
    type Err = PolicyError;

    fn from_str(s: &str) -> PolicyResult<Self> {
        match s {
            "priority" => Ok(RuleKind::Priority),
            "balance" => Ok(RuleKind::Balance),
            "distribution" => Ok(RuleKind::Distribution),
            "preemption" => Ok(RuleKind::Preemption),
            other => Err(PolicyError::invalid(
                "kind",
                format!("unknown rule kind '{}'", other),
            )),
        }
    }
}

impl std::fmt::Display for RuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuleKind::Priority => write!(f, "priority"),
            RuleKind::Balance => write!(f, "balance"),
            RuleKind::Distribution => write!(f, "distribution"),
            RuleKind::Preemption => write!(f, "preemption"),
        }
    }
}

/// One scheduling directive. Each kind carries only the fields it uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RuleRecord", into = "RuleRecord")]
pub enum Rule {
    /// Order devices by a metric (e.g. `temperature`), optionally with a strategy such as `lowest`
    Priority {
        metric: String,
        strategy: Option<String>,
    },
    /// Spread load using a strategy (e.g. `round_robin`), optionally keyed on a metric
    Balance {
        strategy: String,
        metric: Option<String>,
    },
    /// Distribute work across the listed values (zones, hosts, device types)
    Distribution {
        values: Vec<String>,
        strategy: Option<String>,
    },
    /// Whether running work may be preempted
    Preemption { allow: bool },
}

impl Rule {
    pub fn priority(metric: impl Into<String>) -> Self {
        Rule::Priority {
            metric: metric.into(),
            strategy: None,
        }
    }

    pub fn balance(strategy: impl Into<String>) -> Self {
        Rule::Balance {
            strategy: strategy.into(),
            metric: None,
        }
    }

    pub fn distribution<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Rule::Distribution {
            values: values.into_iter().map(Into::into).collect(),
            strategy: None,
        }
    }

    pub fn preemption(allow: bool) -> Self {
        Rule::Preemption { allow }
    }

    pub fn kind(&self) -> RuleKind {
        match self {
            Rule::Priority { .. } => RuleKind::Priority,
            Rule::Balance { .. } => RuleKind::Balance,
            Rule::Distribution { .. } => RuleKind::Distribution,
            Rule::Preemption { .. } => RuleKind::Preemption,
        }
    }
}

/// Loose rule shape produced by policy loaders: a kind plus optional fields.
///
/// Converting into [`Rule`] rejects unknown kinds, missing required fields
/// and fields that the kind does not use.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleRecord {
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow: Option<bool>,
}

fn required<T>(kind: RuleKind, field: &str, value: Option<T>) -> PolicyResult<T> {
    value.ok_or_else(|| PolicyError::invalid(field, format!("is required for {} rules", kind)))
}

fn unused<T>(kind: RuleKind, field: &str, value: &Option<T>) -> PolicyResult<()> {
    if value.is_some() {
        return Err(PolicyError::invalid(
            field,
            format!("is not used by {} rules", kind),
        ));
    }
    Ok(())
}

impl TryFrom<RuleRecord> for Rule {
    type Error = PolicyError;

    fn try_from(record: RuleRecord) -> PolicyResult<Self> {
        let kind: RuleKind = record.kind.parse()?;

        let rule = match kind {
            RuleKind::Priority => {
                unused(kind, "values", &record.values)?;
                unused(kind, "allow", &record.allow)?;
                Rule::Priority {
                    metric: required(kind, "metric", record.metric)?,
                    strategy: record.strategy,
                }
            }
            RuleKind::Balance => {
                unused(kind, "values", &record.values)?;
                unused(kind, "allow", &record.allow)?;
                Rule::Balance {
                    strategy: required(kind, "strategy", record.strategy)?,
                    metric: record.metric,
                }
            }
            RuleKind::Distribution => {
                unused(kind, "metric", &record.metric)?;
                unused(kind, "allow", &record.allow)?;
                Rule::Distribution {
                    values: required(kind, "values", record.values)?,
                    strategy: record.strategy,
                }
            }
            RuleKind::Preemption => {
                unused(kind, "metric", &record.metric)?;
                unused(kind, "strategy", &record.strategy)?;
                unused(kind, "values", &record.values)?;
                Rule::Preemption {
                    allow: required(kind, "allow", record.allow)?,
                }
            }
        };

        Ok(rule)
    }
}

impl From<Rule> for RuleRecord {
    fn from(rule: Rule) -> Self {
        let kind = rule.kind().to_string();
        match rule {
            Rule::Priority { metric, strategy } => Self {
                kind,
                metric: Some(metric),
                strategy,
                ..Default::default()
            },
            Rule::Balance { strategy, metric } => Self {
                kind,
                metric,
                strategy: Some(strategy),
                ..Default::default()
            },
            Rule::Distribution { values, strategy } => Self {
                kind,
                strategy,
                values: Some(values),
                ..Default::default()
            },
            Rule::Preemption { allow } => Self {
                kind,
                allow: Some(allow),
                ..Default::default()
            },
        }
    }
}

/// A named, ordered collection of scheduling rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RulesetRecord", into = "RulesetRecord")]
pub struct Ruleset {
    name: String,
    rules: Vec<Rule>,
}

impl Ruleset {
    pub fn new(name: impl Into<String>, rules: Vec<Rule>) -> PolicyResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(PolicyError::invalid("name", "ruleset name must not be empty"));
        }
        Ok(Self { name, rules })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rules in declaration order
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }
}

/// Unvalidated ruleset fields, as written in a policy document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RulesetRecord {
    pub name: String,
    #[serde(default)]
    pub rules: Vec<Rule>,
}

impl TryFrom<RulesetRecord> for Ruleset {
    type Error = PolicyError;

    fn try_from(record: RulesetRecord) -> PolicyResult<Self> {
        Ruleset::new(record.name, record.rules)
    }
}

impl From<Ruleset> for RulesetRecord {
    fn from(ruleset: Ruleset) -> Self {
        Self {
            name: ruleset.name,
            rules: ruleset.rules,
        }
    }
}
