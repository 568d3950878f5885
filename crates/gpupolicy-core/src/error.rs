//! Error types for the policy engine

use thiserror::Error;

/// Main error type for policy construction and loading
#[derive(Error, Debug)]
pub enum PolicyError {
    /// A data-model value was rejected at construction time
    #[error("Invalid policy data: field `{field}` {reason}")]
    InvalidPolicyData {
        /// Name of the offending field
        field: String,
        /// Why the value was rejected
        reason: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl PolicyError {
    /// Build an `InvalidPolicyData` error for `field`
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        PolicyError::InvalidPolicyData {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for policy operations
pub type PolicyResult<T> = Result<T, PolicyError>;

impl From<serde_json::Error> for PolicyError {
    fn from(err: serde_json::Error) -> Self {
        PolicyError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for PolicyError {
    fn from(err: toml::de::Error) -> Self {
        PolicyError::Serialization(err.to_string())
    }
}

/// Reject non-finite values; `min` additionally bounds the value from below.
pub(crate) fn check_finite(field: &str, value: f64, min: Option<f64>) -> PolicyResult<f64> {
    if !value.is_finite() {
        return Err(PolicyError::invalid(field, "must be a finite number"));
    }
    if let Some(min) = min {
        if value < min {
            return Err(PolicyError::invalid(
                field,
                format!("must be >= {}, got {}", min, value),
            ));
        }
    }
    Ok(value)
}
