//! Configuration types for the policy engine

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Device scoring weights
    pub scoring: ScoringConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl EngineConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &std::path::Path) -> Result<Self, crate::PolicyError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            crate::PolicyError::Config(format!("Failed to read config file: {}", e))
        })?;
        toml::from_str(&content)
            .map_err(|e| crate::PolicyError::Config(format!("Failed to parse config: {}", e)))
    }
}

/// Weights used to rank eligible devices
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Score every eligible device starts from
    pub base: f64,
    /// Added when the device is online
    pub online_bonus: f64,
    /// Memory (GB) at or above which `high_memory_bonus` applies
    pub high_memory_gb: f64,
    pub high_memory_bonus: f64,
    /// Temperature (°C) strictly below which `cool_bonus` applies
    pub cool_below_c: f64,
    pub cool_bonus: f64,
    /// Temperature (°C) strictly above which `hot_penalty` is subtracted
    pub hot_above_c: f64,
    pub hot_penalty: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            base: 1.0,
            online_bonus: 0.5,
            high_memory_gb: 16.0,
            high_memory_bonus: 0.3,
            cool_below_c: 60.0,
            cool_bonus: 0.2,
            hot_above_c: 80.0,
            hot_penalty: 0.3,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level or `EnvFilter` directive (e.g. "info", "gpupolicy_engine=debug")
    pub level: String,
    /// Log format (json or text)
    pub format: String,
    /// Log file path (if any)
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
            file: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_engine_config() {
        let config = EngineConfig::default();
        assert_eq!(config.scoring.base, 1.0);
        assert_eq!(config.scoring.high_memory_gb, 16.0);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_config_parse() {
        let toml_str = r#"
[scoring]
online_bonus = 0.75
hot_above_c = 85.0

[logging]
format = "json"
"#;
        let config: EngineConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.scoring.online_bonus, 0.75);
        assert_eq!(config.scoring.hot_above_c, 85.0);
        assert_eq!(config.scoring.cool_bonus, 0.2);
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[logging]\nlevel = \"debug\"").unwrap();
        let config = EngineConfig::from_file(file.path()).unwrap();
        assert_eq!(config.logging.level, "debug");

        let mut bad = tempfile::NamedTempFile::new().unwrap();
        writeln!(bad, "[scoring\nbase = ").unwrap();
        let err = EngineConfig::from_file(bad.path()).unwrap_err();
        assert!(matches!(err, crate::PolicyError::Config(_)));
    }
}
