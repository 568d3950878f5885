//! Log subscriber setup

use crate::config::LoggingConfig;
use crate::error::{PolicyError, PolicyResult};
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber described by `config`.
///
/// Unparseable level directives fall back to `info`. Installing a second
/// subscriber in the same process is reported as a configuration error.
pub fn init_logging(config: &LoggingConfig) -> PolicyResult<()> {
    let json = match config.format.to_lowercase().as_str() {
        "json" => true,
        "text" => false,
        other => {
            return Err(PolicyError::Config(format!(
                "Unknown log format: {}",
                other
            )))
        }
    };

    let filter = EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    let result = match &config.file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            let builder = builder.with_writer(Mutex::new(file)).with_ansi(false);
            if json {
                builder.json().try_init()
            } else {
                builder.try_init()
            }
        }
        None => {
            if json {
                builder.json().try_init()
            } else {
                builder.try_init()
            }
        }
    };

    result.map_err(|e| PolicyError::Config(format!("Failed to set subscriber: {}", e)))
}
