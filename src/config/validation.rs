//! Configuration parsing helpers.

use std::sync::OnceLock;
use std::time::Duration;

use regex::{Captures, Regex};
use thiserror::Error;

use crate::collector::Target;

/// Configuration error types.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse YAML configuration.
    #[error("failed to parse YAML config: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// Configuration validation failed.
    #[error("config validation error: {0}")]
    ValidationError(String),
}

/// Parse a NUT deadline such as `30s`, `1m30s` or `500ms`.
///
/// Used for the `--timeout` flag; config files go through `humantime_serde`
/// and are checked by `AppConfig::validate`. A zero deadline is rejected.
///
/// ```
/// use nut_exporter::config::parse_timeout;
///
/// assert_eq!(parse_timeout("10s").unwrap().as_secs(), 10);
/// assert_eq!(parse_timeout("1m30s").unwrap().as_secs(), 90);
/// assert!(parse_timeout("0s").is_err());
/// ```
pub fn parse_timeout(s: &str) -> Result<Duration, String> {
    let timeout = humantime::parse_duration(s.trim()).map_err(|e| e.to_string())?;
    if timeout.is_zero() {
        return Err("timeout must be non-zero".to_string());
    }
    Ok(timeout)
}

/// Split a space-separated `--hosts` value into validated targets.
pub fn parse_hosts(s: &str) -> Result<Vec<Target>, ConfigError> {
    let targets: Vec<Target> = s.split_whitespace().map(Target::from).collect();
    if targets.is_empty() {
        return Err(ConfigError::ValidationError("no hosts given".to_string()));
    }
    for target in &targets {
        target
            .validate()
            .map_err(|e| ConfigError::ValidationError(format!("hosts: {e}")))?;
    }
    Ok(targets)
}

/// Expand `${VAR}` and `${VAR:-default}` references.
///
/// Unset variables without a default expand to the empty string.
pub fn expand_env_vars(input: &str) -> String {
    static ENV_VAR_REGEX: OnceLock<Regex> = OnceLock::new();

    let regex = ENV_VAR_REGEX.get_or_init(|| {
        Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
            .expect("env var pattern is a valid regex")
    });

    regex
        .replace_all(input, |caps: &Captures| {
            let default_value = caps.get(2).map_or("", |m| m.as_str());
            std::env::var(&caps[1]).unwrap_or_else(|_| default_value.to_string())
        })
        .into_owned()
}
