//! Application configuration structures.

use std::net::IpAddr;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::collector::{NutConfig, Target};

use super::validation::{ConfigError, expand_env_vars};

// =============================================================================
// Constants
// =============================================================================

/// Default HTTP port of the exporter.
pub const DEFAULT_SERVER_PORT: u16 = 9100;

// =============================================================================
// Server Configuration
// =============================================================================

/// Web server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server bind address (default: "0.0.0.0").
    pub bind: String,

    /// Server port (default: 9100).
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: DEFAULT_SERVER_PORT,
        }
    }
}

// =============================================================================
// Application Configuration
// =============================================================================

/// Top-level application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Web server configuration.
    pub server: ServerConfig,

    /// NUT collector configuration.
    pub nut: NutConfig,
}

impl AppConfig {
    /// Load configuration from a YAML file.
    ///
    /// `${VAR}` and `${VAR:-default}` references are expanded before parsing.
    /// An empty file yields the defaults.
    ///
    /// # Errors
    /// Returns `ConfigError` if the file cannot be read, parsed, or validated.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let content = expand_env_vars(&content);
        let config: Self = if content.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(&content)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Replace the target list, e.g. from a space-separated `--hosts` value.
    pub fn set_targets<I, T>(&mut self, targets: I)
    where
        I: IntoIterator<Item = T>,
        T: Into<Target>,
    {
        self.nut.targets = targets.into_iter().map(Into::into).collect();
    }

    /// Validate configuration values.
    ///
    /// # Errors
    /// Returns `ConfigError::ValidationError` if any field is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Validate server bind address
        self.server.bind.parse::<IpAddr>().map_err(|_| {
            ConfigError::ValidationError(format!(
                "invalid server bind address: '{}'",
                self.server.bind
            ))
        })?;

        // Validate server port
        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "server port must be non-zero".to_string(),
            ));
        }

        // Validate targets
        if self.nut.targets.is_empty() {
            return Err(ConfigError::ValidationError(
                "at least one nut target is required".to_string(),
            ));
        }
        for target in &self.nut.targets {
            target
                .validate()
                .map_err(|e| ConfigError::ValidationError(format!("nut targets: {e}")))?;
        }

        // Validate timeouts
        check_timeout("connect_timeout", self.nut.connect_timeout)?;
        check_timeout("io_timeout", self.nut.io_timeout)?;
        if let Some(round_timeout) = self.nut.round_timeout {
            check_timeout("round_timeout", round_timeout)?;
        }

        // Validate concurrency
        if self.nut.concurrency == 0 {
            return Err(ConfigError::ValidationError(
                "nut concurrency must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

fn check_timeout(name: &str, value: Duration) -> Result<(), ConfigError> {
    if value.is_zero() {
        return Err(ConfigError::ValidationError(format!(
            "nut {name} must be non-zero"
        )));
    }
    Ok(())
}
