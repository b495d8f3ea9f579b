//! Configuration module for the exporter.
//!
//! Provides YAML-based configuration loading and validation for:
//! - Server settings (port, bind address)
//! - NUT collector settings (targets, timeouts, concurrency)

mod app;
mod validation;

pub use app::{AppConfig, DEFAULT_SERVER_PORT, ServerConfig};
pub use validation::{ConfigError, expand_env_vars, parse_hosts, parse_timeout};
