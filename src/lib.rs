//! NUT Exporter - Prometheus metrics for Network UPS Tools
//!
//! This crate polls one or more NUT servers (`upsd`) over the NUT network
//! protocol and exposes the state of every attached UPS as Prometheus gauges.
//! It can be used as a library, or run as a standalone binary with the
//! `nut-exporter` executable.
//!
//! # Architecture
//!
//! - **Protocol**: async NUT client (`LIST UPS`, `LIST VAR`)
//! - **Catalog**: static mapping of NUT variables to metric descriptors
//! - **Collector**: per-target fan-out, failure containment, ordered merge
//! - **Exposition**: Prometheus text rendering
//! - **Server**: Axum HTTP surface (`/metrics`, `/healthz`, `/api/devices`)
//!
//! # Example
//!
//! ```rust,no_run
//! use nut_exporter::{NutCollector, NutConfig, exposition};
//!
//! # async fn run() {
//! let collector = NutCollector::new(NutConfig::new(["localhost"]));
//! let observations = collector.collect().await;
//! print!("{}", exposition::render(&observations));
//! # }
//! ```

pub mod catalog;
pub mod collector;
pub mod config;
pub mod exposition;
pub mod protocol;
pub mod server;

pub use catalog::{MetricDescriptor, ValueKind};
pub use collector::{
    Collector, DeviceLabels, NutCollector, NutConfig, Observation, Target, TargetDevices,
    TargetError,
};
pub use config::{AppConfig, ConfigError};
pub use protocol::{Client, ClientError, ClientOptions, VariableSet};
