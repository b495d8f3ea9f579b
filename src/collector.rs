//! Collector Layer
//!
//! Polls NUT servers and turns device variables into [`Observation`]s.
//! Each target is collected by its own Tokio task; failures are logged and
//! contained to the device or target they happen on, so a round always
//! returns whatever could be gathered.
//!
//! # Architecture
//!
//! - [`Collector`]: trait consumed by the HTTP layer
//! - [`NutCollector`]: fan-out over [`Target`]s with ordered merge
//! - [`map_variables`]: variable set to observations, via the catalog
//!
//! # Example
//!
//! ```rust,no_run
//! use nut_exporter::{NutCollector, NutConfig};
//! use std::time::Duration;
//!
//! # async fn run() {
//! let config = NutConfig::new(["localhost", "ups.lan:3493"])
//!     .with_round_timeout(Duration::from_secs(30));
//! let collector = NutCollector::new(config);
//! for obs in collector.collect().await {
//!     println!("{} {} {}", obs.name(), obs.labels.device, obs.value);
//! }
//! # }
//! ```

mod mapping;
#[cfg(test)]
mod mock;
mod nut;
mod observation;
mod target;
mod traits;

pub use mapping::map_variables;
pub use nut::{NutCollector, NutConfig};
pub use observation::{DeviceLabels, Observation};
pub use target::{Target, TargetError};
pub use traits::{Collector, TargetDevices};
