//! Collector trait used by the HTTP surface.

use async_trait::async_trait;
use serde::Serialize;

use super::observation::Observation;
use super::target::Target;

/// Device listing of one target.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetDevices {
    /// Target as configured.
    pub target: Target,
    /// Device names in server order; empty when `error` is set.
    pub devices: Vec<String>,
    /// Why the listing failed.
    pub error: Option<String>,
}

/// Source of observations.
///
/// Implementations contain every failure: both operations always return,
/// possibly with partial or empty results.
#[async_trait]
pub trait Collector: Send + Sync + 'static {
    /// Run one collection round.
    async fn collect(&self) -> Vec<Observation>;

    /// List the devices of every target.
    async fn enumerate_devices(&self) -> Vec<TargetDevices>;
}
