//! Observation types produced by a collection round.

use std::sync::Arc;

use crate::catalog::MetricDescriptor;
use crate::protocol::VariableSet;

/// Identity labels attached to every observation of one device.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceLabels {
    /// Device name as listed by the server.
    pub device: String,
    /// `device.model`, empty when not reported.
    pub model: String,
    /// `device.mfr`, empty when not reported.
    pub manufacturer: String,
    /// `device.serial`, empty when not reported.
    pub serial: String,
    /// `device.type`, empty when not reported.
    pub device_type: String,
}

impl DeviceLabels {
    /// Build the label set of `device` from its variables.
    pub fn from_variables(device: &str, variables: &VariableSet) -> Self {
        let get = |name: &str| variables.get(name).cloned().unwrap_or_default();
        Self {
            device: device.to_string(),
            model: get("device.model"),
            manufacturer: get("device.mfr"),
            serial: get("device.serial"),
            device_type: get("device.type"),
        }
    }

    /// Label values in [`crate::catalog::DEVICE_LABELS`] order.
    pub fn values(&self) -> [&str; 5] {
        [
            &self.device,
            &self.model,
            &self.manufacturer,
            &self.serial,
            &self.device_type,
        ]
    }
}

/// One exported sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    /// Metric identity and help.
    pub descriptor: &'static MetricDescriptor,
    /// Sample value; `1` for enumerated and flag variables.
    pub value: f64,
    /// Labels of the device the sample belongs to.
    pub labels: Arc<DeviceLabels>,
    /// Matched token for enumerated and flag variables.
    pub status: Option<&'static str>,
}

impl Observation {
    /// Create a numeric sample.
    pub fn numeric(
        descriptor: &'static MetricDescriptor,
        value: f64,
        labels: Arc<DeviceLabels>,
    ) -> Self {
        Self {
            descriptor,
            value,
            labels,
            status: None,
        }
    }

    /// Create a presence sample for a matched status token.
    pub fn status(
        descriptor: &'static MetricDescriptor,
        status: &'static str,
        labels: Arc<DeviceLabels>,
    ) -> Self {
        Self {
            descriptor,
            value: 1.0,
            labels,
            status: Some(status),
        }
    }

    /// Metric name.
    pub fn name(&self) -> &'static str {
        self.descriptor.name
    }
}
