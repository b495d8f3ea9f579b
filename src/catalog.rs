//! Variable catalog.
//!
//! Static table mapping NUT variable names (`battery.charge`, `ups.status`,
//! ...) to the metric they are exported as. Variables missing from the table
//! are not exported.

use std::collections::HashMap;
use std::sync::OnceLock;

/// Prefix shared by every exported metric name.
pub const NAMESPACE: &str = "nut";

/// Label carrying the matched token of enumerated and flag variables.
pub const STATUS_LABEL: &str = "status";

/// Device identity labels, in exposition order.
pub const DEVICE_LABELS: [&str; 5] = ["device", "model", "manufacturer", "serial", "type"];

/// Beeper states reported in `ups.beeper.status`.
const BEEPER_STATES: &[&str] = &["enabled", "disabled", "muted"];

/// Charger states reported in `battery.charger.status`.
const CHARGER_STATES: &[&str] = &["charging", "discharging", "floating", "resting"];

/// Status flags that may appear in `ups.status`.
const UPS_STATUS_FLAGS: &[&str] = &[
    "OL", "OB", "LB", "HB", "RB", "CHRG", "DISCHRG", "BYPASS", "CAL", "OFF", "OVER", "TRIM",
    "BOOST", "FSD", "ALARM", "TEST",
];

/// How the raw value of a variable becomes a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Value is a decimal number, exported as is.
    Numeric,
    /// Value is one token of a closed set, exported as `1` with the token
    /// in the status label.
    Enumerated(&'static [&'static str]),
    /// Value is a space-separated list of tokens from a closed set; each
    /// known token is exported as its own `1` sample.
    Flags(&'static [&'static str]),
}

impl ValueKind {
    /// Extra label name used by this kind, if any.
    pub fn label(&self) -> Option<&'static str> {
        match self {
            Self::Numeric => None,
            Self::Enumerated(_) | Self::Flags(_) => Some(STATUS_LABEL),
        }
    }

    /// Return the closed-set entry equal to `token`.
    ///
    /// Always `None` for [`ValueKind::Numeric`].
    pub fn canonical(&self, token: &str) -> Option<&'static str> {
        match self {
            Self::Numeric => None,
            Self::Enumerated(set) | Self::Flags(set) => set.iter().copied().find(|s| *s == token),
        }
    }
}

/// Export description of one NUT variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricDescriptor {
    /// NUT variable name.
    pub variable: &'static str,
    /// Fully qualified metric name.
    pub name: &'static str,
    /// Help text.
    pub help: &'static str,
    /// Value interpretation.
    pub kind: ValueKind,
}

const fn gauge(variable: &'static str, name: &'static str, help: &'static str) -> MetricDescriptor {
    MetricDescriptor {
        variable,
        name,
        help,
        kind: ValueKind::Numeric,
    }
}

const fn state(
    variable: &'static str,
    name: &'static str,
    help: &'static str,
    states: &'static [&'static str],
) -> MetricDescriptor {
    MetricDescriptor {
        variable,
        name,
        help,
        kind: ValueKind::Enumerated(states),
    }
}

const fn flags(
    variable: &'static str,
    name: &'static str,
    help: &'static str,
    set: &'static [&'static str],
) -> MetricDescriptor {
    MetricDescriptor {
        variable,
        name,
        help,
        kind: ValueKind::Flags(set),
    }
}

#[rustfmt::skip]
static DESCRIPTORS: &[MetricDescriptor] = &[
    gauge("device.uptime", "nut_ups_uptime_seconds", "Device uptime"),

    gauge("ups.temperature", "nut_ups_temperature_celsius", "UPS temperature"),
    gauge("ups.load", "nut_ups_load_percent", "Load on UPS"),
    gauge("ups.load.high", "nut_ups_load_high_percent", "Load when UPS switches to overload condition"),
    gauge("ups.efficiency", "nut_ups_efficiency", "Efficiency of the UPS (ratio of the output current on the input current)"),
    gauge("ups.power", "nut_ups_power_voltamperes", "Current value of apparent power"),
    gauge("ups.power.nominal", "nut_ups_power_nominal_voltamperes", "Nominal value of apparent power"),
    gauge("ups.realpower", "nut_ups_realpower_watts", "Current value of real power"),
    gauge("ups.realpower.nominal", "nut_ups_realpower_nominal_watts", "Nominal value of real power"),
    gauge("ups.delay.shutdown", "nut_ups_delay_shutdown_seconds", "Interval to wait after shutdown with delay command"),
    gauge("ups.delay.start", "nut_ups_delay_start_seconds", "Interval to wait before (re)starting the load"),
    gauge("ups.timer.shutdown", "nut_ups_timer_shutdown_seconds", "Time before the load will be shutdown"),
    gauge("ups.timer.start", "nut_ups_timer_start_seconds", "Time before the load will be started"),
    state("ups.beeper.status", "nut_ups_beeper_status", "UPS beeper status", BEEPER_STATES),
    flags("ups.status", "nut_ups_status", "UPS status flags", UPS_STATUS_FLAGS),

    gauge("input.voltage", "nut_input_voltage_volts", "Input voltage"),
    gauge("input.voltage.maximum", "nut_input_voltage_maximum_volts", "Maximum incoming voltage seen"),
    gauge("input.voltage.minimum", "nut_input_voltage_minimum_volts", "Minimum incoming voltage seen"),
    gauge("input.voltage.low.warning", "nut_input_voltage_low_warning_volts", "Low warning threshold"),
    gauge("input.voltage.low.critical", "nut_input_voltage_low_critical_volts", "Low critical threshold"),
    gauge("input.voltage.high.warning", "nut_input_voltage_high_warning_volts", "High warning threshold"),
    gauge("input.voltage.high.critical", "nut_input_voltage_high_critical_volts", "High critical threshold"),
    gauge("input.voltage.nominal", "nut_input_voltage_nominal_volts", "Nominal input voltage"),
    gauge("input.transfer.delay", "nut_input_transfer_delay_seconds", "Delay before transfer to mains"),
    gauge("input.transfer.low", "nut_input_transfer_low_volts", "Low voltage transfer point"),
    gauge("input.transfer.high", "nut_input_transfer_high_volts", "High voltage transfer point"),
    gauge("input.transfer.low.min", "nut_input_transfer_low_min_volts", "Smallest settable low voltage transfer point"),
    gauge("input.transfer.low.max", "nut_input_transfer_low_max_volts", "Greatest settable low voltage transfer point"),
    gauge("input.transfer.high.min", "nut_input_transfer_high_min_volts", "Smallest settable high voltage transfer point"),
    gauge("input.transfer.high.max", "nut_input_transfer_high_max_volts", "Greatest settable high voltage transfer point"),
    gauge("input.transfer.boost.low", "nut_input_transfer_boost_low_volts", "Low voltage boosting transfer point"),
    gauge("input.transfer.boost.high", "nut_input_transfer_boost_high_volts", "High voltage boosting transfer point"),
    gauge("input.transfer.trim.low", "nut_input_transfer_trim_low_volts", "Low voltage trimming transfer point"),
    gauge("input.transfer.trim.high", "nut_input_transfer_trim_high_volts", "High voltage trimming transfer point"),
    gauge("input.current", "nut_input_current_amperes", "Input current"),
    gauge("input.current.nominal", "nut_input_current_nominal_amperes", "Nominal input current"),
    gauge("input.current.low.warning", "nut_input_current_low_warning_amperes", "Low warning threshold"),
    gauge("input.current.low.critical", "nut_input_current_low_critical_amperes", "Low critical threshold"),
    gauge("input.current.high.warning", "nut_input_current_high_warning_amperes", "High warning threshold"),
    gauge("input.current.high.critical", "nut_input_current_high_critical_amperes", "High critical threshold"),
    gauge("input.frequency", "nut_input_frequency_hertz", "Input line frequency"),
    gauge("input.frequency.nominal", "nut_input_frequency_nominal_hertz", "Nominal input line frequency"),
    gauge("input.frequency.low", "nut_input_frequency_low_hertz", "Input line frequency low"),
    gauge("input.frequency.high", "nut_input_frequency_high_hertz", "Input line frequency high"),
    gauge("input.load", "nut_input_load_percent", "Load on (ePDU) input"),
    gauge("input.realpower", "nut_input_realpower_watts", "Current sum value of all (ePDU) phases real power"),
    gauge("input.power", "nut_input_power_voltamperes", "Current sum value of all (ePDU) phases apparent power"),

    gauge("output.voltage", "nut_output_voltage_volts", "Output voltage"),
    gauge("output.voltage.nominal", "nut_output_voltage_nominal_volts", "Nominal output voltage"),
    gauge("output.frequency", "nut_output_frequency_hertz", "Output frequency"),
    gauge("output.frequency.nominal", "nut_output_frequency_nominal_hertz", "Nominal output frequency"),
    gauge("output.current", "nut_output_current_amperes", "Output current"),
    gauge("output.current.nominal", "nut_output_current_nominal_amperes", "Nominal output current"),
    gauge("output.realpower", "nut_output_realpower_watts", "Output real power"),
    gauge("output.power", "nut_output_power_voltamperes", "Output apparent power"),

    gauge("ambient.temperature", "nut_ambient_temperature_celsius", "Ambient temperature"),
    gauge("ambient.humidity", "nut_ambient_humidity_percent", "Ambient relative humidity"),

    gauge("battery.charge", "nut_battery_charge_percent", "Battery charge"),
    gauge("battery.charge.low", "nut_battery_charge_low_percent", "Remaining battery level when UPS switches to LB"),
    gauge("battery.charge.restart", "nut_battery_charge_restart_percent", "Minimum battery level for UPS restart after power-off"),
    gauge("battery.charge.warning", "nut_battery_charge_warning_percent", "Battery level when UPS switches to \"Warning\" state"),
    state("battery.charger.status", "nut_battery_charger_status", "Status of the battery charger", CHARGER_STATES),
    gauge("battery.voltage", "nut_battery_voltage_volts", "Battery voltage"),
    gauge("battery.voltage.nominal", "nut_battery_voltage_nominal_volts", "Nominal battery voltage"),
    gauge("battery.voltage.low", "nut_battery_voltage_low_volts", "Minimum battery voltage, that triggers FSD status"),
    gauge("battery.voltage.high", "nut_battery_voltage_high_volts", "Maximum battery voltage (i.e. battery.charge = 100)"),
    gauge("battery.capacity", "nut_battery_capacity_amperehours", "Battery capacity"),
    gauge("battery.current", "nut_battery_current_amperes", "Battery current"),
    gauge("battery.current.total", "nut_battery_current_total_amperes", "Total battery current"),
    gauge("battery.temperature", "nut_battery_temperature_celsius", "Battery temperature"),
    gauge("battery.runtime", "nut_battery_runtime_seconds", "Battery runtime"),
    gauge("battery.runtime.low", "nut_battery_runtime_low_seconds", "Remaining battery runtime when UPS switches to LB"),
    gauge("battery.runtime.restart", "nut_battery_runtime_restart_seconds", "Minimum battery runtime for UPS restart after power-off"),
    gauge("battery.packs", "nut_battery_packs", "Number of battery packs"),
    gauge("battery.packs.bad", "nut_battery_packs_bad", "Number of bad battery packs"),
];

/// All descriptors in declaration order.
pub fn descriptors() -> &'static [MetricDescriptor] {
    DESCRIPTORS
}

/// Look up the descriptor for a NUT variable.
///
/// Returns `None` for variables this build does not export.
///
/// # Examples
///
/// ```
/// use nut_exporter::catalog::{self, ValueKind};
///
/// let charge = catalog::lookup("battery.charge").unwrap();
/// assert_eq!(charge.name, "nut_battery_charge_percent");
/// assert_eq!(charge.kind, ValueKind::Numeric);
/// assert!(catalog::lookup("driver.version").is_none());
/// ```
pub fn lookup(variable: &str) -> Option<&'static MetricDescriptor> {
    static INDEX: OnceLock<HashMap<&'static str, &'static MetricDescriptor>> = OnceLock::new();

    INDEX
        .get_or_init(|| DESCRIPTORS.iter().map(|d| (d.variable, d)).collect())
        .get(variable)
        .copied()
}
