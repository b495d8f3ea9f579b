//! Variable to observation mapping.

use std::sync::Arc;

use crate::catalog::{self, ValueKind};
use crate::protocol::VariableSet;

use super::observation::{DeviceLabels, Observation};

/// Turn the variables of one device into observations.
///
/// Unknown variables, unparseable numbers and tokens outside a closed set
/// are dropped; nothing here fails.
pub fn map_variables(device: &str, variables: &VariableSet) -> Vec<Observation> {
    let labels = Arc::new(DeviceLabels::from_variables(device, variables));
    let mut observations = Vec::new();

    for (variable, raw) in variables {
        let Some(descriptor) = catalog::lookup(variable) else {
            continue;
        };

        match descriptor.kind {
            ValueKind::Numeric => match raw.parse::<f64>() {
                Ok(value) => {
                    observations.push(Observation::numeric(descriptor, value, Arc::clone(&labels)))
                }
                Err(e) => tracing::debug!(
                    device = %device, variable = %variable, value = %raw, error = %e,
                    "Dropping non-numeric value"
                ),
            },
            ValueKind::Enumerated(_) => match descriptor.kind.canonical(raw) {
                Some(status) => {
                    observations.push(Observation::status(descriptor, status, Arc::clone(&labels)))
                }
                None => tracing::debug!(
                    device = %device, variable = %variable, value = %raw,
                    "Dropping value outside known states"
                ),
            },
            ValueKind::Flags(_) => {
                let mut seen: Vec<&'static str> = Vec::new();
                for token in raw.split_whitespace() {
                    match descriptor.kind.canonical(token) {
                        Some(flag) if !seen.contains(&flag) => {
                            seen.push(flag);
                            observations.push(Observation::status(
                                descriptor,
                                flag,
                                Arc::clone(&labels),
                            ));
                        }
                        Some(_) => {}
                        None => tracing::debug!(
                            device = %device, variable = %variable, flag = %token,
                            "Dropping unknown status flag"
                        ),
                    }
                }
            }
        }
    }

    observations
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> VariableSet {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_numeric_value_is_exact() {
        let obs = map_variables("rack", &vars(&[("battery.charge", "42.5")]));
        assert_eq!(obs.len(), 1);
        assert_eq!(obs[0].name(), "nut_battery_charge_percent");
        assert_eq!(obs[0].value, 42.5);
        assert_eq!(obs[0].status, None);
    }

    #[test]
    fn test_numeric_parse_failure_is_dropped() {
        let obs = map_variables(
            "rack",
            &vars(&[("battery.charge", "full"), ("ups.load", "")]),
        );
        assert!(obs.is_empty());
    }

    #[test]
    fn test_enumerated_known_state() {
        let obs = map_variables("rack", &vars(&[("battery.charger.status", "resting")]));
        assert_eq!(obs.len(), 1);
        assert_eq!(obs[0].name(), "nut_battery_charger_status");
        assert_eq!(obs[0].value, 1.0);
        assert_eq!(obs[0].status, Some("resting"));
    }

    #[test]
    fn test_enumerated_unknown_state_is_dropped() {
        let obs = map_variables("rack", &vars(&[("battery.charger.status", "unknown-junk")]));
        assert!(obs.is_empty());
    }

    #[test]
    fn test_beeper_status_is_label_valued() {
        let obs = map_variables("rack", &vars(&[("ups.beeper.status", "disabled")]));
        assert_eq!(obs.len(), 1);
        assert_eq!(obs[0].value, 1.0);
        assert_eq!(obs[0].status, Some("disabled"));
    }

    #[test]
    fn test_status_flags() {
        let obs = map_variables("rack", &vars(&[("ups.status", "OL CHRG")]));
        let flags: Vec<_> = obs.iter().map(|o| o.status.unwrap()).collect();
        assert_eq!(flags, vec!["OL", "CHRG"]);
        assert!(obs.iter().all(|o| o.value == 1.0));
    }

    #[test]
    fn test_status_flags_unknown_and_repeated() {
        let obs = map_variables("rack", &vars(&[("ups.status", "OB  WEIRD OB LB")]));
        let flags: Vec<_> = obs.iter().map(|o| o.status.unwrap()).collect();
        assert_eq!(flags, vec!["OB", "LB"]);
    }

    #[test]
    fn test_known_enumerated_and_unknown_variables() {
        let obs = map_variables(
            "rack",
            &vars(&[
                ("battery.charge", "100"),
                ("battery.charger.status", "charging"),
                ("driver.version.internal", "0.43"),
            ]),
        );
        assert_eq!(obs.len(), 2);
    }

    #[test]
    fn test_labels_shared_by_device() {
        let obs = map_variables(
            "rack",
            &vars(&[
                ("battery.charge", "100"),
                ("device.mfr", "Eaton"),
                ("device.model", "5P 1550"),
                ("device.serial", "G123"),
                ("device.type", "ups"),
                ("ups.load", "23"),
            ]),
        );
        assert_eq!(obs.len(), 2);
        assert!(Arc::ptr_eq(&obs[0].labels, &obs[1].labels));
        assert_eq!(obs[0].labels.values(), ["rack", "5P 1550", "Eaton", "G123", "ups"]);
    }
}
