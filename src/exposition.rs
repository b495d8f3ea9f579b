//! Prometheus text exposition of collected observations.

use std::collections::HashMap;
use std::fmt::Write;

use crate::catalog::{self, DEVICE_LABELS};
use crate::collector::Observation;

/// Content type of [`render`] output.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Render observations as Prometheus text format.
///
/// Families appear in catalog order, each with `HELP` and `TYPE` lines;
/// samples keep their collection order. Families without samples are
/// omitted.
pub fn render(observations: &[Observation]) -> String {
    let mut families: HashMap<&'static str, Vec<&Observation>> = HashMap::new();
    for obs in observations {
        families.entry(obs.name()).or_default().push(obs);
    }

    let mut out = String::new();
    for descriptor in catalog::descriptors() {
        let Some(samples) = families.get(descriptor.name) else {
            continue;
        };

        // Writing into a String cannot fail.
        let _ = writeln!(out, "# HELP {} {}", descriptor.name, escape_help(descriptor.help));
        let _ = writeln!(out, "# TYPE {} gauge", descriptor.name);
        for obs in samples {
            out.push_str(descriptor.name);
            out.push('{');
            for (i, (name, value)) in DEVICE_LABELS.iter().zip(obs.labels.values()).enumerate() {
                if i > 0 {
                    out.push(',');
                }
                let _ = write!(out, "{name}=\"{}\"", escape_label(value));
            }
            if let (Some(label), Some(status)) = (descriptor.kind.label(), obs.status) {
                let _ = write!(out, ",{label}=\"{}\"", escape_label(status));
            }
            let _ = writeln!(out, "}} {}", format_value(obs.value));
        }
    }
    out
}

fn escape_help(help: &str) -> String {
    help.replace('\\', "\\\\").replace('\n', "\\n")
}

fn escape_label(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            c => out.push(c),
        }
    }
    out
}

fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value == f64::INFINITY {
        "+Inf".to_string()
    } else if value == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else {
        value.to_string()
    }
}
