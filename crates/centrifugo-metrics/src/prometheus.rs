//! Prometheus text exposition format.
//!
//! Renders gathered metric families into the text format (version 0.0.4)
//! for scraping by a Prometheus server or compatible agent.

use std::fmt::Write;

use crate::registry::MetricFamily;

/// Content type of the rendered exposition.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Render metric families into Prometheus text format.
///
/// Families without samples are omitted entirely.
pub fn render(families: &[MetricFamily]) -> String {
    let mut out = String::new();

    for family in families.iter().filter(|f| !f.samples.is_empty()) {
        let desc = family.descriptor;

        // Help + type declarations.
        let _ = writeln!(out, "# HELP {} {}", desc.name, escape_help(desc.help));
        let _ = writeln!(out, "# TYPE {} {}", desc.name, desc.kind.as_str());

        for sample in &family.samples {
            out.push_str(desc.name);
            if !desc.labels.is_empty() {
                out.push('{');
                for (i, (name, value)) in desc.labels.iter().zip(&sample.label_values).enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    let _ = write!(out, "{name}=\"{}\"", escape_label_value(value));
                }
                out.push('}');
            }
            let _ = writeln!(out, " {}", format_value(sample.value));
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
        // Display prints integral floats without a fractional part.
        value.to_string()
    }
}

fn escape_help(help: &str) -> String {
    help.replace('\\', "\\\\").replace('\n', "\\n")
}

fn escape_label_value(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{MetricDescriptor, MetricSample};

    static CLIENTS: MetricDescriptor =
        MetricDescriptor::gauge("test_clients", "Connected clients.", &["node"]);
    static SENT: MetricDescriptor =
        MetricDescriptor::counter("test_sent_total", "Messages sent.", &["node"]);
    static BARE: MetricDescriptor = MetricDescriptor::gauge("test_bare", "No labels.", &[]);

    fn family(descriptor: &'static MetricDescriptor, values: &[(&str, f64)]) -> MetricFamily {
        MetricFamily {
            descriptor,
            samples: values
                .iter()
                .map(|(node, v)| MetricSample::new(descriptor, vec![node.to_string()], *v))
                .collect(),
        }
    }

    #[test]
    fn render_empty() {
        assert!(render(&[]).is_empty());
        assert!(render(&[family(&CLIENTS, &[])]).is_empty());
    }

    #[test]
    fn render_single_family() {
        let output = render(&[family(&CLIENTS, &[("node-1", 5.0)])]);

        assert_eq!(
            output,
            "# HELP test_clients Connected clients.\n\
             # TYPE test_clients gauge\n\
             test_clients{node=\"node-1\"} 5\n"
        );
    }

    #[test]
    fn render_counter_type() {
        let output = render(&[family(&SENT, &[("node-1", 1000.0)])]);
        assert!(output.contains("# TYPE test_sent_total counter"));
        assert!(output.contains("test_sent_total{node=\"node-1\"} 1000\n"));
    }

    #[test]
    fn render_without_labels() {
        let output = render(&[MetricFamily {
            descriptor: &BARE,
            samples: vec![MetricSample::new(&BARE, Vec::new(), 0.5)],
        }]);
        assert!(output.contains("test_bare 0.5\n"));
    }

    #[test]
    fn label_values_are_escaped() {
        let output = render(&[family(&CLIENTS, &[("a\"b\\c\nd", 1.0)])]);
        assert!(output.contains(r#"test_clients{node="a\"b\\c\nd"} 1"#));
    }

    #[test]
    fn special_values() {
        assert_eq!(format_value(f64::NAN), "NaN");
        assert_eq!(format_value(f64::INFINITY), "+Inf");
        assert_eq!(format_value(f64::NEG_INFINITY), "-Inf");
        assert_eq!(format_value(31457280.0), "31457280");
        assert_eq!(format_value(1.25), "1.25");
    }

    #[test]
    fn render_format_is_prometheus_compatible() {
        let output = render(&[
            family(&CLIENTS, &[("node-1", 5.0)]),
            family(&SENT, &[("node-1", 7.0)]),
        ]);

        // Every non-comment line should match: metric_name{labels} value
        for line in output.lines() {
            if line.starts_with('#') {
                continue;
            }
            assert!(
                line.contains('{') && line.contains("} "),
                "line should have labels: {line}"
            );
        }
    }
}
