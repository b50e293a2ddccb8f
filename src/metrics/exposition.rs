//! Prometheus text format export
//!
//! Renders a [`MetricRegistry`] in the standard exposition format. Constant
//! labels and per-child dynamic labels are merged and key-sorted so a series
//! always renders identically.
//!
//! # Example Output
//!
//! ```text
//! # HELP execCount Reports count of executions of something
//! # TYPE execCount counter
//! execCount{metricType="counter",of="ping",qualifier="-",serviceName="payments"} 42
//!
//! # HELP processingTime Reports processing time of something
//! # TYPE processingTime summary
//! processingTime{of="ping",qualifier="-",quantile="0.5"} 12.5
//! processingTime_sum{of="ping",qualifier="-"} 99.5
//! processingTime_count{of="ping",qualifier="-"} 8
//! ```

use std::collections::BTreeMap;
use std::fmt::Write;

use super::backend::{MetricDesc, SummarySnapshot};
use super::registry::{Collector, MetricRegistry};

/// Sort children by their dynamic label values so a series always renders
/// in a deterministic order.
fn sorted<T>(mut children: Vec<(Vec<String>, T)>) -> Vec<(Vec<String>, T)> {
    children.sort_by(|a, b| a.0.cmp(&b.0));
    children
}

/// Render every collector of the registry in the Prometheus text format.
pub fn render(registry: &MetricRegistry) -> String {
    let mut output = String::with_capacity(4096);

    for collector in registry.collectors() {
        match collector {
            Collector::Counter(vec) => {
                write_counter(&mut output, vec.desc(), vec.collect());
            }
            Collector::Gauge(vec) => {
                write_gauge(&mut output, vec.desc(), vec.collect());
            }
            Collector::Summary(vec) => {
                write_summary(&mut output, vec.desc(), vec.collect());
            }
        }
    }

    output
}

fn write_counter(output: &mut String, desc: &MetricDesc, children: Vec<(Vec<String>, u64)>) {
    if children.is_empty() {
        return;
    }

    write_header(output, desc, "counter");
    for (values, value) in sorted(children) {
        let labels = label_pairs(desc, &values, None);
        write_sample(output, &desc.name, &labels, &value.to_string());
    }
    writeln!(output).unwrap();
}

fn write_gauge(output: &mut String, desc: &MetricDesc, children: Vec<(Vec<String>, i64)>) {
    if children.is_empty() {
        return;
    }

    write_header(output, desc, "gauge");
    for (values, value) in sorted(children) {
        let labels = label_pairs(desc, &values, None);
        write_sample(output, &desc.name, &labels, &value.to_string());
    }
    writeln!(output).unwrap();
}

fn write_summary(output: &mut String, desc: &MetricDesc, mut children: Vec<SummarySnapshot>) {
    if children.is_empty() {
        return;
    }

    children.sort_by(|a, b| a.label_values.cmp(&b.label_values));

    write_header(output, desc, "summary");
    for child in children {
        for (quantile, value) in &child.quantiles {
            let labels = label_pairs(
                desc,
                &child.label_values,
                Some(("quantile", format_value(*quantile))),
            );
            write_sample(output, &desc.name, &labels, &format_value(*value));
        }

        let labels = label_pairs(desc, &child.label_values, None);
        let sum_name = format!("{}_sum", desc.name);
        write_sample(output, &sum_name, &labels, &format_value(child.sum));
        let count_name = format!("{}_count", desc.name);
        write_sample(output, &count_name, &labels, &child.count.to_string());
    }
    writeln!(output).unwrap();
}

fn write_header(output: &mut String, desc: &MetricDesc, kind: &str) {
    writeln!(output, "# HELP {} {}", desc.name, desc.help).unwrap();
    writeln!(output, "# TYPE {} {}", desc.name, kind).unwrap();
}

fn write_sample(output: &mut String, name: &str, labels: &str, value: &str) {
    if labels.is_empty() {
        writeln!(output, "{name} {value}").unwrap();
    } else {
        writeln!(output, "{name}{{{labels}}} {value}").unwrap();
    }
}

/// Merge constant labels, dynamic labels, and an optional extra pair into one
/// key-sorted `k="v",...` string.
fn label_pairs(desc: &MetricDesc, values: &[String], extra: Option<(&str, String)>) -> String {
    let mut pairs: BTreeMap<&str, &str> = desc
        .const_labels
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();

    for (name, value) in desc.label_names.iter().zip(values.iter()) {
        pairs.insert(name, value);
    }

    let extra_value;
    if let Some((key, value)) = extra {
        extra_value = value;
        pairs.insert(key, &extra_value);
    }

    pairs
        .iter()
        .map(|(k, v)| format!("{k}=\"{}\"", escape_value(v)))
        .collect::<Vec<_>>()
        .join(",")
}

/// Escape a label value per the exposition format rules.
fn escape_value(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

/// Render a float without trailing noise; NaN renders as `NaN`.
fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else {
        format!("{value}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::backend::{CounterVec, GaugeVec, Opts, SummaryVec};
    use std::sync::Arc;

    fn const_labels() -> BTreeMap<String, String> {
        let mut labels = BTreeMap::new();
        labels.insert("serviceName".to_string(), "payments".to_string());
        labels
    }

    #[test]
    fn test_counter_exposition_merges_const_labels() {
        let registry = MetricRegistry::new();
        let vec = Arc::new(CounterVec::new(
            Opts::new("execCount", "Executions"),
            &["of".to_string()],
            const_labels(),
        ));
        registry.register(Collector::Counter(vec.clone())).unwrap();

        vec.with_label_values(&["ping".to_string()]).inc();
        vec.with_label_values(&["ping".to_string()]).inc();

        let output = registry.gather();
        assert!(output.contains("# HELP execCount Executions"));
        assert!(output.contains("# TYPE execCount counter"));
        assert!(output.contains("execCount{of=\"ping\",serviceName=\"payments\"} 2"));
    }

    #[test]
    fn test_gauge_exposition_without_labels() {
        let registry = MetricRegistry::new();
        let vec = Arc::new(GaugeVec::new(
            Opts::new("active", "Active"),
            &[],
            BTreeMap::new(),
        ));
        registry.register(Collector::Gauge(vec.clone())).unwrap();

        vec.with_label_values(&[]).set(7);

        let output = registry.gather();
        assert!(output.contains("# TYPE active gauge"));
        assert!(output.contains("active 7"));
    }

    #[test]
    fn test_summary_exposition_has_quantiles_sum_count() {
        let registry = MetricRegistry::new();
        let vec = Arc::new(SummaryVec::new(
            Opts::new("processingTime", "Latency"),
            &["of".to_string()],
            BTreeMap::new(),
        ));
        registry.register(Collector::Summary(vec.clone())).unwrap();

        let summary = vec.with_label_values(&["ping".to_string()]);
        summary.observe(10.0);
        summary.observe(30.0);

        let output = registry.gather();
        assert!(output.contains("# TYPE processingTime summary"));
        assert!(output.contains("processingTime{of=\"ping\",quantile=\"0\"} 10"));
        assert!(output.contains("processingTime{of=\"ping\",quantile=\"1\"} 30"));
        assert!(output.contains("processingTime_sum{of=\"ping\"} 40"));
        assert!(output.contains("processingTime_count{of=\"ping\"} 2"));
    }

    #[test]
    fn test_empty_vectors_are_omitted() {
        let registry = MetricRegistry::new();
        let vec = Arc::new(CounterVec::new(
            Opts::new("execCount", "Executions"),
            &["of".to_string()],
            BTreeMap::new(),
        ));
        registry.register(Collector::Counter(vec)).unwrap();

        assert!(registry.gather().is_empty());
    }

    #[test]
    fn test_escape_value() {
        assert_eq!(escape_value("plain"), "plain");
        assert_eq!(escape_value("say \"hi\""), "say \\\"hi\\\"");
        assert_eq!(escape_value("a\\b"), "a\\\\b");
        assert_eq!(escape_value("two\nlines"), "two\\nlines");
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(0.5), "0.5");
        assert_eq!(format_value(1.0), "1");
        assert_eq!(format_value(f64::NAN), "NaN");
    }
}
