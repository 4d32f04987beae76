//! Metric descriptors and samples.

/// Prometheus metric type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    /// Monotonically non-decreasing value.
    Counter,
    /// Point-in-time value.
    Gauge,
}

impl MetricKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Counter => "counter",
            Self::Gauge => "gauge",
        }
    }
}

/// Static definition of one exposed metric.
#[derive(Debug, PartialEq, Eq)]
pub struct MetricDescriptor {
    pub name: &'static str,
    pub help: &'static str,
    pub kind: MetricKind,
    /// Label names, in the order sample values are given.
    pub labels: &'static [&'static str],
}

impl MetricDescriptor {
    pub const fn counter(
        name: &'static str,
        help: &'static str,
        labels: &'static [&'static str],
    ) -> Self {
        Self {
            name,
            help,
            kind: MetricKind::Counter,
            labels,
        }
    }

    pub const fn gauge(
        name: &'static str,
        help: &'static str,
        labels: &'static [&'static str],
    ) -> Self {
        Self {
            name,
            help,
            kind: MetricKind::Gauge,
            labels,
        }
    }
}

/// One observed value of a descriptor, produced during a single scrape.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSample {
    pub descriptor: &'static MetricDescriptor,
    /// Values for `descriptor.labels`, same order.
    pub label_values: Vec<String>,
    pub value: f64,
}

impl MetricSample {
    pub fn new(descriptor: &'static MetricDescriptor, label_values: Vec<String>, value: f64) -> Self {
        Self {
            descriptor,
            label_values,
            value,
        }
    }

    pub fn name(&self) -> &'static str {
        self.descriptor.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static REQUESTS: MetricDescriptor =
        MetricDescriptor::counter("test_requests_total", "Requests.", &["node"]);

    #[test]
    fn constructors_set_kind() {
        assert_eq!(REQUESTS.kind, MetricKind::Counter);
        assert_eq!(
            MetricDescriptor::gauge("test_up", "Up.", &[]).kind,
            MetricKind::Gauge
        );
    }

    #[test]
    fn kind_as_str() {
        assert_eq!(MetricKind::Counter.as_str(), "counter");
        assert_eq!(MetricKind::Gauge.as_str(), "gauge");
    }

    #[test]
    fn sample_name_comes_from_descriptor() {
        let sample = MetricSample::new(&REQUESTS, vec!["node-1".to_string()], 3.0);
        assert_eq!(sample.name(), "test_requests_total");
    }
}
