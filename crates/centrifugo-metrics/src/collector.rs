//! Centrifugo node collector.
//!
//! Fetches a [`NodeStats`] snapshot on every scrape and maps it onto a fixed
//! set of metric families. A failed fetch yields only `centrifugo_up 0`;
//! a successful one yields `centrifugo_up 1` plus every field metric, so the
//! exposed series set never changes shape between successful scrapes.

use std::iter;
use std::time::Duration;

use centrifugo_stats::{NodeStats, StatsSource};
use tracing::{debug, warn};

use crate::descriptor::{MetricDescriptor, MetricSample};
use crate::registry::{CollectFuture, Collector};

const NODE_LABELS: &[&str] = &["node"];

/// Whether the last fetch from the node succeeded.
pub static UP: MetricDescriptor = MetricDescriptor::gauge(
    "centrifugo_up",
    "Whether the last scrape of the Centrifugo node succeeded.",
    NODE_LABELS,
);

/// A metric backed by one [`NodeStats`] field.
struct FieldMetric {
    descriptor: MetricDescriptor,
    value: fn(&NodeStats) -> u64,
}

static FIELD_METRICS: [FieldMetric; 11] = [
    FieldMetric {
        descriptor: MetricDescriptor::gauge(
            "centrifugo_uptime_seconds",
            "Node uptime in seconds.",
            NODE_LABELS,
        ),
        value: |s| s.uptime_seconds,
    },
    FieldMetric {
        descriptor: MetricDescriptor::gauge(
            "centrifugo_clients",
            "Number of active client connections.",
            NODE_LABELS,
        ),
        value: |s| s.clients,
    },
    FieldMetric {
        descriptor: MetricDescriptor::gauge(
            "centrifugo_users",
            "Number of unique users among connected clients.",
            NODE_LABELS,
        ),
        value: |s| s.users,
    },
    FieldMetric {
        descriptor: MetricDescriptor::gauge(
            "centrifugo_subscriptions",
            "Number of active channel subscriptions.",
            NODE_LABELS,
        ),
        value: |s| s.subscriptions,
    },
    FieldMetric {
        descriptor: MetricDescriptor::gauge(
            "centrifugo_channels",
            "Number of active channels.",
            NODE_LABELS,
        ),
        value: |s| s.channels,
    },
    FieldMetric {
        descriptor: MetricDescriptor::counter(
            "centrifugo_messages_sent_total",
            "Messages sent to clients.",
            NODE_LABELS,
        ),
        value: |s| s.messages_sent,
    },
    FieldMetric {
        descriptor: MetricDescriptor::counter(
            "centrifugo_messages_received_total",
            "Messages received from clients.",
            NODE_LABELS,
        ),
        value: |s| s.messages_received,
    },
    FieldMetric {
        descriptor: MetricDescriptor::counter(
            "centrifugo_messages_published_total",
            "Messages published into channels.",
            NODE_LABELS,
        ),
        value: |s| s.messages_published,
    },
    FieldMetric {
        descriptor: MetricDescriptor::counter(
            "centrifugo_api_calls_total",
            "Server API calls.",
            NODE_LABELS,
        ),
        value: |s| s.api_calls,
    },
    FieldMetric {
        descriptor: MetricDescriptor::counter(
            "centrifugo_api_errors_total",
            "Server API calls that failed.",
            NODE_LABELS,
        ),
        value: |s| s.api_errors,
    },
    FieldMetric {
        descriptor: MetricDescriptor::gauge(
            "centrifugo_memory_bytes",
            "Resident memory of the Centrifugo process in bytes.",
            NODE_LABELS,
        ),
        value: |s| s.memory_bytes,
    },
];

/// Collector for a single Centrifugo node.
pub struct CentrifugoCollector<S> {
    source: S,
    /// Value of the `node` label on every sample.
    node: String,
    /// Fetch budget when the scrape does not carry one.
    default_timeout: Duration,
}

impl<S: StatsSource> CentrifugoCollector<S> {
    pub fn new(source: S, node: impl Into<String>, default_timeout: Duration) -> Self {
        Self {
            source,
            node: node.into(),
            default_timeout,
        }
    }

    /// The `node` label value.
    pub fn node(&self) -> &str {
        &self.node
    }

    async fn scrape(&self, timeout: Option<Duration>) -> Vec<MetricSample> {
        let timeout = timeout.unwrap_or(self.default_timeout);

        let stats = match self.source.fetch(timeout).await {
            Ok(stats) => stats,
            Err(e) => {
                warn!(
                    endpoint = self.source.endpoint(),
                    node = %self.node,
                    kind = %e.kind(),
                    error = %e,
                    "centrifugo scrape failed"
                );
                return vec![self.sample(&UP, 0)];
            }
        };

        debug!(
            node = %self.node,
            uid = %stats.uid,
            version = %stats.version,
            "centrifugo scrape succeeded"
        );

        iter::once(self.sample(&UP, 1))
            .chain(
                FIELD_METRICS
                    .iter()
                    .map(|m| self.sample(&m.descriptor, (m.value)(&stats))),
            )
            .collect()
    }

    fn sample(&self, descriptor: &'static MetricDescriptor, value: u64) -> MetricSample {
        MetricSample::new(descriptor, vec![self.node.clone()], value as f64)
    }
}

impl<S: StatsSource> Collector for CentrifugoCollector<S> {
    fn describe(&self) -> Vec<&'static MetricDescriptor> {
        iter::once(&UP)
            .chain(FIELD_METRICS.iter().map(|m| &m.descriptor))
            .collect()
    }

    fn collect(&self, timeout: Option<Duration>) -> CollectFuture<'_> {
        Box::pin(self.scrape(timeout))
    }
}
