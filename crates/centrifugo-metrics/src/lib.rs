//! centrifugo-metrics — Prometheus metrics for a Centrifugo node.
//!
//! Maps [`centrifugo_stats::NodeStats`] snapshots onto a fixed set of
//! metric families and renders them in the Prometheus text exposition
//! format.
//!
//! # Architecture
//!
//! ```text
//! Registry
//!   ├── register() ← validates descriptors (names, duplicates)
//!   ├── gather()   → MetricFamily per descriptor
//!   └── render()   → text/plain for the metrics endpoint
//!
//! CentrifugoCollector: Collector
//!   ├── describe() → static descriptors
//!   └── collect()  → StatsSource::fetch → samples (or centrifugo_up 0)
//! ```

pub mod collector;
pub mod descriptor;
pub mod prometheus;
pub mod registry;

pub use collector::CentrifugoCollector;
pub use descriptor::{MetricDescriptor, MetricKind, MetricSample};
pub use prometheus::{CONTENT_TYPE, render};
pub use registry::{CollectFuture, Collector, MetricFamily, Registry, RegistryError};
