//! centrifugo-exporter — Prometheus exporter for Centrifugo.
//!
//! Wires the configured [`centrifugo_stats::Client`] into a
//! [`centrifugo_metrics::CentrifugoCollector`], registers it, and serves the
//! registry over HTTP.
//!
//! # Architecture
//!
//! ```text
//! GET /metrics
//!   └── Registry::render(scrape timeout)
//!       └── CentrifugoCollector::collect
//!           └── Client::fetch → POST {endpoint}/api (info)
//! ```

pub mod config;
pub mod server;

use centrifugo_metrics::{CentrifugoCollector, Registry};
use centrifugo_stats::Client;

pub use config::{Cli, ConfigError, ExporterConfig, LogFormat};
pub use server::{ExporterState, build_router, scrape_timeout};

/// Build the registry holding the Centrifugo collector for `config`.
pub fn build_registry(config: &ExporterConfig) -> Result<Registry, ConfigError> {
    let client = Client::new(&config.endpoint, &config.secret, config.node_name.as_deref())?;
    let collector = CentrifugoCollector::new(client, config.target(), config.timeout);

    let mut registry = Registry::new();
    registry.register(collector)?;
    Ok(registry)
}
