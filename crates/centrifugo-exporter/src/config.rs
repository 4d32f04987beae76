//! Process configuration.
//!
//! Flags with environment fallbacks, read once at startup into an immutable
//! [`ExporterConfig`].

use std::net::SocketAddr;
use std::time::Duration;

use centrifugo_metrics::RegistryError;
use centrifugo_stats::FetchError;
use clap::{Parser, ValueEnum};
use thiserror::Error;

#[derive(Debug, Parser)]
#[command(
    name = "centrifugo-exporter",
    about = "Prometheus exporter for Centrifugo node statistics",
    version
)]
pub struct Cli {
    /// Centrifugo server endpoint.
    #[arg(long, env = "CENTRIFUGO_ENDPOINT", default_value = "http://localhost:8000")]
    pub centrifugo_endpoint: String,

    /// Centrifugo API key.
    #[arg(long, env = "CENTRIFUGO_SECRET", default_value = "", hide_env_values = true)]
    pub centrifugo_secret: String,

    /// Target Centrifugo node name (default: first node reported).
    #[arg(long, env = "CENTRIFUGO_NODE_NAME", default_value = "")]
    pub centrifugo_node_name: String,

    /// Upstream timeout when the scrape does not carry one (e.g. 5s, 500ms, 1m).
    #[arg(long, env = "CENTRIFUGO_TIMEOUT", default_value = "5s", value_parser = parse_duration)]
    pub centrifugo_timeout: Duration,

    /// Address to listen on for web interface and telemetry.
    #[arg(long, env = "EXPORTER_ADDRESS", default_value = ":9564")]
    pub address: String,

    /// Path under which to expose metrics.
    #[arg(long, env = "EXPORTER_METRICS_PATH", default_value = "/metrics")]
    pub metrics_path: String,

    /// Log output format.
    #[arg(long, env = "EXPORTER_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// Errors that make the exporter refuse to start.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid listen address {0:?}")]
    Address(String),

    #[error("invalid metrics path {0:?}: must be a literal absolute path other than '/'")]
    MetricsPath(String),

    #[error("centrifugo timeout must be greater than zero")]
    Timeout,

    #[error(transparent)]
    Endpoint(#[from] FetchError),

    #[error("collector registration failed: {0}")]
    Registry(#[from] RegistryError),
}

/// Validated exporter configuration.
#[derive(Debug, Clone)]
pub struct ExporterConfig {
    pub endpoint: String,
    pub secret: String,
    pub node_name: Option<String>,
    pub timeout: Duration,
    pub listen: SocketAddr,
    pub metrics_path: String,
    pub log_format: LogFormat,
}

impl ExporterConfig {
    /// Identity attached to every sample: the node name, or the endpoint
    /// when no node name is configured.
    pub fn target(&self) -> &str {
        self.node_name.as_deref().unwrap_or(&self.endpoint)
    }
}

impl TryFrom<Cli> for ExporterConfig {
    type Error = ConfigError;

    fn try_from(cli: Cli) -> Result<Self, Self::Error> {
        let listen = parse_listen(&cli.address)?;

        if !is_literal_path(&cli.metrics_path) {
            return Err(ConfigError::MetricsPath(cli.metrics_path));
        }
        if cli.centrifugo_timeout.is_zero() {
            return Err(ConfigError::Timeout);
        }

        let node_name = Some(cli.centrifugo_node_name.trim().to_string()).filter(|n| !n.is_empty());

        Ok(Self {
            endpoint: cli.centrifugo_endpoint,
            secret: cli.centrifugo_secret,
            node_name,
            timeout: cli.centrifugo_timeout,
            listen,
            metrics_path: cli.metrics_path,
            log_format: cli.log_format,
        })
    }
}

/// Parse a listen address. A bare `:port` listens on all interfaces.
fn parse_listen(address: &str) -> Result<SocketAddr, ConfigError> {
    let address = address.trim();
    let full = match address.strip_prefix(':') {
        Some(port) => format!("0.0.0.0:{port}"),
        None => address.to_string(),
    };
    full.parse()
        .map_err(|_| ConfigError::Address(address.to_string()))
}

/// An absolute route path without captures or wildcards, usable as-is by the
/// router.
fn is_literal_path(path: &str) -> bool {
    path.starts_with('/')
        && path != "/"
        && !path.contains(['{', '}', '*'])
        && !path.split('/').any(|segment| segment.starts_with(':'))
}

/// Parse a duration string like "5s", "500ms", "1m".
fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    let parsed = if let Some(ms) = s.strip_suffix("ms") {
        ms.parse::<u64>().ok().map(Duration::from_millis)
    } else if let Some(secs) = s.strip_suffix('s') {
        secs.parse::<u64>().ok().map(Duration::from_secs)
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.parse::<u64>().ok().map(|m| Duration::from_secs(m * 60))
    } else {
        s.parse::<u64>().ok().map(Duration::from_secs)
    };
    parsed.ok_or_else(|| format!("invalid duration {s:?}"))
}
