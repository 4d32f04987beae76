//! centrifugo-exporter — exposes Centrifugo node statistics to Prometheus.
//!
//! # Usage
//!
//! ```text
//! centrifugo-exporter --centrifugo-endpoint http://localhost:8000 \
//!     --centrifugo-secret $KEY --address :9564
//! ```

use std::sync::Arc;
use std::time::Duration;

use centrifugo_exporter::{Cli, ExporterConfig, LogFormat, build_registry, build_router};
use clap::Parser;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// How long in-flight scrapes may run after a shutdown signal.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

const DEFAULT_LOG_FILTER: &str =
    "info,centrifugo_exporter=debug,centrifugo_metrics=debug,centrifugo_stats=debug";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let config = ExporterConfig::try_from(cli)?;
    run(config).await
}

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn run(config: ExporterConfig) -> anyhow::Result<()> {
    info!(
        endpoint = %config.endpoint,
        node = config.target(),
        timeout = ?config.timeout,
        "centrifugo exporter starting"
    );
    if config.secret.is_empty() {
        warn!("no centrifugo secret configured, API requests are sent without a key");
    }

    let registry = Arc::new(build_registry(&config)?);
    let router = build_router(registry, &config.metrics_path);

    let listener = tokio::net::TcpListener::bind(config.listen).await?;
    info!(addr = %config.listen, metrics_path = %config.metrics_path, "listening");

    // ── Shutdown signal ────────────────────────────────────────

    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

    let server = axum::serve(listener, router).with_graceful_shutdown(async move {
        shutdown_signal().await;
        info!("shutdown signal received");
        let _ = shutdown_tx.send(true);
    });
    let mut server = tokio::spawn(async move { server.await });

    // In-flight scrapes get a bounded grace period once the signal fires.
    let grace = async {
        if shutdown_rx.wait_for(|stop| *stop).await.is_ok() {
            tokio::time::sleep(SHUTDOWN_GRACE).await;
        } else {
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        result = &mut server => result??,
        _ = grace => {
            warn!(
                grace_secs = SHUTDOWN_GRACE.as_secs(),
                "in-flight scrapes did not finish, forcing shutdown"
            );
            server.abort();
        }
    }

    info!("centrifugo exporter stopped");
    Ok(())
}

/// Resolve on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
