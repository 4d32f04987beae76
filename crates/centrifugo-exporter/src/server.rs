//! HTTP exposition surface.
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/` | Landing page linking to the metrics path |
//! | GET | metrics path (default `/metrics`) | Prometheus exposition |

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, header};
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use centrifugo_metrics::{CONTENT_TYPE, Registry};
use tracing::debug;

/// Header Prometheus uses to announce its scrape timeout, in seconds.
pub const SCRAPE_TIMEOUT_HEADER: &str = "x-prometheus-scrape-timeout-seconds";

/// Subtracted from the announced scrape timeout so the response still
/// reaches Prometheus before it gives up.
const SCRAPE_TIMEOUT_MARGIN: Duration = Duration::from_millis(250);

/// Shared state for the exposition handlers.
#[derive(Clone)]
pub struct ExporterState {
    pub registry: Arc<Registry>,
    pub metrics_path: Arc<str>,
}

/// Build the exporter router.
pub fn build_router(registry: Arc<Registry>, metrics_path: &str) -> Router {
    let state = ExporterState {
        registry,
        metrics_path: Arc::from(metrics_path),
    };

    Router::new()
        .route("/", get(landing_page))
        .route(metrics_path, get(metrics))
        .with_state(state)
}

/// GET /
pub async fn landing_page(State(state): State<ExporterState>) -> Html<String> {
    let path = escape_html(&state.metrics_path);
    Html(format!(
        "<html>\n\
         <head><title>Centrifugo Exporter</title></head>\n\
         <body>\n\
         <h1>Centrifugo Exporter</h1>\n\
         <p><a href='{path}'>Metrics</a></p>\n\
         </body>\n\
         </html>\n"
    ))
}

/// GET {metrics_path}
///
/// Always answers 200: upstream failures surface as `centrifugo_up 0`.
pub async fn metrics(State(state): State<ExporterState>, headers: HeaderMap) -> impl IntoResponse {
    let started = Instant::now();
    let timeout = scrape_timeout(&headers);

    let body = state.registry.render(timeout).await;

    debug!(
        ?timeout,
        elapsed_ms = started.elapsed().as_millis() as u64,
        bytes = body.len(),
        "scrape served"
    );
    ([(header::CONTENT_TYPE, CONTENT_TYPE)], body)
}

/// Derive the fetch budget from the scrape request, if it announces one.
///
/// Deadlines no longer than the margin get half of the announced time.
pub fn scrape_timeout(headers: &HeaderMap) -> Option<Duration> {
    let secs: f64 = headers
        .get(SCRAPE_TIMEOUT_HEADER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()?;
    let announced = Duration::try_from_secs_f64(secs).ok()?;
    let timeout = if announced > SCRAPE_TIMEOUT_MARGIN {
        announced - SCRAPE_TIMEOUT_MARGIN
    } else {
        announced / 2
    };
    (!timeout.is_zero()).then_some(timeout)
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('\'', "&#39;")
        .replace('"', "&quot;")
}
