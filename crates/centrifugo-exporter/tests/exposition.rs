//! Exposition tests.
//!
//! Drives the exporter router with `oneshot`, backed either by an in-process
//! stats source or by the real client pointed at a stub Centrifugo.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::routing::post;
use centrifugo_exporter::{Cli, ExporterConfig, build_registry, build_router};
use centrifugo_metrics::{CentrifugoCollector, Registry};
use centrifugo_stats::{FetchError, FetchFuture, NodeStats, StatsSource};
use clap::Parser;
use http_body_util::BodyExt;
use tower::ServiceExt;

/// Stats source with a fixed outcome.
struct Stub {
    fail: bool,
}

impl StatsSource for Stub {
    fn fetch(&self, timeout: Duration) -> FetchFuture<'_> {
        let fail = self.fail;
        Box::pin(async move {
            if fail {
                return Err(FetchError::Timeout(timeout));
            }
            Ok(NodeStats {
                name: "node-1".to_string(),
                uptime_seconds: 120,
                clients: 5,
                channels: 3,
                messages_sent: 1000,
                ..NodeStats::default()
            })
        })
    }

    fn endpoint(&self) -> &str {
        "http://centrifugo.test:8000"
    }
}

fn stub_router(fail: bool, metrics_path: &str) -> Router {
    let mut registry = Registry::new();
    registry
        .register(CentrifugoCollector::new(
            Stub { fail },
            "node-1",
            Duration::from_secs(1),
        ))
        .unwrap();
    build_router(Arc::new(registry), metrics_path)
}

async fn get(router: Router, uri: &str) -> (StatusCode, Option<String>, String) {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let resp = router.oneshot(req).await.unwrap();
    let status = resp.status();
    let content_type = resp
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    (status, content_type, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn landing_page_links_metrics_path() {
    let (status, _, body) = get(stub_router(false, "/metrics"), "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("<h1>Centrifugo Exporter</h1>"));
    assert!(body.contains("href='/metrics'"));
}

#[tokio::test]
async fn metrics_on_success() {
    let (status, content_type, body) = get(stub_router(false, "/metrics"), "/metrics").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        content_type.as_deref(),
        Some("text/plain; version=0.0.4; charset=utf-8")
    );
    assert!(body.contains("# TYPE centrifugo_up gauge"));
    assert!(body.contains("centrifugo_up{node=\"node-1\"} 1\n"));
    assert!(body.contains("centrifugo_uptime_seconds{node=\"node-1\"} 120\n"));
    assert!(body.contains("centrifugo_clients{node=\"node-1\"} 5\n"));
    assert!(body.contains("centrifugo_channels{node=\"node-1\"} 3\n"));
    assert!(body.contains("# TYPE centrifugo_messages_sent_total counter"));
    assert!(body.contains("centrifugo_messages_sent_total{node=\"node-1\"} 1000\n"));
    assert!(body.contains("centrifugo_memory_bytes{node=\"node-1\"} 0\n"));
}

#[tokio::test]
async fn metrics_on_failure_still_ok() {
    let (status, _, body) = get(stub_router(true, "/metrics"), "/metrics").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("centrifugo_up{node=\"node-1\"} 0\n"));
    let samples: Vec<_> = body.lines().filter(|l| !l.starts_with('#')).collect();
    assert_eq!(samples, vec!["centrifugo_up{node=\"node-1\"} 0"]);
}

#[tokio::test]
async fn custom_metrics_path() {
    let router = stub_router(false, "/probe");

    let (status, _, body) = get(router.clone(), "/probe").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("centrifugo_up"));

    let (status, _, _) = get(router.clone(), "/metrics").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, _, landing) = get(router, "/").await;
    assert!(landing.contains("href='/probe'"));
}

#[tokio::test]
async fn metrics_rejects_post() {
    let req = Request::builder()
        .method("POST")
        .uri("/metrics")
        .body(Body::empty())
        .unwrap();
    let resp = stub_router(false, "/metrics").oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
}

// ── Against a stub Centrifugo ──────────────────────────────────

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn config(endpoint: &str, extra: &[&str]) -> ExporterConfig {
    let argv = ["centrifugo-exporter", "--centrifugo-endpoint", endpoint]
        .into_iter()
        .chain(extra.iter().copied());
    ExporterConfig::try_from(Cli::try_parse_from(argv).unwrap()).unwrap()
}

#[tokio::test]
async fn end_to_end_with_stub_centrifugo() {
    let endpoint = serve(Router::new().route(
        "/api",
        post(|| async {
            r#"{"result":{"nodes":[{
                "name": "node-1",
                "uptime": 120,
                "num_clients": 5,
                "num_channels": 3,
                "metrics": {"items": {"centrifugo.client.num_msg_sent": 1000.0}}
            }]}}"#
        }),
    ))
    .await;

    let config = config(&endpoint, &["--centrifugo-node-name", "node-1"]);
    let router = build_router(Arc::new(build_registry(&config).unwrap()), "/metrics");

    let (status, _, body) = get(router, "/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("centrifugo_up{node=\"node-1\"} 1\n"));
    assert!(body.contains("centrifugo_uptime_seconds{node=\"node-1\"} 120\n"));
    assert!(body.contains("centrifugo_messages_sent_total{node=\"node-1\"} 1000\n"));
}

#[tokio::test]
async fn unauthorized_upstream_reports_down() {
    let endpoint = serve(Router::new().route(
        "/api",
        post(|| async { StatusCode::UNAUTHORIZED }),
    ))
    .await;

    let config = config(&endpoint, &["--centrifugo-node-name", "node-1"]);
    let router = build_router(Arc::new(build_registry(&config).unwrap()), "/metrics");

    let (status, _, body) = get(router, "/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("centrifugo_up{node=\"node-1\"} 0\n"));
    assert!(!body.contains("centrifugo_clients"));
}

#[tokio::test]
async fn scrape_timeout_header_bounds_upstream_call() {
    let endpoint = serve(Router::new().route(
        "/api",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            "{}"
        }),
    ))
    .await;

    let config = config(&endpoint, &["--centrifugo-node-name", "node-1"]);
    let router = build_router(Arc::new(build_registry(&config).unwrap()), "/metrics");

    let req = Request::builder()
        .uri("/metrics")
        .header("X-Prometheus-Scrape-Timeout-Seconds", "0.5")
        .body(Body::empty())
        .unwrap();

    let started = Instant::now();
    let resp = router.oneshot(req).await.unwrap();
    assert!(started.elapsed() < Duration::from_secs(3));
    assert_eq!(resp.status(), StatusCode::OK);

    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let body = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(body.contains("centrifugo_up{node=\"node-1\"} 0\n"));
}

#[tokio::test]
async fn deadline_shorter_than_margin_is_honoured() {
    let endpoint = serve(Router::new().route(
        "/api",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            "{}"
        }),
    ))
    .await;

    let config = config(
        &endpoint,
        &["--centrifugo-node-name", "node-1", "--centrifugo-timeout", "3s"],
    );
    let router = build_router(Arc::new(build_registry(&config).unwrap()), "/metrics");

    let req = Request::builder()
        .uri("/metrics")
        .header("X-Prometheus-Scrape-Timeout-Seconds", "0.2")
        .body(Body::empty())
        .unwrap();

    let started = Instant::now();
    let resp = router.oneshot(req).await.unwrap();
    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(resp.status(), StatusCode::OK);

    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let body = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(body.contains("centrifugo_up{node=\"node-1\"} 0\n"));
}
