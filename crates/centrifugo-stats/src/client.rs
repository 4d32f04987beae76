//! HTTP client for the Centrifugo admin API.
//!
//! One `info` request per fetch, no retries. The whole exchange runs under
//! the caller's timeout and is aborted when the returned future is dropped.

use std::error::Error as StdError;
use std::fmt;
use std::time::Duration;

use bytes::Bytes;
use http::{Method, Request, Response, Uri, header};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper_util::client::legacy::Client as HttpClient;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use tracing::debug;

use crate::error::{FetchError, FetchResult};
use crate::stats::{InfoResponse, NodeStats};
use crate::{FetchFuture, StatsSource};

const INFO_REQUEST: &[u8] = br#"{"method":"info","params":{}}"#;
const USER_AGENT: &str = concat!("centrifugo-exporter/", env!("CARGO_PKG_VERSION"));

/// Client for a single Centrifugo endpoint.
#[derive(Clone)]
pub struct Client {
    http: HttpClient<HttpConnector, Full<Bytes>>,
    endpoint: String,
    api_uri: Uri,
    secret: String,
    node_name: Option<String>,
}

impl Client {
    /// Create a client for `endpoint` (e.g. `http://localhost:8000`).
    ///
    /// An empty `secret` sends no `Authorization` header. An empty or absent
    /// `node_name` selects the first node the server reports.
    pub fn new(endpoint: &str, secret: &str, node_name: Option<&str>) -> FetchResult<Self> {
        let api_uri = api_uri(endpoint)?;
        let http = HttpClient::builder(TokioExecutor::new()).build_http();

        Ok(Self {
            http,
            endpoint: endpoint.to_string(),
            api_uri,
            secret: secret.to_string(),
            node_name: node_name.filter(|n| !n.is_empty()).map(str::to_string),
        })
    }

    /// Fetch the current node statistics, bounded by `timeout`.
    pub async fn fetch_stats(&self, timeout: Duration) -> FetchResult<NodeStats> {
        match tokio::time::timeout(timeout, self.request_info()).await {
            Ok(result) => result,
            Err(_) => {
                debug!(endpoint = %self.endpoint, ?timeout, "info request timed out");
                Err(FetchError::Timeout(timeout))
            }
        }
    }

    async fn request_info(&self) -> FetchResult<NodeStats> {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(self.api_uri.clone())
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::USER_AGENT, USER_AGENT);
        if !self.secret.is_empty() {
            builder = builder.header(header::AUTHORIZATION, format!("apikey {}", self.secret));
        }
        let req = builder
            .body(Full::new(Bytes::from_static(INFO_REQUEST)))
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let resp: Response<Incoming> = self.http.request(req).await.map_err(transport)?;
        let status = resp.status();
        if !status.is_success() {
            debug!(endpoint = %self.endpoint, %status, "info request rejected");
            return Err(FetchError::Status { status });
        }

        let body = resp.into_body().collect().await.map_err(transport)?.to_bytes();
        let stats = InfoResponse::from_slice(&body)?.into_node_stats(self.node_name.as_deref())?;

        debug!(
            endpoint = %self.endpoint,
            node = %stats.name,
            version = %stats.version,
            uptime = stats.uptime_seconds,
            "node stats fetched"
        );
        Ok(stats)
    }
}

impl StatsSource for Client {
    fn fetch(&self, timeout: Duration) -> FetchFuture<'_> {
        Box::pin(self.fetch_stats(timeout))
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("endpoint", &self.endpoint)
            .field("api_uri", &self.api_uri)
            .field("secret", &if self.secret.is_empty() { "" } else { "<redacted>" })
            .field("node_name", &self.node_name)
            .finish()
    }
}

/// Derive the API URI (`{endpoint}/api`) and reject endpoints we cannot call.
fn api_uri(endpoint: &str) -> FetchResult<Uri> {
    let invalid = |reason: &str| FetchError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        reason: reason.to_string(),
    };

    let uri: Uri = format!("{}/api", endpoint.trim_end_matches('/'))
        .parse()
        .map_err(|e: http::uri::InvalidUri| invalid(&e.to_string()))?;

    match uri.scheme_str() {
        Some("http") => {}
        Some(_) => return Err(invalid("only http:// endpoints are supported")),
        None => return Err(invalid("missing scheme")),
    }
    if uri.authority().is_none() {
        return Err(invalid("missing host"));
    }
    Ok(uri)
}

/// Flatten an error and its sources into one message.
fn transport<E: StdError>(err: E) -> FetchError {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    FetchError::Transport(message)
}
