//! centrifugo-stats — node statistics from the Centrifugo admin API.
//!
//! Issues one `info` call per fetch and decodes the reported node into a
//! [`NodeStats`] snapshot. Decoding is schema tolerant: fields that a given
//! server version omits (or reports with an unexpected type) decode to zero.
//!
//! # Architecture
//!
//! ```text
//! StatsSource (trait)
//!   └── Client
//!       ├── POST {endpoint}/api  {"method":"info"}
//!       ├── InfoResponse → NodeInfo (lenient wire types)
//!       └── NodeInfo → NodeStats
//! ```

pub mod client;
pub mod error;
pub mod stats;

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

pub use client::Client;
pub use error::{ErrorKind, FetchError, FetchResult};
pub use http::StatusCode;
pub use stats::NodeStats;

/// Boxed future returned by [`StatsSource::fetch`].
pub type FetchFuture<'a> = Pin<Box<dyn Future<Output = FetchResult<NodeStats>> + Send + 'a>>;

/// A source of node statistics, injected into the collector.
pub trait StatsSource: Send + Sync {
    /// Fetch a fresh snapshot. Must resolve within `timeout`.
    fn fetch(&self, timeout: Duration) -> FetchFuture<'_>;

    /// The upstream endpoint, for diagnostics.
    fn endpoint(&self) -> &str;
}
