//! Wire types for the `info` API method and the decoded [`NodeStats`].
//!
//! Every numeric field is decoded through [`lenient_u64`]: absent, null,
//! negative, non-finite or wrongly typed values become `0` instead of
//! failing the whole response. Unknown fields are ignored.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::{FetchError, FetchResult};

/// Snapshot of one Centrifugo node at the moment of the fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeStats {
    /// Unique node id, regenerated on every server start.
    pub uid: String,
    /// Node name as configured on the server.
    pub name: String,
    /// Server version string.
    pub version: String,
    pub uptime_seconds: u64,
    /// Active client connections.
    pub clients: u64,
    /// Unique users among connected clients.
    pub users: u64,
    /// Active channel subscriptions.
    pub subscriptions: u64,
    pub channels: u64,
    pub messages_sent: u64,
    pub messages_received: u64,
    pub messages_published: u64,
    pub api_calls: u64,
    /// Subset of `api_calls` that ended in an error.
    pub api_errors: u64,
    /// Resident memory of the server process in bytes.
    pub memory_bytes: u64,
}

/// Top-level envelope of an API response.
///
/// Centrifugo reports API errors with HTTP 200 and an `error` object.
#[derive(Debug, Deserialize)]
pub struct InfoResponse {
    #[serde(default)]
    pub result: Option<InfoResult>,
    #[serde(default)]
    pub error: Option<ApiError>,
}

#[derive(Debug, Default, Deserialize)]
pub struct InfoResult {
    #[serde(default)]
    pub nodes: Vec<NodeInfo>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApiError {
    #[serde(default, deserialize_with = "lenient_u64")]
    pub code: u64,
    #[serde(default, deserialize_with = "or_default")]
    pub message: String,
}

/// A single node entry as reported by `info`.
#[derive(Debug, Default, Deserialize)]
pub struct NodeInfo {
    #[serde(default, deserialize_with = "or_default")]
    pub uid: String,
    #[serde(default, deserialize_with = "or_default")]
    pub name: String,
    #[serde(default, deserialize_with = "or_default")]
    pub version: String,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub uptime: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub num_clients: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub num_users: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub num_subs: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub num_channels: u64,
    #[serde(default, deserialize_with = "or_default")]
    pub process: ProcessInfo,
    #[serde(default, deserialize_with = "or_default")]
    pub metrics: NodeMetrics,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProcessInfo {
    #[serde(default, deserialize_with = "lenient_u64")]
    pub rss: u64,
}

/// The node's periodically aggregated metrics block.
#[derive(Debug, Default, Deserialize)]
pub struct NodeMetrics {
    #[serde(default, deserialize_with = "lenient_u64")]
    pub interval: u64,
    #[serde(default, deserialize_with = "or_default")]
    pub items: NodeMetricItems,
}

/// Known counters inside `metrics.items`. Values arrive as floats.
#[derive(Debug, Default, Deserialize)]
pub struct NodeMetricItems {
    #[serde(
        rename = "centrifugo.client.num_msg_sent",
        default,
        deserialize_with = "lenient_u64"
    )]
    pub messages_sent: u64,
    #[serde(
        rename = "centrifugo.client.num_msg_received",
        default,
        deserialize_with = "lenient_u64"
    )]
    pub messages_received: u64,
    #[serde(
        rename = "centrifugo.client.num_msg_published",
        default,
        deserialize_with = "lenient_u64"
    )]
    pub messages_published: u64,
    #[serde(
        rename = "centrifugo.http_api.num_request",
        default,
        deserialize_with = "lenient_u64"
    )]
    pub api_calls: u64,
    #[serde(
        rename = "centrifugo.http_api.num_error",
        default,
        deserialize_with = "lenient_u64"
    )]
    pub api_errors: u64,
    #[serde(
        rename = "process.resident_memory_bytes",
        default,
        deserialize_with = "lenient_u64"
    )]
    pub resident_memory_bytes: u64,
}

impl From<NodeInfo> for NodeStats {
    fn from(node: NodeInfo) -> Self {
        let items = node.metrics.items;
        // Newer servers report rss under `process`, older ones only in items.
        let memory_bytes = if node.process.rss > 0 {
            node.process.rss
        } else {
            items.resident_memory_bytes
        };

        Self {
            uid: node.uid,
            name: node.name,
            version: node.version,
            uptime_seconds: node.uptime,
            clients: node.num_clients,
            users: node.num_users,
            subscriptions: node.num_subs,
            channels: node.num_channels,
            messages_sent: items.messages_sent,
            messages_received: items.messages_received,
            messages_published: items.messages_published,
            api_calls: items.api_calls,
            api_errors: items.api_errors,
            memory_bytes,
        }
    }
}

impl InfoResponse {
    /// Decode a raw response body.
    pub fn from_slice(body: &[u8]) -> FetchResult<Self> {
        serde_json::from_slice(body).map_err(|e| FetchError::Decode(e.to_string()))
    }

    /// Select the target node and convert it into a [`NodeStats`].
    ///
    /// With a node name, the node reporting that name is selected; without
    /// one, the first node reported.
    pub fn into_node_stats(self, node_name: Option<&str>) -> FetchResult<NodeStats> {
        if let Some(err) = self.error {
            return Err(FetchError::Api {
                code: err.code,
                message: err.message,
            });
        }

        let result = self
            .result
            .ok_or_else(|| FetchError::Decode("response has no result".to_string()))?;

        let node = match node_name {
            Some(name) => result.nodes.into_iter().find(|n| n.name == name),
            None => result.nodes.into_iter().next(),
        };

        node.map(NodeStats::from).ok_or_else(|| {
            FetchError::NodeNotFound(node_name.unwrap_or("<any>").to_string())
        })
    }
}

/// Decode any JSON number into a `u64`, mapping everything else to `0`.
fn lenient_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(number_to_u64(&value))
}

fn number_to_u64(value: &Value) -> u64 {
    let Value::Number(n) = value else {
        return 0;
    };
    if let Some(v) = n.as_u64() {
        return v;
    }
    match n.as_f64() {
        Some(f) if f.is_finite() && f >= 0.0 => f as u64,
        _ => 0,
    }
}

/// Decode `T`, falling back to `T::default()` when the value has the wrong shape.
fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).unwrap_or_default())
}
