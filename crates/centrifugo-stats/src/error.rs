//! Error types for the Centrifugo stats client.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Result type alias for fetch operations.
pub type FetchResult<T> = Result<T, FetchError>;

/// Errors that can occur while fetching node statistics.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid endpoint {endpoint}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("unexpected status {status}")]
    Status { status: http::StatusCode },

    #[error("api error {code}: {message}")]
    Api { code: u64, message: String },

    #[error("malformed response: {0}")]
    Decode(String),

    #[error("node not found: {0}")]
    NodeNotFound(String),
}

/// Coarse classification of a [`FetchError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Server unreachable, connection reset, or deadline exceeded.
    Transport,
    /// The server answered but refused the request.
    Rejected,
    /// The response could not be decoded into a node snapshot.
    Malformed,
}

impl FetchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidEndpoint { .. } | Self::Transport(_) | Self::Timeout(_) => {
                ErrorKind::Transport
            }
            Self::Status { .. } | Self::Api { .. } => ErrorKind::Rejected,
            Self::Decode(_) | Self::NodeNotFound(_) => ErrorKind::Malformed,
        }
    }
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transport => "transport",
            Self::Rejected => "rejected",
            Self::Malformed => "malformed",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
