//! Error types for guidesync-client.

use thiserror::Error;

/// A failed remote call.
///
/// Only [`RemoteError::RateLimited`] changes retry behaviour; every other
/// variant is retried immediately.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// The server asked the caller to pause. `retry_after` is the raw
    /// advisory value (seconds or an HTTP date), if one was sent.
    #[error("rate limit reached (retry after {})", .retry_after.as_deref().unwrap_or("unspecified"))]
    RateLimited { retry_after: Option<String> },

    /// Non-success HTTP status.
    #[error("remote returned {status} {text}")]
    Status {
        status: u16,
        text: String,
        body: Option<String>,
    },

    /// Connection, TLS or timeout failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The response could not be decoded.
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl RemoteError {
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, RemoteError::RateLimited { .. })
    }
}
