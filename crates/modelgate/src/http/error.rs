//! Transport error types.

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

/// Errors produced by [`HttpClient`](super::HttpClient).
#[derive(Debug, Error)]
pub enum HttpError {
    /// Upstream answered with a non-success status.
    #[error("HTTP {status}: {reason}")]
    Status {
        status: u16,
        reason: String,
        /// Error body, parsed as JSON when possible, otherwise kept as a JSON string.
        body: Option<Value>,
    },

    /// The attempt did not complete within its timeout.
    #[error("request timed out after {}s", .0.as_secs_f64())]
    Timeout(Duration),

    /// Connection, DNS, TLS or body read failure. The URL is stripped.
    #[error("http request failed: {0}")]
    Network(#[source] reqwest::Error),

    /// The request could not be built: bad header or unserializable body.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A successful response whose body is not the expected JSON.
    #[error("malformed response body: {0}")]
    Malformed(#[source] serde_json::Error),
}

impl From<reqwest::Error> for HttpError {
    fn from(err: reqwest::Error) -> Self {
        // URLs may carry credentials in the query string.
        HttpError::Network(err.without_url())
    }
}

impl HttpError {
    /// Status reported for timed-out attempts.
    pub const TIMEOUT_STATUS: u16 = 408;

    /// HTTP status associated with this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            HttpError::Status { status, .. } => Some(*status),
            HttpError::Timeout(_) => Some(Self::TIMEOUT_STATUS),
            HttpError::Network(e) => e.status().map(|s| s.as_u16()),
            HttpError::Malformed(_) | HttpError::InvalidRequest(_) => None,
        }
    }

    /// Parsed error body returned by the upstream, if any.
    pub fn body(&self) -> Option<&Value> {
        match self {
            HttpError::Status { body, .. } => body.as_ref(),
            _ => None,
        }
    }

    /// Whether another attempt may succeed.
    ///
    /// Client errors (4xx) and malformed bodies are final. Timeouts, network
    /// failures and every other non-success status are retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            HttpError::Status { status, .. } => !(400..500).contains(status),
            HttpError::Timeout(_) | HttpError::Network(_) => true,
            HttpError::Malformed(_) | HttpError::InvalidRequest(_) => false,
        }
    }
}

/// Parse a non-success body: JSON when it parses, a JSON string otherwise.
pub(crate) fn parse_error_body(bytes: &[u8]) -> Option<Value> {
    if bytes.is_empty() {
        return None;
    }
    serde_json::from_slice(bytes)
        .ok()
        .or_else(|| Some(Value::String(String::from_utf8_lossy(bytes).into_owned())))
}
