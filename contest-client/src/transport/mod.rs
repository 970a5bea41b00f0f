//! Transport abstraction for the kiosk.
//!
//! This module provides a pluggable transport layer that abstracts how a
//! JSON payload reaches the contest server (reqwest over HTTPS, mock for
//! testing).
//!
//! # Design
//!
//! The transport does exactly one thing: a single POST of a JSON payload
//! to an endpoint path, returning the parsed JSON body. There is no retry
//! here; retrying is the job of the submission engine.
//!
//! # Example
//!
//! ```ignore
//! let transport = MockTransport::new();
//! transport.queue_reply(json!({ "success": true, "id": "Alice" }));
//! let body = transport.post("/api/v2/contest/climber/name", &json!({ "id": "12" })).await?;
//! ```

mod https;
mod mock;

pub use https::{HttpsTransport, TransportConfig};
pub use mock::{Gate, MockTransport};

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Broad category of a transport failure, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The request never completed (DNS, connect, TLS, timeout).
    Network,
    /// The server answered with a non-2xx status.
    HttpStatus,
    /// The server answered 2xx but the body was empty or not JSON.
    Parse,
}

/// Transport errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Network-level failure.
    #[error("network error: {0}")]
    Network(String),

    /// Non-2xx response.
    #[error("http request failed with status {0}")]
    HttpStatus(u16),

    /// Body was not valid JSON.
    #[error("json parse error: {0}")]
    Parse(String),

    /// 2xx response with nothing in it.
    #[error("empty response body")]
    EmptyBody,
}

impl TransportError {
    /// Diagnostic category of this failure.
    pub fn kind(&self) -> FailureKind {
        match self {
            TransportError::Network(_) => FailureKind::Network,
            TransportError::HttpStatus(_) => FailureKind::HttpStatus,
            TransportError::Parse(_) | TransportError::EmptyBody => FailureKind::Parse,
        }
    }
}

/// Transport trait for posting JSON to the contest server.
///
/// Implementations handle the underlying mechanism (reqwest, mock, etc).
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST `payload` to `path` and return the parsed JSON body.
    ///
    /// `path` is absolute on the server, e.g. `/api/v2/contest/success`.
    async fn post(&self, path: &str, payload: &Value) -> Result<Value, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_kinds() {
        assert_eq!(
            TransportError::Network("refused".into()).kind(),
            FailureKind::Network
        );
        assert_eq!(TransportError::HttpStatus(503).kind(), FailureKind::HttpStatus);
        assert_eq!(TransportError::Parse("eof".into()).kind(), FailureKind::Parse);
        assert_eq!(TransportError::EmptyBody.kind(), FailureKind::Parse);
    }

    #[test]
    fn error_display() {
        assert_eq!(
            TransportError::HttpStatus(404).to_string(),
            "http request failed with status 404"
        );
        assert_eq!(TransportError::EmptyBody.to_string(), "empty response body");
    }
}
