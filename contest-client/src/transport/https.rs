//! HTTPS transport backed by reqwest.

use super::{Transport, TransportError};
use crate::error::ClientError;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, trace};

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection settings for [`HttpsTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    /// Server host, optionally with scheme and port.
    ///
    /// A bare host such as `contest.example.org` is reached over HTTPS.
    pub server: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Accept self-signed certificates (gym-local servers).
    pub accept_invalid_certs: bool,
}

impl TransportConfig {
    /// Create settings for a server with default timeout and strict TLS.
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            timeout: DEFAULT_TIMEOUT,
            accept_invalid_certs: false,
        }
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Allow or refuse self-signed certificates.
    pub fn with_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }
}

/// Posts JSON to the contest server over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpsTransport {
    base_url: String,
    http: reqwest::Client,
}

impl HttpsTransport {
    /// Build a transport from connection settings.
    pub fn new(config: &TransportConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|e| ClientError::HttpSetup(e.to_string()))?;

        Self::with_client(&config.server, http)
    }

    /// Wrap an already configured reqwest client.
    pub fn with_client(server: &str, http: reqwest::Client) -> Result<Self, ClientError> {
        Ok(Self {
            base_url: normalize_base_url(server)?,
            http,
        })
    }

    /// Base URL requests are sent to, without trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

fn normalize_base_url(server: &str) -> Result<String, ClientError> {
    let server = server.trim();
    if server.is_empty() {
        return Err(ClientError::InvalidAddress("server address is empty".into()));
    }

    let candidate = if server.contains("://") {
        server.to_string()
    } else {
        format!("https://{}", server)
    };

    let url = reqwest::Url::parse(&candidate)
        .map_err(|e| ClientError::InvalidAddress(format!("{}: {}", server, e)))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ClientError::InvalidAddress(format!(
            "unsupported scheme '{}'",
            url.scheme()
        )));
    }

    Ok(url.as_str().trim_end_matches('/').to_string())
}

#[async_trait]
impl Transport for HttpsTransport {
    async fn post(&self, path: &str, payload: &Value) -> Result<Value, TransportError> {
        let url = format!("{}{}", self.base_url, path);
        trace!("POST {}", url);

        let response = self
            .http
            .post(&url)
            .json(payload)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            debug!("POST {} returned {}", url, status);
            return Err(TransportError::HttpStatus(status.as_u16()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(TransportError::EmptyBody);
        }

        serde_json::from_slice(&bytes).map_err(|e| TransportError::Parse(e.to_string()))
    }
}
