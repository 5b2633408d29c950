//! HTTP transport for peer-to-peer calls.
//!
//! Adapters describe *what* to send; a [`PeerTransport`] sends it. Non-2xx
//! responses come back as [`TransportError::Status`] so callers only ever
//! see successful bodies in the `Ok` branch.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde_json::Value;
use socialdist_common::{AppError, config::FederationConfig};
use tracing::debug;

/// Error type for peer transport operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Peer responded {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Undecodable response: {0}")]
    Decode(String),
}

impl TransportError {
    /// Whether the peer answered 404.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status: 404, .. })
    }
}

impl From<TransportError> for AppError {
    fn from(err: TransportError) -> Self {
        Self::Federation(err.to_string())
    }
}

/// HTTP Basic credentials presented to a peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// A single outbound request.
#[derive(Debug, Clone)]
pub struct PeerRequest {
    pub method: Method,
    pub url: String,
    pub credentials: Option<Credentials>,
    pub body: Option<Value>,
}

impl PeerRequest {
    #[must_use]
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            credentials: None,
            body: None,
        }
    }

    #[must_use]
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// A successful (2xx) peer response. Empty bodies decode to `Value::Null`.
#[derive(Debug, Clone, PartialEq)]
pub struct PeerResponse {
    pub status: u16,
    pub body: Value,
}

/// Sends requests to peers.
#[async_trait]
pub trait PeerTransport: Send + Sync {
    async fn send(&self, request: PeerRequest) -> Result<PeerResponse, TransportError>;
}

/// [`PeerTransport`] backed by a shared `reqwest` client.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    user_agent: String,
}

impl HttpTransport {
    /// Build the client with the configured timeouts.
    pub fn new(config: &FederationConfig, instance_url: &str) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let user_agent = config.user_agent.clone().unwrap_or_else(|| {
            format!("socialdist/{} (+{instance_url})", env!("CARGO_PKG_VERSION"))
        });

        Ok(Self { client, user_agent })
    }
}

#[async_trait]
impl PeerTransport for HttpTransport {
    async fn send(&self, request: PeerRequest) -> Result<PeerResponse, TransportError> {
        let url = url::Url::parse(&request.url)
            .map_err(|e| TransportError::InvalidUrl(format!("{}: {e}", request.url)))?;

        debug!(method = %request.method, url = %url, "Sending peer request");

        let mut builder = self
            .client
            .request(request.method.clone(), url)
            .header("User-Agent", &self.user_agent)
            .header("Accept", "application/json");

        if let Some(credentials) = &request.credentials {
            builder = builder.basic_auth(&credentials.username, Some(&credentials.password));
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        if !status.is_success() {
            debug!(url = %request.url, status = %status, "Peer request failed");
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).map_err(|e| TransportError::Decode(e.to_string()))?
        };

        Ok(PeerResponse {
            status: status.as_u16(),
            body,
        })
    }
}
