//! Scripted [`PeerTransport`] for tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;

use crate::transport::{PeerRequest, PeerResponse, PeerTransport, TransportError};

/// Answers requests from a table keyed by method and URL and records every
/// request it sees. Unscripted requests fail with a network error.
#[derive(Default)]
pub struct StubTransport {
    routes: Mutex<HashMap<(Method, String), Result<PeerResponse, TransportError>>>,
    requests: Mutex<Vec<PeerRequest>>,
}

impl StubTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `method url` with `status` and `body`. Non-2xx statuses become
    /// [`TransportError::Status`], as with the real transport.
    #[must_use]
    pub fn on(self, method: Method, url: impl Into<String>, status: u16, body: Value) -> Self {
        let result = if (200..300).contains(&status) {
            Ok(PeerResponse { status, body })
        } else {
            Err(TransportError::Status {
                status,
                body: body.to_string(),
            })
        };
        self.set(method, url.into(), result);
        self
    }

    /// Fail `method url` with a network error.
    #[must_use]
    pub fn unreachable(self, method: Method, url: impl Into<String>) -> Self {
        self.set(
            method,
            url.into(),
            Err(TransportError::Network("connection refused".to_string())),
        );
        self
    }

    fn set(&self, method: Method, url: String, result: Result<PeerResponse, TransportError>) {
        if let Ok(mut routes) = self.routes.lock() {
            routes.insert((method, url), result);
        }
    }

    /// Every request sent so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<PeerRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    /// URLs of every request sent so far, prefixed with the method.
    #[must_use]
    pub fn request_lines(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|request| format!("{} {}", request.method, request.url))
            .collect()
    }
}

#[async_trait]
impl PeerTransport for StubTransport {
    async fn send(&self, request: PeerRequest) -> Result<PeerResponse, TransportError> {
        let key = (request.method.clone(), request.url.clone());
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }
        self.routes
            .lock()
            .ok()
            .and_then(|routes| routes.get(&key).cloned())
            .unwrap_or_else(|| Err(TransportError::Network(format!("no route for {} {}", key.0, key.1))))
    }
}
