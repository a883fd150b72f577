//! Request execution: simulated locally or sent to the configured backend.
//!
//! [`TransportClient::dispatch`] picks the path per call from the configuration
//! snapshot it is given; implementation details live under `src/transport/`.

pub mod http;
pub mod mock;

pub use http::{build_headers, compose_url, HttpTransport};
pub use mock::{mock_reply, DEFAULT_MOCK_DELAY};

use crate::config::Configuration;
use crate::types::Payload;
use crate::Result;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Content substituted when a successful response body is not valid JSON.
pub const PARSE_FAILED_CONTENT: &str = "(parse failed)";

/// Raw reply before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum RawResponse {
    Json(Value),
    Text(String),
}

impl RawResponse {
    pub(crate) fn parse_failed() -> Self {
        RawResponse::Json(serde_json::json!({ "content": PARSE_FAILED_CONTENT }))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The backend answered with a non-2xx status.
    #[error("{}", status_message(.status, .body))]
    Status { status: u16, body: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("Transport error: {0}")]
    Other(String),
}

fn status_message(status: &u16, body: &str) -> String {
    if body.trim().is_empty() {
        format!("HTTP {}", status)
    } else {
        body.to_string()
    }
}

/// Executes payloads against the mock responder or the HTTP backend.
pub struct TransportClient {
    http: HttpTransport,
    mock_delay: Duration,
}

impl TransportClient {
    pub fn new() -> Result<Self> {
        Ok(Self {
            http: HttpTransport::new()?,
            mock_delay: DEFAULT_MOCK_DELAY,
        })
    }

    /// Override the simulated latency of the mock path.
    pub fn with_mock_delay(mut self, delay: Duration) -> Self {
        self.mock_delay = delay;
        self
    }

    /// Run one payload. Mock is used when `config.mock_mode` is set or no base URL is configured.
    pub async fn dispatch(&self, payload: &Payload, config: &Configuration) -> Result<RawResponse> {
        if config.uses_mock() {
            debug!(
                attachments = payload.attachments.len(),
                delay_ms = self.mock_delay.as_millis() as u64,
                "dispatching to mock responder"
            );
            if !self.mock_delay.is_zero() {
                tokio::time::sleep(self.mock_delay).await;
            }
            return Ok(RawResponse::Text(mock_reply(payload)));
        }

        self.http.execute(payload, config).await
    }
}
