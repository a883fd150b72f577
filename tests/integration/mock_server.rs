//! Mock HTTP server setup for integration tests

use agent_portal::dispatch::RecordingObserver;
use agent_portal::{Configuration, DispatchOrchestrator, SharedConfig, TransportClient};
use mockito::{Mock, Server, ServerGuard};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

pub const ENDPOINT: &str = "/agent/invoke";

/// Test fixture that manages a mock backend
pub struct MockServerFixture {
    pub server: ServerGuard,
    pub base_url: String,
}

impl MockServerFixture {
    pub async fn new() -> Self {
        let server = Server::new_async().await;
        let base_url = server.url();
        Self { server, base_url }
    }

    /// Live configuration pointing at the mock server
    pub fn live_config(&self) -> Configuration {
        Configuration {
            base_url: format!("{}/", self.base_url),
            endpoint: ENDPOINT.trim_start_matches('/').to_string(),
            mock_mode: false,
            credential: "secret".into(),
            extra_headers: BTreeMap::from([("X-Trace".to_string(), Some("abc".to_string()))]),
            ..Default::default()
        }
    }

    /// Orchestrator wired to the given configuration and a recording observer
    pub fn orchestrator(
        &self,
        config: Configuration,
    ) -> (DispatchOrchestrator, Arc<RecordingObserver>) {
        let observer = Arc::new(RecordingObserver::new());
        let transport = TransportClient::new()
            .expect("transport")
            .with_mock_delay(Duration::ZERO);
        let orchestrator = DispatchOrchestrator::builder()
            .config(SharedConfig::new(config))
            .transport(transport)
            .observer(observer.clone())
            .build()
            .expect("orchestrator");
        (orchestrator, observer)
    }

    /// Create a mock for a JSON response
    pub async fn mock_json_response(&mut self, status: usize, body: &str) -> Mock {
        self.server
            .mock("POST", ENDPOINT)
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await
    }

    /// Create a mock for a plain-text response
    pub async fn mock_text_response(&mut self, status: usize, body: &str) -> Mock {
        self.server
            .mock("POST", ENDPOINT)
            .with_status(status)
            .with_header("content-type", "text/plain")
            .with_body(body)
            .create_async()
            .await
    }
}
