use super::{observer::noop_observer, DispatchObserver, DispatchOrchestrator, Inner, StatusState};
use crate::config::{LoadedConfig, SharedConfig};
use crate::conversation::{Composer, Conversation};
use crate::transport::TransportClient;
use crate::Result;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Builder for creating an orchestrator with custom collaborators.
///
/// Keep this surface area small and predictable.
pub struct OrchestratorBuilder {
    config: Option<SharedConfig>,
    status_label: Option<String>,
    transport: Option<TransportClient>,
    mock_delay: Option<Duration>,
    observer: Arc<dyn DispatchObserver>,
}

impl OrchestratorBuilder {
    pub fn new() -> Self {
        Self {
            config: None,
            status_label: None,
            transport: None,
            mock_delay: None,
            observer: noop_observer(),
        }
    }

    /// Share an existing configuration slot (e.g. one a settings editor also holds).
    pub fn config(mut self, config: SharedConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Start from a startup load; its label becomes the initial status.
    pub fn loaded(mut self, loaded: LoadedConfig) -> Self {
        self.config = Some(SharedConfig::new(loaded.config));
        self.status_label = Some(loaded.label);
        self
    }

    pub fn transport(mut self, transport: TransportClient) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Override the mock path latency (tests use `Duration::ZERO`).
    pub fn mock_delay(mut self, delay: Duration) -> Self {
        self.mock_delay = Some(delay);
        self
    }

    /// Inject a presentation observer. Default is a no-op observer.
    pub fn observer(mut self, observer: Arc<dyn DispatchObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Build the orchestrator and announce the initial idle status.
    pub fn build(self) -> Result<DispatchOrchestrator> {
        let config = self.config.unwrap_or_default();
        let mut transport = match self.transport {
            Some(t) => t,
            None => TransportClient::new()?,
        };
        if let Some(delay) = self.mock_delay {
            transport = transport.with_mock_delay(delay);
        }

        let snapshot = config.load();
        let label = self
            .status_label
            .unwrap_or_else(|| snapshot.mode_label().to_string());

        let orchestrator = DispatchOrchestrator {
            inner: Arc::new(Inner {
                conversation: Mutex::new(Conversation::new(&snapshot.system_prompt)),
                composer: Mutex::new(Composer::new()),
                config,
                transport,
                observer: self.observer,
            }),
        };
        orchestrator
            .inner
            .observer
            .on_status_change(StatusState::Idle, &label);
        Ok(orchestrator)
    }
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
