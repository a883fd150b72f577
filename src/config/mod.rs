//! 配置模块：后端地址、请求方式、模拟模式等运行时设置。
//!
//! Runtime configuration.
//!
//! [`Configuration`] is loaded once at startup by [`ConfigLoader`] and then
//! shared through [`SharedConfig`], which lets a settings editor publish a new
//! version at any time. Every dispatch takes one snapshot when it builds its
//! payload, so edits apply to the next dispatch and never to one in flight.

pub mod loader;
pub mod settings;

pub use loader::{ConfigLoader, ConfigSource, LoadedConfig};
pub use settings::SettingsUpdate;

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

pub const DEFAULT_ENDPOINT: &str = "/agent/invoke";
pub const DEFAULT_METHOD: &str = "POST";
pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a professional and reliable assistant. Keep answers concise and cite the uploaded material when relevant.";

/// Status label shown while mock responses are in use.
pub const LABEL_MOCK: &str = "mock mode";
/// Status label shown when requests go to a live backend.
pub const LABEL_LIVE: &str = "ready";

/// Backend and prompt settings read on every dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    /// Empty means the mock path is forced.
    pub base_url: String,
    pub endpoint: String,
    /// Upper-case HTTP method name.
    pub method: String,
    #[serde(rename = "mock")]
    pub mock_mode: bool,
    #[serde(rename = "apiKey")]
    pub credential: String,
    #[serde(rename = "temperature")]
    pub sampling_temperature: f64,
    /// `None` values are kept from the document but skipped when headers are built.
    pub extra_headers: BTreeMap<String, Option<String>>,
    pub system_prompt: String,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            method: DEFAULT_METHOD.to_string(),
            mock_mode: true,
            credential: String::new(),
            sampling_temperature: DEFAULT_TEMPERATURE,
            extra_headers: BTreeMap::new(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

impl Configuration {
    /// Mock responses are used when asked for, or when there is nowhere to send.
    pub fn uses_mock(&self) -> bool {
        self.mock_mode || self.base_url.trim().is_empty()
    }

    /// Idle status label for this configuration.
    pub fn mode_label(&self) -> &'static str {
        if self.uses_mock() {
            LABEL_MOCK
        } else {
            LABEL_LIVE
        }
    }

    /// Copy safe to print: the credential is masked.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if !copy.credential.is_empty() {
            copy.credential = "********".to_string();
        }
        copy
    }
}

/// Live, swappable configuration handle.
///
/// Cloning shares the same underlying slot.
#[derive(Clone)]
pub struct SharedConfig {
    inner: Arc<ArcSwap<Configuration>>,
}

impl SharedConfig {
    pub fn new(config: Configuration) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(config)),
        }
    }

    /// Current configuration. The returned snapshot never changes underneath the caller.
    pub fn load(&self) -> Arc<Configuration> {
        self.inner.load_full()
    }

    pub fn store(&self, config: Configuration) {
        self.inner.store(Arc::new(config));
    }

    /// Apply an edit on top of the current configuration and publish the result.
    pub fn update(&self, f: impl FnOnce(&mut Configuration)) -> Arc<Configuration> {
        let mut next = (*self.load()).clone();
        f(&mut next);
        let next = Arc::new(next);
        self.inner.store(next.clone());
        next
    }
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self::new(Configuration::default())
    }
}

impl std::fmt::Debug for SharedConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SharedConfig").field(&self.load()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = Configuration::default();
        assert_eq!(c.base_url, "");
        assert_eq!(c.endpoint, "/agent/invoke");
        assert_eq!(c.method, "POST");
        assert!(c.mock_mode);
        assert_eq!(c.credential, "");
        assert_eq!(c.sampling_temperature, 0.7);
        assert!(c.extra_headers.is_empty());
        assert!(!c.system_prompt.is_empty());
    }

    #[test]
    fn test_mock_forced_without_base_url() {
        let c = Configuration {
            mock_mode: false,
            ..Default::default()
        };
        assert!(c.uses_mock());
        assert_eq!(c.mode_label(), LABEL_MOCK);

        let c = Configuration {
            mock_mode: false,
            base_url: "http://localhost:8000".into(),
            ..Default::default()
        };
        assert!(!c.uses_mock());
        assert_eq!(c.mode_label(), LABEL_LIVE);
    }

    #[test]
    fn test_snapshot_is_isolated_from_updates() {
        let shared = SharedConfig::default();
        let before = shared.load();
        shared.update(|c| c.sampling_temperature = 0.2);

        assert_eq!(before.sampling_temperature, 0.7);
        assert_eq!(shared.load().sampling_temperature, 0.2);

        let clone = shared.clone();
        clone.store(Configuration {
            endpoint: "/v2".into(),
            ..Default::default()
        });
        assert_eq!(shared.load().endpoint, "/v2");
    }

    #[test]
    fn test_redacted() {
        let c = Configuration {
            credential: "secret".into(),
            ..Default::default()
        };
        assert_eq!(c.redacted().credential, "********");
        assert_eq!(Configuration::default().redacted().credential, "");
    }

    #[test]
    fn test_wire_keys() {
        let json = serde_json::to_value(Configuration::default()).unwrap();
        for key in [
            "baseUrl",
            "endpoint",
            "method",
            "mock",
            "apiKey",
            "temperature",
            "extraHeaders",
            "systemPrompt",
        ] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
    }
}
