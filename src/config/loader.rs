//! Configuration loader with support for local files and remote URLs
//!
//! Loading never fails: a missing or broken document falls back to the
//! built-in defaults and the caller only sees a different status label.

use super::{Configuration, LABEL_LIVE, LABEL_MOCK};
use crate::{Error, ErrorContext, Result};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const DEFAULT_CONFIG_PATH: &str = "config/app-config.json";

/// Status label used when the built-in defaults are in effect.
pub const LABEL_DEFAULTS: &str = "using defaults";

const ENV_CONFIG: &str = "AGENT_PORTAL_CONFIG";
const ENV_BASE_URL: &str = "AGENT_PORTAL_BASE_URL";
const ENV_ENDPOINT: &str = "AGENT_PORTAL_ENDPOINT";
const ENV_METHOD: &str = "AGENT_PORTAL_METHOD";
const ENV_USE_MOCK: &str = "AGENT_PORTAL_USE_MOCK";
const ENV_API_KEY: &str = "AGENT_PORTAL_API_KEY";
const ENV_TEMPERATURE: &str = "AGENT_PORTAL_TEMPERATURE";
const ENV_EXTRA_HEADERS: &str = "AGENT_PORTAL_EXTRA_HEADERS";
const ENV_SYSTEM_PROMPT: &str = "AGENT_PORTAL_SYSTEM_PROMPT";

/// Where the configuration document lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Url(String),
}

impl ConfigSource {
    pub fn parse(raw: &str) -> Self {
        if raw.starts_with("http://") || raw.starts_with("https://") {
            ConfigSource::Url(raw.to_string())
        } else {
            ConfigSource::File(PathBuf::from(raw))
        }
    }

    fn is_yaml(&self) -> bool {
        let name = match self {
            ConfigSource::File(p) => p.to_string_lossy().to_string(),
            ConfigSource::Url(u) => u.split(['?', '#']).next().unwrap_or(u).to_string(),
        };
        let lower = name.to_lowercase();
        lower.ends_with(".yaml") || lower.ends_with(".yml")
    }

    fn describe(&self) -> String {
        match self {
            ConfigSource::File(p) => p.display().to_string(),
            ConfigSource::Url(u) => u.clone(),
        }
    }
}

/// Outcome of a startup load.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Configuration,
    /// Informational status label for the front end.
    pub label: String,
    pub from_defaults: bool,
}

/// Loads a [`Configuration`] from a JSON or YAML document.
pub struct ConfigLoader {
    source: Option<ConfigSource>,
    apply_env: bool,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            source: None,
            apply_env: true,
        }
    }

    /// Set the document location: a path, or an `http(s)` URL.
    pub fn with_source(mut self, source: impl AsRef<str>) -> Self {
        self.source = Some(ConfigSource::parse(source.as_ref()));
        self
    }

    pub fn with_path(mut self, path: impl AsRef<Path>) -> Self {
        self.source = Some(ConfigSource::File(path.as_ref().to_path_buf()));
        self
    }

    /// Toggle `AGENT_PORTAL_*` environment overrides (on by default).
    pub fn with_env_overrides(mut self, enable: bool) -> Self {
        self.apply_env = enable;
        self
    }

    fn resolve_source(&self) -> ConfigSource {
        if let Some(ref s) = self.source {
            return s.clone();
        }
        if let Ok(raw) = std::env::var(ENV_CONFIG) {
            if !raw.trim().is_empty() {
                return ConfigSource::parse(raw.trim());
            }
        }
        ConfigSource::File(PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    /// Load the configuration, falling back to defaults on any failure.
    pub async fn load(&self) -> LoadedConfig {
        let source = self.resolve_source();
        let (mut config, from_defaults) = match self.load_document(&source).await {
            Ok(doc) => (Configuration::from_document(&doc), false),
            Err(e) => {
                warn!(
                    source = source.describe().as_str(),
                    error = %e,
                    "configuration unavailable, falling back to defaults"
                );
                (Configuration::default(), true)
            }
        };

        if self.apply_env {
            apply_env_overrides(&mut config, |k| std::env::var(k).ok());
        }

        let label = if from_defaults {
            LABEL_DEFAULTS
        } else if config.uses_mock() {
            LABEL_MOCK
        } else {
            LABEL_LIVE
        };
        info!(
            source = source.describe().as_str(),
            mock = config.uses_mock(),
            from_defaults,
            "configuration loaded"
        );

        LoadedConfig {
            config,
            label: label.to_string(),
            from_defaults,
        }
    }

    async fn load_document(&self, source: &ConfigSource) -> Result<Value> {
        let text = match source {
            ConfigSource::File(path) => {
                tokio::fs::read_to_string(path).await.map_err(|e| {
                    Error::configuration_with_context(
                        format!("failed to read configuration: {}", e),
                        ErrorContext::new()
                            .with_details(path.display().to_string())
                            .with_source("config_loader"),
                    )
                })?
            }
            ConfigSource::Url(url) => self.fetch(url).await?,
        };
        let doc = parse_document(&text, source.is_yaml())?;
        if !doc.is_object() {
            return Err(Error::configuration_with_context(
                "configuration document must be an object",
                ErrorContext::new()
                    .with_details(source.describe())
                    .with_source("config_loader"),
            ));
        }
        Ok(doc)
    }

    async fn fetch(&self, url: &str) -> Result<String> {
        let ctx = || {
            ErrorContext::new()
                .with_details(url.to_string())
                .with_source("config_loader")
        };
        let response = reqwest::Client::new()
            .get(url)
            .header(reqwest::header::CACHE_CONTROL, "no-cache")
            .send()
            .await
            .map_err(|e| Error::configuration_with_context(e.to_string(), ctx()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::configuration_with_context(
                format!("failed to fetch configuration: HTTP {}", status.as_u16()),
                ctx(),
            ));
        }
        response
            .text()
            .await
            .map_err(|e| Error::configuration_with_context(e.to_string(), ctx()))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_document(text: &str, yaml: bool) -> Result<Value> {
    let ctx = ErrorContext::new().with_source("config_loader");
    if yaml {
        serde_yaml::from_str(text).map_err(|e| {
            Error::configuration_with_context(format!("invalid YAML configuration: {}", e), ctx)
        })
    } else {
        serde_json::from_str(text).map_err(|e| {
            Error::configuration_with_context(format!("invalid JSON configuration: {}", e), ctx)
        })
    }
}

impl Configuration {
    /// Build a configuration from a loosely-typed document.
    ///
    /// Unknown keys are ignored and fields of the wrong type keep their default.
    pub fn from_document(doc: &Value) -> Self {
        let mut config = Configuration::default();
        let Some(obj) = doc.as_object() else {
            warn!("configuration document is not an object, using defaults");
            return config;
        };

        if let Some(v) = obj.get("baseUrl").and_then(Value::as_str) {
            config.base_url = v.to_string();
        }
        if let Some(v) = obj.get("endpoint").and_then(Value::as_str) {
            config.endpoint = v.to_string();
        }
        if let Some(v) = obj.get("method").and_then(Value::as_str) {
            config.method = v.to_uppercase();
        }
        if let Some(v) = obj.get("mock").and_then(Value::as_bool) {
            config.mock_mode = v;
        }
        if let Some(v) = obj.get("apiKey").and_then(Value::as_str) {
            config.credential = v.to_string();
        }
        if let Some(v) = obj.get("temperature").and_then(Value::as_f64) {
            config.sampling_temperature = v;
        }
        if let Some(v) = obj.get("extraHeaders") {
            config.extra_headers = normalize_extra_headers(v);
        }
        if let Some(v) = obj.get("systemPrompt").and_then(Value::as_str) {
            config.system_prompt = v.to_string();
        }
        config
    }
}

/// Coerce an `extraHeaders` value into a header map.
///
/// Accepts an object or a JSON string holding one; anything else becomes `{}`.
/// `null` entries are kept as `None` so they can be skipped at merge time.
pub fn normalize_extra_headers(value: &Value) -> BTreeMap<String, Option<String>> {
    match value {
        Value::Null => BTreeMap::new(),
        Value::String(s) if s.trim().is_empty() => BTreeMap::new(),
        Value::String(s) => match serde_json::from_str::<Value>(s) {
            Ok(parsed @ Value::Object(_)) => normalize_extra_headers(&parsed),
            Ok(_) => {
                warn!("extraHeaders string is not a JSON object, ignoring it");
                BTreeMap::new()
            }
            Err(e) => {
                warn!(error = %e, "extraHeaders could not be parsed, ignoring it");
                BTreeMap::new()
            }
        },
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| {
                let v = match v {
                    Value::Null => None,
                    Value::String(s) => Some(s.clone()),
                    other => Some(other.to_string()),
                };
                (k.clone(), v)
            })
            .collect(),
        _ => {
            warn!("extraHeaders is not an object, ignoring it");
            BTreeMap::new()
        }
    }
}

/// Apply `AGENT_PORTAL_*` overrides. Values that fail to parse are skipped.
pub fn apply_env_overrides(config: &mut Configuration, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup(ENV_BASE_URL) {
        config.base_url = v;
    }
    if let Some(v) = lookup(ENV_ENDPOINT) {
        config.endpoint = v;
    }
    if let Some(v) = lookup(ENV_METHOD) {
        config.method = v.to_uppercase();
    }
    if let Some(v) = lookup(ENV_USE_MOCK) {
        config.mock_mode = matches!(
            v.trim().to_lowercase().as_str(),
            "1" | "true" | "t" | "yes" | "y"
        );
    }
    if let Some(v) = lookup(ENV_API_KEY) {
        config.credential = v;
    }
    if let Some(v) = lookup(ENV_TEMPERATURE) {
        if let Ok(t) = v.trim().parse::<f64>() {
            config.sampling_temperature = t;
        }
    }
    if let Some(v) = lookup(ENV_EXTRA_HEADERS) {
        if let Ok(parsed @ Value::Object(_)) = serde_json::from_str::<Value>(&v) {
            config.extra_headers = normalize_extra_headers(&parsed);
        }
    }
    if let Some(v) = lookup(ENV_SYSTEM_PROMPT) {
        config.system_prompt = v;
    }
}
