//! Settings form model: the editable view of a [`Configuration`].

use super::{loader::normalize_extra_headers, Configuration};
use crate::{Error, ErrorContext, Result};
use serde_json::Value;

pub const ALLOWED_METHODS: &[&str] = &["GET", "POST", "PUT", "PATCH", "DELETE"];

/// Raw values as a settings editor holds them before validation.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsUpdate {
    pub base_url: String,
    pub endpoint: String,
    pub method: String,
    pub mock_mode: bool,
    pub credential: String,
    pub temperature: f64,
    /// Extra headers as JSON text, exactly as typed.
    pub extra_headers: String,
    pub system_prompt: String,
}

impl SettingsUpdate {
    /// Prefill the editor from the current configuration.
    pub fn from_config(config: &Configuration) -> Self {
        Self {
            base_url: config.base_url.clone(),
            endpoint: config.endpoint.clone(),
            method: config.method.clone(),
            mock_mode: config.mock_mode,
            credential: config.credential.clone(),
            temperature: config.sampling_temperature,
            extra_headers: serde_json::to_string_pretty(&config.extra_headers)
                .unwrap_or_else(|_| "{}".to_string()),
            system_prompt: config.system_prompt.clone(),
        }
    }

    /// Validate and normalize into a configuration ready to publish.
    pub fn into_config(self) -> Result<Configuration> {
        let base_url = self.base_url.trim().to_string();
        if !base_url.is_empty() {
            url::Url::parse(&base_url).map_err(|e| {
                Error::validation_with_context(
                    "base URL is not a valid URL",
                    ErrorContext::new()
                        .with_field_path("settings.baseUrl")
                        .with_details(e.to_string())
                        .with_source("settings_update"),
                )
            })?;
        }

        let method = self.method.trim().to_uppercase();
        if !ALLOWED_METHODS.contains(&method.as_str()) {
            return Err(Error::validation_with_context(
                format!("unsupported HTTP method '{}'", method),
                ErrorContext::new()
                    .with_field_path("settings.method")
                    .with_details(format!("expected one of {}", ALLOWED_METHODS.join(", ")))
                    .with_source("settings_update"),
            ));
        }

        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(Error::validation_with_context(
                format!("temperature {} is out of range", self.temperature),
                ErrorContext::new()
                    .with_field_path("settings.temperature")
                    .with_details("expected a value between 0.0 and 1.0")
                    .with_source("settings_update"),
            ));
        }

        let extra_headers = if self.extra_headers.trim().is_empty() {
            Default::default()
        } else {
            match serde_json::from_str::<Value>(&self.extra_headers) {
                Ok(v @ Value::Object(_)) => normalize_extra_headers(&v),
                _ => {
                    return Err(Error::validation_with_context(
                        "extra headers must be a JSON object",
                        ErrorContext::new()
                            .with_field_path("settings.extraHeaders")
                            .with_source("settings_update"),
                    ))
                }
            }
        };

        let endpoint = match self.endpoint.trim() {
            "" => "/".to_string(),
            e => e.to_string(),
        };

        Ok(Configuration {
            base_url,
            endpoint,
            method,
            mock_mode: self.mock_mode,
            credential: self.credential.trim().to_string(),
            sampling_temperature: self.temperature,
            extra_headers,
            system_prompt: self.system_prompt.trim().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> SettingsUpdate {
        SettingsUpdate::from_config(&Configuration::default())
    }

    #[test]
    fn test_roundtrip_from_defaults() {
        let c = base().into_config().unwrap();
        assert_eq!(c, Configuration::default());
    }

    #[test]
    fn test_normalization() {
        let update = SettingsUpdate {
            base_url: "  https://agent.example.com ".into(),
            endpoint: "   ".into(),
            method: "put".into(),
            credential: " key ".into(),
            extra_headers: "{\"X-Trace\": \"abc\"}".into(),
            system_prompt: "  terse  ".into(),
            ..base()
        };
        let c = update.into_config().unwrap();
        assert_eq!(c.base_url, "https://agent.example.com");
        assert_eq!(c.endpoint, "/");
        assert_eq!(c.method, "PUT");
        assert_eq!(c.credential, "key");
        assert_eq!(c.extra_headers.get("X-Trace"), Some(&Some("abc".to_string())));
        assert_eq!(c.system_prompt, "terse");
    }

    #[test]
    fn test_rejections() {
        let err = SettingsUpdate {
            extra_headers: "[\"nope\"]".into(),
            ..base()
        }
        .into_config()
        .unwrap_err();
        assert_eq!(
            err.context().and_then(|c| c.field_path.as_deref()),
            Some("settings.extraHeaders")
        );

        assert!(SettingsUpdate {
            method: "TRACE".into(),
            ..base()
        }
        .into_config()
        .is_err());

        assert!(SettingsUpdate {
            temperature: 1.5,
            ..base()
        }
        .into_config()
        .is_err());

        assert!(SettingsUpdate {
            base_url: "not a url".into(),
            ..base()
        }
        .into_config()
        .is_err());
    }
}
