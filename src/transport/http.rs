use super::{RawResponse, TransportError};
use crate::config::Configuration;
use crate::types::Payload;
use crate::{Error, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, Proxy};
use std::env;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Live backend transport. One pooled client serves every dispatch.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        // Env-overridable defaults.
        let timeout_secs = env::var("AGENT_PORTAL_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(60);

        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .pool_idle_timeout(Some(Duration::from_secs(90)));

        if let Ok(proxy_url) = env::var("AGENT_PORTAL_PROXY_URL") {
            match Proxy::all(&proxy_url) {
                Ok(proxy) => builder = builder.proxy(proxy),
                Err(e) => warn!(proxy = proxy_url.as_str(), error = %e, "ignoring invalid proxy URL"),
            }
        }

        let client = builder
            .build()
            .map_err(|e| Error::Transport(TransportError::Other(e.to_string())))?;

        Ok(Self { client })
    }

    /// Send the payload using the method, URL and headers the configuration describes.
    pub async fn execute(&self, payload: &Payload, config: &Configuration) -> Result<RawResponse> {
        let url = compose_url(&config.base_url, &config.endpoint);
        let method = Method::from_bytes(config.method.trim().to_uppercase().as_bytes())
            .map_err(|_| {
                Error::Transport(TransportError::InvalidRequest(format!(
                    "unsupported HTTP method '{}'",
                    config.method
                )))
            })?;
        let headers = build_headers(config)?;

        let mut request = self.client.request(method.clone(), &url).headers(headers);
        if method != Method::GET {
            request = request.body(serde_json::to_vec(payload)?);
        }

        let start = Instant::now();
        let response = request.send().await.map_err(|e| {
            info!(
                url = url.as_str(),
                error = %e,
                duration_ms = start.elapsed().as_millis() as u64,
                "agent-portal request failed"
            );
            Error::Transport(TransportError::Http(e))
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Transport(TransportError::Http(e)))?;

        if !status.is_success() {
            info!(
                http_status = status.as_u16(),
                url = url.as_str(),
                duration_ms = start.elapsed().as_millis() as u64,
                "agent-portal request rejected"
            );
            return Err(Error::Transport(TransportError::Status {
                status: status.as_u16(),
                body,
            }));
        }

        info!(
            http_status = status.as_u16(),
            url = url.as_str(),
            duration_ms = start.elapsed().as_millis() as u64,
            "agent-portal request completed"
        );

        match serde_json::from_str(&body) {
            Ok(value) => Ok(RawResponse::Json(value)),
            Err(e) => {
                warn!(error = %e, "response body is not JSON, substituting placeholder content");
                Ok(RawResponse::parse_failed())
            }
        }
    }
}

/// `base_url` without its trailing slash, joined to `endpoint` with a leading one.
pub fn compose_url(base_url: &str, endpoint: &str) -> String {
    let base = base_url.trim().trim_end_matches('/');
    let endpoint = endpoint.trim();
    if endpoint.is_empty() {
        format!("{}/", base)
    } else if endpoint.starts_with('/') {
        format!("{}{}", base, endpoint)
    } else {
        format!("{}/{}", base, endpoint)
    }
}

/// Content type, optional bearer credential, then extra headers (later entries win).
pub fn build_headers(config: &Configuration) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    if !config.credential.is_empty() {
        let value = HeaderValue::from_str(&format!("Bearer {}", config.credential))
            .map_err(|_| invalid_header("Authorization"))?;
        headers.insert(AUTHORIZATION, value);
    }

    for (key, value) in &config.extra_headers {
        let Some(value) = value else { continue };
        let name = HeaderName::from_bytes(key.trim().as_bytes()).map_err(|_| invalid_header(key))?;
        let value = HeaderValue::from_str(value).map_err(|_| invalid_header(key))?;
        headers.insert(name, value);
    }

    Ok(headers)
}

fn invalid_header(name: &str) -> Error {
    Error::Transport(TransportError::InvalidRequest(format!(
        "invalid value for header '{}'",
        name
    )))
}
