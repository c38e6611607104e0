//! HTTP client for the remove.bg API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};

use super::{ForegroundExtractor, RemovalConfig, RemovalError};
use crate::config::ConfigError;

/// Calls the remove.bg endpoint with a multipart upload.
#[derive(Debug, Clone)]
pub struct RemoveBgClient {
    http: reqwest::Client,
    config: RemovalConfig,
}

impl RemoveBgClient {
    /// Build a client with the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::HttpClient` if the HTTP client cannot be created
    /// (e.g. TLS backend initialisation failure).
    pub fn new(config: RemovalConfig) -> Result<Self, ConfigError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &RemovalConfig {
        &self.config
    }
}

#[async_trait]
impl ForegroundExtractor for RemoveBgClient {
    async fn extract_foreground(
        &self,
        api_key: &str,
        image_png: Vec<u8>,
    ) -> Result<Vec<u8>, RemovalError> {
        let part = Part::bytes(image_png)
            .file_name("image.png")
            .mime_str("image/png")
            .map_err(|e| RemovalError::RemoteProcessingFailed(e.to_string()))?;
        let form = Form::new().part("image_file", part).text("size", "auto");

        let response = self
            .http
            .post(self.config.endpoint.as_str())
            .header(self.config.api_key_header.as_str(), api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "background removal request failed");
                RemovalError::NetworkUnavailable
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let error = classify_failure(status.as_u16(), &body);
            tracing::warn!(status = status.as_u16(), error = %error, "background removal rejected");
            return Err(error);
        }

        let bytes = response.bytes().await.map_err(|e| {
            tracing::warn!(error = %e, "failed to read background removal response");
            RemovalError::NetworkUnavailable
        })?;
        Ok(bytes.to_vec())
    }
}

/// Map a non-success response to a [`RemovalError`].
///
/// 403 and 429 have dedicated variants. Anything else reports the service's
/// own message from `errors[0].title` or `error`, falling back to the status
/// code when the body is not JSON.
pub fn classify_failure(status: u16, body: &str) -> RemovalError {
    match status {
        403 => RemovalError::InvalidCredential,
        429 => RemovalError::RateLimited,
        _ => {
            let detail = match serde_json::from_str::<serde_json::Value>(body) {
                Ok(json) => json
                    .pointer("/errors/0/title")
                    .and_then(|v| v.as_str())
                    .or_else(|| json.get("error").and_then(|v| v.as_str()))
                    .filter(|s| !s.is_empty())
                    .unwrap_or("Unknown error")
                    .to_string(),
                Err(_) => format!("HTTP {}", status),
            };
            RemovalError::RemoteProcessingFailed(detail)
        }
    }
}
