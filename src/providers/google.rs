use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::error;
use reqwest::Client;
use serde_json::Value;
use url::Url;

use crate::errors::ProviderError;
use crate::language_utils;
use crate::providers::TranslationBackend;

/// Client for the public Google Translate endpoint
///
/// This is the keyless `translate_a/single` API used by browser extensions.
/// It answers with nested JSON arrays: `[[["translated", "source", ...], ...], ...]`.
#[derive(Debug)]
pub struct GoogleTranslate {
    /// HTTP client for API requests
    client: Client,
    /// Fully resolved request URL
    url: Url,
}

impl GoogleTranslate {
    /// Create a new client against `endpoint` (scheme + host)
    pub fn new(endpoint: impl AsRef<str>, timeout: Duration) -> Result<Self> {
        let endpoint = endpoint.as_ref().trim_end_matches('/');
        let url = Url::parse(&format!("{}/translate_a/single", endpoint))
            .with_context(|| format!("Invalid Google Translate endpoint: {}", endpoint))?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client, url })
    }

    /// Concatenate the translated segments of a response body
    pub fn extract_text_from_response(body: &Value) -> Result<String, ProviderError> {
        let segments = body
            .get(0)
            .and_then(Value::as_array)
            .ok_or_else(|| ProviderError::ParseError("missing translation segments".into()))?;

        Ok(segments
            .iter()
            .filter_map(|segment| segment.get(0).and_then(Value::as_str))
            .collect())
    }
}

#[async_trait]
impl TranslationBackend for GoogleTranslate {
    fn name(&self) -> &str {
        "google"
    }

    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, ProviderError> {
        let sl = language_utils::to_backend_code(source_language)
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;
        let tl = language_utils::to_backend_code(target_language)
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;

        let response = self
            .client
            .post(self.url.clone())
            .query(&[("client", "gtx"), ("sl", sl.as_str()), ("tl", tl.as_str()), ("dt", "t")])
            .form(&[("q", text)])
            .send()
            .await
            .map_err(ProviderError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("Google Translate error ({}): {}", status, error_text);
            return Err(ProviderError::from_status(status.as_u16(), error_text));
        }

        let body: Value = response.json().await.map_err(ProviderError::from_reqwest)?;
        Self::extract_text_from_response(&body)
    }
}
