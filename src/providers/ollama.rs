use anyhow::{Context, Result};
use async_trait::async_trait;
use log::error;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::errors::ProviderError;
use crate::providers::{TranslationBackend, translation_instruction};

/// Ollama client for interacting with a local Ollama server
#[derive(Debug)]
pub struct Ollama {
    /// Base URL of the Ollama API
    base_url: String,
    /// HTTP client for making requests
    client: Client,
    /// Model used for generation
    model: String,
    /// Sampling temperature
    temperature: f32,
}

/// Generate request for the Ollama API
#[derive(Debug, Serialize)]
pub struct GenerationRequest {
    /// Model name
    pub model: String,
    /// Prompt to generate from
    pub prompt: String,
    /// System prompt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    /// Whether to stream the response
    pub stream: bool,
    /// Sampling options
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<GenerationOptions>,
}

/// Sampling options of a generate request
#[derive(Debug, Serialize)]
pub struct GenerationOptions {
    /// Temperature for generation
    pub temperature: f32,
}

/// Generate response from the Ollama API
#[derive(Debug, Deserialize)]
pub struct GenerationResponse {
    /// Model that answered
    #[serde(default)]
    pub model: String,
    /// Generated text
    #[serde(default)]
    pub response: String,
    /// Whether generation finished
    #[serde(default)]
    pub done: bool,
}

impl GenerationRequest {
    /// Create a new non-streaming generation request
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            system: None,
            stream: false,
            options: None,
        }
    }

    /// Set the system prompt
    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.options = Some(GenerationOptions { temperature });
        self
    }
}

impl Ollama {
    /// Create a new Ollama client for `endpoint` (defaults to port 11434)
    pub fn new(
        endpoint: impl AsRef<str>,
        model: impl Into<String>,
        temperature: f32,
        timeout: Duration,
    ) -> Result<Self> {
        let endpoint = endpoint.as_ref();
        let with_scheme = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            endpoint.to_string()
        } else {
            format!("http://{}", endpoint)
        };
        let mut url = Url::parse(&with_scheme)
            .with_context(|| format!("Invalid Ollama endpoint: {}", endpoint))?;
        if url.port().is_none() && url.scheme() == "http" {
            let _ = url.set_port(Some(11434));
        }

        Ok(Self {
            base_url: url.as_str().trim_end_matches('/').to_string(),
            client: Client::builder()
                .timeout(timeout)
                // Ollama uses HTTP/1.1
                .http1_only()
                .build()
                .context("Failed to build HTTP client")?,
            model: model.into(),
            temperature,
        })
    }

    /// Base URL requests go to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Parse a generate response body
    ///
    /// Servers that ignore `stream: false` send JSON lines; their `response`
    /// fragments are concatenated.
    pub fn parse_generation(body: &str) -> Result<String, ProviderError> {
        if let Ok(single) = serde_json::from_str::<GenerationResponse>(body) {
            return Ok(single.response);
        }

        let mut text = String::new();
        let mut parsed_any = false;
        for line in body.lines().filter(|l| !l.trim().is_empty()) {
            let part: GenerationResponse = serde_json::from_str(line)
                .map_err(|e| ProviderError::ParseError(format!("invalid Ollama response line: {}", e)))?;
            text.push_str(&part.response);
            parsed_any = true;
        }

        if parsed_any {
            Ok(text)
        } else {
            Err(ProviderError::ParseError("empty Ollama response".into()))
        }
    }
}

#[async_trait]
impl TranslationBackend for Ollama {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, ProviderError> {
        let request = GenerationRequest::new(&self.model, text)
            .system(translation_instruction(source_language, target_language))
            .temperature(self.temperature);

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(ProviderError::from_reqwest)?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(ProviderError::from_reqwest)?;

        if !status.is_success() {
            error!("Ollama API error ({}): {}", status, body);
            return Err(ProviderError::from_status(status.as_u16(), body));
        }

        Self::parse_generation(&body).map(|t| t.trim().to_string())
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        let response = self
            .client
            .get(format!("{}/api/version", self.base_url))
            .send()
            .await
            .map_err(ProviderError::from_reqwest)?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(ProviderError::from_status(response.status().as_u16(), "version check failed"))
        }
    }
}
