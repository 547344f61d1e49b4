/*!
 * Translation backends.
 *
 * This module contains client implementations for the supported services:
 * - Google: the public Google Translate endpoint (default)
 * - Ollama: Local LLM server
 * - Anthropic: Anthropic API integration
 * - Mock: scriptable in-process backend for tests
 *
 * Backends make exactly one request per call. Retries and rate limiting are
 * applied by `translation::client::TranslationClient`.
 */

use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use crate::app_config::{TranslationConfig, TranslationProvider};
use crate::errors::ProviderError;

/// Common trait for all translation backends
///
/// This trait defines the interface that all backend implementations must follow,
/// allowing them to be used interchangeably by the translation client.
#[async_trait]
pub trait TranslationBackend: Send + Sync + Debug {
    /// Short identifier used in logs
    fn name(&self) -> &str;

    /// Translate a single request
    ///
    /// # Arguments
    /// * `text` - The text to translate
    /// * `source_language` - Source language code, or `auto`
    /// * `target_language` - Target language code
    ///
    /// # Returns
    /// * `Result<String, ProviderError>` - The translated text or an error
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, ProviderError>;

    /// Test the connection to the backend
    async fn test_connection(&self) -> Result<(), ProviderError> {
        self.translate("Hello, world.", "en", "fr").await.map(|_| ())
    }
}

/// Build the backend selected by the configuration
pub fn create_backend(config: &TranslationConfig) -> Result<Arc<dyn TranslationBackend>> {
    let timeout = Duration::from_secs(config.get_timeout_secs());
    let backend: Arc<dyn TranslationBackend> = match config.provider {
        TranslationProvider::Google => {
            Arc::new(google::GoogleTranslate::new(config.get_endpoint(), timeout)?)
        }
        TranslationProvider::Ollama => Arc::new(ollama::Ollama::new(
            config.get_endpoint(),
            config.get_model(),
            config.common.temperature,
            timeout,
        )?),
        TranslationProvider::Anthropic => Arc::new(anthropic::Anthropic::new(
            config.get_api_key(),
            config.get_endpoint(),
            config.get_model(),
            config.common.temperature,
            timeout,
        )),
    };
    Ok(backend)
}

/// Instruction shared by the LLM backends
pub(crate) fn translation_instruction(source_language: &str, target_language: &str) -> String {
    let source = crate::language_utils::get_language_name(source_language)
        .unwrap_or_else(|_| source_language.to_string());
    let target = crate::language_utils::get_language_name(target_language)
        .unwrap_or_else(|_| target_language.to_string());
    let from = if crate::language_utils::is_auto(source_language) {
        "the source language".to_string()
    } else {
        source
    };
    format!(
        "You are a professional translator. Translate the following text from {} to {}. \
         Only respond with the translated text, without any explanations or notes.",
        from, target
    )
}

pub mod anthropic;
pub mod google;
pub mod mock;
pub mod ollama;
