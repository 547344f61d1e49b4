/*!
 * Tests for application configuration functionality
 */

use std::time::Duration;

use pagewise::app_config::{Config, LogLevel, TranslationProvider};
use pagewise::pipeline::PipelineOptions;
use pagewise::translation::Backoff;

/// Test default configuration values
#[test]
fn test_default_config_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert_eq!(config.source_language, "auto");
    assert_eq!(config.target_language, "id");
    assert_eq!(config.translation.provider, TranslationProvider::Google);
    assert_eq!(config.translation.get_max_chars_per_request(), 4500);
    assert_eq!(config.translation.common.rate_limit_delay_ms, 1500);
    assert!(config.pipeline.retry_failed_pages);
    assert_eq!(config.pipeline.image_text_threshold, 100);
    assert_eq!(config.pipeline.max_code_point, 0x7F);
    assert_eq!(config.log_level, LogLevel::Info);
}

/// Test configuration validation
#[test]
fn test_config_validation_withVariousConfigs_shouldValidateCorrectly() {
    let mut config = Config::default();
    assert!(config.validate().is_ok());

    // auto is only valid as a source
    config.target_language = "auto".to_string();
    assert!(config.validate().is_err());
    config.target_language = "de".to_string();

    config.source_language = "xyz".to_string();
    assert!(config.validate().is_err());
    config.source_language = "en".to_string();

    // Anthropic without a key
    config.translation.provider = TranslationProvider::Anthropic;
    assert!(config.validate().is_err());
    if let Some(provider) = config.translation.get_active_provider_config_mut() {
        provider.api_key = "test-key".to_string();
    }
    assert!(config.validate().is_ok());

    if let Some(provider) = config.translation.get_active_provider_config_mut() {
        provider.max_chars_per_request = 0;
    }
    assert!(config.validate().is_err());
}

/// Test that translating into the source language is refused
#[test]
fn test_config_validation_withSameSourceAndTarget_shouldFail() {
    let mut config = Config::default();
    config.source_language = "ger".to_string();
    config.target_language = "de".to_string();

    assert!(config.validate().is_err());

    config.source_language = "auto".to_string();
    assert!(config.validate().is_ok());
}

/// Test that a sparse config file fills in defaults
#[test]
fn test_config_deserialize_withPartialJson_shouldFillDefaults() {
    let json = r#"{
        "target_language": "fr",
        "translation": { "provider": "ollama" },
        "pipeline": { "retry_failed_pages": false }
    }"#;

    let config: Config = serde_json::from_str(json).unwrap();

    assert_eq!(config.source_language, "auto");
    assert_eq!(config.target_language, "fr");
    assert_eq!(config.translation.provider, TranslationProvider::Ollama);
    assert!(!config.pipeline.retry_failed_pages);
    assert_eq!(config.pipeline.image_text_threshold, 100);
}

/// Test that the retry settings become a client policy
#[test]
fn test_retry_policy_withExponentialBackoff_shouldDoubleDelays() {
    let mut config = Config::default();
    config.translation.common.retry_count = 3;
    config.translation.common.retry_backoff_ms = 500;
    config.translation.common.exponential_backoff = true;

    let policy = config.translation.common.retry_policy();

    assert_eq!(policy.max_attempts, 4);
    assert!(matches!(policy.backoff, Backoff::Exponential { .. }));
    assert_eq!(policy.delay_after(1), Duration::from_millis(500));
    assert_eq!(policy.delay_after(2), Duration::from_millis(1000));
}

/// Test that pipeline options follow the active provider
#[test]
fn test_pipeline_options_fromConfig_shouldUseActiveProviderLimits() {
    let mut config = Config::default();
    config.translation.provider = TranslationProvider::Ollama;
    config.target_language = "es".to_string();

    let options = PipelineOptions::from_config(&config);

    assert_eq!(options.chunk_size, 3000);
    assert_eq!(options.target_language, "es");
    assert!(options.retry_failed_pages);
}

/// Test the CLI-facing provider names
#[test]
fn test_translation_provider_names_shouldBeStable() {
    assert_eq!(TranslationProvider::Google.to_lowercase_string(), "google");
    assert_eq!(TranslationProvider::Anthropic.display_name(), "Anthropic");
    assert_eq!(LogLevel::Debug.to_level_filter(), log::LevelFilter::Debug);
}
