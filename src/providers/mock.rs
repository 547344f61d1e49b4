/*!
 * Mock backend implementation for testing.
 *
 * This module provides a mock backend that simulates different behaviors:
 * - `MockBackend::working()` - Always succeeds with a tagged "translation"
 * - `MockBackend::failing()` - Always fails with a transient error
 * - `MockBehavior::FailFirst` - Fails the first N calls, then succeeds
 * - `MockBehavior::FailWhenContains` - Fails every call whose text contains a marker
 *
 * Clones share the request log, so a test can keep a handle after moving the
 * backend into a client.
 */

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::errors::ProviderError;
use crate::providers::TranslationBackend;

/// Behavior mode for the mock backend
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Always succeeds with `[target] text`
    Working,
    /// Transient failure for the first `failures` calls
    FailFirst { failures: usize },
    /// Transient failure whenever the request contains the marker
    FailWhenContains(String),
    /// Always fails with a transient error
    Failing,
    /// Always fails with the given error
    Error(ProviderError),
    /// Succeeds with an empty body
    Empty,
}

/// Mock backend for testing translation behavior
#[derive(Debug, Clone)]
pub struct MockBackend {
    behavior: MockBehavior,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockBackend {
    /// Create a new mock backend with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a working mock backend that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create a failing mock backend that always errors
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Number of calls received
    pub fn request_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }

    /// Texts received, in call order
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// The translation `Working` produces for a text
    pub fn expected_translation(text: &str, target_language: &str) -> String {
        format!("[{}] {}", target_language, text)
    }
}

#[async_trait]
impl TranslationBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    async fn translate(
        &self,
        text: &str,
        _source_language: &str,
        target_language: &str,
    ) -> Result<String, ProviderError> {
        let count = {
            let mut requests = self
                .requests
                .lock()
                .map_err(|_| ProviderError::RequestFailed("mock request log poisoned".into()))?;
            requests.push(text.to_string());
            requests.len()
        };

        let transient = || ProviderError::ConnectionError(format!("simulated failure #{}", count));

        match &self.behavior {
            MockBehavior::Working => Ok(Self::expected_translation(text, target_language)),
            MockBehavior::FailFirst { failures } if count <= *failures => Err(transient()),
            MockBehavior::FailFirst { .. } => Ok(Self::expected_translation(text, target_language)),
            MockBehavior::FailWhenContains(marker) if text.contains(marker.as_str()) => Err(transient()),
            MockBehavior::FailWhenContains(_) => Ok(Self::expected_translation(text, target_language)),
            MockBehavior::Failing => Err(transient()),
            MockBehavior::Error(error) => Err(error.clone()),
            MockBehavior::Empty => Ok(String::new()),
        }
    }
}
