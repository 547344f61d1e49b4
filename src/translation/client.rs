/*!
 * Retrying, rate-limited wrapper around a translation backend.
 *
 * All retry and spacing policy lives here so backends stay plain request
 * adapters. The minimum interval is measured between the starts of two
 * consecutive backend calls and paid once per call, retries included, so a
 * retry that already waited out its backoff pays nothing extra.
 */

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use log::{debug, warn};
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::errors::TranslationError;
use crate::providers::TranslationBackend;
use crate::translation::sanitize::collapse_whitespace;

/// Delay schedule between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Same delay before every retry
    Fixed(Duration),
    /// `base`, then `2 * base`, `4 * base`, ...
    Exponential {
        /// Delay before the first retry
        base: Duration,
    },
}

/// Bounded retry policy for transient backend failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total calls allowed for one text, the first included
    pub max_attempts: u32,
    /// Delay schedule between calls
    pub backoff: Backoff,
}

impl RetryPolicy {
    /// Delay to wait after the given failed attempt (1-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed(delay) => delay,
            Backoff::Exponential { base } => {
                let factor = 1u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
                base.saturating_mul(factor)
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            backoff: Backoff::Fixed(Duration::from_secs(2)),
        }
    }
}

/// Translation client used by the page processor
pub struct TranslationClient {
    backend: Arc<dyn TranslationBackend>,
    policy: RetryPolicy,
    min_interval: Duration,
    min_text_length: usize,
    last_call: Mutex<Option<Instant>>,
    calls: AtomicU64,
}

impl TranslationClient {
    /// Create a client with the default policy and no spacing
    pub fn new(backend: Arc<dyn TranslationBackend>) -> Self {
        Self {
            backend,
            policy: RetryPolicy::default(),
            min_interval: Duration::ZERO,
            min_text_length: 5,
            last_call: Mutex::new(None),
            calls: AtomicU64::new(0),
        }
    }

    /// Set the retry policy
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = RetryPolicy {
            max_attempts: policy.max_attempts.max(1),
            ..policy
        };
        self
    }

    /// Set the minimum interval between backend calls
    pub fn with_min_interval(mut self, interval: Duration) -> Self {
        self.min_interval = interval;
        self
    }

    /// Texts shorter than this many characters bypass the backend
    pub fn with_min_text_length(mut self, length: usize) -> Self {
        self.min_text_length = length;
        self
    }

    /// Name of the wrapped backend
    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Number of backend calls made so far, retries included
    pub fn calls_made(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Ask the backend for a cheap round trip, without retries
    pub async fn check_connection(&self) -> Result<(), TranslationError> {
        self.wait_for_slot().await;
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.backend.test_connection().await.map_err(TranslationError::Provider)
    }

    /// Translate `text`, retrying transient failures per the policy
    ///
    /// Text shorter than the minimum meaningful length is returned unchanged.
    pub async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, TranslationError> {
        if text.trim().chars().count() < self.min_text_length {
            return Ok(text.to_string());
        }

        let request = collapse_whitespace(text);
        let mut attempt = 0;

        loop {
            attempt += 1;
            self.wait_for_slot().await;
            self.calls.fetch_add(1, Ordering::SeqCst);

            match self.backend.translate(&request, source_language, target_language).await {
                Ok(translated) if translated.trim().is_empty() => {
                    return Err(TranslationError::EmptyResponse);
                }
                Ok(translated) => {
                    debug!(
                        "{} translated {} chars on attempt {}",
                        self.backend.name(),
                        request.chars().count(),
                        attempt
                    );
                    return Ok(translated);
                }
                Err(error) if !error.is_transient() => {
                    return Err(TranslationError::Provider(error));
                }
                Err(error) if attempt >= self.policy.max_attempts => {
                    return Err(TranslationError::RetriesExhausted { attempts: attempt, last: error });
                }
                Err(error) => {
                    let delay = self.policy.delay_after(attempt);
                    warn!(
                        "{} call failed ({}), retrying in {:?} (attempt {}/{})",
                        self.backend.name(),
                        error,
                        delay,
                        attempt + 1,
                        self.policy.max_attempts
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// Wait until the minimum interval since the previous call has elapsed
    async fn wait_for_slot(&self) {
        let mut last_call = self.last_call.lock().await;
        if let Some(previous) = *last_call {
            let ready_at = previous + self.min_interval;
            if ready_at > Instant::now() {
                tokio::time::sleep_until(ready_at).await;
            }
        }
        *last_call = Some(Instant::now());
    }
}
