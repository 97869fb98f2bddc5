//! Single-retry policy for provider calls.
//!
//! A failed call is attempted again at most once, and only when the failure is
//! tagged transient and retries are enabled. Permanent failures return at once.

use std::future::Future;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::error::ProviderFailure;

/// Configuration for retry behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Whether a transient failure gets its one extra attempt.
    pub enabled: bool,
    /// Pause before the retry.
    #[serde(rename = "backoff_ms", with = "crate::serde_millis")]
    pub backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backoff: Duration::ZERO,
        }
    }
}

impl RetryConfig {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Total attempts a transient failure may consume.
    pub fn max_attempts(&self) -> u32 {
        if self.enabled {
            2
        } else {
            1
        }
    }
}

/// Result of a retried operation.
#[derive(Debug, Clone)]
pub struct RetryOutcome<T> {
    pub result: Result<T, ProviderFailure>,
    /// Number of attempts made (1 = no retry needed or allowed).
    pub attempts: u32,
    pub total_duration: Duration,
}

impl<T> RetryOutcome<T> {
    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }

    pub fn into_result(self) -> Result<T, ProviderFailure> {
        self.result
    }
}

/// Runs `operation`, retrying once on a transient failure when enabled.
///
/// The closure receives the zero-based attempt number.
pub async fn execute_with_retry<T, F, Fut>(
    config: &RetryConfig,
    mut operation: F,
) -> RetryOutcome<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, ProviderFailure>>,
{
    let start = Instant::now();
    let max_attempts = config.max_attempts();
    let mut attempt = 0;

    loop {
        let result = operation(attempt).await;
        attempt += 1;

        match result {
            Err(failure) if failure.is_transient() && attempt < max_attempts => {
                tracing::warn!(attempt, error = %failure, "retrying provider call");
                if !config.backoff.is_zero() {
                    tokio::time::sleep(config.backoff).await;
                }
            }
            result => {
                return RetryOutcome {
                    result,
                    attempts: attempt,
                    total_duration: start.elapsed(),
                };
            }
        }
    }
}
