use crate::error::{AdventureError, LlmError, Result};
use std::future::Future;
use std::time::Duration;

const DEFAULT_BASE_BACKOFF_MS: u64 = 500;
const MAX_BACKOFF_MS: u64 = 10_000;

/// Bounded wait plus retry with exponential backoff around one provider call.
///
/// Each attempt runs under `timeout`; an attempt that overruns becomes
/// [`AdventureError::GenerationTimeout`]. Timeouts and transient provider
/// errors are retried up to `max_retries` times, everything else fails fast.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    timeout: Duration,
    max_retries: u32,
    base_backoff_ms: u64,
}

impl RetryPolicy {
    pub fn new(timeout_secs: u64, max_retries: u32) -> Self {
        Self {
            timeout: Duration::from_secs(timeout_secs),
            max_retries,
            base_backoff_ms: DEFAULT_BASE_BACKOFF_MS,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_base_backoff_ms(mut self, base_backoff_ms: u64) -> Self {
        self.base_backoff_ms = base_backoff_ms;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub async fn run<T, F, Fut>(&self, what: &'static str, provider: &str, mut call: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, LlmError>>,
    {
        let mut backoff_ms = self.base_backoff_ms;
        let mut attempt = 0;

        loop {
            let err = match tokio::time::timeout(self.timeout, call()).await {
                Ok(Ok(value)) => {
                    if attempt > 0 {
                        tracing::info!(
                            provider,
                            attempt,
                            "{what} provider recovered after retries"
                        );
                    }
                    return Ok(value);
                }
                Ok(Err(e)) => AdventureError::Llm(e),
                Err(_) => AdventureError::GenerationTimeout {
                    what,
                    secs: self.timeout.as_secs(),
                },
            };

            if !err.is_retryable() {
                tracing::warn!(provider, "{what} call failed with non-retryable error: {err}");
                return Err(err);
            }
            if attempt >= self.max_retries {
                tracing::warn!(provider, attempts = attempt + 1, "{what} call failed: {err}");
                return Err(err);
            }

            tracing::warn!(
                provider,
                attempt = attempt + 1,
                max_retries = self.max_retries,
                "{what} call failed, retrying: {err}"
            );
            tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
            backoff_ms = backoff_ms.saturating_mul(2).min(MAX_BACKOFF_MS);
            attempt += 1;
        }
    }
}
