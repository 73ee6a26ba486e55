//! Opt-in retry wrapper around any [`ModelClient`].
//!
//! The analysis pipeline itself makes a single capability call per run; backoff
//! is layered on here, outside the pipeline, when `MODEL_MAX_RETRIES > 0`.

use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use super::{ModelClient, ModelError};

const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

/// Upper bound on any single wait, including a server-supplied `Retry-After`.
const MAX_RETRY_DELAY: Duration = Duration::from_secs(60);

/// Retries transient failures (rate limits, outages) with exponential backoff:
/// 1s, 2s, 4s... A server-supplied `Retry-After` takes precedence. Waits are
/// capped at one minute.
pub struct RetryingModel<M> {
    inner: M,
    max_retries: u32,
    base_delay: Duration,
}

impl<M: ModelClient> RetryingModel<M> {
    pub fn new(inner: M, max_retries: u32) -> Self {
        Self {
            inner,
            max_retries,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }

    #[cfg(test)]
    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    fn delay_for(&self, attempt: u32, error: &ModelError) -> Duration {
        let delay = match error {
            ModelError::RateLimited {
                retry_after_secs: Some(secs),
            } => Duration::from_secs(*secs),
            _ => self
                .base_delay
                .saturating_mul(2u32.saturating_pow(attempt)),
        };
        delay.min(MAX_RETRY_DELAY)
    }
}

#[async_trait]
impl<M: ModelClient> ModelClient for RetryingModel<M> {
    async fn generate(&self, prompt: &str) -> Result<String, ModelError> {
        let mut attempt = 0;
        loop {
            match self.inner.generate(prompt).await {
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    let delay = self.delay_for(attempt, &e);
                    attempt += 1;
                    warn!(
                        "Model call attempt {} failed ({}), retrying after {}ms...",
                        attempt,
                        e,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                }
                outcome => return outcome,
            }
        }
    }
}
