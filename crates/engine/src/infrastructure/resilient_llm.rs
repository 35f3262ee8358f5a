//! Retrying decorator for any [`LlmPort`].
//!
//! Transient provider failures are retried with capped exponential backoff;
//! the decision comes from [`LlmError::is_transient`].

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::infrastructure::ports::{LlmError, LlmPort, LlmRequest, LlmResponse, RandomPort};

#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Extra attempts after the first; 0 disables retrying
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    /// Fraction of the delay randomly added or removed, 0.0 to 1.0
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
            max_delay_ms: 30_000,
            jitter_factor: 0.2,
        }
    }
}

impl RetryConfig {
    /// Delay before retry number `retry` (1-based) without jitter
    pub fn backoff_ms(&self, retry: u32) -> u64 {
        let doublings = retry.saturating_sub(1).min(63);
        self.base_delay_ms
            .saturating_mul(1u64 << doublings)
            .min(self.max_delay_ms)
    }
}

pub struct ResilientLlmClient {
    inner: Arc<dyn LlmPort>,
    config: RetryConfig,
    random: Arc<dyn RandomPort>,
}

impl ResilientLlmClient {
    pub fn new(inner: Arc<dyn LlmPort>, config: RetryConfig, random: Arc<dyn RandomPort>) -> Self {
        Self {
            inner,
            config,
            random,
        }
    }

    /// Backoff for retry number `retry`, spread by the jitter factor
    fn delay_for(&self, retry: u32) -> Duration {
        let backoff = self.config.backoff_ms(retry) as f64;
        let spread = self.config.jitter_factor.clamp(0.0, 1.0);
        let factor = 1.0 + self.random.gen_float(-spread, spread);
        Duration::from_millis((backoff * factor).max(0.0).round() as u64)
    }
}

#[async_trait]
impl LlmPort for ResilientLlmClient {
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse, LlmError> {
        let mut retry = 0;
        loop {
            let error = match self.inner.generate(request.clone()).await {
                Ok(response) => {
                    if retry > 0 {
                        tracing::info!(retries = retry, "LLM request recovered");
                    }
                    return Ok(response);
                }
                Err(e) => e,
            };

            if !error.is_transient() {
                tracing::error!(error = %error, "LLM request failed permanently");
                return Err(error);
            }
            if retry >= self.config.max_retries {
                tracing::error!(
                    attempts = retry + 1,
                    error = %error,
                    "LLM request failed, retries exhausted"
                );
                return Err(error);
            }

            retry += 1;
            let delay = self.delay_for(retry);
            tracing::warn!(
                retry,
                max_retries = self.config.max_retries,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Transient LLM failure, backing off"
            );
            tokio::time::sleep(delay).await;
        }
    }
}
