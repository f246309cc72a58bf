use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use switchboard_common::{Result, SwitchboardError};
use tracing::warn;

use crate::client::{LlmClient, LlmRequest, LlmResponse, TRANSPORT_FAILURE_PREFIX};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 500,
            max_delay_ms: 30_000,
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }
}

/// Retries transient provider failures (rate limits, 5xx) with
/// exponential back-off. Anything else is returned on the first failure.
pub struct RetryingClient<T: LlmClient> {
    inner: T,
    config: RetryConfig,
}

impl<T: LlmClient> RetryingClient<T> {
    pub fn new(inner: T, config: RetryConfig) -> Self {
        Self { inner, config }
    }

    /// Classifies on the `HTTP <code>` prefix the clients put on every
    /// non-2xx error. Body text never influences the decision.
    fn is_retryable(error: &SwitchboardError) -> bool {
        let SwitchboardError::Provider { message, .. } = error else {
            return false;
        };

        match http_status(message) {
            Some(code) => code == 429 || (500..=599).contains(&code),
            // no response at all: connect errors and timeouts
            None => message.starts_with(TRANSPORT_FAILURE_PREFIX),
        }
    }

    /// Milliseconds from a `Retry-After: <seconds>` hint in the message.
    fn parse_retry_after(error_msg: &str) -> Option<u64> {
        const NEEDLE: &str = "retry-after";

        // ASCII lowering keeps byte offsets aligned with `error_msg`
        let pos = error_msg.to_ascii_lowercase().find(NEEDLE)?;
        let rest = error_msg[pos + NEEDLE.len()..].trim_start_matches([':', '=', ' ']);
        let digits_end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());

        rest[..digits_end]
            .parse::<u64>()
            .ok()
            .map(|secs| secs.saturating_mul(1000))
    }

    fn compute_delay(&self, attempt: u32) -> u64 {
        let base = self.config.initial_delay_ms as f64
            * self.config.backoff_multiplier.powi(attempt as i32);
        let jitter = (base * 0.1 * jitter_fraction(attempt)) as u64;
        let delay = (base as u64).saturating_add(jitter);
        delay.min(self.config.max_delay_ms)
    }
}

/// Status code from a message of the form `HTTP <code> ...`.
fn http_status(message: &str) -> Option<u16> {
    let rest = message.strip_prefix("HTTP ")?;
    let end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
    rest[..end].parse().ok()
}

/// Deterministic spread in `[0, 1)` derived from the attempt number.
fn jitter_fraction(attempt: u32) -> f64 {
    let x = attempt.wrapping_add(1).wrapping_mul(2_654_435_761);
    (x % 100) as f64 / 100.0
}

#[async_trait]
impl<T: LlmClient> LlmClient for RetryingClient<T> {
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse> {
        let mut attempt = 0;

        loop {
            let error = match self.inner.complete(request.clone()).await {
                Ok(response) => return Ok(response),
                Err(e) => e,
            };

            if attempt >= self.config.max_retries || !Self::is_retryable(&error) {
                return Err(error);
            }

            let error_msg = error.to_string();
            let delay = Self::parse_retry_after(&error_msg)
                .map(|ms| ms.min(self.config.max_delay_ms))
                .unwrap_or_else(|| self.compute_delay(attempt));

            warn!(
                model = %self.inner.model_name(),
                attempt = attempt + 1,
                max_retries = self.config.max_retries,
                delay_ms = delay,
                error = %error_msg,
                "Retrying completion request"
            );

            tokio::time::sleep(tokio::time::Duration::from_millis(delay)).await;
            attempt += 1;
        }
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }
}
