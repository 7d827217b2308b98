//! Retry utilities with exponential backoff and optional jitter.
//!
//! [`RetryableCall`] wraps a single invocation of an unreliable external
//! dependency. The backoff schedule is a plain value on [`RetryConfig`] so it
//! can be inspected and asserted without running anything.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::cancellation::CancellationToken;
use crate::errors::{AttemptError, RetryError, StudioError};

/// Jitter strategy applied on top of the backoff delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JitterStrategy {
    /// No jitter; the schedule is fully deterministic.
    #[default]
    None,
    /// Random from 0 to delay.
    Full,
    /// Half fixed, half random.
    Equal,
}

/// Configuration for retry behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum attempts (including the initial one).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay after the first failed attempt, in milliseconds.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Maximum delay cap in milliseconds.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Factor applied to the delay after each further failure.
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
    /// Jitter strategy.
    #[serde(default)]
    pub jitter_strategy: JitterStrategy,
    /// Upper bound for a single attempt, independent of the retry budget.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_timeout_ms: Option<u64>,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    4_000
}

fn default_max_delay_ms() -> u64 {
    10_000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter_strategy: JitterStrategy::None,
            call_timeout_ms: None,
        }
    }
}

impl RetryConfig {
    /// Creates a new retry config.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum attempts.
    #[must_use]
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Sets the base delay.
    #[must_use]
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay_ms = duration_ms(delay);
        self
    }

    /// Sets the maximum delay.
    #[must_use]
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay_ms = duration_ms(delay);
        self
    }

    /// Sets the backoff multiplier.
    #[must_use]
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Sets the jitter strategy.
    #[must_use]
    pub fn with_jitter(mut self, strategy: JitterStrategy) -> Self {
        self.jitter_strategy = strategy;
        self
    }

    /// Sets the per-attempt timeout.
    #[must_use]
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout_ms = Some(duration_ms(timeout));
        self
    }

    /// Returns the base delay.
    #[must_use]
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    /// Returns the maximum delay.
    #[must_use]
    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    /// Returns the per-attempt timeout, if any.
    #[must_use]
    pub fn call_timeout(&self) -> Option<Duration> {
        self.call_timeout_ms.map(Duration::from_millis)
    }

    /// Checks the configuration for values the retry loop cannot honour.
    ///
    /// # Errors
    ///
    /// Returns `Config` describing the first invalid field.
    pub fn validate(&self) -> Result<(), StudioError> {
        if self.max_attempts == 0 {
            return Err(StudioError::Config("max_attempts must be at least 1".to_string()));
        }
        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier <= 0.0 {
            return Err(StudioError::Config(format!(
                "backoff_multiplier must be a positive number, got {}",
                self.backoff_multiplier
            )));
        }
        if self.base_delay_ms > self.max_delay_ms {
            return Err(StudioError::Config(format!(
                "base_delay_ms ({}) exceeds max_delay_ms ({})",
                self.base_delay_ms, self.max_delay_ms
            )));
        }
        if self.call_timeout_ms == Some(0) {
            return Err(StudioError::Config("call_timeout_ms must be positive".to_string()));
        }
        Ok(())
    }

    /// Delay to wait after the given failed attempt (1-indexed), before jitter.
    ///
    /// `min(max_delay, base_delay * backoff_multiplier^(attempt - 1))`
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
        let raw = self.base_delay_ms as f64 * self.backoff_multiplier.powi(exponent);
        let capped = if raw.is_finite() {
            raw.min(self.max_delay_ms as f64).max(0.0)
        } else {
            self.max_delay_ms as f64
        };
        Duration::from_millis(capped.round() as u64)
    }

    /// Delay for the given failed attempt with the configured jitter applied.
    #[must_use]
    pub fn jittered_delay(&self, attempt: u32) -> Duration {
        let delay = duration_ms(self.delay_for_attempt(attempt));
        let jittered = match self.jitter_strategy {
            JitterStrategy::None => delay,
            JitterStrategy::Full => {
                if delay == 0 {
                    0
                } else {
                    rand::thread_rng().gen_range(0..=delay)
                }
            }
            JitterStrategy::Equal => {
                let half = delay / 2;
                if half == 0 {
                    delay
                } else {
                    half + rand::thread_rng().gen_range(0..=half)
                }
            }
        };
        Duration::from_millis(jittered)
    }

    /// The waits between attempts when every attempt fails, before jitter.
    #[must_use]
    pub fn backoff_schedule(&self) -> Vec<Duration> {
        (1..self.max_attempts.max(1))
            .map(|attempt| self.delay_for_attempt(attempt))
            .collect()
    }

    /// Worst-case cumulative backoff, excluding time spent in the calls.
    #[must_use]
    pub fn worst_case_delay(&self) -> Duration {
        self.backoff_schedule().into_iter().sum()
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Bounded-retry wrapper around one external call site.
#[derive(Debug, Clone)]
pub struct RetryableCall {
    name: String,
    config: RetryConfig,
    cancel: Option<Arc<CancellationToken>>,
}

impl RetryableCall {
    /// Creates a retryable call for the named call site.
    #[must_use]
    pub fn new(name: impl Into<String>, config: RetryConfig) -> Self {
        Self {
            name: name.into(),
            config,
            cancel: None,
        }
    }

    /// Attaches a cancellation token observed between attempts.
    #[must_use]
    pub fn with_cancellation(mut self, token: Arc<CancellationToken>) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Returns the call site name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the retry configuration.
    #[must_use]
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Invokes `operation` until it succeeds or the attempts run out.
    ///
    /// Each attempt is bounded by the configured call timeout. Between
    /// failed attempts the call sleeps for the configured backoff; a
    /// cancellation during that sleep ends the call immediately.
    ///
    /// # Errors
    ///
    /// Returns `ExhaustedRetries` carrying the last attempt's error, or
    /// `Cancelled` if the attached token fired.
    pub async fn call<T, E, F, Fut>(&self, mut operation: F) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            if let Some(reason) = self.cancellation_reason() {
                return Err(RetryError::Cancelled(reason));
            }

            attempt += 1;
            let outcome = match self.config.call_timeout() {
                Some(limit) => match tokio::time::timeout(limit, operation()).await {
                    Ok(result) => result.map_err(AttemptError::Failed),
                    Err(_) => Err(AttemptError::TimedOut(limit)),
                },
                None => operation().await.map_err(AttemptError::Failed),
            };

            let error = match outcome {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::debug!(call = %self.name, attempt, "Call succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(error) => error,
            };

            if attempt >= max_attempts {
                tracing::warn!(
                    call = %self.name,
                    attempts = attempt,
                    error = %error,
                    "Retries exhausted"
                );
                return Err(RetryError::ExhaustedRetries {
                    attempts: attempt,
                    last_error: error,
                });
            }

            let delay = self.config.jittered_delay(attempt);
            tracing::warn!(
                call = %self.name,
                attempt,
                delay_ms = duration_ms(delay),
                error = %error,
                "Retrying after error"
            );

            if let Some(reason) = self.backoff(delay).await {
                return Err(RetryError::Cancelled(reason));
            }
        }
    }

    /// Sleeps for `delay`, returning the cancellation reason if interrupted.
    async fn backoff(&self, delay: Duration) -> Option<String> {
        match &self.cancel {
            Some(token) => {
                tokio::select! {
                    () = tokio::time::sleep(delay) => None,
                    () = token.cancelled() => Some(token.reason().unwrap_or_default()),
                }
            }
            None => {
                tokio::time::sleep(delay).await;
                None
            }
        }
    }

    fn cancellation_reason(&self) -> Option<String> {
        self.cancel
            .as_ref()
            .filter(|token| token.is_cancelled())
            .map(|token| token.reason().unwrap_or_default())
    }
}

/// Executes an operation with retry logic.
///
/// # Errors
///
/// See [`RetryableCall::call`].
pub async fn with_retry<T, E, F, Fut>(
    config: &RetryConfig,
    key: &str,
    operation: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    RetryableCall::new(key, config.clone()).call(operation).await
}
