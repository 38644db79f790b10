//! Bounded retry with exponential backoff for collaborator calls.
//!
//! Agents wrap their model calls in [`RetryPolicy::execute`]. The graph
//! executor never retries; a stage that keeps failing after its attempts are
//! used up either propagates the error or yields a placeholder string via
//! [`RetryPolicy::execute_or_placeholder`].

use std::future::Future;
use std::time::Duration;

use crate::error::AgentError;

/// Backoff settings. `max_attempts` counts the first call.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub base_delay: Duration,
    /// Upper bound for any single delay.
    pub max_delay: Duration,
    /// Growth factor per attempt (2.0 doubles the delay).
    pub multiplier: f64,
    /// Random spread as a fraction of the delay, 0.0 to 1.0.
    pub jitter: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
            jitter: 0.1,
        }
    }
}

impl RetryConfig {
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter.clamp(0.0, 1.0);
        self
    }
}

/// Runs an async operation up to `max_attempts` times, sleeping between tries.
#[derive(Debug, Clone, Default)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Single attempt, no sleeping. Handy for tests and mocks.
    pub fn no_retry() -> Self {
        Self::new(RetryConfig::default().with_max_attempts(1))
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Delay after the failed attempt `attempt` (0-indexed), capped and jittered.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let base = self.config.base_delay.as_millis() as f64
            * self.config.multiplier.powi(attempt as i32);
        let capped = base.min(self.config.max_delay.as_millis() as f64);
        let jittered = if self.config.jitter > 0.0 {
            let spread = capped * self.config.jitter;
            (capped + rand::random::<f64>() * spread * 2.0 - spread).max(0.0)
        } else {
            capped
        };
        Duration::from_millis(jittered as u64)
    }

    /// Calls `operation` until it succeeds or the attempts run out; returns the last error.
    pub async fn execute<F, Fut, T>(&self, what: &str, operation: F) -> Result<T, AgentError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, AgentError>>,
    {
        let attempts = self.config.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            match operation().await {
                Ok(v) => return Ok(v),
                Err(e) if attempt + 1 < attempts => {
                    let delay = self.delay_for(attempt);
                    tracing::warn!(
                        what,
                        attempt = attempt + 1,
                        max_attempts = attempts,
                        backoff_ms = delay.as_millis() as u64,
                        error = %e,
                        "retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!(what, attempts, error = %e, "retries exhausted");
                    return Err(e);
                }
            }
        }
    }

    /// Like [`execute`](Self::execute) but turns exhaustion into `"[Error: ...]"`.
    pub async fn execute_or_placeholder<F, Fut>(&self, what: &str, operation: F) -> String
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<String, AgentError>>,
    {
        self.execute(what, operation)
            .await
            .unwrap_or_else(|e| placeholder(&e))
    }
}

/// Placeholder text a stage yields when its model call keeps failing.
pub fn placeholder(error: &AgentError) -> String {
    format!("[Error: {}]", error)
}
