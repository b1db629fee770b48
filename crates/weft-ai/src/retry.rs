//! Exponential backoff for transient AI failures

use std::future::Future;
use std::time::Duration;

use backoff::ExponentialBackoffBuilder;
use backoff::backoff::Backoff;

use crate::Result;

/// Retry schedule: `initial`, then doubling, for at most `max_retries` retries.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: crate::DEFAULT_MAX_RETRIES,
            initial_interval: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    fn schedule(&self) -> impl Backoff + use<> {
        ExponentialBackoffBuilder::new()
            .with_initial_interval(self.initial_interval)
            .with_multiplier(2.0)
            .with_randomization_factor(0.0)
            .with_max_interval(self.initial_interval * 64)
            .with_max_elapsed_time(None)
            .build()
    }

    /// Run `operation` until it succeeds, fails permanently, or retries run out.
    pub async fn run<T, F, Fut>(&self, label: &str, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut schedule = self.schedule();
        let mut attempt = 0;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    let wait = schedule.next_backoff().unwrap_or(self.initial_interval);
                    attempt += 1;
                    tracing::warn!(
                        operation = label,
                        error = %e,
                        attempt,
                        max_retries = self.max_retries,
                        wait_ms = wait.as_millis() as u64,
                        "Retrying after transient failure"
                    );
                    tokio::time::sleep(wait).await;
                }
                Err(e) => {
                    if e.is_retryable() {
                        tracing::error!(operation = label, error = %e, attempts = attempt + 1, "Giving up after retries");
                    }
                    return Err(e);
                }
            }
        }
    }
}
