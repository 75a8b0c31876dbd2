// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bounded retry with exponential backoff for upstream calls.
//!
//! Backoff waits race a [`CancellationToken`]. Cancelling it (server
//! shutdown) aborts a pipeline that is sleeping between attempts.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::error::{ProviderError, ProviderResult};

/// Default number of attempts, including the first.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Wait before the second attempt. Doubles for each later attempt.
pub const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_secs(2);

/// Retry policy: attempt budget and backoff schedule.
///
/// Which errors are retried is decided by [`ProviderError::is_retryable`]:
/// transport failures, 429 and 529 are; 401, encryption and cancellation are not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_backoff: DEFAULT_INITIAL_BACKOFF,
        }
    }
}

impl RetryPolicy {
    /// A policy that makes exactly one attempt.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::ZERO,
        }
    }

    /// Wait after failed attempt number `attempt` (1-based): 2s, 4s, 8s, ...
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.initial_backoff.saturating_mul(1 << exponent)
    }

    /// Run `operation` until it succeeds, fails fatally, or the budget is spent.
    ///
    /// `operation` receives the 1-based attempt number. The last error is
    /// returned unchanged when attempts are exhausted.
    pub async fn run<T, F, Fut>(
        &self,
        cancel: &CancellationToken,
        mut operation: F,
    ) -> ProviderResult<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = ProviderResult<T>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            if cancel.is_cancelled() {
                return Err(ProviderError::Cancelled);
            }

            match operation(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    let delay = self.backoff_for(attempt);
                    warn!(
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Upstream call failed, backing off"
                    );

                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {},
                        _ = cancel.cancelled() => return Err(ProviderError::Cancelled),
                    }

                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    fn gaps(instants: &[Instant]) -> Vec<Duration> {
        instants.windows(2).map(|w| w[1] - w[0]).collect()
    }

    #[test]
    fn backoff_doubles_from_initial() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_for(1), Duration::from_secs(2));
        assert_eq!(policy.backoff_for(2), Duration::from_secs(4));
        assert_eq!(policy.backoff_for(3), Duration::from_secs(8));
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limited_twice_then_success_takes_three_attempts() {
        let token = CancellationToken::new();
        let mut seen = Vec::new();

        let result = RetryPolicy::default()
            .run(&token, |attempt| {
                seen.push(Instant::now());
                let outcome = if attempt < 3 {
                    Err(ProviderError::RateLimited("429".into()))
                } else {
                    Ok("done")
                };
                async move { outcome }
            })
            .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(seen.len(), 3);
        assert_eq!(
            gaps(&seen),
            vec![Duration::from_secs(2), Duration::from_secs(4)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn authentication_failure_is_not_retried() {
        let token = CancellationToken::new();
        let mut attempts = 0;

        let result: ProviderResult<()> = RetryPolicy::default()
            .run(&token, |_| {
                attempts += 1;
                async { Err(ProviderError::Authentication("401".into())) }
            })
            .await;

        assert_eq!(attempts, 1);
        assert!(matches!(result, Err(ProviderError::Authentication(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_budget_returns_last_error() {
        let token = CancellationToken::new();
        let mut attempts = 0;

        let result: ProviderResult<()> = RetryPolicy::default()
            .run(&token, |_| {
                attempts += 1;
                async { Err(ProviderError::Overloaded("529".into())) }
            })
            .await;

        assert_eq!(attempts, 3);
        assert!(matches!(result, Err(ProviderError::Overloaded(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_backoff() {
        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(500)).await;
            canceller.cancel();
        });

        let started = Instant::now();
        let mut attempts = 0;
        let result: ProviderResult<()> = RetryPolicy::default()
            .run(&token, |_| {
                attempts += 1;
                async { Err(ProviderError::Transport("connection reset".into())) }
            })
            .await;

        assert_eq!(attempts, 1);
        assert!(matches!(result, Err(ProviderError::Cancelled)));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn no_retry_policy_makes_one_attempt() {
        let token = CancellationToken::new();
        let mut attempts = 0;

        let result: ProviderResult<()> = RetryPolicy::no_retry()
            .run(&token, |_| {
                attempts += 1;
                async { Err(ProviderError::Transport("boom".into())) }
            })
            .await;

        assert_eq!(attempts, 1);
        assert!(result.is_err());
    }
}
