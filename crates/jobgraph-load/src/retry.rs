//! Whole-run retry with a bounded budget and a fixed delay.
//!
//! Only an unreachable store is retried. Every attempt starts the load from
//! the beginning, which the upsert-by-identity writes make safe.

use std::future::Future;
use std::time::Duration;

use jobgraph_core::config::LoadSettings;

use crate::error::LoadError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// A single attempt.
    pub fn once() -> Self {
        Self::new(1, Duration::ZERO)
    }
}

impl From<&LoadSettings> for RetryPolicy {
    fn from(settings: &LoadSettings) -> Self {
        Self::new(
            settings.retry_attempts,
            Duration::from_secs(settings.retry_delay_secs),
        )
    }
}

/// Run `op` until it succeeds, fails permanently, or the budget runs out.
///
/// `op` receives the 1-based attempt number.
pub async fn with_retries<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, LoadError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, LoadError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match op(attempt).await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::info!(attempt, "Load succeeded after retrying");
                }
                return Ok(value);
            }
            Err(e) if e.is_transient() && attempt < max_attempts => {
                tracing::warn!(
                    attempt,
                    max_attempts,
                    delay_secs = policy.delay.as_secs(),
                    error = %e,
                    "Graph store unavailable, retrying load"
                );
                tokio::time::sleep(policy.delay).await;
                attempt += 1;
            }
            Err(e) if e.is_transient() && max_attempts > 1 => {
                return Err(LoadError::RetriesExhausted {
                    attempts: max_attempts,
                    source: Box::new(e),
                });
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use std::cell::Cell;

    fn unavailable() -> LoadError {
        LoadError::Store(StoreError::Unavailable("connection refused".into()))
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failures() {
        let calls = Cell::new(0);
        let policy = RetryPolicy::new(5, Duration::ZERO);
        let result = with_retries(&policy, |attempt| {
            calls.set(calls.get() + 1);
            async move {
                if attempt < 3 {
                    Err(unavailable())
                } else {
                    Ok(attempt)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn test_budget_exhaustion_is_fatal() {
        let calls = Cell::new(0);
        let policy = RetryPolicy::new(3, Duration::ZERO);
        let result: Result<(), _> = with_retries(&policy, |_| {
            calls.set(calls.get() + 1);
            async { Err(unavailable()) }
        })
        .await;

        assert!(matches!(
            result,
            Err(LoadError::RetriesExhausted { attempts: 3, .. })
        ));
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn test_permanent_errors_are_not_retried() {
        let calls = Cell::new(0);
        let policy = RetryPolicy::new(5, Duration::ZERO);
        let result: Result<(), _> = with_retries(&policy, |_| {
            calls.set(calls.get() + 1);
            async { Err(LoadError::Store(StoreError::Rejected("syntax".into()))) }
        })
        .await;

        assert!(matches!(result, Err(LoadError::Store(StoreError::Rejected(_)))));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_policy_from_settings() {
        let policy = RetryPolicy::from(&LoadSettings::default());
        assert_eq!(policy.max_attempts, 100);
        assert_eq!(policy.delay, Duration::from_secs(10));
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts, 1);
    }
}
