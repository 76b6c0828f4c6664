//! Bounded polling primitives.
//!
//! Everything in this crate that waits - readiness of a freshly loaded
//! document, appearance of a consent banner - is a poll loop with a hard
//! deadline. Two shapes cover all call sites: a condition that eventually
//! reports true (`wait_for_result`, which errors on deadline) and a producer
//! that eventually yields a value (`wait_for_some`, for which absence at the
//! deadline is an ordinary answer, not an error).

use crate::error::{NavError, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};

/// Default timeout for wait operations (30 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default poll interval for checking conditions (100ms).
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Configuration for wait operations.
#[derive(Debug, Clone, Copy)]
pub struct WaitConfig {
    /// Maximum time to wait for the condition.
    pub timeout: Duration,

    /// How often to check if the condition is satisfied.
    pub poll_interval: Duration,
}

impl WaitConfig {
    /// Creates a new wait configuration.
    #[must_use]
    pub fn new(timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            timeout,
            poll_interval,
        }
    }

    /// Creates a config with a custom timeout and the default poll interval.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::new(timeout, DEFAULT_POLL_INTERVAL)
    }
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT, DEFAULT_POLL_INTERVAL)
    }
}

/// Waits for a fallible condition to report true.
///
/// The condition is polled at `poll_interval` until it returns `Ok(true)` or
/// the timeout expires. `Ok(false)` and `Err` are both treated as "not yet":
/// condition errors are assumed transient (a script racing a page load) and
/// absorbed by the next poll.
///
/// # Errors
///
/// Returns [`NavError::WaitTimeout`] if the deadline passes first.
pub async fn wait_for_result<F, Fut>(condition: F, config: WaitConfig, description: &str) -> Result<()>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    let start = Instant::now();

    loop {
        match condition().await {
            Ok(true) => return Ok(()),
            Ok(false) | Err(_) => {}
        }

        if start.elapsed() >= config.timeout {
            return Err(NavError::WaitTimeout {
                condition: description.to_string(),
                timeout: config.timeout,
            });
        }

        sleep(config.poll_interval).await;
    }
}

/// Waits for a producer to yield a value, resolving to `None` at the deadline.
///
/// Used where element-or-absent is the contract: a consent banner that may
/// simply never appear. The producer is polled like [`wait_for_result`];
/// producer errors are absorbed as "nothing yet". A zero timeout performs
/// exactly one check.
pub async fn wait_for_some<F, Fut, T>(producer: F, config: WaitConfig) -> Option<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    let start = Instant::now();

    loop {
        if let Ok(Some(value)) = producer().await {
            return Some(value);
        }

        if start.elapsed() >= config.timeout {
            return None;
        }

        sleep(config.poll_interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn wait_for_result_succeeds_immediately() {
        let result = wait_for_result(
            || async { Ok(true) },
            WaitConfig::default(),
            "test condition",
        )
        .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn wait_for_result_succeeds_eventually() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = wait_for_result(
            move || {
                let c = counter_clone.clone();
                async move {
                    let count = c.fetch_add(1, Ordering::SeqCst);
                    Ok(count >= 3)
                }
            },
            WaitConfig::with_timeout(Duration::from_secs(5)),
            "counter >= 3",
        )
        .await;

        assert!(result.is_ok());
        assert!(counter.load(Ordering::SeqCst) >= 3);
    }

    #[tokio::test]
    async fn wait_for_result_absorbs_transient_errors() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = wait_for_result(
            move || {
                let c = counter_clone.clone();
                async move {
                    if c.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(NavError::ScriptFailed("not yet attached".into()))
                    } else {
                        Ok(true)
                    }
                }
            },
            WaitConfig::with_timeout(Duration::from_secs(5)),
            "condition after transient errors",
        )
        .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn wait_for_result_times_out() {
        let result = wait_for_result(
            || async { Ok(false) },
            WaitConfig::new(Duration::from_millis(100), Duration::from_millis(10)),
            "impossible condition",
        )
        .await;

        assert!(matches!(result, Err(NavError::WaitTimeout { .. })));
    }

    #[tokio::test]
    async fn wait_for_some_yields_value() {
        let value = wait_for_some(
            || async { Ok(Some(42u32)) },
            WaitConfig::default(),
        )
        .await;

        assert_eq!(value, Some(42));
    }

    #[tokio::test]
    async fn wait_for_some_resolves_absent_at_deadline() {
        let value: Option<u32> = wait_for_some(
            || async { Ok(None) },
            WaitConfig::new(Duration::from_millis(50), Duration::from_millis(10)),
        )
        .await;

        assert_eq!(value, None);
    }

    #[tokio::test]
    async fn wait_for_some_zero_timeout_checks_once() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let value: Option<u32> = wait_for_some(
            move || {
                let c = counter_clone.clone();
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Ok(None)
                }
            },
            WaitConfig::new(Duration::ZERO, Duration::from_millis(10)),
        )
        .await;

        assert_eq!(value, None);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
