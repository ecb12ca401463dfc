//! Async testing utilities
//!
//! Session completions and listener callbacks run on background tasks, so
//! tests observe them by polling rather than by awaiting a handle.

// Test helpers; panics are the assertion mechanism
#![allow(clippy::missing_panics_doc)]

use std::future::Future;
use std::time::Duration;

/// Default interval between polls
pub const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Assert that a synchronous condition becomes true within a timeout
///
/// The condition is re-evaluated every few milliseconds while the runtime is
/// free to drive background tasks.
///
/// # Examples
///
/// ```no_run
/// use std::sync::atomic::{AtomicBool, Ordering};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// #[tokio::test]
/// async fn test_eventually() {
///     let flag = Arc::new(AtomicBool::new(false));
///     let flag_clone = flag.clone();
///
///     tokio::spawn(async move {
///         flag_clone.store(true, Ordering::SeqCst);
///     });
///
///     grantflow_common::assert_eventually!(Duration::from_secs(1), flag.load(Ordering::SeqCst));
/// }
/// ```
#[macro_export]
macro_rules! assert_eventually {
    ($timeout:expr, $cond:expr) => {{
        let timeout_duration = $timeout;
        let deadline = tokio::time::Instant::now() + timeout_duration;
        loop {
            if $cond {
                break;
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "Condition `{}` did not become true within {:?}",
                stringify!($cond),
                timeout_duration
            );
            tokio::time::sleep($crate::testing::async_utils::POLL_INTERVAL).await;
        }
    }};
}

/// Assert that an async condition eventually becomes true within a timeout
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
///
/// #[tokio::test]
/// async fn test_eventually_async() {
///     grantflow_common::assert_eventually_async!(Duration::from_secs(1), async { true });
/// }
/// ```
#[macro_export]
macro_rules! assert_eventually_async {
    ($timeout:expr, $fut:expr) => {{
        let timeout_duration = $timeout;
        let result = tokio::time::timeout(timeout_duration, async {
            loop {
                if $fut.await {
                    break;
                }
                tokio::time::sleep($crate::testing::async_utils::POLL_INTERVAL).await;
            }
        })
        .await;

        assert!(result.is_ok(), "Condition did not become true within {:?}", timeout_duration);
    }};
}

/// Wait for a future to complete with a timeout
///
/// # Errors
/// Returns `Elapsed` if `fut` does not finish within `duration`
pub async fn timeout_ok<F, T>(duration: Duration, fut: F) -> Result<T, tokio::time::error::Elapsed>
where
    F: Future<Output = T>,
{
    tokio::time::timeout(duration, fut).await
}

/// Poll an async condition until it returns true or the timeout elapses
///
/// Returns whether the condition was observed true.
pub async fn poll_until<F, Fut>(timeout: Duration, interval: Duration, mut condition: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;

    loop {
        if condition().await {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(interval).await;
    }
}

/// Give background tasks a chance to run
///
/// Used before asserting that something did *not* happen, e.g. that a
/// listener was not notified a second time.
pub async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    tokio::time::sleep(Duration::from_millis(20)).await;
}

#[cfg(test)]
mod tests {
    //! Unit tests for testing::async_utils.
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    /// Validates `poll_until` behavior for the condition set by a spawned
    /// task scenario.
    ///
    /// Assertions:
    /// - Ensures the condition is observed before the timeout.
    #[tokio::test]
    async fn test_poll_until_observes_background_change() {
        let flag = Arc::new(AtomicBool::new(false));
        let flag_clone = flag.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            flag_clone.store(true, Ordering::SeqCst);
        });

        let reached = poll_until(Duration::from_secs(1), POLL_INTERVAL, || {
            let flag = flag.clone();
            async move { flag.load(Ordering::SeqCst) }
        })
        .await;

        assert!(reached);
    }

    /// Validates `poll_until` behavior for the never-true condition scenario.
    ///
    /// Assertions:
    /// - Ensures `false` is returned after the timeout.
    /// - Confirms the condition was polled more than once.
    #[tokio::test]
    async fn test_poll_until_times_out() {
        let polls = Arc::new(AtomicUsize::new(0));
        let polls_clone = polls.clone();

        let reached = poll_until(Duration::from_millis(30), POLL_INTERVAL, move || {
            polls_clone.fetch_add(1, Ordering::SeqCst);
            async { false }
        })
        .await;

        assert!(!reached);
        assert!(polls.load(Ordering::SeqCst) > 1);
    }

    /// Validates `assert_eventually!` for the counter reached scenario.
    ///
    /// Assertion coverage: the macro returns once the counter reaches 3.
    #[tokio::test]
    async fn test_assert_eventually_macro() {
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = counter.clone();

        tokio::spawn(async move {
            for _ in 0..3 {
                counter_clone.fetch_add(1, Ordering::SeqCst);
                tokio::task::yield_now().await;
            }
        });

        crate::assert_eventually!(Duration::from_secs(1), counter.load(Ordering::SeqCst) == 3);
    }

    /// Validates `timeout_ok` behavior for the slow future scenario.
    ///
    /// Assertions:
    /// - Ensures a future slower than the timeout yields `Err`.
    #[tokio::test]
    async fn test_timeout_ok_times_out() {
        let result = timeout_ok(Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_millis(200)).await;
        })
        .await;

        assert!(result.is_err());
    }
}
