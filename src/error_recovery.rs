// src/error_recovery.rs
//! Retry with exponential backoff for API operations.
//!
//! One network call is wrapped at a time. Only errors that classify as
//! transient are retried; anything else is returned on the spot.

use crate::constants::{
    RETRY_BACKOFF_MULTIPLIER, RETRY_INITIAL_DELAY_MS, RETRY_MAX_ATTEMPTS, RETRY_MAX_DELAY_MS,
};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Errors that know whether a retry could succeed.
pub trait Transient {
    fn is_transient(&self) -> bool;
}

/// Attempt budget and delay curve for [`retry_with_backoff`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total invocations in the worst case, the first one included.
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: RETRY_MAX_ATTEMPTS,
            initial_delay: Duration::from_millis(RETRY_INITIAL_DELAY_MS),
            max_delay: Duration::from_millis(RETRY_MAX_DELAY_MS),
            backoff_multiplier: RETRY_BACKOFF_MULTIPLIER,
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after failed attempt number `attempt` (1-based):
    /// `min(initial * multiplier^(attempt - 1), max)`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let millis =
            self.initial_delay.as_millis() as f64 * self.backoff_multiplier.powi(exponent);
        let capped = millis.min(self.max_delay.as_millis() as f64).max(0.0);
        Duration::from_millis(capped as u64)
    }
}

/// Runs `operation` until it succeeds, fails with a non-transient error, or
/// the attempt budget runs out.
///
/// `on_retry(error, attempt, delay)` fires right before each backoff sleep.
/// A first-try success never sleeps, and the error returned on failure is
/// always the most recent one.
pub async fn retry_with_backoff<F, Fut, T, E, O>(
    mut operation: F,
    policy: &RetryPolicy,
    mut on_retry: O,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Transient,
    O: FnMut(&E, u32, Duration),
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if e.is_transient() && attempt < max_attempts => {
                let delay = policy.delay_for_attempt(attempt);
                on_retry(&e, attempt, delay);
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// The default retry observer: a warning naming what is being retried.
pub fn log_retry<E: Display>(label: &str) -> impl FnMut(&E, u32, Duration) + '_ {
    move |error, attempt, delay| {
        log::warn!(
            "{}: attempt {} failed ({}), retrying after {:?}",
            label,
            attempt,
            error,
            delay
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    #[derive(Debug, PartialEq)]
    enum TestError {
        Reset(u32),
        Fatal,
    }

    impl Transient for TestError {
        fn is_transient(&self) -> bool {
            matches!(self, TestError::Reset(_))
        }
    }

    #[test]
    fn delay_curve_is_capped() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(2000));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(4000));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(8000));
        assert_eq!(policy.delay_for_attempt(4), Duration::from_millis(10000));
        assert_eq!(policy.delay_for_attempt(60), Duration::from_millis(10000));
    }

    #[tokio::test(start_paused = true)]
    async fn first_try_success_never_sleeps() {
        let start = Instant::now();
        let mut observed = 0;
        let result: Result<u8, TestError> = retry_with_backoff(
            || async { Ok(7) },
            &RetryPolicy::default(),
            |_: &TestError, _, _| observed += 1,
        )
        .await;

        assert_eq!(result, Ok(7));
        assert_eq!(observed, 0);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failure_then_success() {
        let calls = &AtomicU32::new(0);
        let mut observed = Vec::new();
        let start = Instant::now();

        let result = retry_with_backoff(
            move || async move {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(TestError::Reset(1))
                } else {
                    Ok("done")
                }
            },
            &RetryPolicy::default(),
            |_: &TestError, attempt, delay| observed.push((attempt, delay)),
        )
        .await;

        assert_eq!(result, Ok("done"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(observed, vec![(1, Duration::from_millis(2000))]);
        assert!(start.elapsed() >= Duration::from_millis(2000));
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_attempts_return_last_error() {
        let calls = &AtomicU32::new(0);
        let mut delays = Vec::new();

        let result: Result<(), TestError> = retry_with_backoff(
            move || async move {
                let attempt = calls.fetch_add(1, Ordering::SeqCst) + 1;
                Err(TestError::Reset(attempt))
            },
            &RetryPolicy::default(),
            |_: &TestError, _, delay| delays.push(delay),
        )
        .await;

        assert_eq!(result, Err(TestError::Reset(3)));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(
            delays,
            vec![Duration::from_millis(2000), Duration::from_millis(4000)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn fatal_errors_are_not_retried() {
        let calls = &AtomicU32::new(0);
        let start = Instant::now();

        let result: Result<(), TestError> = retry_with_backoff(
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(TestError::Fatal)
            },
            &RetryPolicy::default(),
            |_: &TestError, _, _| panic!("observer must not fire for fatal errors"),
        )
        .await;

        assert_eq!(result, Err(TestError::Fatal));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
