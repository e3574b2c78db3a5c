//! Bounded-retry combinator.
//!
//! The delay arithmetic is kept in a pure helper so it can be unit tested
//! without a runtime; the async shell supplies the clock.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

/// Clamp a retry interval to the time remaining in the budget.
///
/// The poll loop must never sleep longer than what remains of the caller's
/// total budget, otherwise the last attempt would overshoot the deadline.
#[inline]
pub fn clamped_delay(interval: Duration, remaining: Duration) -> Duration {
    interval.min(remaining)
}

/// Repeatedly evaluate `pred` until it returns true or `total` elapses,
/// sleeping `interval` (clamped to the remaining budget) between attempts.
///
/// `pred` is always evaluated at least once, immediately. Returns whether
/// it became true within the budget.
pub async fn retry_until<F, Fut>(total: Duration, interval: Duration, mut pred: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = Instant::now() + total;
    loop {
        if pred().await {
            return true;
        }
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return false;
        }
        tokio::time::sleep(clamped_delay(interval, remaining)).await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicU32;
    use std::sync::atomic::Ordering;

    use super::*;

    #[test]
    fn clamped_delay_never_exceeds_remaining() {
        assert_eq!(
            clamped_delay(Duration::from_millis(500), Duration::from_millis(120)),
            Duration::from_millis(120)
        );
        assert_eq!(
            clamped_delay(Duration::from_millis(50), Duration::from_millis(120)),
            Duration::from_millis(50)
        );
    }

    #[tokio::test]
    async fn succeeds_immediately_without_sleeping() {
        let ok = retry_until(Duration::ZERO, Duration::from_secs(10), || async { true }).await;
        assert!(ok);
    }

    #[tokio::test]
    async fn retries_until_predicate_flips() {
        let calls = AtomicU32::new(0);
        let ok = retry_until(Duration::from_secs(5), Duration::from_millis(1), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move { n >= 3 }
        })
        .await;
        assert!(ok);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn gives_up_when_budget_expires() {
        let ok = retry_until(Duration::from_millis(20), Duration::from_millis(5), || async { false }).await;
        assert!(!ok);
    }

    #[tokio::test]
    async fn zero_budget_still_evaluates_once() {
        let calls = AtomicU32::new(0);
        let ok = retry_until(Duration::ZERO, Duration::from_millis(5), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { false }
        })
        .await;
        assert!(!ok);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
