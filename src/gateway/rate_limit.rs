// src/gateway/rate_limit.rs
//!
//! Sliding-window admission control for outbound API calls
//!
//! The vendor throttles aggressively, so the companion refuses calls
//! client-side before they ever reach the wire: at most
//! `MAX_CALLS_PER_WINDOW` admissions within any trailing `WINDOW`.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Vendor policy: at most 5 calls in any trailing 1000 ms.
pub const MAX_CALLS_PER_WINDOW: usize = 5;
pub const WINDOW: Duration = Duration::from_millis(1000);

/// Sliding-window rate limiter over monotonic timestamps.
///
/// Pruning, the admission check and the recording of the admitted call
/// all happen under one lock guard with no await point in between, so
/// two concurrent dispatches can never both take the last slot.
pub struct RateLimiter {
    max_calls: usize,
    window: Duration,
    admitted: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(max_calls: usize, window: Duration) -> Self {
        Self {
            max_calls,
            window,
            admitted: Mutex::new(VecDeque::with_capacity(max_calls)),
        }
    }

    /// Limiter preconfigured for the constelia.ai API policy.
    pub fn for_api() -> Self {
        Self::new(MAX_CALLS_PER_WINDOW, WINDOW)
    }

    pub fn max_calls(&self) -> usize {
        self.max_calls
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Try to admit a call at `now`. Timestamps older than the window are
    /// pruned first; on admission `now` is recorded, on rejection the
    /// window is left untouched apart from the pruning.
    pub fn try_admit_at(&self, now: Instant) -> bool {
        let mut admitted = self
            .admitted
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        while let Some(oldest) = admitted.front() {
            if now.duration_since(*oldest) >= self.window {
                admitted.pop_front();
            } else {
                break;
            }
        }

        if admitted.len() < self.max_calls {
            admitted.push_back(now);
            true
        } else {
            false
        }
    }

    /// Try to admit a call right now.
    pub fn try_admit(&self) -> bool {
        self.try_admit_at(Instant::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_burst_up_to_limit_is_admitted() {
        let limiter = RateLimiter::for_api();
        let base = Instant::now();

        for _ in 0..MAX_CALLS_PER_WINDOW {
            assert!(limiter.try_admit_at(base));
        }
        assert!(!limiter.try_admit_at(base));
    }

    #[test]
    fn test_window_slides_forward() {
        let limiter = RateLimiter::for_api();
        let base = Instant::now();

        for _ in 0..MAX_CALLS_PER_WINDOW {
            assert!(limiter.try_admit_at(base));
        }

        // Still inside the window of the first burst
        assert!(!limiter.try_admit_at(base + Duration::from_millis(999)));

        // First burst has aged out
        assert!(limiter.try_admit_at(base + Duration::from_millis(1000)));
    }

    #[test]
    fn test_rejection_does_not_consume_a_slot() {
        let limiter = RateLimiter::for_api();
        let base = Instant::now();

        for _ in 0..MAX_CALLS_PER_WINDOW {
            assert!(limiter.try_admit_at(base));
        }

        // Rejected attempts spread across the window must not be recorded
        assert!(!limiter.try_admit_at(base + Duration::from_millis(100)));
        assert!(!limiter.try_admit_at(base + Duration::from_millis(500)));

        // At base + window the whole burst expires; all five slots open up
        for _ in 0..MAX_CALLS_PER_WINDOW {
            assert!(limiter.try_admit_at(base + WINDOW));
        }
        assert!(!limiter.try_admit_at(base + WINDOW));
    }

    #[test]
    fn test_trailing_window_never_exceeds_limit() {
        let limiter = RateLimiter::for_api();
        let base = Instant::now();
        let mut admitted_at: Vec<Instant> = Vec::new();

        // Hammer the limiter on an uneven schedule for three seconds
        for step in 0..120u64 {
            let now = base + Duration::from_millis(step * 25);
            if limiter.try_admit_at(now) {
                admitted_at.push(now);
            }

            let in_window = admitted_at
                .iter()
                .filter(|t| now.duration_since(**t) < WINDOW)
                .count();
            assert!(
                in_window <= MAX_CALLS_PER_WINDOW,
                "{} admissions inside one window after step {}",
                in_window,
                step
            );
        }

        assert!(!admitted_at.is_empty());
    }

    #[test]
    fn test_custom_policy() {
        let limiter = RateLimiter::new(2, Duration::from_millis(100));
        let base = Instant::now();

        assert!(limiter.try_admit_at(base));
        assert!(limiter.try_admit_at(base));
        assert!(!limiter.try_admit_at(base));
        assert!(limiter.try_admit_at(base + Duration::from_millis(100)));
    }

    #[test]
    fn test_api_policy_constants() {
        let limiter = RateLimiter::for_api();
        assert_eq!(limiter.max_calls(), 5);
        assert_eq!(limiter.window(), Duration::from_millis(1000));
    }
}
