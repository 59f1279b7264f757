//! Fixed-window rate limiter middleware.
//!
//! Counts requests in the current wall-clock second and rejects the excess
//! with 429. Applied to question submission only.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::extract::{Extension, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::debug;

use crate::error::ApiError;

const COUNT_BITS: u32 = 32;
const COUNT_MASK: u64 = (1 << COUNT_BITS) - 1;

/// Shared state for the rate limiter.
///
/// The active window (low 32 bits of the epoch second) and the requests seen
/// in it share one atomic word, so a window rollover and a concurrent
/// increment can never overwrite each other.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    /// Maximum requests allowed per second.
    max_per_sec: u64,
    /// `window << 32 | count`.
    packed: Arc<AtomicU64>,
}

impl RateLimiter {
    /// Create a limiter allowing `max_per_sec` requests per second.
    pub fn new(max_per_sec: u64) -> Self {
        Self {
            max_per_sec: max_per_sec.min(COUNT_MASK),
            packed: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Try to take a permit in the window for `now_secs`.
    pub fn try_acquire_at(&self, now_secs: u64) -> bool {
        let window = now_secs & COUNT_MASK;
        let mut admitted = false;
        let _ = self
            .packed
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |packed| {
                let seen = if packed >> COUNT_BITS == window {
                    packed & COUNT_MASK
                } else {
                    0
                };
                admitted = seen < self.max_per_sec;
                admitted.then(|| (window << COUNT_BITS) | (seen + 1))
            });
        admitted
    }

    pub fn try_acquire(&self) -> bool {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        self.try_acquire_at(now)
    }
}

/// Axum middleware that enforces the rate limit.
pub async fn rate_limit_middleware(
    Extension(limiter): Extension<RateLimiter>,
    req: Request,
    next: Next,
) -> Response {
    if limiter.try_acquire() {
        next.run(req).await
    } else {
        debug!(path = %req.uri().path(), "Rate limit exceeded");
        ApiError::TooManyRequests("Rate limit exceeded".to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allows_up_to_limit_per_window() {
        let limiter = RateLimiter::new(3);
        assert!(limiter.try_acquire_at(100));
        assert!(limiter.try_acquire_at(100));
        assert!(limiter.try_acquire_at(100));
        assert!(!limiter.try_acquire_at(100));
    }

    #[test]
    fn test_new_window_resets() {
        let limiter = RateLimiter::new(1);
        assert!(limiter.try_acquire_at(100));
        assert!(!limiter.try_acquire_at(100));
        assert!(limiter.try_acquire_at(101));
    }

    #[test]
    fn test_zero_limit_rejects_everything() {
        let limiter = RateLimiter::new(0);
        assert!(!limiter.try_acquire_at(5));
        assert!(!limiter.try_acquire_at(5));
    }

    #[test]
    fn test_clones_share_counter() {
        let limiter = RateLimiter::new(1);
        let clone = limiter.clone();
        assert!(limiter.try_acquire_at(7));
        assert!(!clone.try_acquire_at(7));
    }

    #[test]
    fn test_rollover_under_contention_admits_exactly_limit() {
        let limiter = RateLimiter::new(5);
        for _ in 0..5 {
            assert!(limiter.try_acquire_at(199));
        }

        let admitted: usize = std::thread::scope(|scope| {
            let workers: Vec<_> = (0..8)
                .map(|_| {
                    let limiter = limiter.clone();
                    scope.spawn(move || (0..50).filter(|_| limiter.try_acquire_at(200)).count())
                })
                .collect();
            workers.into_iter().map(|w| w.join().unwrap()).sum()
        });
        assert_eq!(admitted, 5);
        assert!(!limiter.try_acquire_at(200));
    }
}
