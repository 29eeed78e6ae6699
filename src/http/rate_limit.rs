//! Client-side request pacing
//!
//! A token bucket from `governor` keeps page requests under the remote
//! service's quota.

use governor::clock::DefaultClock;
use governor::middleware::NoOpMiddleware;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as Governor};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Configuration for rate limiting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimiterConfig {
    /// Sustained requests per second
    pub requests_per_second: NonZeroU32,
    /// Requests allowed back to back before pacing starts
    pub burst_size: NonZeroU32,
}

impl RateLimiterConfig {
    pub fn new(requests_per_second: NonZeroU32, burst_size: NonZeroU32) -> Self {
        Self {
            requests_per_second,
            burst_size,
        }
    }

    /// Build from a configured rate, rounding up to at least one request
    /// per second with no burst
    pub fn per_second(rate: f64) -> Self {
        let rps = if rate.is_finite() && rate > 1.0 {
            rate.ceil().min(f64::from(u32::MAX)) as u32
        } else {
            1
        };
        let rps = NonZeroU32::new(rps).unwrap_or(NonZeroU32::MIN);
        Self::new(rps, NonZeroU32::MIN)
    }
}

/// Token bucket rate limiter
#[derive(Clone)]
pub struct RateLimiter {
    limiter: Arc<Governor<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>>,
}

impl RateLimiter {
    pub fn new(config: &RateLimiterConfig) -> Self {
        let quota = Quota::per_second(config.requests_per_second).allow_burst(config.burst_size);
        Self {
            limiter: Arc::new(Governor::direct(quota)),
        }
    }

    /// Wait until the next request may be sent
    pub async fn wait(&self) {
        self.limiter.until_ready().await;
    }

    /// Take a permit if one is available right now
    pub fn try_acquire(&self) -> bool {
        self.limiter.check().is_ok()
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter").finish()
    }
}
