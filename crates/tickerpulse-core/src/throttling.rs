use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Shared request budget for one upstream host.
///
/// Cloning is cheap and every clone draws from the same budget, so a single
/// throttle can sit in front of all batch workers.
#[derive(Clone)]
pub struct RequestThrottle {
    limiter: Arc<DirectRateLimiter>,
}

impl std::fmt::Debug for RequestThrottle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestThrottle").finish_non_exhaustive()
    }
}

impl RequestThrottle {
    /// Allow `limit` requests per `window`, with bursts up to `limit`.
    pub fn new(window: Duration, limit: NonZeroU32) -> Self {
        Self {
            limiter: Arc::new(RateLimiter::direct(quota_from_window(window, limit))),
        }
    }

    pub fn per_second(limit: NonZeroU32) -> Self {
        Self::new(Duration::from_secs(1), limit)
    }

    /// Wait until the budget admits one more request.
    pub async fn ready(&self) {
        self.limiter.until_ready().await;
    }

    /// Take one unit of budget without waiting.
    pub fn try_acquire(&self) -> bool {
        self.limiter.check().is_ok()
    }
}

fn quota_from_window(window: Duration, limit: NonZeroU32) -> Quota {
    let seconds_per_cell = (window.as_secs_f64() / f64::from(limit.get())).max(0.001);
    let period = Duration::from_secs_f64(seconds_per_cell);

    Quota::with_period(period)
        .unwrap_or_else(|| Quota::per_second(limit))
        .allow_burst(limit)
}
