//! Shared request budget for upstream calls.

use std::num::NonZeroU32;
use std::sync::Arc;

use governor::clock::DefaultClock;
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Requests-per-second budget. Clones draw from the same budget.
#[derive(Clone)]
pub struct RequestThrottle {
    limiter: Arc<DirectRateLimiter>,
}

impl RequestThrottle {
    /// A budget of `requests_per_second`; zero is treated as one.
    pub fn new(requests_per_second: u32) -> Self {
        let per_second = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
        Self {
            limiter: Arc::new(RateLimiter::direct(Quota::per_second(per_second))),
        }
    }

    /// Wait until one request fits in the budget, then take it.
    pub async fn until_ready(&self) {
        self.limiter.until_ready().await;
    }

    /// Take one request from the budget if it is available right now.
    pub fn try_acquire(&self) -> bool {
        self.limiter.check().is_ok()
    }
}

impl std::fmt::Debug for RequestThrottle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestThrottle").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_one_budget() {
        let throttle = RequestThrottle::new(1);
        let shared = throttle.clone();

        assert!(throttle.try_acquire());
        assert!(!shared.try_acquire());
    }

    #[test]
    fn zero_rate_still_admits_one_request() {
        let throttle = RequestThrottle::new(0);
        assert!(throttle.try_acquire());
    }
}
