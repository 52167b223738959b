use governor::clock::{Clock, DefaultClock};
use governor::middleware::{NoOpMiddleware, StateInformationMiddleware};
use governor::state::keyed::DefaultKeyedStateStore;
use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;
use std::time::Duration;

// 超過這個數量時清掉已回滿的 key
const PRUNE_THRESHOLD: usize = 10_000;

type KeyedLimiter<C> =
    RateLimiter<String, DefaultKeyedStateStore<String>, C, StateInformationMiddleware>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub remaining: u32,
    /// Wait before the next request from this client would be accepted.
    pub retry_after: Duration,
}

/// Per-client GCRA limiter: bursts up to `limit` requests, refilling over one minute.
pub struct ClientRateLimiter<C: Clock = DefaultClock> {
    limiter: KeyedLimiter<C>,
    clock: C,
}

impl ClientRateLimiter {
    pub fn per_minute(limit: u32) -> Self {
        Self::with_clock(limit, DefaultClock::default())
    }
}

impl<C: Clock + Clone> ClientRateLimiter<C> {
    pub fn with_clock(limit: u32, clock: C) -> Self {
        let quota = Quota::per_minute(NonZeroU32::new(limit).unwrap_or(NonZeroU32::MIN));
        let limiter = RateLimiter::<_, _, C, NoOpMiddleware<C::Instant>>::new(quota, DefaultKeyedStateStore::default(), clock.clone())
            .with_middleware::<StateInformationMiddleware>();
        Self { limiter, clock }
    }

    pub fn check(&self, key: &str) -> RateLimitDecision {
        if self.limiter.len() > PRUNE_THRESHOLD {
            self.limiter.retain_recent();
        }

        match self.limiter.check_key(&key.to_string()) {
            Ok(snapshot) => RateLimitDecision {
                allowed: true,
                remaining: snapshot.remaining_burst_capacity(),
                retry_after: Duration::ZERO,
            },
            Err(not_until) => RateLimitDecision {
                allowed: false,
                remaining: 0,
                retry_after: not_until.wait_time_from(self.clock.now()),
            },
        }
    }

    pub fn tracked_clients(&self) -> usize {
        self.limiter.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use governor::clock::FakeRelativeClock;

    #[test]
    fn test_blocks_after_limit_until_refilled() {
        let clock = FakeRelativeClock::default();
        let limiter = ClientRateLimiter::with_clock(2, clock.clone());

        let first = limiter.check("10.0.0.1");
        let second = limiter.check("10.0.0.1");
        assert!(first.allowed && second.allowed);
        assert!(first.remaining > second.remaining);

        clock.advance(Duration::from_secs(5));
        let blocked = limiter.check("10.0.0.1");
        assert!(!blocked.allowed);
        assert_eq!(blocked.remaining, 0);
        assert!(blocked.retry_after > Duration::ZERO);
        assert!(blocked.retry_after <= Duration::from_secs(60));

        clock.advance(Duration::from_secs(60));
        assert!(limiter.check("10.0.0.1").allowed);
    }

    #[test]
    fn test_clients_are_counted_separately() {
        let limiter = ClientRateLimiter::with_clock(1, FakeRelativeClock::default());

        assert!(limiter.check("a").allowed);
        assert!(!limiter.check("a").allowed);
        assert!(limiter.check("b").allowed);
        assert_eq!(limiter.tracked_clients(), 2);
    }
}
