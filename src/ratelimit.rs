//! Token-bucket rate limiting.
//!
//! One [`RateBucket`] guards one tracked key. Tokens refill on a fixed
//! cadence and are consumed one per admitted request. Refill is computed
//! lazily inside [`RateBucket::try_take`]; there are no background timers
//! or periodic tasks, so an idle bucket costs nothing.
//!
//! Buckets start half-full: a burst of traffic right after startup is
//! neither fully blocked nor fully unthrottled.

use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

const MINUTE: Duration = Duration::from_secs(60);

/// A token bucket admitting up to `burst_capacity` requests at once and
/// `reqs_per_minute` requests per minute sustained.
///
/// All state lives behind a per-instance lock, so buckets for different
/// keys never contend with each other. The type deliberately exposes no
/// way to inspect or top up its balance; [`try_take`](Self::try_take) is
/// the whole API.
pub struct RateBucket {
    capacity: u32,
    refill_interval: Duration,
    state: Mutex<BucketState>,
}

#[derive(Debug)]
struct BucketState {
    /// Current token balance, `0 <= amount <= capacity`.
    amount: u32,
    /// When the next token becomes available.
    next_refill_at: Instant,
}

impl RateBucket {
    /// Create a bucket that sustains `reqs_per_minute` with bursts up to
    /// `burst_capacity`, starting half-full.
    ///
    /// A `burst_capacity` of zero yields a bucket that denies everything,
    /// which is occasionally useful in tests.
    ///
    /// # Panics
    ///
    /// Panics if `reqs_per_minute` is zero (the refill cadence would be
    /// undefined).
    pub fn new(reqs_per_minute: u32, burst_capacity: u32) -> Self {
        Self::new_at(reqs_per_minute, burst_capacity, Instant::now())
    }

    fn new_at(reqs_per_minute: u32, burst_capacity: u32, now: Instant) -> Self {
        assert!(reqs_per_minute > 0, "reqs_per_minute must be > 0");
        let refill_interval = MINUTE / reqs_per_minute;
        Self {
            capacity: burst_capacity,
            refill_interval,
            state: Mutex::new(BucketState {
                amount: burst_capacity / 2,
                next_refill_at: now + refill_interval,
            }),
        }
    }

    /// Try to admit one unit of work right now.
    ///
    /// Returns `true` and consumes a token if one is available, `false`
    /// otherwise. A denied call leaves the refill schedule untouched;
    /// there is no extra penalty for asking.
    pub fn try_take(&self) -> bool {
        self.try_take_at(Instant::now())
    }

    fn try_take_at(&self, now: Instant) -> bool {
        // State mutation below cannot panic, so a poisoned lock still
        // holds a consistent bucket; recover it.
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        // Award every token whose refill instant has passed. Multiple may
        // accrue in one call if the bucket sat idle across intervals.
        while state.amount < self.capacity && now > state.next_refill_at {
            state.amount += 1;
            state.next_refill_at += self.refill_interval;
        }

        if state.amount == 0 {
            // Empty: rate limit exceeded.
            false
        } else if state.amount == self.capacity {
            // Saturated after a long idle stretch. Take one token and
            // restart the schedule from now, so `next_refill_at` never
            // drifts arbitrarily far into the past.
            state.amount -= 1;
            state.next_refill_at = now + self.refill_interval;
            true
        } else {
            // Somewhere in between: take one token, keep the cadence.
            state.amount -= 1;
            true
        }
    }
}

impl std::fmt::Debug for RateBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateBucket")
            .field("capacity", &self.capacity)
            .field("refill_interval", &self.refill_interval)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// rate=2/min, burst=10: half the burst is admittable immediately,
    /// the sixth call in the same instant is denied.
    #[test]
    fn starts_half_full() {
        let start = Instant::now();
        let bucket = RateBucket::new_at(2, 10, start);
        for _ in 0..5 {
            assert!(bucket.try_take_at(start));
        }
        assert!(!bucket.try_take_at(start));
    }

    #[test]
    fn zero_capacity_denies_everything() {
        let start = Instant::now();
        let bucket = RateBucket::new_at(60, 0, start);
        assert!(!bucket.try_take_at(start));
        assert!(!bucket.try_take_at(start + Duration::from_secs(600)));
    }

    /// After draining, no token is available for strictly less than one
    /// refill interval, and exactly one becomes available after it.
    #[test]
    fn refills_one_token_per_interval() {
        let start = Instant::now();
        let d = Duration::from_secs(1); // 60/min
        let bucket = RateBucket::new_at(60, 2, start);

        assert!(bucket.try_take_at(start)); // drains the half-full balance
        assert!(!bucket.try_take_at(start + d - Duration::from_millis(1)));

        let later = start + d + Duration::from_millis(1);
        assert!(bucket.try_take_at(later));
        assert!(!bucket.try_take_at(later)); // only one token accrued
    }

    /// Several elapsed intervals are awarded in a single call.
    #[test]
    fn awards_multiple_tokens_after_idle() {
        let start = Instant::now();
        let bucket = RateBucket::new_at(60, 10, start); // amount = 5

        let later = start + Duration::from_millis(3_500); // 3 intervals elapsed
        for _ in 0..8 {
            assert!(bucket.try_take_at(later));
        }
        assert!(!bucket.try_take_at(later));
    }

    /// Once idle long enough to saturate, the next take restarts the
    /// refill schedule from its own timestamp, not the stale one.
    #[test]
    fn saturated_take_resets_schedule() {
        let start = Instant::now();
        let d = Duration::from_secs(1);
        let bucket = RateBucket::new_at(60, 4, start); // amount = 2

        // Idle well past capacity * interval: bucket is full.
        let resume = start + Duration::from_secs(30);
        assert!(bucket.try_take_at(resume)); // amount 4 -> 3, schedule reset

        // Drain the rest at the same instant.
        assert!(bucket.try_take_at(resume));
        assert!(bucket.try_take_at(resume));
        assert!(!bucket.try_take_at(resume));

        // The next token arrives one interval after `resume`, not on the
        // schedule that was current when the bucket went idle.
        assert!(!bucket.try_take_at(resume + d - Duration::from_millis(1)));
        assert!(bucket.try_take_at(resume + d + Duration::from_millis(1)));
    }

    /// A denied call does not push the next refill further out.
    #[test]
    fn denied_take_is_free() {
        let start = Instant::now();
        let d = Duration::from_secs(1);
        let bucket = RateBucket::new_at(60, 2, start);

        assert!(bucket.try_take_at(start));
        for i in 0..10 {
            assert!(!bucket.try_take_at(start + Duration::from_millis(i * 50)));
        }
        // Still refills on the original cadence.
        assert!(bucket.try_take_at(start + d + Duration::from_millis(1)));
    }

    #[test]
    #[should_panic(expected = "reqs_per_minute")]
    fn zero_rate_panics() {
        let _ = RateBucket::new(0, 10);
    }
}
