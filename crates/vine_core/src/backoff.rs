use std::time::Duration;

use rand::Rng;

use crate::interval::{draw_between, MIN_DELAY};

/// Retry schedule for re-establishing an expired session.
///
/// Retries never give up; each attempt waits a uniformly drawn delay in
/// `[min, max]`. The scheduler owns one of these and resets it once a
/// session is re-established.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReauthBackoff {
    min: Duration,
    max: Duration,
    attempts: u32,
}

impl ReauthBackoff {
    pub fn new(min: Duration, max: Duration) -> Self {
        let min = min.max(MIN_DELAY);
        let max = max.max(min);
        Self {
            min,
            max,
            attempts: 0,
        }
    }

    /// Failed attempts recorded since the last reset.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn is_backing_off(&self) -> bool {
        self.attempts > 0
    }

    /// Records a failed attempt and returns how long to wait before the next one.
    pub fn next_delay<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Duration {
        self.attempts = self.attempts.saturating_add(1);
        self.delay(rng)
    }

    /// A delay drawn from the same bounds, without recording an attempt.
    pub fn delay<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        draw_between(rng, self.min, self.max)
    }

    pub fn reset(&mut self) {
        self.attempts = 0;
    }
}

impl Default for ReauthBackoff {
    fn default() -> Self {
        Self::new(Duration::from_secs(120), Duration::from_secs(300))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn delays_stay_within_bounds_and_count_attempts() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut backoff = ReauthBackoff::default();
        for expected in 1..=20 {
            let delay = backoff.next_delay(&mut rng);
            assert!(delay >= Duration::from_secs(120));
            assert!(delay <= Duration::from_secs(300));
            assert_eq!(backoff.attempts(), expected);
        }
        backoff.reset();
        assert!(!backoff.is_backing_off());
    }

    #[test]
    fn plain_delay_does_not_count_as_an_attempt() {
        let mut rng = StdRng::seed_from_u64(3);
        let backoff = ReauthBackoff::default();
        let delay = backoff.delay(&mut rng);
        assert!(delay >= Duration::from_secs(120) && delay <= Duration::from_secs(300));
        assert!(!backoff.is_backing_off());
    }

    #[test]
    fn zero_bounds_are_lifted_to_minimum_delay() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut backoff = ReauthBackoff::new(Duration::ZERO, Duration::ZERO);
        assert_eq!(backoff.next_delay(&mut rng), MIN_DELAY);
    }
}
