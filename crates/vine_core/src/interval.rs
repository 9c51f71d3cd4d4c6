use std::time::Duration;

use rand::Rng;

/// Floor for every sleep the scheduler takes, so the loop never spins.
pub const MIN_DELAY: Duration = Duration::from_secs(1);

/// How the pause between poll cycles is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntervalMode {
    /// Uniform draw from `[min, max]` after every cycle.
    Jittered { min: Duration, max: Duration },
    /// `fast` until `quiet_threshold` consecutive quiet cycles, then `slow`
    /// until content changes again.
    Adaptive {
        fast: Duration,
        slow: Duration,
        quiet_threshold: u32,
    },
}

impl IntervalMode {
    pub fn adaptive() -> Self {
        IntervalMode::Adaptive {
            fast: Duration::from_secs(5),
            slow: Duration::from_secs(12),
            quiet_threshold: 60,
        }
    }

    fn normalized(self) -> Self {
        match self {
            IntervalMode::Jittered { min, max } => {
                let min = min.max(MIN_DELAY);
                IntervalMode::Jittered {
                    min,
                    max: max.max(min),
                }
            }
            IntervalMode::Adaptive {
                fast,
                slow,
                quiet_threshold,
            } => IntervalMode::Adaptive {
                fast: fast.max(MIN_DELAY),
                slow: slow.max(MIN_DELAY),
                quiet_threshold: quiet_threshold.max(1),
            },
        }
    }
}

impl Default for IntervalMode {
    fn default() -> Self {
        IntervalMode::Jittered {
            min: Duration::from_secs(240),
            max: Duration::from_secs(400),
        }
    }
}

/// What a finished cycle observed, as far as interval adaptation cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleActivity {
    /// At least one queue returned content different from last time.
    Changed,
    /// Every queue that could be fetched returned identical content.
    Quiet,
    /// Nothing could be fetched; the quiet counter is left alone.
    Inconclusive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalPolicy {
    mode: IntervalMode,
    quiet_cycles: u32,
    current: Duration,
}

impl IntervalPolicy {
    pub fn new(mode: IntervalMode) -> Self {
        Self::restore(mode, 0)
    }

    /// Rebuilds the policy from persisted bookkeeping.
    pub fn restore(mode: IntervalMode, quiet_cycles: u32) -> Self {
        let mode = mode.normalized();
        let mut policy = Self {
            mode,
            quiet_cycles,
            current: MIN_DELAY,
        };
        policy.current = match mode {
            IntervalMode::Jittered { min, .. } => min,
            IntervalMode::Adaptive { .. } => policy.adaptive_interval(),
        };
        policy
    }

    pub fn quiet_cycles(&self) -> u32 {
        self.quiet_cycles
    }

    /// Interval most recently chosen.
    pub fn current(&self) -> Duration {
        self.current
    }

    pub fn record(&mut self, activity: CycleActivity) {
        match activity {
            CycleActivity::Changed => self.quiet_cycles = 0,
            CycleActivity::Quiet => self.quiet_cycles = self.quiet_cycles.saturating_add(1),
            CycleActivity::Inconclusive => {}
        }
        if let IntervalMode::Adaptive { .. } = self.mode {
            self.current = self.adaptive_interval();
        }
    }

    /// Delay before the next cycle. Always at least [`MIN_DELAY`].
    pub fn next_delay<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Duration {
        if let IntervalMode::Jittered { min, max } = self.mode {
            self.current = draw_between(rng, min, max);
        }
        self.current.max(MIN_DELAY)
    }

    fn adaptive_interval(&self) -> Duration {
        match self.mode {
            IntervalMode::Adaptive {
                fast,
                slow,
                quiet_threshold,
            } => {
                if self.quiet_cycles >= quiet_threshold {
                    slow
                } else {
                    fast
                }
            }
            IntervalMode::Jittered { min, .. } => min,
        }
    }
}

/// Uniform draw in `[min, max]` at millisecond resolution. A `max` below
/// `min` collapses the range to `min`.
pub fn draw_between<R: Rng + ?Sized>(rng: &mut R, min: Duration, max: Duration) -> Duration {
    let low = min.as_millis() as u64;
    let high = (max.as_millis() as u64).max(low);
    Duration::from_millis(rng.gen_range(low..=high))
}
