//! Host clock.
use std::{
    thread,
    time::{Duration, Instant},
};

use serde::Deserialize;

/// Number of nanoseconds in a second
const NANOS_IN_SECOND: u64 = 1_000_000_000;

/// Step frequency, in hertz (per second)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Hz(pub u64);

impl Default for Hz {
    /// Timers are specified to count down at 60Hz, and the
    /// interpreter counts them down once per step.
    fn default() -> Self {
        Hz(60)
    }
}

impl From<Hz> for Duration {
    fn from(freq: Hz) -> Self {
        if freq.0 == 0 {
            Duration::from_nanos(0)
        } else {
            Duration::from_nanos(NANOS_IN_SECOND / freq.0)
        }
    }
}

/// Timer to synchronize the host loop with the stepping frequency.
///
/// When the loop is paused, for example while a frame is printed, the
/// elapsed time is taken into account when determining the next cycle.
pub struct Clock {
    start: Instant,
    period: Duration,
}

impl Clock {
    pub fn new(freq: Hz) -> Self {
        Self {
            start: Instant::now(),
            period: freq.into(),
        }
    }

    /// Set the clock state back to zero.
    pub fn reset(&mut self) {
        self.start = Instant::now()
    }

    /// Block the current thread until the next clock cycle.
    ///
    /// A zero period runs unthrottled.
    pub fn wait(&mut self) {
        loop {
            if self.start.elapsed() < self.period {
                // Sleep does not have enough resolution, and spinning
                // causes high CPU usage.
                thread::yield_now();
            } else {
                // Reset back to zero, rather than trying to catch up.
                self.reset();
                return;
            }
        }
    }
}
