use std::time::Duration;

use super::instant::Instant;

/// A Timer with a given duration after which it will enter into a "Ringing"
/// state. The Timer can be reset at an given time, or manually set to start
/// "Ringing" again.
#[derive(Clone, Debug)]
pub struct Timer {
    duration: Duration,
    last: Instant,
    forced: bool,
}

impl Timer {
    /// Creates a new Timer with a given duration, started at `now`
    pub fn new(duration: Duration, now: &Instant) -> Self {
        Self {
            duration,
            last: *now,
            forced: false,
        }
    }

    /// Creates a new Timer which rings on its first check
    pub fn new_ringing(duration: Duration, now: &Instant) -> Self {
        let mut timer = Self::new(duration, now);
        timer.ring_manual();
        timer
    }

    /// Reset the Timer to stop ringing and wait the specified duration
    pub fn reset(&mut self, now: &Instant) {
        self.last = *now;
        self.forced = false;
    }

    /// Gets whether or not the Timer is "Ringing" (i.e. the given duration has
    /// passed since the last reset)
    pub fn ringing(&self, now: &Instant) -> bool {
        self.forced || self.last.elapsed(now) >= self.duration
    }

    /// Manually causes the Timer to enter into a "Ringing" state
    pub fn ring_manual(&mut self) {
        self.forced = true;
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }
}
