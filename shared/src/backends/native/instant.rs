use std::time::Duration;

/// Represents a specific moment in time
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Instant {
    inner: std::time::Instant,
}

impl Instant {
    /// Creates an Instant from the moment the method is called
    pub fn now() -> Self {
        Self {
            inner: std::time::Instant::now(),
        }
    }

    /// Returns time elapsed between this Instant and `now`, or zero if `now`
    /// is earlier
    pub fn elapsed(&self, now: &Self) -> Duration {
        now.inner.saturating_duration_since(self.inner)
    }

    /// Returns time remaining from `now` until this Instant, or zero if this
    /// Instant has already passed
    pub fn until(&self, now: &Self) -> Duration {
        self.inner.saturating_duration_since(now.inner)
    }

    /// Returns whether this Instant is strictly later than `other`
    pub fn is_after(&self, other: &Self) -> bool {
        self.inner > other.inner
    }

    /// Moves this Instant forward by the given number of milliseconds
    pub fn add_millis(&mut self, millis: u32) {
        self.inner += Duration::from_millis(u64::from(millis));
    }

    /// Moves this Instant forward by the given Duration
    pub fn add_duration(&mut self, duration: Duration) {
        self.inner += duration;
    }

    /// Returns a copy of this Instant moved forward by `millis`
    pub fn after_millis(&self, millis: u32) -> Self {
        let mut output = *self;
        output.add_millis(millis);
        output
    }

    pub fn inner(&self) -> std::time::Instant {
        self.inner
    }
}
