use std::time::Duration;

use log::info;

use minibot_shared::{Instant, Timer};

use crate::{events::CoordinatorEvents, registry::SharedRegistry};

/// Periodically forgets units that have gone silent
pub struct Reaper {
    registry: SharedRegistry,
    timer: Timer,
    eviction_timeout: Duration,
}

impl Reaper {
    pub fn new(
        registry: SharedRegistry,
        reap_interval: Duration,
        eviction_timeout: Duration,
        now: &Instant,
    ) -> Self {
        Self {
            registry,
            timer: Timer::new(reap_interval, now),
            eviction_timeout,
        }
    }

    /// Evicts stale units if the reap interval has elapsed. Returns how many
    /// were removed.
    pub fn maintain(&mut self, now: &Instant, events: &mut CoordinatorEvents) -> usize {
        if !self.timer.ringing(now) {
            return 0;
        }
        self.timer.reset(now);

        let evicted = self.registry.lock().evict_stale(now, self.eviction_timeout);
        for unit in &evicted {
            let record = &unit.record;
            match unit.controller {
                Some(controller) => info!(
                    "evicting silent unit '{}' from channel {}, unpaired from {}",
                    record.id(),
                    record.assigned_channel(),
                    controller
                ),
                None => info!(
                    "evicting silent unit '{}' from channel {}",
                    record.id(),
                    record.assigned_channel()
                ),
            }
            events.push_eviction(record.id(), unit.controller);
        }
        evicted.len()
    }
}
