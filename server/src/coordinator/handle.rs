use std::{
    mem,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, PoisonError,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use log::{info, warn};

use minibot_shared::Instant;

use crate::{
    controller::ControllerSource,
    coordinator::{
        discovery_listener::DiscoveryListener, dispatcher::Dispatcher, operator::Operator,
        reaper::Reaper, CoordinatorConfig,
    },
    events::CoordinatorEvents,
    CoordinatorError,
};

/// Events waiting for `poll_events`, bounded per kind
struct PendingEvents {
    events: CoordinatorEvents,
    max_per_kind: usize,
    overflowing: bool,
}

type SharedEvents = Arc<Mutex<PendingEvents>>;

const IDLE_BACKOFF: Duration = Duration::from_millis(1);

/// A Coordinator running on its own threads. Dropping the handle stops it.
pub struct CoordinatorHandle {
    running: Arc<AtomicBool>,
    events: SharedEvents,
    operator: Operator,
    threads: Vec<JoinHandle<()>>,
}

impl CoordinatorHandle {
    pub(crate) fn spawn<S: ControllerSource + Send + 'static>(
        config: CoordinatorConfig,
        mut listener: DiscoveryListener,
        mut reaper: Reaper,
        mut dispatcher: Dispatcher,
        operator: Operator,
        mut source: S,
    ) -> Result<Self, CoordinatorError> {
        let mut handle = Self {
            running: Arc::new(AtomicBool::new(true)),
            events: Arc::new(Mutex::new(PendingEvents {
                events: CoordinatorEvents::new(),
                max_per_kind: config.max_pending_events,
                overflowing: false,
            })),
            operator,
            threads: Vec::new(),
        };

        let running = handle.running.clone();
        let events = handle.events.clone();
        let operator = handle.operator.clone();
        let receive_thread = thread::Builder::new()
            .name("minibot-receive".to_string())
            .spawn(move || {
                while running.load(Ordering::Relaxed) {
                    let now = Instant::now();
                    let mut pass = CoordinatorEvents::new();
                    let handled = listener.receive(&now, &mut pass);
                    reaper.maintain(&now, &mut pass);
                    operator.take_failures(&mut pass);
                    publish(&events, &mut pass);
                    if handled == 0 {
                        // non-blocking receivers would spin otherwise
                        thread::sleep(IDLE_BACKOFF);
                    }
                }
            })
            .map_err(|error| CoordinatorError::Spawn {
                thread: "receive",
                reason: error.to_string(),
            })?;
        handle.threads.push(receive_thread);

        let running = handle.running.clone();
        let events = handle.events.clone();
        let tick_interval = config.tick_interval;
        let dispatch_thread = thread::Builder::new()
            .name("minibot-dispatch".to_string())
            .spawn(move || {
                while running.load(Ordering::Relaxed) {
                    let now = Instant::now();
                    let mut pass = CoordinatorEvents::new();
                    dispatcher.dispatch(&mut source, &now, &mut pass);
                    publish(&events, &mut pass);

                    let busy = now.elapsed(&Instant::now());
                    thread::sleep(tick_interval.saturating_sub(busy));
                }
            })
            .map_err(|error| CoordinatorError::Spawn {
                thread: "dispatch",
                reason: error.to_string(),
            });
        // `handle` drops on error, stopping the receive thread
        handle.threads.push(dispatch_thread?);

        info!("coordinator running");
        Ok(handle)
    }

    /// Takes every event gathered by both loops since the last call. At most
    /// `max_pending_events` of each kind are kept in between, newest first.
    pub fn poll_events(&self) -> CoordinatorEvents {
        let mut pending = self.events.lock().unwrap_or_else(PoisonError::into_inner);
        pending.overflowing = false;
        mem::take(&mut pending.events)
    }

    pub fn operator(&self) -> Operator {
        self.operator.clone()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Sends the emergency stop to every unit, then stops and joins both loops
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if self.threads.is_empty() {
            return;
        }
        info!("coordinator shutting down");
        self.operator.emergency_stop(true);
        self.running.store(false, Ordering::Relaxed);
        for thread in self.threads.drain(..) {
            if thread.join().is_err() {
                warn!("coordinator thread panicked");
            }
        }
    }
}

impl Drop for CoordinatorHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

fn publish(events: &SharedEvents, pass: &mut CoordinatorEvents) {
    if pass.is_empty() {
        return;
    }
    let mut pending = events.lock().unwrap_or_else(PoisonError::into_inner);
    pending.events.append(pass);
    let max_per_kind = pending.max_per_kind;
    let dropped = pending.events.retain_newest(max_per_kind);
    if dropped > 0 && !pending.overflowing {
        // once per stretch without a poll
        warn!(
            "events are not being polled, dropping the oldest beyond {} of each kind",
            max_per_kind
        );
        pending.overflowing = true;
    }
}
