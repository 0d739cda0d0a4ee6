use std::{
    collections::VecDeque,
    sync::atomic::{AtomicBool, Ordering},
    thread,
};

use log::{info, trace, warn};

use minibot_shared::{DropReason, DropStats, Frame, Instant, Timer};

use crate::{
    actuator::ActuatorSink,
    session::{SessionAction, SessionPhase, SessionState},
    transport::UnitSocket,
    unit_events::UnitEvents,
    UnitConfig, UnitError,
};

// Upper bound on datagrams handled per update
const MAX_DATAGRAMS_PER_UPDATE: usize = 64;

/// Drives one remote unit: executes the SessionState's decisions against a
/// socket and an ActuatorSink, and keeps announcements & heartbeats going
pub struct RemoteUnit<S: UnitSocket, A: ActuatorSink> {
    config: UnitConfig,
    reported_address: String,
    session: SessionState,
    socket: S,
    sink: A,
    announce_timer: Timer,
    heartbeat_timer: Timer,
    listening_for_assignment: bool,
    rebind_pending: bool,
    drop_stats: DropStats,
}

impl<S: UnitSocket, A: ActuatorSink> RemoteUnit<S, A> {
    pub fn new(config: UnitConfig, socket: S, sink: A) -> Self {
        let now = Instant::now();
        Self {
            reported_address: config.resolve_reported_address(),
            session: SessionState::new(config.unit_id.clone(), config.command_timeout),
            socket,
            sink,
            announce_timer: Timer::new_ringing(config.announce_interval, &now),
            heartbeat_timer: Timer::new_ringing(config.heartbeat_interval, &now),
            listening_for_assignment: false,
            rebind_pending: false,
            drop_stats: DropStats::new(),
            config,
        }
    }

    /// Binds the listen port and starts advertising. A bind failure here is
    /// fatal and leaves the unit in `Init`.
    pub fn start(&mut self, now: &Instant) -> Result<UnitEvents, UnitError> {
        if self.session.phase() != SessionPhase::Init {
            return Err(UnitError::AlreadyStarted);
        }
        self.socket.listen(self.config.listen_port)?;
        self.listening_for_assignment = true;
        info!(
            "unit '{}' advertising to port {} from port {:?} as {}",
            self.config.unit_id,
            self.config.discovery_port,
            self.socket.local_port(),
            self.reported_address
        );

        let mut events = UnitEvents::new();
        let actions = self.session.start();
        self.apply(actions, &mut events);
        self.update_into(now, &mut events);
        Ok(events)
    }

    /// One poll: timeout check, announcements or heartbeats as due, then every
    /// waiting datagram
    pub fn update(&mut self, now: &Instant) -> UnitEvents {
        let mut events = UnitEvents::new();
        if self.session.phase() != SessionPhase::Init {
            self.update_into(now, &mut events);
        }
        events
    }

    /// Runs until `running` is cleared, then stops the outputs
    pub fn run(&mut self, running: &AtomicBool) -> Result<(), UnitError> {
        if self.session.phase() == SessionPhase::Init {
            self.start(&Instant::now())?;
        }
        while running.load(Ordering::Relaxed) {
            self.update(&Instant::now());
            thread::sleep(self.config.poll_interval);
        }
        self.sink.stop();
        info!("unit '{}' stopped", self.config.unit_id);
        Ok(())
    }

    // Accessors

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn config(&self) -> &UnitConfig {
        &self.config
    }

    pub fn reported_address(&self) -> &str {
        &self.reported_address
    }

    pub fn sink(&self) -> &A {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut A {
        &mut self.sink
    }

    pub fn socket(&self) -> &S {
        &self.socket
    }

    pub fn drop_stats(&self) -> DropStats {
        self.drop_stats
    }

    // Internal

    fn update_into(&mut self, now: &Instant, events: &mut UnitEvents) {
        if self.rebind_pending {
            self.listen_discovery(events);
        }

        let actions = self.session.check_timeout(now);
        self.apply(actions, events);

        match self.session.phase() {
            SessionPhase::Advertising => {
                if !self.rebind_pending && self.announce_timer.ringing(now) {
                    self.announce_timer.reset(now);
                    self.announce(events);
                }
            }
            SessionPhase::Assigned => {
                if self.heartbeat_timer.ringing(now) {
                    self.heartbeat_timer.reset(now);
                    self.heartbeat(events);
                }
            }
            SessionPhase::Init => {}
        }

        self.receive_all(now, events);
    }

    fn receive_all(&mut self, now: &Instant, events: &mut UnitEvents) {
        for _ in 0..MAX_DATAGRAMS_PER_UPDATE {
            let (source, decoded) = match self.socket.receive() {
                Ok(Some((source, payload))) => (source, Frame::decode(payload)),
                Ok(None) => break,
                Err(_) => {
                    warn!("unit '{}' socket failed to receive", self.config.unit_id);
                    events.push_error(UnitError::RecvFailed);
                    break;
                }
            };

            let frame = match decoded {
                Ok(frame) => frame,
                Err(error) => {
                    trace!("dropping datagram from {}: {}", source, error);
                    self.drop_stats.record(DropReason::Malformed);
                    continue;
                }
            };

            let name = frame.name();
            match self.session.handle_frame(frame, source, now) {
                Ok(actions) => self.apply(actions, events),
                Err(reason) => {
                    trace!("dropping {} frame from {}: {:?}", name, source, reason);
                    self.drop_stats.record(reason);
                }
            }
        }
    }

    fn apply(&mut self, actions: Vec<SessionAction>, events: &mut UnitEvents) {
        let mut queue: VecDeque<SessionAction> = actions.into();
        while let Some(action) = queue.pop_front() {
            match action {
                SessionAction::StopOutputs => self.sink.stop(),
                SessionAction::ListenDiscovery => {
                    self.announce_timer.ring_manual();
                    self.listen_discovery(events);
                }
                SessionAction::ListenChannel(channel) => {
                    self.listening_for_assignment = false;
                    if let Err(error) = self.socket.listen(channel) {
                        warn!("{}, advertising again", error);
                        events.push_error(error);
                        // the rest of the assignment no longer applies
                        queue.clear();
                        queue.extend(self.session.enter_advertising());
                    }
                }
                SessionAction::Drive(command) => self.sink.apply(&command),
                SessionAction::Assigned {
                    channel,
                    coordinator,
                } => {
                    self.heartbeat_timer.ring_manual();
                    events.push_assignment(channel, coordinator);
                }
                SessionAction::LostCoordinator => events.push_timeout(),
                SessionAction::ModeChanged(mode) => events.push_mode_change(mode),
                SessionAction::EmergencyStop(active) => events.push_emergency_stop(active),
            }
        }
    }

    fn listen_discovery(&mut self, events: &mut UnitEvents) {
        if self.listening_for_assignment {
            self.rebind_pending = false;
            return;
        }
        match self.socket.listen(self.config.listen_port) {
            Ok(()) => {
                self.listening_for_assignment = true;
                self.rebind_pending = false;
            }
            Err(error) => {
                // retried on every update until it succeeds
                warn!("{}", error);
                events.push_error(error);
                self.rebind_pending = true;
            }
        }
    }

    fn announce(&mut self, events: &mut UnitEvents) {
        let frame = Frame::Discover {
            unit_id: self.config.unit_id.clone(),
            reported_address: self.reported_address.clone(),
        };
        trace!("unit '{}' announcing", self.config.unit_id);
        if self
            .socket
            .broadcast(self.config.discovery_port, &frame.encode())
            .is_err()
        {
            warn!("unit '{}' failed to announce", self.config.unit_id);
            events.push_error(UnitError::SendFailed { frame: frame.name() });
        }
    }

    fn heartbeat(&mut self, events: &mut UnitEvents) {
        let Some(coordinator) = self.session.coordinator_address() else {
            return;
        };
        let frame = Frame::Alive {
            unit_id: self.config.unit_id.clone(),
        };
        if self.socket.send(&coordinator, &frame.encode()).is_err() {
            warn!(
                "unit '{}' failed to send heartbeat to {}",
                self.config.unit_id, coordinator
            );
            events.push_error(UnitError::SendFailed { frame: frame.name() });
        }
    }
}
