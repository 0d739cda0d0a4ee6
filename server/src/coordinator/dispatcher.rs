use std::time::Duration;

use log::info;

use minibot_shared::{ControlFrame, Frame, Instant, Timer};

use crate::{
    controller::{ControllerSample, ControllerSource},
    coordinator::outbox::send_frame,
    events::CoordinatorEvents,
    registry::{DispatchTarget, SharedRegistry},
    transport::PacketSender,
};

/// Runs once per tick: turns controller samples into control frames for
/// paired teleop units, and keeps every unit's mode fresh
pub struct Dispatcher {
    registry: SharedRegistry,
    sender: Box<dyn PacketSender>,
    status_timer: Timer,
    max_sample_age: Duration,
}

impl Dispatcher {
    pub fn new(
        registry: SharedRegistry,
        sender: Box<dyn PacketSender>,
        status_interval: Duration,
        max_sample_age: Duration,
        now: &Instant,
    ) -> Self {
        Self {
            registry,
            sender,
            status_timer: Timer::new_ringing(status_interval, now),
            max_sample_age,
        }
    }

    /// Performs one dispatch tick. Returns the number of control frames sent.
    pub fn dispatch<S: ControllerSource + ?Sized>(
        &mut self,
        source: &mut S,
        now: &Instant,
        events: &mut CoordinatorEvents,
    ) -> usize {
        // snapshot under the lock, send without it
        let (mut targets, emergency_stop) = {
            let registry = self.registry.lock();
            (registry.dispatch_targets(), registry.emergency_stop_active())
        };

        // shuffle order of units in order to avoid priority among them
        fastrand::shuffle(&mut targets);

        let keepalive = self.status_timer.ringing(now);
        if keepalive {
            self.status_timer.reset(now);
        }

        let mut sent = 0;
        for target in targets {
            if keepalive {
                self.send_keepalive(&target, emergency_stop, events);
            }
            if self.send_control(&target, source, emergency_stop, now, events) {
                sent += 1;
            }
        }
        sent
    }

    fn send_keepalive(
        &self,
        target: &DispatchTarget,
        emergency_stop: bool,
        events: &mut CoordinatorEvents,
    ) {
        let status = Frame::Status {
            unit_id: target.unit_id.clone(),
            mode: target.mode,
        };
        if let Err(error) = send_frame(self.sender.as_ref(), &target.command_address, &status) {
            events.push_error(error);
        }
        if emergency_stop {
            if let Err(error) =
                send_frame(self.sender.as_ref(), &target.command_address, &Frame::EmergencyStop)
            {
                events.push_error(error);
            }
        }
    }

    fn send_control<S: ControllerSource + ?Sized>(
        &self,
        target: &DispatchTarget,
        source: &mut S,
        emergency_stop: bool,
        now: &Instant,
        events: &mut CoordinatorEvents,
    ) -> bool {
        let Some(controller) = target.controller else {
            return false;
        };

        let Some(sample) = source.sample(&controller, now) else {
            // the unit may have been re-paired since the snapshot
            if self
                .registry
                .lock()
                .unpair_exact(&target.unit_id, &controller)
            {
                info!("{} is gone, unpairing unit '{}'", controller, target.unit_id);
                events.push_unpairing(&target.unit_id, controller);
            }
            return false;
        };

        if emergency_stop || !target.mode.is_teleop() {
            return false;
        }

        let sample = if sample.sampled_at.elapsed(now) > self.max_sample_age {
            ControllerSample::neutral(*now)
        } else {
            sample
        };

        let control = Frame::Control(ControlFrame::from_normalized(
            target.unit_id.clone(),
            sample.axes(),
            sample.buttons,
        ));
        match send_frame(self.sender.as_ref(), &target.command_address, &control) {
            Ok(()) => true,
            Err(error) => {
                events.push_error(error);
                false
            }
        }
    }
}
