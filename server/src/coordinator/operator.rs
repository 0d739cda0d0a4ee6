use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, PoisonError},
};

use log::{info, warn};

use minibot_shared::{Frame, SessionMode, UnitId};

use crate::{
    controller::ControllerId,
    coordinator::outbox::{broadcast_frame, send_frame},
    events::CoordinatorEvents,
    registry::{RemoteUnitRecord, SharedRegistry},
    transport::PacketSender,
    CoordinatorError,
};

/// Handle for the actions a human operator takes: pairing, mode changes, the
/// emergency stop and resets. Cheap to clone; every clone acts on the same
/// Registry.
///
/// Sends made on behalf of an action never fail the action itself. Their
/// failures are queued and come out as error events on the coordinator's next
/// receive pass.
#[derive(Clone)]
pub struct Operator {
    registry: SharedRegistry,
    sender: Box<dyn PacketSender>,
    discovery_port: u16,
    failures: Arc<Mutex<VecDeque<CoordinatorError>>>,
    max_failures: usize,
}

impl Operator {
    pub(crate) fn new(
        registry: SharedRegistry,
        sender: Box<dyn PacketSender>,
        discovery_port: u16,
        max_failures: usize,
    ) -> Self {
        Self {
            registry,
            sender,
            discovery_port,
            failures: Arc::new(Mutex::new(VecDeque::new())),
            max_failures,
        }
    }

    // Pairing

    /// Pairs a unit with a controller. Any previous pairing of either side is
    /// broken first.
    pub fn pair(&self, unit_id: &UnitId, controller: ControllerId) -> Result<(), CoordinatorError> {
        self.registry.lock().pair(unit_id, controller)?;
        info!("paired unit '{}' with {}", unit_id, controller);
        Ok(())
    }

    pub fn unpair_unit(&self, unit_id: &UnitId) -> Option<ControllerId> {
        let controller = self.registry.lock().unpair_unit(unit_id)?;
        info!("unpaired unit '{}' from {}", unit_id, controller);
        Some(controller)
    }

    /// Called when an input device disappears
    pub fn controller_disconnected(&self, controller: &ControllerId) -> Option<UnitId> {
        let unit_id = self.registry.lock().unpair_controller(controller)?;
        info!("{} disconnected, unpaired unit '{}'", controller, unit_id);
        Some(unit_id)
    }

    pub fn paired_controller(&self, unit_id: &UnitId) -> Option<ControllerId> {
        self.registry.lock().pairing().controller_for(unit_id)
    }

    // Modes

    /// Changes one unit's mode and tells it right away. A lost status frame is
    /// repaired by the next keepalive.
    pub fn set_mode(&self, unit_id: &UnitId, mode: SessionMode) -> Result<(), CoordinatorError> {
        let command_address = self.registry.lock().set_mode(unit_id, mode)?;
        info!("unit '{}' set to {}", unit_id, mode);

        let status = Frame::Status {
            unit_id: unit_id.clone(),
            mode,
        };
        // the keepalive retries
        self.report(send_frame(self.sender.as_ref(), &command_address, &status));
        Ok(())
    }

    /// Changes every unit's mode, and the mode newly discovered units start in
    pub fn set_mode_all(&self, mode: SessionMode) -> usize {
        let units = self.registry.lock().set_mode_all(mode);
        info!("all {} units set to {}", units.len(), mode);

        for (unit_id, command_address) in &units {
            let status = Frame::Status {
                unit_id: unit_id.clone(),
                mode,
            };
            self.report(send_frame(self.sender.as_ref(), command_address, &status));
        }
        units.len()
    }

    // Emergency stop

    /// Latches or releases the emergency stop. The frame goes to every unit on
    /// both its observed address and its channel, and is broadcast on the
    /// discovery port for units that are still advertising.
    pub fn emergency_stop(&self, active: bool) {
        let addresses = {
            let mut registry = self.registry.lock();
            registry.set_emergency_stop(active);
            registry.unit_addresses()
        };

        let frame = if active {
            warn!("emergency stop engaged");
            Frame::EmergencyStop
        } else {
            info!("emergency stop released");
            Frame::EmergencyStopOff
        };

        for (source_address, command_address) in addresses {
            self.report(send_frame(self.sender.as_ref(), &source_address, &frame));
            if command_address != source_address {
                self.report(send_frame(self.sender.as_ref(), &command_address, &frame));
            }
        }
        self.report(broadcast_frame(
            self.sender.as_ref(),
            self.discovery_port,
            &frame,
        ));
    }

    pub fn emergency_stop_active(&self) -> bool {
        self.registry.lock().emergency_stop_active()
    }

    // Registry

    /// Forgets every unit and pairing. Units rejoin on their next announcement.
    pub fn reset_all(&self) -> usize {
        let count = self.registry.lock().clear();
        info!("registry reset, forgot {} units", count);
        count
    }

    /// Snapshot of every known unit
    pub fn units(&self) -> Vec<RemoteUnitRecord> {
        self.registry.lock().records().cloned().collect()
    }

    pub fn unit(&self, unit_id: &UnitId) -> Option<RemoteUnitRecord> {
        self.registry.lock().get(unit_id).cloned()
    }

    // Failures

    /// Moves every queued send failure into `events`
    pub(crate) fn take_failures(&self, events: &mut CoordinatorEvents) {
        let mut failures = self.failures.lock().unwrap_or_else(PoisonError::into_inner);
        for error in failures.drain(..) {
            events.push_error(error);
        }
    }

    fn report(&self, result: Result<(), CoordinatorError>) {
        let Err(error) = result else {
            return;
        };
        let mut failures = self.failures.lock().unwrap_or_else(PoisonError::into_inner);
        if failures.len() >= self.max_failures {
            failures.pop_front();
        }
        failures.push_back(error);
    }
}
