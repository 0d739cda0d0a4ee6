use std::{net::SocketAddr, time::Duration};

use log::{info, trace, warn};

use minibot_shared::{ControlFrame, DropReason, Frame, Instant, SessionMode, UnitId};

use crate::{actuator::DriveCommand, session::SessionAction};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SessionPhase {
    Init,
    Advertising,
    Assigned,
}

/// The remote unit's view of its session with the coordinator. Frames and
/// time go in, actions come out; sockets and actuators are the caller's
/// business.
#[derive(Clone, Debug)]
pub struct SessionState {
    unit_id: UnitId,
    command_timeout: Duration,
    phase: SessionPhase,
    assigned_channel: Option<u16>,
    coordinator_address: Option<SocketAddr>,
    last_frame_received_at: Option<Instant>,
    emergency_stop_active: bool,
    mode: SessionMode,
}

impl SessionState {
    pub fn new(unit_id: UnitId, command_timeout: Duration) -> Self {
        Self {
            unit_id,
            command_timeout,
            phase: SessionPhase::Init,
            assigned_channel: None,
            coordinator_address: None,
            last_frame_received_at: None,
            emergency_stop_active: false,
            mode: SessionMode::Standby,
        }
    }

    pub fn unit_id(&self) -> &UnitId {
        &self.unit_id
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn assigned_channel(&self) -> Option<u16> {
        self.assigned_channel
    }

    pub fn coordinator_address(&self) -> Option<SocketAddr> {
        self.coordinator_address
    }

    pub fn last_frame_received_at(&self) -> Option<Instant> {
        self.last_frame_received_at
    }

    pub fn emergency_stop_active(&self) -> bool {
        self.emergency_stop_active
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    /// Whether control frames currently reach the actuators
    pub fn is_driving(&self) -> bool {
        self.phase == SessionPhase::Assigned && self.mode.is_teleop() && !self.emergency_stop_active
    }

    // Transitions

    /// Leaves `Init`. Has no effect afterwards.
    pub fn start(&mut self) -> Vec<SessionAction> {
        if self.phase != SessionPhase::Init {
            return Vec::new();
        }
        self.enter_advertising()
    }

    /// Returns to advertising. Outputs stop before anything else happens.
    pub fn enter_advertising(&mut self) -> Vec<SessionAction> {
        self.phase = SessionPhase::Advertising;
        self.assigned_channel = None;
        self.coordinator_address = None;
        self.last_frame_received_at = None;
        self.mode = SessionMode::Standby;

        vec![SessionAction::StopOutputs, SessionAction::ListenDiscovery]
    }

    /// Drops back to advertising if the command channel has been silent for
    /// longer than the command timeout
    pub fn check_timeout(&mut self, now: &Instant) -> Vec<SessionAction> {
        if self.phase != SessionPhase::Assigned {
            return Vec::new();
        }
        let Some(last_frame) = self.last_frame_received_at else {
            return Vec::new();
        };
        if last_frame.elapsed(now) <= self.command_timeout {
            return Vec::new();
        }

        warn!(
            "unit '{}' heard nothing on channel {:?} for {:?}, advertising again",
            self.unit_id, self.assigned_channel, self.command_timeout
        );
        let mut actions = self.enter_advertising();
        actions.push(SessionAction::LostCoordinator);
        actions
    }

    /// Applies one decoded frame. `Err` carries why the frame was dropped;
    /// dropped frames never touch liveness.
    pub fn handle_frame(
        &mut self,
        frame: Frame,
        source: SocketAddr,
        now: &Instant,
    ) -> Result<Vec<SessionAction>, DropReason> {
        match self.phase {
            SessionPhase::Init => Err(DropReason::Unexpected),
            SessionPhase::Advertising => self.handle_advertising(frame, source, now),
            SessionPhase::Assigned => self.handle_assigned(frame, now),
        }
    }

    fn handle_advertising(
        &mut self,
        frame: Frame,
        source: SocketAddr,
        now: &Instant,
    ) -> Result<Vec<SessionAction>, DropReason> {
        match frame {
            Frame::Assign { unit_id, channel } => {
                self.check_own(&unit_id)?;
                info!(
                    "unit '{}' assigned channel {} by {}",
                    self.unit_id, channel, source
                );
                self.phase = SessionPhase::Assigned;
                self.assigned_channel = Some(channel);
                self.coordinator_address = Some(source);
                self.last_frame_received_at = Some(*now);
                Ok(vec![
                    SessionAction::ListenChannel(channel),
                    SessionAction::Assigned {
                        channel,
                        coordinator: source,
                    },
                ])
            }
            Frame::EmergencyStop => Ok(self.engage_emergency_stop()),
            Frame::EmergencyStopOff => Ok(self.release_emergency_stop()),
            // other units' announcements arrive here too
            _ => Err(DropReason::Unexpected),
        }
    }

    fn handle_assigned(
        &mut self,
        frame: Frame,
        now: &Instant,
    ) -> Result<Vec<SessionAction>, DropReason> {
        match frame {
            Frame::EmergencyStop => {
                self.last_frame_received_at = Some(*now);
                Ok(self.engage_emergency_stop())
            }
            Frame::EmergencyStopOff => {
                self.last_frame_received_at = Some(*now);
                Ok(self.release_emergency_stop())
            }
            Frame::Status { unit_id, mode } => {
                self.check_own(&unit_id)?;
                self.last_frame_received_at = Some(*now);
                Ok(self.change_mode(mode))
            }
            Frame::Control(control) => {
                self.check_own(&control.unit_id)?;
                self.last_frame_received_at = Some(*now);
                Ok(self.drive(&control))
            }
            Frame::Discover { .. } | Frame::Assign { .. } | Frame::Alive { .. } => {
                Err(DropReason::Unexpected)
            }
        }
    }

    fn check_own(&self, unit_id: &UnitId) -> Result<(), DropReason> {
        if *unit_id == self.unit_id {
            Ok(())
        } else {
            Err(DropReason::ForeignUnit)
        }
    }

    fn engage_emergency_stop(&mut self) -> Vec<SessionAction> {
        if !self.emergency_stop_active {
            warn!("unit '{}' emergency stop engaged", self.unit_id);
        }
        self.emergency_stop_active = true;
        // repeated ESTOPs still force outputs to neutral
        vec![
            SessionAction::StopOutputs,
            SessionAction::EmergencyStop(true),
        ]
    }

    fn release_emergency_stop(&mut self) -> Vec<SessionAction> {
        if !self.emergency_stop_active {
            return Vec::new();
        }
        info!("unit '{}' emergency stop released", self.unit_id);
        self.emergency_stop_active = false;
        vec![SessionAction::EmergencyStop(false)]
    }

    fn change_mode(&mut self, mode: SessionMode) -> Vec<SessionAction> {
        if mode == self.mode {
            return Vec::new();
        }
        info!("unit '{}' mode {} -> {}", self.unit_id, self.mode, mode);
        let was_teleop = self.mode.is_teleop();
        self.mode = mode;

        let mut actions = Vec::new();
        if was_teleop {
            actions.push(SessionAction::StopOutputs);
        }
        actions.push(SessionAction::ModeChanged(mode));
        actions
    }

    fn drive(&self, control: &ControlFrame) -> Vec<SessionAction> {
        if !self.is_driving() {
            trace!(
                "unit '{}' ignoring control frame in {} mode",
                self.unit_id, self.mode
            );
            return Vec::new();
        }
        vec![SessionAction::Drive(DriveCommand::from(control))]
    }
}
