use std::net::SocketAddr;

use minibot_shared::SessionMode;

use crate::actuator::DriveCommand;

/// What the driver must do in response to a session transition, in order
#[derive(Clone, Debug, PartialEq)]
pub enum SessionAction {
    /// Set every output to neutral
    StopOutputs,
    /// Listen on the discovery port and start announcing
    ListenDiscovery,
    /// Listen exclusively on the assigned command channel
    ListenChannel(u16),
    /// Forward a command to the actuators
    Drive(DriveCommand),
    /// The coordinator at `coordinator` assigned `channel`
    Assigned {
        channel: u16,
        coordinator: SocketAddr,
    },
    /// The command channel went silent
    LostCoordinator,
    ModeChanged(SessionMode),
    EmergencyStop(bool),
}
