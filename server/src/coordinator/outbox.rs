use std::net::SocketAddr;

use log::{trace, warn};

use minibot_shared::Frame;

use crate::{transport::PacketSender, CoordinatorError};

/// Encodes and sends one frame. Failures are logged here and handed back so
/// the caller can report them; nothing is retried.
pub(crate) fn send_frame(
    sender: &dyn PacketSender,
    address: &SocketAddr,
    frame: &Frame,
) -> Result<(), CoordinatorError> {
    trace!("sending {} to {}", frame.name(), address);
    sender.send(address, &frame.encode()).map_err(|_| {
        warn!("failed to send {} frame to {}", frame.name(), address);
        CoordinatorError::SendFailed {
            frame: frame.name(),
            address: *address,
        }
    })
}

/// Broadcasts one frame on `port`
pub(crate) fn broadcast_frame(
    sender: &dyn PacketSender,
    port: u16,
    frame: &Frame,
) -> Result<(), CoordinatorError> {
    trace!("broadcasting {} on port {}", frame.name(), port);
    sender.broadcast(port, &frame.encode()).map_err(|_| {
        warn!("failed to broadcast {} frame on port {}", frame.name(), port);
        CoordinatorError::BroadcastFailed {
            frame: frame.name(),
            port,
        }
    })
}
