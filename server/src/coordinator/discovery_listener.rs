use std::net::SocketAddr;

use log::{debug, info, trace, warn};

use minibot_shared::{DropReason, DropStats, Frame, FrameError, Instant, UnitId};

use crate::{
    coordinator::outbox::send_frame,
    events::CoordinatorEvents,
    registry::{Announcement, SharedRegistry},
    transport::{PacketReceiver, PacketSender},
    CoordinatorError,
};

// Upper bound on datagrams handled per pass, so a flood cannot starve the reaper
const MAX_DATAGRAMS_PER_PASS: usize = 64;

/// Consumes the discovery socket: registers announcing units, replies with
/// their channel, and records heartbeats
pub struct DiscoveryListener {
    registry: SharedRegistry,
    sender: Box<dyn PacketSender>,
    receiver: Box<dyn PacketReceiver>,
    drop_stats: DropStats,
}

impl DiscoveryListener {
    pub fn new(
        registry: SharedRegistry,
        sender: Box<dyn PacketSender>,
        receiver: Box<dyn PacketReceiver>,
    ) -> Self {
        Self {
            registry,
            sender,
            receiver,
            drop_stats: DropStats::new(),
        }
    }

    /// Handles datagrams until the socket has nothing more to give. With a
    /// blocking socket the first empty receive waits out the receive timeout.
    pub fn receive(&mut self, now: &Instant, events: &mut CoordinatorEvents) -> usize {
        let mut handled = 0;
        while handled < MAX_DATAGRAMS_PER_PASS {
            let (source, decoded) = match self.receiver.receive() {
                Ok(Some((source, payload))) => (source, Frame::decode(payload)),
                Ok(None) => break,
                Err(_) => {
                    warn!("coordinator socket failed to receive");
                    events.push_error(CoordinatorError::RecvFailed);
                    break;
                }
            };
            handled += 1;
            self.handle(source, decoded, now, events);
        }
        handled
    }

    pub fn drop_stats(&self) -> DropStats {
        self.drop_stats
    }

    fn handle(
        &mut self,
        source: SocketAddr,
        decoded: Result<Frame, FrameError>,
        now: &Instant,
        events: &mut CoordinatorEvents,
    ) {
        let frame = match decoded {
            Ok(frame) => frame,
            Err(error) => {
                trace!("dropping datagram from {}: {}", source, error);
                self.drop_stats.record(DropReason::Malformed);
                return;
            }
        };

        match frame {
            Frame::Discover {
                unit_id,
                reported_address,
            } => self.handle_announcement(&unit_id, source, &reported_address, now, events),
            Frame::Alive { unit_id } => {
                let known = self.registry.lock().acknowledge(&unit_id, now);
                if !known {
                    trace!("dropping heartbeat from unknown unit '{}'", unit_id);
                    self.drop_stats.record(DropReason::ForeignUnit);
                }
            }
            other => {
                // our own ESTOP broadcasts land here too
                trace!("dropping {} frame from {}", other.name(), source);
                self.drop_stats.record(DropReason::Unexpected);
            }
        }
    }

    fn handle_announcement(
        &mut self,
        unit_id: &UnitId,
        source: SocketAddr,
        reported_address: &str,
        now: &Instant,
        events: &mut CoordinatorEvents,
    ) {
        let announcement = self
            .registry
            .lock()
            .announce(unit_id, source, reported_address, now);

        let channel = match announcement {
            Ok(Announcement::Discovered { channel }) => {
                info!(
                    "discovered unit '{}' at {} (reports {}), assigning channel {}",
                    unit_id, source, reported_address, channel
                );
                events.push_discovery(unit_id, source, channel);
                channel
            }
            Ok(Announcement::Known { channel }) => {
                debug!(
                    "unit '{}' announced again from {}, resending channel {}",
                    unit_id, source, channel
                );
                events.push_reassignment(unit_id, source, channel);
                channel
            }
            Err(error) => {
                warn!("{}", error);
                events.push_error(error);
                return;
            }
        };

        let assignment = Frame::Assign {
            unit_id: unit_id.clone(),
            channel,
        };
        if let Err(error) = send_frame(self.sender.as_ref(), &source, &assignment) {
            events.push_error(error);
        }
    }
}
