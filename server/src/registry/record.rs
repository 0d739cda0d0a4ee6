use std::{net::SocketAddr, time::Duration};

use minibot_shared::{Instant, SessionMode, UnitId};

/// Everything the coordinator knows about one discovered unit
#[derive(Clone, Debug, PartialEq)]
pub struct RemoteUnitRecord {
    id: UnitId,
    source_address: SocketAddr,
    reported_address: String,
    assigned_channel: u16,
    last_announce_at: Instant,
    last_ack_at: Option<Instant>,
    mode: SessionMode,
}

impl RemoteUnitRecord {
    pub(crate) fn new(
        id: UnitId,
        source_address: SocketAddr,
        reported_address: &str,
        assigned_channel: u16,
        mode: SessionMode,
        now: &Instant,
    ) -> Self {
        Self {
            id,
            source_address,
            reported_address: reported_address.to_string(),
            assigned_channel,
            last_announce_at: *now,
            last_ack_at: None,
            mode,
        }
    }

    pub fn id(&self) -> &UnitId {
        &self.id
    }

    /// Transport-level source of the unit's latest announcement. Replies always
    /// go here, never to the reported address.
    pub fn source_address(&self) -> SocketAddr {
        self.source_address
    }

    /// Address the unit claimed for itself. Logging only.
    pub fn reported_address(&self) -> &str {
        &self.reported_address
    }

    pub fn assigned_channel(&self) -> u16 {
        self.assigned_channel
    }

    /// Where command traffic for this unit is sent
    pub fn command_address(&self) -> SocketAddr {
        SocketAddr::new(self.source_address.ip(), self.assigned_channel)
    }

    pub fn last_announce_at(&self) -> Instant {
        self.last_announce_at
    }

    pub fn last_ack_at(&self) -> Option<Instant> {
        self.last_ack_at
    }

    /// Latest moment the unit was heard from, by announcement or heartbeat
    pub fn last_heard_at(&self) -> Instant {
        match self.last_ack_at {
            Some(ack) if ack.is_after(&self.last_announce_at) => ack,
            _ => self.last_announce_at,
        }
    }

    pub fn is_stale(&self, now: &Instant, eviction_timeout: Duration) -> bool {
        self.last_heard_at().elapsed(now) > eviction_timeout
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub(crate) fn refresh_announce(
        &mut self,
        source_address: SocketAddr,
        reported_address: &str,
        now: &Instant,
    ) {
        self.source_address = source_address;
        if self.reported_address != reported_address {
            self.reported_address = reported_address.to_string();
        }
        self.last_announce_at = *now;
    }

    pub(crate) fn refresh_ack(&mut self, now: &Instant) {
        self.last_ack_at = Some(*now);
    }

    pub(crate) fn set_mode(&mut self, mode: SessionMode) {
        self.mode = mode;
    }
}
