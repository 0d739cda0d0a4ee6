use std::time::Duration;

use minibot_shared::{constants::DISCOVERY_PORT, UnitId};

/// Contains Config properties which will be used by a RemoteUnit
#[derive(Clone, Debug)]
pub struct UnitConfig {
    /// Identity broadcast in every announcement
    pub unit_id: UnitId,
    /// Port announcements are broadcast to, where the coordinator listens
    pub discovery_port: u16,
    /// Port the unit listens on while advertising. Assignments arrive here,
    /// since the coordinator replies to the announcement's source. `0` binds
    /// an ephemeral port, letting several units share one host.
    pub listen_port: u16,
    /// Period between announcements while unassigned
    pub announce_interval: Duration,
    /// Silence on the command channel for longer than this returns the unit
    /// to advertising, stopping its outputs
    pub command_timeout: Duration,
    /// Period between heartbeats to the coordinator while assigned
    pub heartbeat_interval: Duration,
    /// How long `run` sleeps between updates
    pub poll_interval: Duration,
    /// Address placed in announcements. Advisory only; the coordinator
    /// replies to the observed source. Defaults to the host's local address.
    pub reported_address: Option<String>,
}

impl UnitConfig {
    /// Default timings for a unit with the given id
    pub fn new(unit_id: UnitId) -> Self {
        Self {
            unit_id,
            discovery_port: DISCOVERY_PORT,
            listen_port: DISCOVERY_PORT,
            announce_interval: Duration::from_secs(2),
            command_timeout: Duration::from_secs(5),
            heartbeat_interval: Duration::from_secs(1),
            poll_interval: Duration::from_millis(10),
            reported_address: None,
        }
    }

    pub(crate) fn resolve_reported_address(&self) -> String {
        if let Some(address) = &self.reported_address {
            return address.clone();
        }
        #[cfg(not(feature = "transport_udp"))]
        let detected: Option<String> = None;
        #[cfg(feature = "transport_udp")]
        let detected = local_ipaddress::get();
        detected.unwrap_or_else(|| "127.0.0.1".to_string())
    }
}
