use std::{default::Default, time::Duration};

use minibot_shared::constants::{COMMAND_PORT_BASE, DISCOVERY_PORT};

/// Contains Config properties which will be used by the Coordinator
#[derive(Clone, Debug)]
pub struct CoordinatorConfig {
    /// Port the discovery socket is bound to. Units broadcast here.
    pub discovery_port: u16,
    /// First command channel handed out
    pub command_port_base: u16,
    /// How many channels from `command_port_base` may be assigned
    pub channel_count: u16,
    /// Period of the dispatch loop
    pub tick_interval: Duration,
    /// How often every unit is re-sent its mode, keeping quiet units inside
    /// their command timeout
    pub status_interval: Duration,
    /// A controller sample older than this is sent as centered sticks
    pub max_sample_age: Duration,
    /// A unit not heard from for longer than this is forgotten
    pub eviction_timeout: Duration,
    /// How often the reaper looks for stale units
    pub reap_interval: Duration,
    /// Longest a single receive waits on the socket
    pub recv_timeout: Duration,
    /// Longest a single send may block
    pub send_timeout: Duration,
    /// Most events of each kind a spawned coordinator holds between
    /// `poll_events` calls. The oldest are dropped past this.
    pub max_pending_events: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            discovery_port: DISCOVERY_PORT,
            command_port_base: COMMAND_PORT_BASE,
            channel_count: 256,
            tick_interval: Duration::from_nanos(16_666_667),
            status_interval: Duration::from_secs(1),
            max_sample_age: Duration::from_millis(250),
            eviction_timeout: Duration::from_secs(10),
            reap_interval: Duration::from_millis(500),
            recv_timeout: Duration::from_millis(100),
            send_timeout: Duration::from_millis(20),
            max_pending_events: 1024,
        }
    }
}
