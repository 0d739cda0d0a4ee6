/// Well-known port every unit announces itself on, and the coordinator listens on
pub const DISCOVERY_PORT: u16 = 12345;

/// First port handed out as a dedicated command channel
pub const COMMAND_PORT_BASE: u16 = 12346;

/// Exact length of a binary control frame. Any datagram of this length is
/// decoded as a control frame, every other length as a text frame.
pub const CONTROL_FRAME_SIZE: usize = 24;

/// Width of the NUL-padded unit id field at the start of a control frame
pub const UNIT_ID_FIELD_SIZE: usize = 16;

/// Number of axis bytes in a control frame (4 used, 2 reserved)
pub const AXIS_FIELD_SIZE: usize = 6;

/// Number of axis bytes actually carrying stick samples
pub const USED_AXIS_COUNT: usize = 4;

/// Number of little-endian button bytes in a control frame
pub const BUTTON_FIELD_SIZE: usize = 2;

/// Largest datagram either side ever reads
pub const MAX_DATAGRAM_SIZE: usize = 256;

pub const DISCOVER_PREFIX: &str = "DISCOVER:";
pub const PORT_PREFIX: &str = "PORT:";
pub const ALIVE_PREFIX: &str = "ALIVE:";
pub const ESTOP_TOKEN: &str = "ESTOP";
pub const ESTOP_OFF_TOKEN: &str = "ESTOP_OFF";
