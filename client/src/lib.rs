//! # Minibot Client
//! The remote-unit side of the minibot protocol. A unit broadcasts its id
//! until a coordinator assigns it a command channel, then forwards control
//! frames to its actuators, falling back to advertising (with every output
//! stopped) as soon as the channel goes quiet.

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

#[macro_use]
extern crate cfg_if;

pub mod transport;
pub mod shared {
    pub use minibot_shared::{
        constants, Button, ButtonSet, ControlFrame, DropReason, DropStats, Frame, Instant,
        SessionMode, UnitId,
    };
}

mod actuator;
mod error;
mod remote_unit;
mod session;
mod unit_config;
mod unit_events;

pub use actuator::{ActuatorSink, DriveCommand};
pub use error::UnitError;
pub use remote_unit::RemoteUnit;
pub use session::{SessionAction, SessionPhase, SessionState};
pub use unit_config::UnitConfig;
pub use unit_events::{
    AssignEvent, EmergencyStopEvent, ErrorEvent, ModeEvent, TimeoutEvent, UnitEvent, UnitEvents,
};
