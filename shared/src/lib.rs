//! # Minibot Shared
//! Wire formats, identifiers and timing primitives shared between the
//! minibot-server (coordinator) & minibot-client (remote unit) crates.

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

mod axis;
mod backends;
mod button_set;
pub mod constants;
mod drop_stats;
mod frames;
mod session_mode;
mod unit_id;

pub use axis::{decode_axis, encode_axis, NEUTRAL_AXIS_BYTE};
pub use backends::{Instant, Timer};
pub use button_set::{Button, ButtonSet};
pub use drop_stats::{DropReason, DropStats};
pub use frames::{
    control_frame::ControlFrame,
    error::{FrameError, UnitIdError},
    frame::Frame,
};
pub use session_mode::SessionMode;
pub use unit_id::UnitId;
