pub mod control_frame;
pub mod error;
pub mod frame;
