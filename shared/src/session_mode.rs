use std::{fmt, str::FromStr};

use crate::frames::error::FrameError;

/// Game status a coordinator assigns to a unit. Only `Teleop` lets control
/// frames move actuators.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum SessionMode {
    #[default]
    Standby,
    Teleop,
    Autonomous,
}

impl SessionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionMode::Standby => "standby",
            SessionMode::Teleop => "teleop",
            SessionMode::Autonomous => "autonomous",
        }
    }

    pub fn is_teleop(&self) -> bool {
        *self == SessionMode::Teleop
    }
}

impl fmt::Display for SessionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionMode {
    type Err = FrameError;

    fn from_str(status: &str) -> Result<Self, Self::Err> {
        match status {
            "standby" => Ok(SessionMode::Standby),
            "teleop" => Ok(SessionMode::Teleop),
            "autonomous" => Ok(SessionMode::Autonomous),
            _ => Err(FrameError::UnknownStatus {
                status: status.to_string(),
            }),
        }
    }
}
