use log::trace;

use crate::{
    constants::{
        ALIVE_PREFIX, CONTROL_FRAME_SIZE, DISCOVER_PREFIX, ESTOP_OFF_TOKEN, ESTOP_TOKEN,
        PORT_PREFIX,
    },
    frames::{control_frame::ControlFrame, error::FrameError},
    session_mode::SessionMode,
    unit_id::UnitId,
};

/// Every datagram either side of the protocol can send
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Frame {
    /// `DISCOVER:<id>:<reportedAddress>`, broadcast by an unassigned unit. The
    /// reported address is advisory only, replies go to the observed source.
    Discover {
        unit_id: UnitId,
        reported_address: String,
    },
    /// `PORT:<id>:<channel>`, coordinator hands a unit its command channel
    Assign { unit_id: UnitId, channel: u16 },
    /// `<id>:<status>`
    Status { unit_id: UnitId, mode: SessionMode },
    /// `ALIVE:<id>`, heartbeat from an assigned unit back to the coordinator
    Alive { unit_id: UnitId },
    /// `ESTOP`
    EmergencyStop,
    /// `ESTOP_OFF`
    EmergencyStopOff,
    /// 24-byte binary controller sample
    Control(ControlFrame),
}

impl Frame {
    /// Decodes a datagram. Length alone decides between the binary control
    /// frame and the text frames; the 24-byte rule is never relaxed.
    pub fn decode(payload: &[u8]) -> Result<Self, FrameError> {
        if payload.len() == CONTROL_FRAME_SIZE {
            return ControlFrame::from_bytes(payload).map(Frame::Control);
        }

        // text frames may arrive NUL-terminated
        let end = payload
            .iter()
            .rposition(|byte| *byte != 0)
            .map_or(0, |index| index + 1);
        if end == 0 {
            return Err(FrameError::Empty);
        }
        let text = std::str::from_utf8(&payload[..end])
            .map_err(|_| FrameError::InvalidUtf8 { len: payload.len() })?;

        Self::decode_text(text)
    }

    fn decode_text(text: &str) -> Result<Self, FrameError> {
        match text {
            ESTOP_TOKEN => return Ok(Frame::EmergencyStop),
            ESTOP_OFF_TOKEN => return Ok(Frame::EmergencyStopOff),
            _ => {}
        }

        if let Some(rest) = text.strip_prefix(DISCOVER_PREFIX) {
            let (unit_id, reported_address) =
                rest.split_once(':').ok_or(FrameError::MissingField {
                    frame: "DISCOVER",
                    field: "address",
                })?;
            if reported_address.is_empty() {
                return Err(FrameError::MissingField {
                    frame: "DISCOVER",
                    field: "address",
                });
            }
            return Ok(Frame::Discover {
                unit_id: UnitId::new(unit_id)?,
                reported_address: reported_address.to_string(),
            });
        }

        if let Some(rest) = text.strip_prefix(PORT_PREFIX) {
            let (unit_id, channel) = rest.split_once(':').ok_or(FrameError::MissingField {
                frame: "PORT",
                field: "channel",
            })?;
            let channel = match channel.parse::<u16>() {
                Ok(channel) if channel != 0 => channel,
                _ => {
                    return Err(FrameError::InvalidChannel {
                        value: channel.to_string(),
                    })
                }
            };
            return Ok(Frame::Assign {
                unit_id: UnitId::new(unit_id)?,
                channel,
            });
        }

        if let Some(unit_id) = text.strip_prefix(ALIVE_PREFIX) {
            return Ok(Frame::Alive {
                unit_id: UnitId::new(unit_id)?,
            });
        }

        if let Some((unit_id, status)) = text.split_once(':') {
            let mode = status.parse::<SessionMode>()?;
            return Ok(Frame::Status {
                unit_id: UnitId::new(unit_id)?,
                mode,
            });
        }

        Err(FrameError::Unrecognized {
            text: text.to_string(),
        })
    }

    /// Encodes this frame into datagram bytes. A text frame that would be
    /// exactly 24 bytes long gets one trailing NUL so that it is never read
    /// back as a control frame.
    pub fn encode(&self) -> Vec<u8> {
        let text = match self {
            Frame::Control(control) => return control.to_bytes().to_vec(),
            Frame::Discover {
                unit_id,
                reported_address,
            } => format!("{}{}:{}", DISCOVER_PREFIX, unit_id, reported_address),
            Frame::Assign { unit_id, channel } => {
                format!("{}{}:{}", PORT_PREFIX, unit_id, channel)
            }
            Frame::Status { unit_id, mode } => format!("{}:{}", unit_id, mode),
            Frame::Alive { unit_id } => format!("{}{}", ALIVE_PREFIX, unit_id),
            Frame::EmergencyStop => ESTOP_TOKEN.to_string(),
            Frame::EmergencyStopOff => ESTOP_OFF_TOKEN.to_string(),
        };

        let mut bytes = text.into_bytes();
        if bytes.len() == CONTROL_FRAME_SIZE {
            trace!("padding {}-byte text frame off the control frame length", bytes.len());
            bytes.push(0);
        }
        bytes
    }

    /// Id of the unit this frame concerns, if it names one
    pub fn unit_id(&self) -> Option<&UnitId> {
        match self {
            Frame::Discover { unit_id, .. }
            | Frame::Assign { unit_id, .. }
            | Frame::Status { unit_id, .. }
            | Frame::Alive { unit_id } => Some(unit_id),
            Frame::Control(control) => Some(&control.unit_id),
            Frame::EmergencyStop | Frame::EmergencyStopOff => None,
        }
    }

    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Frame::Discover { .. } => "DISCOVER",
            Frame::Assign { .. } => "PORT",
            Frame::Status { .. } => "STATUS",
            Frame::Alive { .. } => "ALIVE",
            Frame::EmergencyStop => "ESTOP",
            Frame::EmergencyStopOff => "ESTOP_OFF",
            Frame::Control(_) => "CONTROL",
        }
    }
}
