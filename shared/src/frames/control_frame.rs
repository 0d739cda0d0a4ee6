use crate::{
    axis::{decode_axis, encode_axis, NEUTRAL_AXIS_BYTE},
    button_set::ButtonSet,
    constants::{
        AXIS_FIELD_SIZE, BUTTON_FIELD_SIZE, CONTROL_FRAME_SIZE, UNIT_ID_FIELD_SIZE,
        USED_AXIS_COUNT,
    },
    frames::error::FrameError,
    unit_id::UnitId,
};

const AXES_OFFSET: usize = UNIT_ID_FIELD_SIZE;
const BUTTONS_OFFSET: usize = AXES_OFFSET + AXIS_FIELD_SIZE;

/// Fixed 24-byte binary frame carrying one tick of controller input:
///
/// | bytes  | content                                   |
/// |--------|-------------------------------------------|
/// | 0..16  | unit id, NUL-padded                       |
/// | 16..22 | axes: left x, left y, right x, right y, 2 reserved (zero) |
/// | 22..24 | button bitset, little-endian              |
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ControlFrame {
    pub unit_id: UnitId,
    pub axes: [u8; USED_AXIS_COUNT],
    pub buttons: ButtonSet,
}

impl ControlFrame {
    pub fn new(unit_id: UnitId, axes: [u8; USED_AXIS_COUNT], buttons: ButtonSet) -> Self {
        Self {
            unit_id,
            axes,
            buttons,
        }
    }

    /// Builds a frame from normalized axis values, applying the wire mapping
    pub fn from_normalized(
        unit_id: UnitId,
        axes: [f32; USED_AXIS_COUNT],
        buttons: ButtonSet,
    ) -> Self {
        Self::new(unit_id, axes.map(encode_axis), buttons)
    }

    /// Centered sticks, no buttons
    pub fn neutral(unit_id: UnitId) -> Self {
        Self::new(unit_id, [NEUTRAL_AXIS_BYTE; USED_AXIS_COUNT], ButtonSet::empty())
    }

    pub fn normalized_axes(&self) -> [f32; USED_AXIS_COUNT] {
        self.axes.map(decode_axis)
    }

    pub fn to_bytes(&self) -> [u8; CONTROL_FRAME_SIZE] {
        let mut bytes = [0u8; CONTROL_FRAME_SIZE];
        bytes[..UNIT_ID_FIELD_SIZE].copy_from_slice(&self.unit_id.to_field());
        bytes[AXES_OFFSET..AXES_OFFSET + USED_AXIS_COUNT].copy_from_slice(&self.axes);
        // reserved axis bytes stay zero
        bytes[BUTTONS_OFFSET..].copy_from_slice(&self.buttons.to_le_bytes());
        bytes
    }

    pub fn from_bytes(payload: &[u8]) -> Result<Self, FrameError> {
        if payload.len() != CONTROL_FRAME_SIZE {
            return Err(FrameError::WrongControlFrameLength {
                len: payload.len(),
                expected: CONTROL_FRAME_SIZE,
            });
        }

        let unit_id = UnitId::from_field(&payload[..UNIT_ID_FIELD_SIZE])?;

        let mut axes = [0u8; USED_AXIS_COUNT];
        axes.copy_from_slice(&payload[AXES_OFFSET..AXES_OFFSET + USED_AXIS_COUNT]);

        let mut buttons = [0u8; BUTTON_FIELD_SIZE];
        buttons.copy_from_slice(&payload[BUTTONS_OFFSET..]);

        Ok(Self {
            unit_id,
            axes,
            buttons: ButtonSet::from_le_bytes(buttons),
        })
    }
}
