use std::{fmt, str::FromStr};

use crate::{
    constants::{
        ALIVE_PREFIX, DISCOVER_PREFIX, ESTOP_OFF_TOKEN, ESTOP_TOKEN, PORT_PREFIX,
        UNIT_ID_FIELD_SIZE,
    },
    frames::error::UnitIdError,
};

/// Short, stable name a remote unit announces itself with. Guaranteed to fit
/// the 16-byte id field of a control frame and to be safe inside `:`-separated
/// text frames.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UnitId(String);

impl UnitId {
    pub fn new(value: &str) -> Result<Self, UnitIdError> {
        if value.is_empty() {
            return Err(UnitIdError::Empty);
        }
        if value.len() > UNIT_ID_FIELD_SIZE {
            return Err(UnitIdError::TooLong {
                len: value.len(),
                max: UNIT_ID_FIELD_SIZE,
            });
        }
        if let Some(character) = value
            .chars()
            .find(|c| *c == ':' || c.is_whitespace() || c.is_control())
        {
            return Err(UnitIdError::ForbiddenCharacter { character });
        }
        if Self::is_reserved(value) {
            return Err(UnitIdError::Reserved {
                token: value.to_string(),
            });
        }
        Ok(Self(value.to_string()))
    }

    /// Reads an id from the NUL-padded field of a control frame. The id ends at
    /// the first NUL byte, or at the end of the field.
    pub fn from_field(field: &[u8]) -> Result<Self, UnitIdError> {
        let field = &field[..field.len().min(UNIT_ID_FIELD_SIZE)];
        let end = field.iter().position(|b| *b == 0).unwrap_or(field.len());
        let text = std::str::from_utf8(&field[..end]).map_err(|_| UnitIdError::InvalidUtf8)?;
        Self::new(text)
    }

    /// Writes this id into a NUL-padded control frame field
    pub fn to_field(&self) -> [u8; UNIT_ID_FIELD_SIZE] {
        let mut field = [0u8; UNIT_ID_FIELD_SIZE];
        let bytes = self.0.as_bytes();
        field[..bytes.len()].copy_from_slice(bytes);
        field
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn is_reserved(value: &str) -> bool {
        let prefix_word = |prefix: &str| prefix.trim_end_matches(':') == value;
        prefix_word(DISCOVER_PREFIX)
            || prefix_word(PORT_PREFIX)
            || prefix_word(ALIVE_PREFIX)
            || value == ESTOP_TOKEN
            || value == ESTOP_OFF_TOKEN
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for UnitId {
    type Err = UnitIdError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::new(value)
    }
}

impl TryFrom<&str> for UnitId {
    type Error = UnitIdError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl AsRef<str> for UnitId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
