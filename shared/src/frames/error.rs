use thiserror::Error;

/// Errors that can occur while validating a unit id
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnitIdError {
    /// The id is empty
    #[error("Unit id is empty")]
    Empty,

    /// The id does not fit the control frame's id field
    #[error("Unit id is {len} bytes long, the maximum is {max} bytes")]
    TooLong { len: usize, max: usize },

    /// The id contains a character that would break text framing
    #[error("Unit id contains forbidden character {character:?}")]
    ForbiddenCharacter { character: char },

    /// The id collides with a literal protocol token
    #[error("Unit id '{token}' is a reserved protocol token")]
    Reserved { token: String },

    /// The id field of a control frame is not valid UTF-8
    #[error("Unit id field is not valid UTF-8")]
    InvalidUtf8,
}

/// Errors that can occur while decoding a datagram into a frame. Every one of
/// these results in the datagram being dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// Zero-length datagram (or one made only of NUL padding)
    #[error("Datagram is empty")]
    Empty,

    /// A control frame must be exactly 24 bytes long
    #[error("Control frame must be {expected} bytes, got {len}")]
    WrongControlFrameLength { len: usize, expected: usize },

    /// A text frame is not valid UTF-8
    #[error("Text frame of {len} bytes is not valid UTF-8")]
    InvalidUtf8 { len: usize },

    /// A text frame matched no known literal or prefix
    #[error("Text frame '{text}' matches no known frame kind")]
    Unrecognized { text: String },

    /// A known frame kind is missing one of its fields
    #[error("{frame} frame is missing its {field} field")]
    MissingField {
        frame: &'static str,
        field: &'static str,
    },

    /// Channel field of an assignment frame is not a usable port number
    #[error("Invalid channel '{value}' in assignment frame. Channel must be a non-zero u16")]
    InvalidChannel { value: String },

    /// Status field is not one of standby, teleop or autonomous
    #[error("Unknown status '{status}'. Status must be standby, teleop or autonomous")]
    UnknownStatus { status: String },

    /// Unit id carried by the frame is invalid
    #[error("Invalid unit id: {0}")]
    InvalidUnitId(#[from] UnitIdError),
}
