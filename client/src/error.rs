use thiserror::Error;

/// Errors surfaced by a remote unit. Only failing to bind the discovery port
/// at startup is fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnitError {
    /// A socket could not be bound to the given port
    #[error("Cannot bind unit socket to port {port}: {reason}")]
    Bind { port: u16, reason: String },

    /// A frame could not be sent
    #[error("Cannot send {frame} frame")]
    SendFailed { frame: &'static str },

    /// The socket reported an error while receiving
    #[error("Cannot receive from unit socket")]
    RecvFailed,

    /// `start` was called on a unit that is already running
    #[error("Unit is already started")]
    AlreadyStarted,
}
