use std::net::SocketAddr;

use thiserror::Error;

use minibot_shared::UnitId;

/// Errors surfaced by the coordinator. Only `Bind` and `Spawn` are fatal, and
/// only at startup; everything else is reported through events while the
/// loops keep running.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordinatorError {
    /// The discovery socket could not be bound
    #[error("Cannot bind coordinator socket to port {port}: {reason}")]
    Bind { port: u16, reason: String },

    /// A loop thread could not be started
    #[error("Cannot spawn {thread} thread: {reason}")]
    Spawn { thread: &'static str, reason: String },

    /// A datagram could not be sent. The record stays until reaped.
    #[error("Cannot send {frame} frame to {address}")]
    SendFailed {
        frame: &'static str,
        address: SocketAddr,
    },

    /// A broadcast datagram could not be sent
    #[error("Cannot broadcast {frame} frame on port {port}")]
    BroadcastFailed { frame: &'static str, port: u16 },

    /// The socket reported an error while receiving
    #[error("Cannot receive from coordinator socket")]
    RecvFailed,

    /// Every command channel in the configured range is assigned
    #[error("All {count} command channels from {base} are in use, cannot assign '{unit_id}'")]
    ChannelsExhausted { unit_id: UnitId, base: u16, count: u16 },

    /// An operator action named a unit that is not registered
    #[error("No unit '{unit_id}' is registered")]
    UnknownUnit { unit_id: UnitId },
}
