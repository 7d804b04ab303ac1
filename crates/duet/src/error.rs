//! Unified error type for the Duet server.

use duet_game::GameError;
use duet_protocol::ProtocolError;
use duet_room::RoomError;
use duet_signal::SignalError;
use duet_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `duet` meta-crate, you deal with this single error type
/// instead of importing errors from each sub-crate. The `#[from]`
/// attribute on each variant auto-generates `From` impls, so the `?`
/// operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum DuetError {
    /// A transport-level error (connection, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room-level error (password gate, slots, lifecycle).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// A game-level error (unknown game, rejected action, ...).
    #[error(transparent)]
    Game(#[from] GameError),

    /// A signaling-level error (offer/answer discipline).
    #[error(transparent)]
    Signal(#[from] SignalError),
}
