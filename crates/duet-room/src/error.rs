//! Error types for the room layer.

use std::time::Duration;

use duet_protocol::{ErrorCode, RoomId};

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room does not exist (never created, or already deleted).
    #[error("room {0} not found")]
    NotFound(RoomId),

    /// A room with the explicitly requested id already exists.
    #[error("room id {0} is taken")]
    IdTaken(RoomId),

    /// Both slots are occupied.
    #[error("room {0} is full")]
    RoomFull(RoomId),

    /// The room has been closed by its host.
    #[error("room {0} is closed")]
    Closed(RoomId),

    /// Wrong password. Carries how many attempts remain before lockout.
    #[error("wrong password ({remaining} attempts remaining)")]
    WrongPassword { remaining: u32 },

    /// The room is locked out after repeated password failures.
    #[error("room is locked, retry in {}s", retry_after.as_secs())]
    LockedOut { retry_after: Duration },

    /// Only the host slot's occupant may perform this operation.
    #[error("only the host can do this in room {0}")]
    NotHost(RoomId),

    /// The caller's connection does not occupy a slot in this room.
    #[error("caller is not in room {0}")]
    NotInRoom(RoomId),

    /// Malformed request input (empty display name, bad room code, ...).
    #[error("invalid request: {0}")]
    Invalid(String),
}

impl RoomError {
    /// Maps this error onto the wire taxonomy.
    pub fn code(&self) -> ErrorCode {
        match self {
            RoomError::NotFound(_) => ErrorCode::NotFound,
            RoomError::IdTaken(_) => ErrorCode::State,
            RoomError::RoomFull(_) => ErrorCode::Capacity,
            RoomError::Closed(_) => ErrorCode::State,
            RoomError::WrongPassword { .. } => ErrorCode::Auth,
            RoomError::LockedOut { .. } => ErrorCode::RateLimit,
            RoomError::NotHost(_) => ErrorCode::State,
            RoomError::NotInRoom(_) => ErrorCode::State,
            RoomError::Invalid(_) => ErrorCode::Validation,
        }
    }
}
