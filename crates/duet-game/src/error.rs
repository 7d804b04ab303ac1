use duet_protocol::{ErrorCode, GameKey};
use thiserror::Error;

/// Errors surfaced by the game layer.
#[derive(Debug, Error)]
pub enum GameError {
    /// No implementation registered under this key.
    #[error("unknown game: {0}")]
    UnknownGame(GameKey),

    /// The room has no session for this game.
    #[error("no active session for game {0}")]
    NoSession(GameKey),

    /// The session exists but is not accepting actions right now.
    #[error("game {0} is not in play")]
    NotPlaying(GameKey),

    /// The game's own validation rejected the action.
    #[error("action rejected: {0}")]
    Rejected(String),

    /// The action payload did not deserialize into the game's action type.
    #[error("malformed action: {0}")]
    BadAction(String),

    /// Rematch requested while the session is still in play.
    #[error("game {0} has not finished")]
    NotFinished(GameKey),

    /// State downcast or view serialization failed; indicates a bug.
    #[error("internal game error: {0}")]
    Internal(String),
}

impl GameError {
    /// Wire-level error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            GameError::UnknownGame(_) => ErrorCode::NotFound,
            GameError::NoSession(_)
            | GameError::NotPlaying(_)
            | GameError::NotFinished(_)
            | GameError::Rejected(_) => ErrorCode::State,
            GameError::BadAction(_) => ErrorCode::Validation,
            GameError::Internal(_) => ErrorCode::Internal,
        }
    }
}
