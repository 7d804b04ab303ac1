//! Core identifiers and small shared enums.
//!
//! Everything here travels on the wire, so the serde representations are
//! part of the protocol: ids serialize as plain strings, roles and error
//! codes as lowercase/snake_case string tags.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A room's public identifier: a short uppercase alphanumeric code that
/// doubles as the invite code (e.g. `"K7Q2XF"`).
///
/// Newtype over `String` so a room id can't be confused with a display
/// name or a game key. `#[serde(transparent)]` keeps the JSON a plain
/// string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl RoomId {
    /// Returns the id as a `&str`.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RoomId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Identifier of a pluggable game implementation (e.g. `"tictactoe"`).
///
/// The capability registry maps these to game logic; the engine treats
/// them as opaque keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameKey(pub String);

impl GameKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GameKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for GameKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// The two fixed roles in a room. The host creates it, the peer joins it.
///
/// Exactly two participants per room is a core invariant, so roles are a
/// closed enum rather than an index or a player list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Host,
    Peer,
}

impl Role {
    /// Returns the other occupant's role.
    pub fn other(self) -> Role {
        match self {
            Role::Host => Role::Peer,
            Role::Peer => Role::Host,
        }
    }

    /// Stable index for per-role arrays (`[T; 2]`): host = 0, peer = 1.
    pub fn index(self) -> usize {
        match self {
            Role::Host => 0,
            Role::Peer => 1,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Host => write!(f, "host"),
            Role::Peer => write!(f, "peer"),
        }
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// The result a game's win-condition check can produce.
///
/// Cooperative games report `Draw` for a shared finish; turn games report
/// the winning role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Outcome {
    Winner { role: Role },
    Draw,
}

// ---------------------------------------------------------------------------
// ErrorCode
// ---------------------------------------------------------------------------

/// Wire-level error taxonomy.
///
/// Every per-request failure is reported to the requester (never broadcast)
/// with one of these codes, so clients can branch without parsing messages:
///
/// - `Validation` — malformed request; non-fatal, caller-only.
/// - `Auth` — bad password; counted toward the room's lockout.
/// - `Capacity` — both slots occupied.
/// - `State` — closed room, game not started, wrong turn, illegal action.
/// - `RateLimit` — room locked out; carries a remaining-time hint.
/// - `NotFound` — unknown room or unregistered game key.
/// - `Internal` — unexpected fault; logged server-side, detail never leaked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Validation,
    Auth,
    Capacity,
    State,
    RateLimit,
    NotFound,
    Internal,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::Validation => "validation",
            ErrorCode::Auth => "auth",
            ErrorCode::Capacity => "capacity",
            ErrorCode::State => "state",
            ErrorCode::RateLimit => "rate_limit",
            ErrorCode::NotFound => "not_found",
            ErrorCode::Internal => "internal",
        };
        write!(f, "{s}")
    }
}

// =========================================================================
// Tests
// =========================================================================
