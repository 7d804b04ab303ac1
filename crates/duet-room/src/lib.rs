//! Room lifecycle management for Duet.
//!
//! A room pairs exactly two participants — host and peer — behind a
//! password gate. This crate owns room existence, the two role slots,
//! password verification, the failed-attempt lockout guard, and
//! broadcast-group membership (each occupant's outbound event sender).
//!
//! # Key types
//!
//! - [`RoomRegistry`] — creates, joins, leaves, closes, and sweeps rooms
//! - [`RateLimitGuard`] — per-room failure counter and lockout clock
//! - [`PasswordHash`] — salted digest stored per room
//! - [`RoomConfig`] / [`GuardConfig`] — tunables (short values in tests)

mod config;
mod error;
mod guard;
mod password;
mod registry;

pub use config::RoomConfig;
pub use error::RoomError;
pub use guard::{FailureVerdict, GuardConfig, RateLimitGuard};
pub use password::{PasswordHash, generate_password, generate_room_code};
pub use registry::{
    CreatedRoom, EventSender, JoinOutcome, Occupant, RoomRegistry, RoomSession, RoomStatus,
};
