//! Wire protocol for Duet.
//!
//! This crate defines the "language" that clients and the coordination
//! server speak:
//!
//! - **Types** ([`RoomId`], [`GameKey`], [`Role`], [`Outcome`], [`ErrorCode`])
//!   — the identifiers and small enums shared by every layer.
//! - **Events** ([`ClientEvent`], [`ServerEvent`]) — the messages that
//!   travel on the wire. Requests that expect a reply carry a client-chosen
//!   `req` id; the matching ack echoes it back.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how events are converted
//!   to/from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong during
//!   encoding/decoding.
//!
//! The protocol layer sits between transport (raw bytes) and the
//! coordination components. It doesn't know about connections, rooms, or
//! game rules — it only knows message shapes.

mod codec;
mod error;
mod events;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use events::{ClientEvent, ServerEvent};
pub use types::{ErrorCode, GameKey, Outcome, Role, RoomId};
