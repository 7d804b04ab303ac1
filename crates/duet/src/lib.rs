//! # Duet
//!
//! Real-time coordination server for two-participant sessions: rooms
//! pair exactly one host and one peer behind a password gate, a pluggable
//! game engine keeps authoritative state with monotonic sequence numbers,
//! and a WebRTC signaling relay negotiates the direct media channel.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use duet::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), DuetError> {
//!     let server = DuetServer::builder()
//!         .bind("0.0.0.0:8080")
//!         .games(GameRegistry::with_builtin())
//!         .build()
//!         .await?;
//!     server.run().await
//! }
//! ```

mod error;
mod handler;
mod server;

pub use error::DuetError;
pub use server::{DuetServer, DuetServerBuilder};

/// Commonly used items, re-exported from the sub-crates.
pub mod prelude {
    pub use crate::{DuetError, DuetServer, DuetServerBuilder};
    pub use duet_game::{Game, GameEngine, GameRegistry};
    pub use duet_protocol::{
        ClientEvent, ErrorCode, GameKey, Outcome, Role, RoomId, ServerEvent,
    };
    pub use duet_room::{GuardConfig, RoomConfig};
    pub use duet_signal::SignalCoordinator;
}
