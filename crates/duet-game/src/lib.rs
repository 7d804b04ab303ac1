//! Game layer for Duet: the pluggable capability contract, the registry
//! that maps game keys to implementations, and the authoritative session
//! engine that drives any game through its lifecycle.
//!
//! # Key types
//!
//! - [`Game`] — the trait one implements per bundled game: pure
//!   validate/apply/view/outcome value transformations, no transport.
//! - [`GameRegistry`] — static lookup from [`GameKey`] to implementation,
//!   with override support for test doubles.
//! - [`GameEngine`] — owns per-room sessions, enforces the
//!   validate-then-apply discipline and the monotonic sequence number.
//!
//! The engine is uniformly polymorphic over the contract: it never
//! branches on which game is active. Turn discipline lives entirely in
//! each game's `validate` — cooperative games simply never check it.
//!
//! [`GameKey`]: duet_protocol::GameKey

mod driver;
mod engine;
mod error;
pub mod games;
mod logic;
mod registry;

pub use driver::{ErasedState, GameDriver};
pub use engine::{Deliver, Effects, GameEngine, SessionStatus};
pub use error::GameError;
pub use logic::Game;
pub use registry::GameRegistry;
