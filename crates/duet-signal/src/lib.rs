//! WebRTC negotiation coordinator.
//!
//! The server never inspects session descriptions or candidates; it is a
//! relay with three duties:
//!
//! - the double-ready handshake that tells the host (the sole offer
//!   initiator) when to create an offer,
//! - verbatim relay of offers, answers, and ICE candidates to the other
//!   occupant,
//! - buffering ICE candidates that arrive before their destination has a
//!   remote description, so none are dropped in that window.

mod coordinator;
mod error;

pub use coordinator::{Phase, SignalCoordinator, SignalEffects};
pub use error::SignalError;
