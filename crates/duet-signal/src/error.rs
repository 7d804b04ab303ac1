use duet_protocol::ErrorCode;
use thiserror::Error;

/// Errors surfaced by the negotiation coordinator.
///
/// All of them are state errors from the wire's point of view: the relay
/// refuses to forward a message that would corrupt the other endpoint's
/// negotiation state.
#[derive(Debug, Error)]
pub enum SignalError {
    /// Only the host produces offers.
    #[error("only the host may send an offer")]
    NotInitiator,

    /// A second offer arrived while the previous one is unanswered.
    #[error("offer discarded: negotiation is not in a stable state")]
    OfferCollision,

    /// An answer arrived with no outstanding offer (or from the host).
    #[error("unexpected answer: no outstanding offer")]
    UnexpectedAnswer,
}

impl SignalError {
    pub fn code(&self) -> ErrorCode {
        ErrorCode::State
    }
}
