use std::collections::HashMap;

use duet_protocol::{Role, RoomId, ServerEvent};
use serde_json::Value;

use crate::SignalError;

/// Events a coordinator operation produced, each addressed to one role.
/// The caller resolves roles to connections via the room registry.
pub type SignalEffects = Vec<(Role, ServerEvent)>;

/// Offer/answer progress for a room, modelled as an explicit state
/// machine so the collision policy is auditable: the host is the sole
/// initiator, so "have-remote-offer" never exists server-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// No offer outstanding. The only state that accepts a new offer.
    #[default]
    Stable,
    /// The host's offer was relayed; waiting for the peer's answer.
    AwaitingAnswer,
}

/// Per-room negotiation state.
#[derive(Debug, Default)]
struct Negotiation {
    /// Double-ready handshake flags, indexed by [`Role::index`].
    ready: [bool; 2],
    phase: Phase,
    /// Whether each side holds a remote description: the peer once the
    /// offer is relayed to it, the host once the answer is relayed back.
    /// ICE candidates are held until the destination side is described.
    described: [bool; 2],
    /// Candidates queued per destination role.
    pending: [Vec<Value>; 2],
}

/// Tracks negotiation state for every room and produces the relay
/// events. Owns nothing transport-level; the server delivers.
#[derive(Default)]
pub struct SignalCoordinator {
    rooms: HashMap<RoomId, Negotiation>,
}

impl SignalCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `role` ready to negotiate. Once both occupants are ready, a
    /// `Negotiate` event naming the host as initiator goes to both sides
    /// and the flags reset, so any renegotiation needs a fresh handshake.
    pub fn ready(&mut self, room: &RoomId, role: Role) -> SignalEffects {
        let nego = self.rooms.entry(room.clone()).or_default();
        nego.ready[role.index()] = true;
        if nego.ready != [true, true] {
            return Vec::new();
        }

        nego.ready = [false, false];
        tracing::debug!(%room, "both sides ready, host initiates negotiation");
        let negotiate = ServerEvent::Negotiate {
            initiator: Role::Host,
        };
        vec![
            (Role::Host, negotiate.clone()),
            (Role::Peer, negotiate),
        ]
    }

    /// Relays the host's offer to the peer, then flushes any candidates
    /// that were waiting for the peer to hold a remote description.
    ///
    /// Offers from the peer, and offers while a previous one is still
    /// unanswered, are refused rather than relayed.
    pub fn offer(
        &mut self,
        room: &RoomId,
        from: Role,
        sdp: String,
    ) -> Result<SignalEffects, SignalError> {
        if from != Role::Host {
            return Err(SignalError::NotInitiator);
        }
        let nego = self.rooms.entry(room.clone()).or_default();
        if nego.phase != Phase::Stable {
            return Err(SignalError::OfferCollision);
        }

        nego.phase = Phase::AwaitingAnswer;
        nego.described[Role::Peer.index()] = true;
        let mut effects = vec![(Role::Peer, ServerEvent::RtcOffer { sdp })];
        effects.extend(flush(nego, Role::Peer));
        Ok(effects)
    }

    /// Relays the peer's answer to the host, completing the exchange and
    /// flushing the host-bound candidate queue.
    pub fn answer(
        &mut self,
        room: &RoomId,
        from: Role,
        sdp: String,
    ) -> Result<SignalEffects, SignalError> {
        let nego = self.rooms.entry(room.clone()).or_default();
        if from != Role::Peer || nego.phase != Phase::AwaitingAnswer {
            return Err(SignalError::UnexpectedAnswer);
        }

        nego.phase = Phase::Stable;
        nego.described[Role::Host.index()] = true;
        let mut effects = vec![(Role::Host, ServerEvent::RtcAnswer { sdp })];
        effects.extend(flush(nego, Role::Host));
        Ok(effects)
    }

    /// Relays a candidate to the other occupant, or queues it if that
    /// side does not yet hold a remote description. Queued candidates are
    /// never dropped; they flush, in arrival order, with the description
    /// relay.
    pub fn ice(&mut self, room: &RoomId, from: Role, candidate: Value) -> SignalEffects {
        let nego = self.rooms.entry(room.clone()).or_default();
        let to = from.other();
        if nego.described[to.index()] {
            return vec![(to, ServerEvent::RtcIce { candidate })];
        }
        tracing::trace!(%room, %to, "buffering ICE candidate until description");
        nego.pending[to.index()].push(candidate);
        Vec::new()
    }

    /// Clears a departing occupant's negotiation footprint: readiness,
    /// description flag, and queued candidates. An in-flight offer is
    /// abandoned so a replacement occupant starts from a stable state.
    pub fn participant_left(&mut self, room: &RoomId, role: Role) {
        if let Some(nego) = self.rooms.get_mut(room) {
            nego.ready[role.index()] = false;
            nego.described[role.index()] = false;
            nego.pending[role.index()].clear();
            nego.phase = Phase::Stable;
        }
    }

    /// Drops all state for a deleted room.
    pub fn drop_room(&mut self, room: &RoomId) {
        self.rooms.remove(room);
    }

    /// Current phase, if the room has negotiation state.
    pub fn phase(&self, room: &RoomId) -> Option<Phase> {
        self.rooms.get(room).map(|n| n.phase)
    }
}

fn flush(nego: &mut Negotiation, to: Role) -> SignalEffects {
    std::mem::take(&mut nego.pending[to.index()])
        .into_iter()
        .map(|candidate| (to, ServerEvent::RtcIce { candidate }))
        .collect()
}

// =========================================================================
// Tests
// =========================================================================
