//! Client and server event types.
//!
//! Internally tagged (`{"type": "JoinRoom", ...}`) so the JS client can
//! switch on a single field. Three request events — `CreateRoom`,
//! `JoinRoom`, `SubmitAction` — carry a client-chosen `req` id and are
//! answered by exactly one ack event (or an [`ServerEvent::Error`]) that
//! echoes it. Everything else is fire-and-forget from the client's side.
//!
//! Errors are only ever delivered to the connection that caused them;
//! broadcast events describe successful state transitions exclusively.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{ErrorCode, GameKey, Outcome, Role, RoomId};

// ---------------------------------------------------------------------------
// ClientEvent
// ---------------------------------------------------------------------------

/// Everything a client can send.
///
/// Room-scoped events name their room explicitly rather than relying on
/// per-connection implicit state, so a future multi-room client needs no
/// protocol change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    /// Create a room and occupy its host slot.
    ///
    /// `room_id` and `password` are optional requests; the server
    /// generates both when absent. The plaintext password is returned
    /// once, in the ack.
    CreateRoom {
        req: u64,
        room_id: Option<String>,
        password: Option<String>,
        display_name: String,
    },

    /// Join an existing room through its password gate.
    JoinRoom {
        req: u64,
        room_id: RoomId,
        password: String,
        display_name: String,
    },

    /// Vacate the caller's slot. Also implied by a dropped connection.
    LeaveRoom { room_id: RoomId },

    /// Host only: close the room for good.
    CloseRoom { room_id: RoomId },

    /// Pick a game. Authoritative when sent by the host; a readiness
    /// intent when sent by the peer.
    SelectGame { room_id: RoomId, game: GameKey },

    /// Toggle the caller's readiness for a game.
    SetReady {
        room_id: RoomId,
        game: GameKey,
        ready: bool,
    },

    /// Submit a game action. The `action` payload is opaque to the
    /// coordination layer; only the matching game logic interprets it.
    SubmitAction {
        req: u64,
        room_id: RoomId,
        game: GameKey,
        action: Value,
    },

    /// Ask for a rematch of a finished game.
    RequestRematch { room_id: RoomId, game: GameKey },

    /// Caller is ready to (re)negotiate the direct media channel.
    RtcReady { room_id: RoomId },

    /// Session description offer, relayed verbatim to the other occupant.
    RtcOffer { room_id: RoomId, sdp: String },

    /// Session description answer, relayed verbatim.
    RtcAnswer { room_id: RoomId, sdp: String },

    /// ICE candidate, relayed (possibly after buffering). Opaque payload.
    RtcIce { room_id: RoomId, candidate: Value },
}

// ---------------------------------------------------------------------------
// ServerEvent
// ---------------------------------------------------------------------------

/// Everything the server can send.
///
/// Acks (`RoomCreated`, `JoinedRoom`, `WaitingForPeer`, `ActionAccepted`,
/// `Error`) go only to the requester. The rest are room broadcasts, and
/// within one room they are delivered in acceptance order — `seq` is the
/// authoritative marker clients use to discard stale game state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    // -- Acks --
    /// Reply to `CreateRoom`. The only time the plaintext password leaves
    /// the server.
    RoomCreated {
        req: u64,
        room_id: RoomId,
        invite: String,
        password: String,
    },

    /// Reply to `JoinRoom` when the room is now fully occupied.
    JoinedRoom {
        req: u64,
        role: Role,
        peer_name: String,
    },

    /// Reply to `JoinRoom` when the caller is alone in the room.
    WaitingForPeer { req: u64, role: Role },

    /// Reply to `SubmitAction` on acceptance. The new state itself
    /// arrives via the `GameState` broadcast.
    ActionAccepted { req: u64, game: GameKey, seq: u64 },

    /// Any per-request failure. Never broadcast.
    Error {
        req: Option<u64>,
        code: ErrorCode,
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        remaining_attempts: Option<u32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        retry_after_secs: Option<u64>,
    },

    // -- Room broadcasts --
    /// Sent to the waiting occupant when the second slot fills.
    RoomReady { peer_name: String },

    /// An occupant vacated their slot (leave or disconnect).
    PeerLeft { role: Role, name: String },

    /// The host closed the room; it no longer exists.
    RoomClosed,

    // -- Game broadcasts (views are per-role, so "broadcast" means one
    //    event per occupant with that occupant's view) --
    /// A game session entered the playing state.
    GameStarted { game: GameKey, seq: u64, view: Value },

    /// Authoritative state after an accepted action.
    GameState { game: GameKey, seq: u64, view: Value },

    /// The game produced an outcome; the session is finished.
    GameEnded { game: GameKey, outcome: Outcome },

    /// Combined readiness flags changed.
    ReadyState {
        game: GameKey,
        host_ready: bool,
        peer_ready: bool,
    },

    /// One side asked for a rematch and is marked ready.
    RematchRequested { game: GameKey, by: Role },

    // -- Signaling --
    /// Both sides signalled readiness: the named initiator (always the
    /// host) should create an offer now.
    Negotiate { initiator: Role },

    /// Relayed offer from the other occupant.
    RtcOffer { sdp: String },

    /// Relayed answer from the other occupant.
    RtcAnswer { sdp: String },

    /// Relayed (possibly previously buffered) ICE candidate.
    RtcIce { candidate: Value },
}

impl ServerEvent {
    /// Shorthand for a plain error without rate-limit hints.
    pub fn error(req: Option<u64>, code: ErrorCode, message: impl Into<String>) -> Self {
        ServerEvent::Error {
            req,
            code,
            message: message.into(),
            remaining_attempts: None,
            retry_after_secs: None,
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! JSON-shape tests: the client SDK parses these exact layouts, so a
    //! serde attribute regression would break it silently otherwise.

    use super::*;

    #[test]
    fn test_create_room_json_format() {
        let ev = ClientEvent::CreateRoom {
            req: 1,
            room_id: None,
            password: Some("Passw0rd!".into()),
            display_name: "ada".into(),
        };
        let json: serde_json::Value = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["type"], "CreateRoom");
        assert_eq!(json["req"], 1);
        assert!(json["room_id"].is_null());
        assert_eq!(json["password"], "Passw0rd!");
        assert_eq!(json["display_name"], "ada");
    }

    #[test]
    fn test_join_room_round_trip() {
        let ev = ClientEvent::JoinRoom {
            req: 7,
            room_id: RoomId::from("AB12CD"),
            password: "hunter2".into(),
            display_name: "grace".into(),
        };
        let bytes = serde_json::to_vec(&ev).unwrap();
        let decoded: ClientEvent = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(ev, decoded);
    }

    #[test]
    fn test_submit_action_carries_opaque_payload() {
        let ev = ClientEvent::SubmitAction {
            req: 3,
            room_id: RoomId::from("AB12CD"),
            game: GameKey::from("tictactoe"),
            action: serde_json::json!({ "cell": 4 }),
        };
        let json: serde_json::Value = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["type"], "SubmitAction");
        assert_eq!(json["action"]["cell"], 4);
    }

    #[test]
    fn test_rtc_ice_round_trip() {
        let ev = ClientEvent::RtcIce {
            room_id: RoomId::from("AB12CD"),
            candidate: serde_json::json!({
                "candidate": "candidate:1 1 UDP 2122252543 10.0.0.2 55555 typ host",
                "sdpMLineIndex": 0
            }),
        };
        let bytes = serde_json::to_vec(&ev).unwrap();
        let decoded: ClientEvent = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(ev, decoded);
    }

    #[test]
    fn test_room_created_json_format() {
        let ev = ServerEvent::RoomCreated {
            req: 1,
            room_id: RoomId::from("K7Q2XF"),
            invite: "/room/K7Q2XF".into(),
            password: "x9k2mq41pz".into(),
        };
        let json: serde_json::Value = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["type"], "RoomCreated");
        assert_eq!(json["room_id"], "K7Q2XF");
        assert_eq!(json["invite"], "/room/K7Q2XF");
    }

    #[test]
    fn test_error_omits_absent_hints() {
        let ev = ServerEvent::error(Some(2), ErrorCode::State, "room is closed");
        let json: serde_json::Value = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["type"], "Error");
        assert_eq!(json["code"], "state");
        assert!(json.get("remaining_attempts").is_none());
        assert!(json.get("retry_after_secs").is_none());
    }

    #[test]
    fn test_error_carries_rate_limit_hints() {
        let ev = ServerEvent::Error {
            req: Some(5),
            code: ErrorCode::RateLimit,
            message: "room is locked".into(),
            remaining_attempts: None,
            retry_after_secs: Some(900),
        };
        let json: serde_json::Value = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["code"], "rate_limit");
        assert_eq!(json["retry_after_secs"], 900);
    }

    #[test]
    fn test_room_closed_is_unit_variant() {
        let json: serde_json::Value =
            serde_json::to_value(ServerEvent::RoomClosed).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "RoomClosed" }));
    }

    #[test]
    fn test_game_state_round_trip() {
        let ev = ServerEvent::GameState {
            game: GameKey::from("tictactoe"),
            seq: 12,
            view: serde_json::json!({
                "board": [null, null, null, null, null, null, null, null, null]
            }),
        };
        let bytes = serde_json::to_vec(&ev).unwrap();
        let decoded: ServerEvent = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(ev, decoded);
    }

    #[test]
    fn test_game_ended_json_format() {
        let ev = ServerEvent::GameEnded {
            game: GameKey::from("tictactoe"),
            outcome: Outcome::Winner { role: Role::Host },
        };
        let json: serde_json::Value = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["type"], "GameEnded");
        assert_eq!(json["outcome"]["kind"], "winner");
        assert_eq!(json["outcome"]["role"], "host");
    }

    #[test]
    fn test_negotiate_names_initiator() {
        let json: serde_json::Value =
            serde_json::to_value(ServerEvent::Negotiate { initiator: Role::Host })
                .unwrap();
        assert_eq!(json["type"], "Negotiate");
        assert_eq!(json["initiator"], "host");
    }

    #[test]
    fn test_decode_unknown_type_returns_error() {
        let unknown = r#"{"type": "TeleportPlayer", "x": 3}"#;
        let result: Result<ClientEvent, _> = serde_json::from_str(unknown);
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_garbage_returns_error() {
        let result: Result<ClientEvent, _> =
            serde_json::from_slice(b"not json at all");
        assert!(result.is_err());
    }
}
