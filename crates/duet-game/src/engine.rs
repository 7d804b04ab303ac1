//! The authoritative session engine.
//!
//! One [`GameSession`] exists per room-game pair. The engine never
//! branches on which game is active: every transition goes through the
//! erased [`GameDriver`] and the validate-then-apply discipline, and the
//! per-session sequence number increments by exactly one per accepted
//! action.
//!
//! Operations return [`Effects`]: the events the caller must deliver,
//! each tagged with its audience. The engine itself never touches the
//! transport, which keeps it directly testable.
//!
//! [`GameDriver`]: crate::GameDriver

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use duet_protocol::{GameKey, Role, RoomId, ServerEvent};
use serde_json::Value;

use crate::driver::ErasedState;
use crate::{GameDriver, GameError, GameRegistry};

/// Audience of one effect event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deliver {
    /// Both occupants of the room.
    Both,
    /// A single role only.
    Only(Role),
}

/// Events an engine operation produced, in delivery order.
pub type Effects = Vec<(Deliver, ServerEvent)>;

/// Lifecycle of a room-game pair. "Awaiting select" is the absence of a
/// session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Created by a peer selection or a rematch; waiting for both ready
    /// flags.
    AwaitingReady,
    Playing,
    /// Outcome reached. The session is kept so a rematch can reuse it.
    Finished,
}

struct GameSession {
    driver: Arc<dyn GameDriver>,
    /// `None` until the first start.
    state: Option<ErasedState>,
    seq: u64,
    /// Readiness flags indexed by [`Role::index`].
    ready: [bool; 2],
    status: SessionStatus,
    /// When the session entered `AwaitingReady`, for the stall sweep.
    pending_since: Option<Instant>,
}

impl GameSession {
    fn awaiting(driver: Arc<dyn GameDriver>) -> Self {
        Self {
            driver,
            state: None,
            seq: 0,
            ready: [false, false],
            status: SessionStatus::AwaitingReady,
            pending_since: Some(Instant::now()),
        }
    }
}

/// Owns every live game session, keyed by room then game.
pub struct GameEngine {
    registry: Arc<GameRegistry>,
    sessions: HashMap<RoomId, HashMap<GameKey, GameSession>>,
}

impl GameEngine {
    pub fn new(registry: Arc<GameRegistry>) -> Self {
        Self {
            registry,
            sessions: HashMap::new(),
        }
    }

    /// Selects a game for the room.
    ///
    /// Host selection is authoritative: the game starts immediately.
    /// Peer selection only records a readiness intent; the game starts
    /// once the host readies too, so neither side can switch games
    /// unilaterally.
    pub fn select(
        &mut self,
        room: &RoomId,
        game: &GameKey,
        role: Role,
    ) -> Result<Effects, GameError> {
        let driver = self
            .registry
            .get(game)
            .ok_or_else(|| GameError::UnknownGame(game.clone()))?;

        if role == Role::Host {
            let mut session = GameSession::awaiting(driver);
            let effects = start(&mut session, game);
            self.room_sessions(room).insert(game.clone(), session);
            tracing::info!(%room, %game, "game started by host selection");
            return Ok(effects);
        }

        let session = self
            .room_sessions(room)
            .entry(game.clone())
            .or_insert_with(|| GameSession::awaiting(driver));
        session.ready[role.index()] = true;
        Ok(vec![(Deliver::Both, ready_state(game, session))])
    }

    /// Toggles the caller's readiness flag, starting the game once both
    /// flags are true.
    pub fn set_ready(
        &mut self,
        room: &RoomId,
        game: &GameKey,
        role: Role,
        ready: bool,
    ) -> Result<Effects, GameError> {
        let driver = self
            .registry
            .get(game)
            .ok_or_else(|| GameError::UnknownGame(game.clone()))?;
        let session = self
            .room_sessions(room)
            .entry(game.clone())
            .or_insert_with(|| GameSession::awaiting(driver));

        if session.status == SessionStatus::Playing {
            return Err(GameError::Rejected("game is already in play".into()));
        }
        session.ready[role.index()] = ready;

        let mut effects = vec![(Deliver::Both, ready_state(game, session))];
        if session.ready == [true, true] {
            effects.extend(start(session, game));
            tracing::info!(%room, %game, "game started, both sides ready");
        }
        Ok(effects)
    }

    /// Validates and applies an action from `role`.
    ///
    /// A rejection leaves the session untouched and is reported only to
    /// the caller. On acceptance the new sequence number is returned for
    /// the caller's acknowledgment, alongside the broadcast effects.
    pub fn action(
        &mut self,
        room: &RoomId,
        game: &GameKey,
        role: Role,
        action: &Value,
    ) -> Result<(u64, Effects), GameError> {
        if !self.registry.is_registered(game) {
            return Err(GameError::UnknownGame(game.clone()));
        }
        let session = self
            .sessions
            .get_mut(room)
            .and_then(|games| games.get_mut(game))
            .ok_or_else(|| GameError::NoSession(game.clone()))?;
        if session.status != SessionStatus::Playing {
            return Err(GameError::NotPlaying(game.clone()));
        }
        let state = session
            .state
            .as_ref()
            .ok_or_else(|| GameError::Internal("playing session has no state".into()))?;

        session.driver.validate(state, role, action)?;
        let next = session.driver.apply(state, role, action)?;
        session.state = Some(next);
        session.seq += 1;

        let state = session
            .state
            .as_ref()
            .ok_or_else(|| GameError::Internal("state vanished after apply".into()))?;
        let mut effects: Effects = [Role::Host, Role::Peer]
            .into_iter()
            .map(|r| {
                (
                    Deliver::Only(r),
                    ServerEvent::GameState {
                        game: game.clone(),
                        seq: session.seq,
                        view: session.driver.view(state, r),
                    },
                )
            })
            .collect();

        if let Some(outcome) = session.driver.outcome(state) {
            session.status = SessionStatus::Finished;
            tracing::info!(%room, %game, ?outcome, seq = session.seq, "game ended");
            effects.push((
                Deliver::Both,
                ServerEvent::GameEnded {
                    game: game.clone(),
                    outcome,
                },
            ));
        }
        Ok((session.seq, effects))
    }

    /// Requests a rematch of a finished game: readiness resets to
    /// (caller, not-other) and the start path is re-entered via
    /// [`set_ready`].
    ///
    /// [`set_ready`]: GameEngine::set_ready
    pub fn rematch(
        &mut self,
        room: &RoomId,
        game: &GameKey,
        role: Role,
    ) -> Result<Effects, GameError> {
        let session = self
            .sessions
            .get_mut(room)
            .and_then(|games| games.get_mut(game))
            .ok_or_else(|| GameError::NoSession(game.clone()))?;
        if session.status != SessionStatus::Finished {
            return Err(GameError::NotFinished(game.clone()));
        }

        session.status = SessionStatus::AwaitingReady;
        session.pending_since = Some(Instant::now());
        session.ready = [false, false];
        session.ready[role.index()] = true;

        Ok(vec![
            (
                Deliver::Both,
                ServerEvent::RematchRequested {
                    game: game.clone(),
                    by: role,
                },
            ),
            (Deliver::Both, ready_state(game, session)),
        ])
    }

    /// Removes sessions stuck in `AwaitingReady` longer than `timeout`,
    /// returning them to the selection state. Returns the removed pairs
    /// so the caller can notify the rooms.
    pub fn sweep_stalled(&mut self, timeout: Duration) -> Vec<(RoomId, GameKey)> {
        let mut stalled = Vec::new();
        for (room, games) in &mut self.sessions {
            games.retain(|game, session| {
                let stuck = session.status == SessionStatus::AwaitingReady
                    && session
                        .pending_since
                        .is_some_and(|since| since.elapsed() >= timeout);
                if stuck {
                    stalled.push((room.clone(), game.clone()));
                }
                !stuck
            });
        }
        self.sessions.retain(|_, games| !games.is_empty());
        if !stalled.is_empty() {
            tracing::debug!(count = stalled.len(), "dropped stalled ready handshakes");
        }
        stalled
    }

    /// Drops every session belonging to a deleted room.
    pub fn drop_room(&mut self, room: &RoomId) {
        self.sessions.remove(room);
    }

    /// Status of the room-game pair, if a session exists.
    pub fn status(&self, room: &RoomId, game: &GameKey) -> Option<SessionStatus> {
        self.sessions
            .get(room)
            .and_then(|games| games.get(game))
            .map(|session| session.status)
    }

    fn room_sessions(&mut self, room: &RoomId) -> &mut HashMap<GameKey, GameSession> {
        self.sessions.entry(room.clone()).or_default()
    }
}

/// Initializes state and produces the per-role start events. Readiness
/// flags are consumed so a later restart needs a fresh handshake.
fn start(session: &mut GameSession, game: &GameKey) -> Effects {
    session.state = Some(session.driver.init(None));
    session.seq = 0;
    session.status = SessionStatus::Playing;
    session.ready = [false, false];
    session.pending_since = None;

    let Some(state) = session.state.as_ref() else {
        return Vec::new();
    };
    [Role::Host, Role::Peer]
        .into_iter()
        .map(|role| {
            (
                Deliver::Only(role),
                ServerEvent::GameStarted {
                    game: game.clone(),
                    seq: 0,
                    view: session.driver.view(state, role),
                },
            )
        })
        .collect()
}

fn ready_state(game: &GameKey, session: &GameSession) -> ServerEvent {
    ServerEvent::ReadyState {
        game: game.clone(),
        host_ready: session.ready[Role::Host.index()],
        peer_ready: session.ready[Role::Peer.index()],
    }
}
