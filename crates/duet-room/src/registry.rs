//! The room session registry: creates, gates, and tears down rooms.
//!
//! The registry is an explicit context object owned by the server state,
//! not a module-level singleton, so tests can build isolated instances.
//! It is the only component allowed to mutate role slots; the game engine
//! and negotiation coordinator resolve roles through it but never write.
//!
//! Events are processed to completion under the registry's exclusive
//! borrow, so no two operations on the same room interleave. The empty-
//! room grace period is an absolute timestamp checked by a periodic
//! sweep, and refilling a slot clears the timestamp — that is the
//! "cancellable timer".

use std::collections::HashMap;
use std::time::Instant;

use duet_protocol::{GameKey, Role, RoomId, ServerEvent};
use duet_transport::ConnectionId;
use tokio::sync::mpsc;

use crate::password::{PasswordHash, generate_password, generate_room_code};
use crate::{FailureVerdict, GuardConfig, RateLimitGuard, RoomConfig, RoomError};

/// Channel for delivering outbound events to one occupant's connection.
///
/// Holding an occupant's sender *is* their broadcast-group membership:
/// dropping it removes them from the group.
pub type EventSender = mpsc::UnboundedSender<ServerEvent>;

/// Longest accepted display name.
const MAX_NAME_LEN: usize = 32;

/// Longest accepted explicitly-requested room code.
const MAX_CODE_LEN: usize = 16;

/// One occupied slot.
#[derive(Debug)]
pub struct Occupant {
    pub conn: ConnectionId,
    pub name: String,
    sender: EventSender,
}

impl Occupant {
    fn send(&self, event: ServerEvent) {
        // Drops silently if the receiver is gone; disconnect cleanup
        // will vacate the slot shortly after.
        let _ = self.sender.send(event);
    }
}

/// Room lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomStatus {
    Open,
    Closed,
}

/// A live room: password gate, two role slots, current game key.
#[derive(Debug)]
pub struct RoomSession {
    id: RoomId,
    password: PasswordHash,
    status: RoomStatus,
    slots: [Option<Occupant>; 2],
    current_game: Option<GameKey>,
    created_at: Instant,
    /// Set when both slots are vacant; cleared when one refills.
    empty_since: Option<Instant>,
}

impl RoomSession {
    pub fn id(&self) -> &RoomId {
        &self.id
    }

    pub fn status(&self) -> RoomStatus {
        self.status
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    pub fn current_game(&self) -> Option<&GameKey> {
        self.current_game.as_ref()
    }

    /// The occupant holding `role`, if any.
    pub fn occupant(&self, role: Role) -> Option<&Occupant> {
        self.slots[role.index()].as_ref()
    }

    /// Which role this connection holds in the room, if any.
    pub fn role_of(&self, conn: ConnectionId) -> Option<Role> {
        for role in [Role::Host, Role::Peer] {
            if self.slots[role.index()]
                .as_ref()
                .is_some_and(|o| o.conn == conn)
            {
                return Some(role);
            }
        }
        None
    }

    pub fn is_full(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }
}

/// Result of a successful `create_room`. The plaintext password leaves
/// the server here and nowhere else.
#[derive(Debug)]
pub struct CreatedRoom {
    pub room_id: RoomId,
    pub invite: String,
    pub password: String,
}

/// Result of a successful `join_room`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    /// The caller is alone; the room waits for its second occupant.
    Waiting { role: Role },
    /// Both slots are now occupied.
    Joined { role: Role, peer_name: String },
}

/// Owns every room and the password guard.
pub struct RoomRegistry {
    rooms: HashMap<RoomId, RoomSession>,
    guard: RateLimitGuard,
    config: RoomConfig,
}

impl RoomRegistry {
    pub fn new(config: RoomConfig, guard_config: GuardConfig) -> Self {
        Self {
            rooms: HashMap::new(),
            guard: RateLimitGuard::new(guard_config),
            config,
        }
    }

    /// Creates a room and seats the caller in the host slot.
    ///
    /// An explicitly requested id is rejected if taken; an auto-generated
    /// code retries on collision. The password is hashed immediately; the
    /// plaintext is only echoed back in the returned `CreatedRoom`.
    pub fn create_room(
        &mut self,
        desired_id: Option<&str>,
        desired_password: Option<&str>,
        display_name: &str,
        conn: ConnectionId,
        sender: EventSender,
    ) -> Result<CreatedRoom, RoomError> {
        let name = validate_display_name(display_name)?;

        let room_id = match desired_id {
            Some(code) => {
                let code = validate_room_code(code)?;
                if self.rooms.contains_key(&code) {
                    return Err(RoomError::IdTaken(code));
                }
                code
            }
            None => self.fresh_room_code()?,
        };

        let password = match desired_password {
            Some(p) if !p.is_empty() => p.to_string(),
            _ => generate_password(self.config.password_length),
        };

        let host = Occupant {
            conn,
            name,
            sender,
        };
        let session = RoomSession {
            id: room_id.clone(),
            password: PasswordHash::new(&password),
            status: RoomStatus::Open,
            slots: [Some(host), None],
            current_game: None,
            created_at: Instant::now(),
            empty_since: None,
        };
        self.rooms.insert(room_id.clone(), session);
        tracing::info!(%room_id, %conn, "room created");

        Ok(CreatedRoom {
            invite: format!("/room/{room_id}"),
            room_id,
            password,
        })
    }

    /// Joins a room through its password gate.
    ///
    /// Order matters: the guard rejects a locked room before any state is
    /// touched; a wrong password feeds the guard; only a verified caller
    /// reaches the closed/full checks and the vacant slot.
    pub fn join_room(
        &mut self,
        id: &RoomId,
        password: &str,
        display_name: &str,
        conn: ConnectionId,
        sender: EventSender,
    ) -> Result<JoinOutcome, RoomError> {
        let name = validate_display_name(display_name)?;

        if let Some(retry_after) = self.guard.is_locked(id) {
            return Err(RoomError::LockedOut { retry_after });
        }

        let room = self
            .rooms
            .get(id)
            .ok_or_else(|| RoomError::NotFound(id.clone()))?;

        if !room.password.verify(password) {
            return match self.guard.record_failure(id) {
                FailureVerdict::Remaining(remaining) => {
                    Err(RoomError::WrongPassword { remaining })
                }
                FailureVerdict::Locked { retry_after } => {
                    Err(RoomError::LockedOut { retry_after })
                }
            };
        }
        self.guard.reset(id);

        let room = self
            .rooms
            .get_mut(id)
            .ok_or_else(|| RoomError::NotFound(id.clone()))?;

        if room.status == RoomStatus::Closed {
            return Err(RoomError::Closed(id.clone()));
        }
        if room.is_full() {
            return Err(RoomError::RoomFull(id.clone()));
        }

        // Peer slot normally; the host slot when a prior disconnect
        // vacated it (the reconnection case).
        let role = if room.occupant(Role::Host).is_none() {
            Role::Host
        } else {
            Role::Peer
        };
        room.slots[role.index()] = Some(Occupant {
            conn,
            name: name.clone(),
            sender,
        });
        room.empty_since = None; // cancels any pending deletion

        tracing::info!(room_id = %id, %conn, %role, "occupant joined");

        match room.occupant(role.other()) {
            Some(other) => {
                other.send(ServerEvent::RoomReady { peer_name: name });
                Ok(JoinOutcome::Joined {
                    role,
                    peer_name: other.name.clone(),
                })
            }
            None => Ok(JoinOutcome::Waiting { role }),
        }
    }

    /// Vacates the caller's slot and notifies the remaining occupant.
    ///
    /// Returns the vacated role so callers can clear per-role state in
    /// the other components. When the room empties, deletion is scheduled
    /// by stamping `empty_since`; the sweep enforces it later.
    pub fn leave_room(&mut self, id: &RoomId, conn: ConnectionId) -> Result<Role, RoomError> {
        let room = self
            .rooms
            .get_mut(id)
            .ok_or_else(|| RoomError::NotFound(id.clone()))?;
        let role = room.role_of(conn).ok_or_else(|| RoomError::NotInRoom(id.clone()))?;

        let Some(departed) = room.slots[role.index()].take() else {
            return Err(RoomError::NotInRoom(id.clone()));
        };
        tracing::info!(room_id = %id, %conn, %role, "occupant left");

        if let Some(other) = room.occupant(role.other()) {
            other.send(ServerEvent::PeerLeft {
                role,
                name: departed.name,
            });
        }
        if room.is_empty() {
            room.empty_since = Some(Instant::now());
            tracing::debug!(room_id = %id, "room empty, grace period started");
        }
        Ok(role)
    }

    /// Treats a dropped connection as leaving every room it occupies.
    ///
    /// Returns the (room, role) pairs vacated so the caller can clear
    /// engine/coordinator state.
    pub fn disconnect(&mut self, conn: ConnectionId) -> Vec<(RoomId, Role)> {
        let occupied: Vec<RoomId> = self
            .rooms
            .values()
            .filter(|room| room.role_of(conn).is_some())
            .map(|room| room.id.clone())
            .collect();

        let mut vacated = Vec::with_capacity(occupied.len());
        for id in occupied {
            if let Ok(role) = self.leave_room(&id, conn) {
                vacated.push((id, role));
            }
        }
        vacated
    }

    /// Host-only: closes and deletes the room immediately (no grace).
    ///
    /// The peer is notified before the room's senders are dropped, which
    /// removes everyone from the broadcast group.
    pub fn close_room(&mut self, id: &RoomId, conn: ConnectionId) -> Result<(), RoomError> {
        let room = self
            .rooms
            .get_mut(id)
            .ok_or_else(|| RoomError::NotFound(id.clone()))?;
        match room.role_of(conn) {
            Some(Role::Host) => {}
            Some(Role::Peer) => return Err(RoomError::NotHost(id.clone())),
            None => return Err(RoomError::NotInRoom(id.clone())),
        }

        // Closed is transient: the room is removed before this call
        // returns, so a later join sees NotFound, never Closed. The
        // status check in join_room is only reachable if deletion ever
        // becomes lazy.
        room.status = RoomStatus::Closed;
        if let Some(peer) = room.occupant(Role::Peer) {
            peer.send(ServerEvent::RoomClosed);
        }
        self.rooms.remove(id);
        tracing::info!(room_id = %id, "room closed by host");
        Ok(())
    }

    /// Deletes rooms that have sat empty past the grace period.
    ///
    /// Returns the deleted ids so the caller can drop the rooms' game
    /// sessions and negotiation state.
    pub fn sweep_expired(&mut self) -> Vec<RoomId> {
        let grace = self.config.empty_grace;
        let now = Instant::now();
        let expired: Vec<RoomId> = self
            .rooms
            .values()
            .filter(|room| {
                room.empty_since
                    .is_some_and(|since| now.duration_since(since) > grace)
            })
            .map(|room| room.id.clone())
            .collect();
        for id in &expired {
            self.rooms.remove(id);
            self.guard.reset(id);
            tracing::info!(room_id = %id, "empty room deleted after grace period");
        }
        expired
    }

    /// Runs the guard's record sweep. Driven by the maintenance task.
    pub fn sweep_guard(&mut self) {
        self.guard.sweep();
    }

    /// Records which game this room last selected.
    pub fn set_current_game(&mut self, id: &RoomId, game: GameKey) {
        if let Some(room) = self.rooms.get_mut(id) {
            room.current_game = Some(game);
        }
    }

    /// Resolves the caller's role in a room.
    pub fn role_of(&self, id: &RoomId, conn: ConnectionId) -> Result<Role, RoomError> {
        let room = self
            .rooms
            .get(id)
            .ok_or_else(|| RoomError::NotFound(id.clone()))?;
        room.role_of(conn).ok_or_else(|| RoomError::NotInRoom(id.clone()))
    }

    /// Sends an event to one occupant. Returns `false` if the slot is
    /// vacant or the room is gone.
    pub fn send_to(&self, id: &RoomId, role: Role, event: ServerEvent) -> bool {
        match self.rooms.get(id).and_then(|room| room.occupant(role)) {
            Some(occupant) => {
                occupant.send(event);
                true
            }
            None => false,
        }
    }

    /// Sends an event to every occupant of a room, in slot order.
    pub fn broadcast(&self, id: &RoomId, event: ServerEvent) {
        if let Some(room) = self.rooms.get(id) {
            for slot in room.slots.iter().flatten() {
                slot.send(event.clone());
            }
        }
    }

    pub fn get(&self, id: &RoomId) -> Option<&RoomSession> {
        self.rooms.get(id)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    fn fresh_room_code(&self) -> Result<RoomId, RoomError> {
        for _ in 0..self.config.code_retries {
            let code = RoomId(generate_room_code(self.config.code_length));
            if !self.rooms.contains_key(&code) {
                return Ok(code);
            }
        }
        // 31^6 codes; exhausting the retries means something is wrong
        // with the RNG or the process is hosting absurdly many rooms.
        Err(RoomError::Invalid("could not allocate a room code".into()))
    }
}

fn validate_display_name(name: &str) -> Result<String, RoomError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(RoomError::Invalid("display name must not be empty".into()));
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(RoomError::Invalid(format!(
            "display name longer than {MAX_NAME_LEN} characters"
        )));
    }
    Ok(trimmed.to_string())
}

fn validate_room_code(code: &str) -> Result<RoomId, RoomError> {
    let trimmed = code.trim();
    if trimmed.is_empty() || trimmed.len() > MAX_CODE_LEN {
        return Err(RoomError::Invalid(
            "room code must be 1-16 characters".into(),
        ));
    }
    if !trimmed.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(RoomError::Invalid(
            "room code must be alphanumeric".into(),
        ));
    }
    Ok(RoomId(trimmed.to_uppercase()))
}
