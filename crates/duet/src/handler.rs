//! Per-connection handler: the outbound event pump and client event
//! dispatch.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! Outbound delivery is a separate writer task fed by an unbounded
//! channel; the room registry holds a clone of the channel's sender as
//! the occupant's broadcast-group membership. That way any component can
//! emit to a connection without touching the socket, and delivery order
//! within a room follows acceptance order.

use std::sync::Arc;

use duet_game::{Deliver, Effects};
use duet_protocol::{ClientEvent, Codec, ErrorCode, RoomId, ServerEvent};
use duet_room::{EventSender, JoinOutcome, RoomError, RoomRegistry};
use duet_signal::SignalEffects;
use duet_transport::{Connection, ConnectionId, WebSocketConnection};
use tokio::sync::mpsc;

use crate::DuetError;
use crate::server::ServerState;

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection(
    conn: WebSocketConnection,
    state: Arc<ServerState>,
) -> Result<(), DuetError> {
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    // Outbound pump: everything addressed to this connection funnels
    // through one channel, serialized by one writer task.
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();
    let writer = {
        let conn = conn.clone();
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                let bytes = match state.codec.encode(&event) {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        tracing::error!(error = %e, "failed to encode outbound event");
                        continue;
                    }
                };
                if conn.send(&bytes).await.is_err() {
                    break;
                }
            }
        })
    };

    // Inbound loop: decode, dispatch, repeat until the peer hangs up.
    loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::debug!(%conn_id, "connection closed cleanly");
                break;
            }
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "recv error");
                break;
            }
        };

        let event: ClientEvent = match state.codec.decode(&data) {
            Ok(event) => event,
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "failed to decode client event");
                let _ = tx.send(ServerEvent::error(
                    None,
                    ErrorCode::Validation,
                    "malformed event",
                ));
                continue;
            }
        };

        dispatch(&state, conn_id, &tx, event).await;
    }

    // A dropped connection vacates every slot it held; the vacated roles
    // also lose their negotiation footprint. Game sessions stay until the
    // room itself is swept, so a reconnecting occupant can resume.
    {
        let mut rooms = state.rooms.lock().await;
        let vacated = rooms.disconnect(conn_id);
        if !vacated.is_empty() {
            let mut signals = state.signals.lock().await;
            for (room_id, role) in vacated {
                signals.participant_left(&room_id, role);
            }
        }
    }

    drop(tx);
    let _ = writer.await;
    Ok(())
}

/// Routes one client event to the owning component and delivers the
/// resulting events. Errors go back on the caller's channel only.
async fn dispatch(
    state: &Arc<ServerState>,
    conn_id: ConnectionId,
    tx: &EventSender,
    event: ClientEvent,
) {
    match event {
        ClientEvent::CreateRoom {
            req,
            room_id,
            password,
            display_name,
        } => {
            let result = state.rooms.lock().await.create_room(
                room_id.as_deref(),
                password.as_deref(),
                &display_name,
                conn_id,
                tx.clone(),
            );
            match result {
                Ok(created) => {
                    let _ = tx.send(ServerEvent::RoomCreated {
                        req,
                        room_id: created.room_id,
                        invite: created.invite,
                        password: created.password,
                    });
                }
                Err(e) => send_room_error(tx, Some(req), &e),
            }
        }

        ClientEvent::JoinRoom {
            req,
            room_id,
            password,
            display_name,
        } => {
            let result = state.rooms.lock().await.join_room(
                &room_id,
                &password,
                &display_name,
                conn_id,
                tx.clone(),
            );
            match result {
                Ok(JoinOutcome::Waiting { role }) => {
                    let _ = tx.send(ServerEvent::WaitingForPeer { req, role });
                }
                Ok(JoinOutcome::Joined { role, peer_name }) => {
                    let _ = tx.send(ServerEvent::JoinedRoom {
                        req,
                        role,
                        peer_name,
                    });
                }
                Err(e) => send_room_error(tx, Some(req), &e),
            }
        }

        ClientEvent::LeaveRoom { room_id } => {
            let mut rooms = state.rooms.lock().await;
            match rooms.leave_room(&room_id, conn_id) {
                Ok(role) => {
                    state
                        .signals
                        .lock()
                        .await
                        .participant_left(&room_id, role);
                }
                Err(e) => send_room_error(tx, None, &e),
            }
        }

        ClientEvent::CloseRoom { room_id } => {
            let mut rooms = state.rooms.lock().await;
            match rooms.close_room(&room_id, conn_id) {
                Ok(()) => {
                    state.engine.lock().await.drop_room(&room_id);
                    state.signals.lock().await.drop_room(&room_id);
                    let _ = tx.send(ServerEvent::RoomClosed);
                }
                Err(e) => send_room_error(tx, None, &e),
            }
        }

        ClientEvent::SelectGame { room_id, game } => {
            let mut rooms = state.rooms.lock().await;
            let role = match rooms.role_of(&room_id, conn_id) {
                Ok(role) => role,
                Err(e) => return send_room_error(tx, None, &e),
            };
            let mut engine = state.engine.lock().await;
            match engine.select(&room_id, &game, role) {
                Ok(effects) => {
                    // A peer selection is only a readiness intent; the
                    // room's current game changes when a session starts.
                    if game_started(&effects) {
                        rooms.set_current_game(&room_id, game);
                    }
                    deliver(&rooms, &room_id, effects);
                }
                Err(e) => send_game_error(tx, None, &e),
            }
        }

        ClientEvent::SetReady {
            room_id,
            game,
            ready,
        } => {
            let mut rooms = state.rooms.lock().await;
            let role = match rooms.role_of(&room_id, conn_id) {
                Ok(role) => role,
                Err(e) => return send_room_error(tx, None, &e),
            };
            let mut engine = state.engine.lock().await;
            match engine.set_ready(&room_id, &game, role, ready) {
                Ok(effects) => {
                    if game_started(&effects) {
                        rooms.set_current_game(&room_id, game);
                    }
                    deliver(&rooms, &room_id, effects);
                }
                Err(e) => send_game_error(tx, None, &e),
            }
        }

        ClientEvent::SubmitAction {
            req,
            room_id,
            game,
            action,
        } => {
            let rooms = state.rooms.lock().await;
            let role = match rooms.role_of(&room_id, conn_id) {
                Ok(role) => role,
                Err(e) => return send_room_error(tx, Some(req), &e),
            };
            let mut engine = state.engine.lock().await;
            match engine.action(&room_id, &game, role, &action) {
                Ok((seq, effects)) => {
                    // The ack precedes the state broadcast on the
                    // caller's own connection.
                    let _ = tx.send(ServerEvent::ActionAccepted { req, game, seq });
                    deliver(&rooms, &room_id, effects);
                }
                Err(e) => send_game_error(tx, Some(req), &e),
            }
        }

        ClientEvent::RequestRematch { room_id, game } => {
            let rooms = state.rooms.lock().await;
            let role = match rooms.role_of(&room_id, conn_id) {
                Ok(role) => role,
                Err(e) => return send_room_error(tx, None, &e),
            };
            let mut engine = state.engine.lock().await;
            match engine.rematch(&room_id, &game, role) {
                Ok(effects) => deliver(&rooms, &room_id, effects),
                Err(e) => send_game_error(tx, None, &e),
            }
        }

        ClientEvent::RtcReady { room_id } => {
            let rooms = state.rooms.lock().await;
            let role = match rooms.role_of(&room_id, conn_id) {
                Ok(role) => role,
                Err(e) => return send_room_error(tx, None, &e),
            };
            let effects = state.signals.lock().await.ready(&room_id, role);
            deliver_signal(&rooms, &room_id, effects);
        }

        ClientEvent::RtcOffer { room_id, sdp } => {
            let rooms = state.rooms.lock().await;
            let role = match rooms.role_of(&room_id, conn_id) {
                Ok(role) => role,
                Err(e) => return send_room_error(tx, None, &e),
            };
            match state.signals.lock().await.offer(&room_id, role, sdp) {
                Ok(effects) => deliver_signal(&rooms, &room_id, effects),
                Err(e) => {
                    let _ = tx.send(ServerEvent::error(None, e.code(), e.to_string()));
                }
            }
        }

        ClientEvent::RtcAnswer { room_id, sdp } => {
            let rooms = state.rooms.lock().await;
            let role = match rooms.role_of(&room_id, conn_id) {
                Ok(role) => role,
                Err(e) => return send_room_error(tx, None, &e),
            };
            match state.signals.lock().await.answer(&room_id, role, sdp) {
                Ok(effects) => deliver_signal(&rooms, &room_id, effects),
                Err(e) => {
                    let _ = tx.send(ServerEvent::error(None, e.code(), e.to_string()));
                }
            }
        }

        ClientEvent::RtcIce { room_id, candidate } => {
            let rooms = state.rooms.lock().await;
            let role = match rooms.role_of(&room_id, conn_id) {
                Ok(role) => role,
                Err(e) => return send_room_error(tx, None, &e),
            };
            let effects = state.signals.lock().await.ice(&room_id, role, candidate);
            deliver_signal(&rooms, &room_id, effects);
        }
    }
}

/// Whether an engine operation actually started a session.
fn game_started(effects: &Effects) -> bool {
    effects
        .iter()
        .any(|(_, event)| matches!(event, ServerEvent::GameStarted { .. }))
}

/// Delivers engine effects through the room's occupant senders.
fn deliver(rooms: &RoomRegistry, room_id: &RoomId, effects: Effects) {
    for (audience, event) in effects {
        match audience {
            Deliver::Both => rooms.broadcast(room_id, event),
            Deliver::Only(role) => {
                rooms.send_to(room_id, role, event);
            }
        }
    }
}

/// Delivers coordinator effects, each addressed to a single role.
fn deliver_signal(rooms: &RoomRegistry, room_id: &RoomId, effects: SignalEffects) {
    for (role, event) in effects {
        rooms.send_to(room_id, role, event);
    }
}

/// Maps a room error onto the wire, with the guard's hints attached.
fn send_room_error(tx: &EventSender, req: Option<u64>, error: &RoomError) {
    let mut remaining_attempts = None;
    let mut retry_after_secs = None;
    match error {
        RoomError::WrongPassword { remaining } => remaining_attempts = Some(*remaining),
        RoomError::LockedOut { retry_after } => {
            retry_after_secs = Some(retry_after.as_secs());
        }
        _ => {}
    }
    let _ = tx.send(ServerEvent::Error {
        req,
        code: error.code(),
        message: error.to_string(),
        remaining_attempts,
        retry_after_secs,
    });
}

fn send_game_error(tx: &EventSender, req: Option<u64>, error: &duet_game::GameError) {
    let message = match error {
        // Never leak internal detail; the full error is in the log.
        duet_game::GameError::Internal(detail) => {
            tracing::error!(%detail, "internal game error");
            "internal error".to_string()
        }
        other => other.to_string(),
    };
    let _ = tx.send(ServerEvent::error(req, error.code(), message));
}

// =========================================================================
// Tests
// =========================================================================
