//! Integration tests for the room registry: slot discipline, the
//! password gate with its lockout, and the empty-room grace sweep.

use std::time::Duration;

use duet_protocol::{Role, RoomId, ServerEvent};
use duet_room::{
    EventSender, GuardConfig, JoinOutcome, RoomConfig, RoomError, RoomRegistry,
};
use duet_transport::ConnectionId;
use tokio::sync::mpsc::{self, UnboundedReceiver};

// =========================================================================
// Helpers
// =========================================================================

fn cid(id: u64) -> ConnectionId {
    ConnectionId::new(id)
}

fn channel() -> (EventSender, UnboundedReceiver<ServerEvent>) {
    mpsc::unbounded_channel()
}

fn registry() -> RoomRegistry {
    RoomRegistry::new(RoomConfig::default(), GuardConfig::default())
}

/// Registry whose empty rooms expire on the next sweep (zero grace).
fn registry_with_instant_expiry() -> RoomRegistry {
    RoomRegistry::new(
        RoomConfig {
            empty_grace: Duration::ZERO,
            ..RoomConfig::default()
        },
        GuardConfig::default(),
    )
}

/// Creates a room with a fixed id/password and a host named "ada".
/// Returns the host's event receiver.
fn create_r1(reg: &mut RoomRegistry) -> UnboundedReceiver<ServerEvent> {
    let (tx, rx) = channel();
    reg.create_room(Some("R1"), Some("Passw0rd!"), "ada", cid(1), tx)
        .expect("create should succeed");
    rx
}

fn r1() -> RoomId {
    RoomId::from("R1")
}

// =========================================================================
// create_room
// =========================================================================

#[test]
fn test_create_room_seats_caller_as_host() {
    let mut reg = registry();
    let (tx, _rx) = channel();
    let created = reg
        .create_room(None, None, "ada", cid(1), tx)
        .expect("create should succeed");

    assert_eq!(created.room_id.as_str().len(), 6);
    assert_eq!(created.invite, format!("/room/{}", created.room_id));
    assert_eq!(created.password.len(), 10);
    assert_eq!(reg.role_of(&created.room_id, cid(1)).unwrap(), Role::Host);
}

#[test]
fn test_create_room_echoes_explicit_password_once() {
    let mut reg = registry();
    let (tx, _rx) = channel();
    let created = reg
        .create_room(Some("R1"), Some("Passw0rd!"), "ada", cid(1), tx)
        .expect("create should succeed");
    assert_eq!(created.password, "Passw0rd!");
    assert_eq!(created.room_id, r1());
}

#[test]
fn test_create_room_rejects_taken_id() {
    let mut reg = registry();
    let _host_rx = create_r1(&mut reg);

    let (tx, _rx) = channel();
    let result = reg.create_room(Some("R1"), None, "bob", cid(2), tx);
    assert!(matches!(result, Err(RoomError::IdTaken(id)) if id == r1()));
}

#[test]
fn test_create_room_rejects_empty_display_name() {
    let mut reg = registry();
    let (tx, _rx) = channel();
    let result = reg.create_room(None, None, "   ", cid(1), tx);
    assert!(matches!(result, Err(RoomError::Invalid(_))));
}

#[test]
fn test_create_room_uppercases_requested_code() {
    let mut reg = registry();
    let (tx, _rx) = channel();
    let created = reg
        .create_room(Some("cozy-den"), None, "ada", cid(1), tx)
        .expect("create should succeed");
    assert_eq!(created.room_id, RoomId::from("COZY-DEN"));
}

// =========================================================================
// join_room: password gate
// =========================================================================

#[test]
fn test_join_wrong_password_reports_remaining_attempts() {
    let mut reg = registry();
    let _host_rx = create_r1(&mut reg);

    let (tx, _rx) = channel();
    let result = reg.join_room(&r1(), "wrong", "grace", cid(2), tx);
    assert!(matches!(
        result,
        Err(RoomError::WrongPassword { remaining: 4 })
    ));
}

#[test]
fn test_fifth_wrong_password_locks_room() {
    let mut reg = registry();
    let _host_rx = create_r1(&mut reg);

    for _ in 0..4 {
        let (tx, _rx) = channel();
        let _ = reg.join_room(&r1(), "wrong", "grace", cid(2), tx);
    }
    let (tx, _rx) = channel();
    let result = reg.join_room(&r1(), "wrong", "grace", cid(2), tx);
    assert!(matches!(result, Err(RoomError::LockedOut { .. })));
}

#[test]
fn test_locked_room_rejects_even_the_correct_password() {
    // Five wrong guesses, then the right one: still locked out.
    let mut reg = registry();
    let _host_rx = create_r1(&mut reg);

    for _ in 0..5 {
        let (tx, _rx) = channel();
        let _ = reg.join_room(&r1(), "wrong", "grace", cid(2), tx);
    }
    let (tx, _rx) = channel();
    let result = reg.join_room(&r1(), "Passw0rd!", "grace", cid(2), tx);
    let Err(RoomError::LockedOut { retry_after }) = result else {
        panic!("expected LockedOut, got {result:?}");
    };
    assert!(retry_after > Duration::from_secs(14 * 60));
}

#[test]
fn test_successful_auth_resets_failure_counter() {
    let mut reg = registry();
    let _host_rx = create_r1(&mut reg);

    for _ in 0..4 {
        let (tx, _rx) = channel();
        let _ = reg.join_room(&r1(), "wrong", "grace", cid(2), tx);
    }
    // One attempt left; a correct password resets the counter.
    let (tx, _rx) = channel();
    reg.join_room(&r1(), "Passw0rd!", "grace", cid(2), tx)
        .expect("correct password should succeed");
    reg.leave_room(&r1(), cid(2)).expect("leave should succeed");

    // Four more wrong guesses fit before the threshold again.
    for _ in 0..4 {
        let (tx, _rx) = channel();
        let result = reg.join_room(&r1(), "wrong", "grace", cid(3), tx);
        assert!(matches!(result, Err(RoomError::WrongPassword { .. })));
    }
}

#[test]
fn test_join_unknown_room_returns_not_found() {
    let mut reg = registry();
    let (tx, _rx) = channel();
    let result = reg.join_room(&RoomId::from("NOPE"), "pw", "grace", cid(2), tx);
    assert!(matches!(result, Err(RoomError::NotFound(_))));
}

// =========================================================================
// join_room: slots
// =========================================================================

#[test]
fn test_join_fills_peer_slot_and_notifies_host() {
    let mut reg = registry();
    let mut host_rx = create_r1(&mut reg);

    let (tx, _rx) = channel();
    let outcome = reg
        .join_room(&r1(), "Passw0rd!", "grace", cid(2), tx)
        .expect("join should succeed");
    assert_eq!(
        outcome,
        JoinOutcome::Joined {
            role: Role::Peer,
            peer_name: "ada".into()
        }
    );

    let notified = host_rx.try_recv().expect("host should be notified");
    assert_eq!(
        notified,
        ServerEvent::RoomReady {
            peer_name: "grace".into()
        }
    );
}

#[test]
fn test_third_join_returns_capacity_error() {
    let mut reg = registry();
    let _host_rx = create_r1(&mut reg);
    let (tx, _rx) = channel();
    reg.join_room(&r1(), "Passw0rd!", "grace", cid(2), tx)
        .expect("second join should succeed");

    let (tx, _rx) = channel();
    let result = reg.join_room(&r1(), "Passw0rd!", "carl", cid(3), tx);
    assert!(matches!(result, Err(RoomError::RoomFull(_))));
}

#[test]
fn test_rejoin_after_host_disconnect_takes_host_slot() {
    let mut reg = registry();
    let _host_rx = create_r1(&mut reg);
    let (tx, _rx) = channel();
    reg.join_room(&r1(), "Passw0rd!", "grace", cid(2), tx)
        .expect("join should succeed");

    // Host drops; the vacated slot is the host slot.
    assert_eq!(reg.disconnect(cid(1)), vec![(r1(), Role::Host)]);

    let (tx, _rx) = channel();
    let outcome = reg
        .join_room(&r1(), "Passw0rd!", "ada", cid(4), tx)
        .expect("rejoin should succeed");
    assert_eq!(
        outcome,
        JoinOutcome::Joined {
            role: Role::Host,
            peer_name: "grace".into()
        }
    );
}

// =========================================================================
// leave / disconnect / close
// =========================================================================

#[test]
fn test_leave_notifies_remaining_occupant() {
    let mut reg = registry();
    let mut host_rx = create_r1(&mut reg);
    let (tx, _rx) = channel();
    reg.join_room(&r1(), "Passw0rd!", "grace", cid(2), tx)
        .expect("join should succeed");
    host_rx.try_recv().expect("drain RoomReady");

    reg.leave_room(&r1(), cid(2)).expect("leave should succeed");
    let notified = host_rx.try_recv().expect("host should see PeerLeft");
    assert_eq!(
        notified,
        ServerEvent::PeerLeft {
            role: Role::Peer,
            name: "grace".into()
        }
    );
}

#[test]
fn test_leave_by_non_member_is_rejected() {
    let mut reg = registry();
    let _host_rx = create_r1(&mut reg);
    let result = reg.leave_room(&r1(), cid(9));
    assert!(matches!(result, Err(RoomError::NotInRoom(_))));
}

#[test]
fn test_close_room_requires_host() {
    let mut reg = registry();
    let _host_rx = create_r1(&mut reg);
    let (tx, _rx) = channel();
    reg.join_room(&r1(), "Passw0rd!", "grace", cid(2), tx)
        .expect("join should succeed");

    let result = reg.close_room(&r1(), cid(2));
    assert!(matches!(result, Err(RoomError::NotHost(_))));
    assert_eq!(reg.room_count(), 1);
}

#[test]
fn test_close_room_notifies_peer_and_deletes_immediately() {
    let mut reg = registry();
    let _host_rx = create_r1(&mut reg);
    let (tx, mut peer_rx) = channel();
    reg.join_room(&r1(), "Passw0rd!", "grace", cid(2), tx)
        .expect("join should succeed");

    reg.close_room(&r1(), cid(1)).expect("close should succeed");
    assert_eq!(peer_rx.try_recv().expect("peer notified"), ServerEvent::RoomClosed);
    assert_eq!(reg.room_count(), 0);

    let (tx, _rx) = channel();
    let result = reg.join_room(&r1(), "Passw0rd!", "carl", cid(3), tx);
    assert!(matches!(result, Err(RoomError::NotFound(_))));
}

// =========================================================================
// Grace period sweep
// =========================================================================

#[test]
fn test_empty_room_is_deleted_after_grace() {
    let mut reg = registry_with_instant_expiry();
    let _host_rx = create_r1(&mut reg);
    let (tx, _rx) = channel();
    reg.join_room(&r1(), "Passw0rd!", "grace", cid(2), tx)
        .expect("join should succeed");

    // Peer disconnects, grace elapses with no reconnection, host leaves.
    reg.disconnect(cid(2));
    reg.disconnect(cid(1));

    let deleted = reg.sweep_expired();
    assert_eq!(deleted, vec![r1()]);

    let (tx, _rx) = channel();
    let result = reg.join_room(&r1(), "Passw0rd!", "dana", cid(3), tx);
    assert!(matches!(result, Err(RoomError::NotFound(_))));
}

#[test]
fn test_refilling_a_slot_cancels_pending_deletion() {
    let mut reg = registry_with_instant_expiry();
    let _host_rx = create_r1(&mut reg);

    reg.disconnect(cid(1)); // room is now empty
    let (tx, _rx) = channel();
    reg.join_room(&r1(), "Passw0rd!", "ada", cid(4), tx)
        .expect("rejoin within grace should succeed");

    assert!(reg.sweep_expired().is_empty(), "refilled room must survive");
    assert_eq!(reg.room_count(), 1);
}

#[test]
fn test_occupied_room_never_expires() {
    let mut reg = registry_with_instant_expiry();
    let _host_rx = create_r1(&mut reg);
    assert!(reg.sweep_expired().is_empty());
    assert_eq!(reg.room_count(), 1);
}
