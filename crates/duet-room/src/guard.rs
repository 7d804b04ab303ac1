//! Password/rate-limit guard: per-room failure counter and lockout clock.
//!
//! Keyed by room id, not by caller identity — the room is the contended
//! resource, and an attacker can trivially rotate connections. A lockout
//! is an absolute deadline compared at read time; no timer task is held
//! for its duration.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use duet_protocol::RoomId;

/// Configuration for the guard.
#[derive(Debug, Clone)]
pub struct GuardConfig {
    /// Failures within the window that trigger a lockout.
    pub max_attempts: u32,

    /// Sliding window; the counter resets once this much time passes
    /// since the last attempt.
    pub window: Duration,

    /// How long a triggered lockout lasts.
    pub lockout: Duration,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            window: Duration::from_secs(5 * 60),
            lockout: Duration::from_secs(15 * 60),
        }
    }
}

/// What `record_failure` decided for this attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureVerdict {
    /// Still below the threshold; this many attempts remain.
    Remaining(u32),
    /// Threshold reached; the room is now locked for `retry_after`.
    Locked { retry_after: Duration },
}

#[derive(Debug)]
struct AttemptRecord {
    attempts: u32,
    last_attempt: Instant,
    locked_until: Option<Instant>,
}

/// Per-room failure counter and lockout clock.
///
/// The caller holds the registry's exclusive borrow while invoking
/// `record_failure`, so increment-and-compare is a single atomic unit:
/// two concurrent failures for one room cannot both observe "below
/// threshold".
#[derive(Debug)]
pub struct RateLimitGuard {
    records: HashMap<RoomId, AttemptRecord>,
    config: GuardConfig,
}

impl RateLimitGuard {
    pub fn new(config: GuardConfig) -> Self {
        Self {
            records: HashMap::new(),
            config,
        }
    }

    /// Returns the remaining lockout duration while the stored deadline
    /// is in the future, `None` otherwise.
    pub fn is_locked(&self, id: &RoomId) -> Option<Duration> {
        let record = self.records.get(id)?;
        let deadline = record.locked_until?;
        deadline.checked_duration_since(Instant::now())
    }

    /// Records a failed password attempt for this room.
    ///
    /// If the sliding window has elapsed since the last attempt the
    /// counter resets first. Reaching the threshold sets the lockout
    /// deadline and reports it.
    pub fn record_failure(&mut self, id: &RoomId) -> FailureVerdict {
        let now = Instant::now();
        let record = self.records.entry(id.clone()).or_insert(AttemptRecord {
            attempts: 0,
            last_attempt: now,
            locked_until: None,
        });

        if now.duration_since(record.last_attempt) > self.config.window {
            record.attempts = 0;
            record.locked_until = None;
        }

        record.attempts += 1;
        record.last_attempt = now;

        if record.attempts >= self.config.max_attempts {
            record.locked_until = Some(now + self.config.lockout);
            tracing::warn!(room_id = %id, attempts = record.attempts, "room locked out");
            FailureVerdict::Locked {
                retry_after: self.config.lockout,
            }
        } else {
            FailureVerdict::Remaining(self.config.max_attempts - record.attempts)
        }
    }

    /// Clears the room's counter after any successful authentication.
    pub fn reset(&mut self, id: &RoomId) {
        self.records.remove(id);
    }

    /// Drops records whose window and lockout have both expired,
    /// bounding memory use. Run periodically by the maintenance task.
    pub fn sweep(&mut self) {
        let now = Instant::now();
        let window = self.config.window;
        self.records.retain(|_, record| {
            let window_active = now.duration_since(record.last_attempt) <= window;
            let lockout_active = record.locked_until.is_some_and(|until| until > now);
            window_active || lockout_active
        });
    }

    /// Number of rooms currently tracked (for tests and metrics logs).
    pub fn record_count(&self) -> usize {
        self.records.len()
    }
}

// =========================================================================
// Tests
// =========================================================================
