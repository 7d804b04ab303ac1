//! Room registry configuration.

use std::time::Duration;

/// Configuration for the room registry.
///
/// Tests shrink the durations to zero instead of sleeping; the defaults
/// are what the demo server runs with.
#[derive(Debug, Clone)]
pub struct RoomConfig {
    /// Length of auto-generated room codes.
    pub code_length: usize,

    /// Length of auto-generated passwords.
    pub password_length: usize,

    /// How long an empty room survives before the sweep deletes it.
    /// Refilling a slot cancels the pending deletion.
    pub empty_grace: Duration,

    /// How many times to retry an auto-generated code on collision
    /// before giving up.
    pub code_retries: usize,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            code_length: 6,
            password_length: 10,
            empty_grace: Duration::from_secs(60),
            code_retries: 8,
        }
    }
}
