use std::collections::HashMap;
use std::sync::Arc;

use duet_protocol::GameKey;

use crate::driver::Erased;
use crate::games::{Lockstep, TicTacToe};
use crate::{Game, GameDriver};

/// Maps game keys to their implementations.
///
/// Built once at startup and shared immutably; registering the same key
/// twice replaces the earlier entry, which is how tests install doubles.
#[derive(Default)]
pub struct GameRegistry {
    drivers: HashMap<GameKey, Arc<dyn GameDriver>>,
}

impl GameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the bundled games.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register("tictactoe", TicTacToe);
        registry.register("lockstep", Lockstep::default());
        registry
    }

    /// Registers a game under `key`, replacing any existing entry.
    pub fn register<G: Game>(&mut self, key: impl Into<GameKey>, game: G) {
        self.drivers.insert(key.into(), Arc::new(Erased(game)));
    }

    pub fn is_registered(&self, key: &GameKey) -> bool {
        self.drivers.contains_key(key)
    }

    pub fn get(&self, key: &GameKey) -> Option<Arc<dyn GameDriver>> {
        self.drivers.get(key).cloned()
    }

    pub fn keys(&self) -> impl Iterator<Item = &GameKey> {
        self.drivers.keys()
    }

    pub fn len(&self) -> usize {
        self.drivers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty()
    }
}
