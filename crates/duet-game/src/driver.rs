//! Object-safe erasure over [`Game`] so the engine can hold any game
//! behind one trait object.
//!
//! A [`Game`]'s associated types make it non-object-safe; [`Erased`]
//! wraps an implementation and exposes it as a [`GameDriver`] whose state
//! is an opaque `Any` box and whose actions and views are JSON values.

use std::any::Any;

use duet_protocol::{Outcome, Role};
use serde_json::Value;

use crate::{Game, GameError};

/// Opaque, engine-owned game state.
pub type ErasedState = Box<dyn Any + Send + Sync>;

/// What the engine actually drives: a type-erased view of a [`Game`].
pub trait GameDriver: Send + Sync {
    /// Creates the initial erased state.
    fn init(&self, seed: Option<u64>) -> ErasedState;

    /// Deserializes and validates an action without touching the state.
    fn validate(&self, state: &ErasedState, role: Role, action: &Value) -> Result<(), GameError>;

    /// Applies a previously validated action, returning the successor.
    fn apply(&self, state: &ErasedState, role: Role, action: &Value)
    -> Result<ErasedState, GameError>;

    /// Role-scoped JSON projection of the state.
    fn view(&self, state: &ErasedState, role: Role) -> Value;

    /// Win condition. `None` while the game continues.
    fn outcome(&self, state: &ErasedState) -> Option<Outcome>;
}

/// Adapter that erases a typed [`Game`] into a [`GameDriver`].
pub struct Erased<G: Game>(pub G);

impl<G: Game> Erased<G> {
    fn downcast<'a>(&self, state: &'a ErasedState) -> Result<&'a G::State, GameError> {
        state
            .downcast_ref::<G::State>()
            .ok_or_else(|| GameError::Internal("session state has the wrong type".into()))
    }

    fn decode(&self, action: &Value) -> Result<G::Action, GameError> {
        serde_json::from_value(action.clone()).map_err(|e| GameError::BadAction(e.to_string()))
    }
}

impl<G: Game> GameDriver for Erased<G> {
    fn init(&self, seed: Option<u64>) -> ErasedState {
        Box::new(self.0.init(seed))
    }

    fn validate(&self, state: &ErasedState, role: Role, action: &Value) -> Result<(), GameError> {
        let state = self.downcast(state)?;
        let action = self.decode(action)?;
        self.0
            .validate(state, role, &action)
            .map_err(GameError::Rejected)
    }

    fn apply(
        &self,
        state: &ErasedState,
        role: Role,
        action: &Value,
    ) -> Result<ErasedState, GameError> {
        let state = self.downcast(state)?;
        let action = self.decode(action)?;
        Ok(Box::new(self.0.apply(state, role, &action)))
    }

    fn view(&self, state: &ErasedState, role: Role) -> Value {
        let Ok(state) = self.downcast(state) else {
            tracing::error!("view requested with mistyped state");
            return Value::Null;
        };
        match serde_json::to_value(self.0.view(state, role)) {
            Ok(view) => view,
            Err(error) => {
                tracing::error!(%error, "game view failed to serialize");
                Value::Null
            }
        }
    }

    fn outcome(&self, state: &ErasedState) -> Option<Outcome> {
        self.downcast(state).ok().and_then(|s| self.0.outcome(s))
    }
}
