//! The `Game` trait — the contract every bundled game implements.

use duet_protocol::{Outcome, Role};
use serde::{Serialize, de::DeserializeOwned};

/// A pluggable game: a pure value transformer over its own state type.
///
/// Implementations must not perform I/O, reference the transport, or
/// mutate shared state — the engine owns the authoritative copy and only
/// ever replaces it with the result of a validate-then-apply pair.
///
/// Associated types keep each game's state strongly typed internally;
/// the engine sees them erased behind [`GameDriver`], and actions/views
/// cross the wire as JSON.
///
/// [`GameDriver`]: crate::GameDriver
pub trait Game: Send + Sync + 'static {
    /// Authoritative state, shaped entirely by the game.
    type State: Clone + Send + Sync + 'static;

    /// What a client may submit.
    type Action: Serialize + DeserializeOwned + Send;

    /// Role-scoped projection of the state. Must omit anything hidden
    /// from that role (an opponent's secret word, say).
    type View: Serialize;

    /// Creates the initial state. `seed` is provided for games with
    /// random setup so rematches can be made deterministic in tests.
    fn init(&self, seed: Option<u64>) -> Self::State;

    /// Checks an action against the current state.
    ///
    /// Returning `Err` rejects the action with the given reason; the
    /// engine then guarantees `apply` is not invoked and the state is
    /// unchanged. Turn-based games reject out-of-turn actions here;
    /// cooperative games never look at the sender's role.
    fn validate(&self, state: &Self::State, role: Role, action: &Self::Action)
    -> Result<(), String>;

    /// Produces the successor state for a validated action. Pure: the
    /// input state is only read.
    fn apply(&self, state: &Self::State, role: Role, action: &Self::Action) -> Self::State;

    /// Projects the state for one role. Idempotent and side-effect free.
    fn view(&self, state: &Self::State, role: Role) -> Self::View;

    /// Evaluates the win condition. `None` while the game continues.
    fn outcome(&self, state: &Self::State) -> Option<Outcome>;
}
