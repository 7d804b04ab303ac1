use duet_protocol::{Outcome, Role};
use serde::{Deserialize, Serialize};

use crate::Game;

/// Cooperative counter: either side may step at any time, and the game
/// finishes for both once the shared count reaches the target.
///
/// Deliberately role-agnostic, so it exercises the engine path where the
/// game imposes no turn order.
pub struct Lockstep {
    pub target: u32,
}

impl Default for Lockstep {
    fn default() -> Self {
        Self { target: 10 }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Count {
    count: u32,
    target: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Step {
    pub amount: u32,
}

impl Game for Lockstep {
    type State = Count;
    type Action = Step;
    type View = Count;

    fn init(&self, _seed: Option<u64>) -> Count {
        Count {
            count: 0,
            target: self.target,
        }
    }

    fn validate(&self, state: &Count, _role: Role, action: &Step) -> Result<(), String> {
        if state.count >= state.target {
            return Err("Target already reached".into());
        }
        if !(1..=3).contains(&action.amount) {
            return Err("Step must be between 1 and 3".into());
        }
        Ok(())
    }

    fn apply(&self, state: &Count, _role: Role, action: &Step) -> Count {
        Count {
            count: (state.count + action.amount).min(state.target),
            target: state.target,
        }
    }

    fn view(&self, state: &Count, _role: Role) -> Count {
        state.clone()
    }

    fn outcome(&self, state: &Count) -> Option<Outcome> {
        (state.count >= state.target).then_some(Outcome::Draw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_either_role_may_step_anytime() {
        let game = Lockstep::default();
        let state = game.init(None);
        assert!(game.validate(&state, Role::Host, &Step { amount: 1 }).is_ok());
        assert!(game.validate(&state, Role::Peer, &Step { amount: 1 }).is_ok());
    }

    #[test]
    fn test_step_amount_is_bounded() {
        let game = Lockstep::default();
        let state = game.init(None);
        assert!(game.validate(&state, Role::Host, &Step { amount: 0 }).is_err());
        assert!(game.validate(&state, Role::Host, &Step { amount: 4 }).is_err());
    }

    #[test]
    fn test_reaching_target_finishes_as_draw() {
        let game = Lockstep { target: 4 };
        let mut state = game.init(None);
        for role in [Role::Host, Role::Peer] {
            let action = Step { amount: 2 };
            game.validate(&state, role, &action).expect("legal step");
            state = game.apply(&state, role, &action);
        }
        assert_eq!(game.outcome(&state), Some(Outcome::Draw));
        assert!(game.validate(&state, Role::Host, &Step { amount: 1 }).is_err());
    }

    #[test]
    fn test_count_saturates_at_target() {
        let game = Lockstep { target: 4 };
        let state = game.init(None);
        let next = game.apply(&state, Role::Host, &Step { amount: 3 });
        let done = game.apply(&next, Role::Peer, &Step { amount: 3 });
        assert_eq!(game.outcome(&done), Some(Outcome::Draw));
    }
}
