//! Demo coordination server: the bundled games plus a custom one.
//!
//! Nim shows what implementing the game contract looks like outside the
//! framework: a pile of 21 sticks, each turn takes 1-3, whoever takes
//! the last stick wins.

use duet::prelude::*;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Custom game
// ---------------------------------------------------------------------------

struct Nim;

const STARTING_PILE: u32 = 21;

#[derive(Debug, Clone)]
struct Pile {
    remaining: u32,
    turn: Role,
    last_to_take: Option<Role>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Take {
    sticks: u32,
}

#[derive(Debug, Serialize)]
struct PileView {
    remaining: u32,
    turn: Role,
    you: Role,
}

impl Game for Nim {
    type State = Pile;
    type Action = Take;
    type View = PileView;

    fn init(&self, _seed: Option<u64>) -> Pile {
        Pile {
            remaining: STARTING_PILE,
            turn: Role::Host,
            last_to_take: None,
        }
    }

    fn validate(&self, state: &Pile, role: Role, action: &Take) -> Result<(), String> {
        if state.remaining == 0 {
            return Err("The pile is empty".into());
        }
        if role != state.turn {
            return Err("Not your turn".into());
        }
        if !(1..=3).contains(&action.sticks) {
            return Err("Take 1 to 3 sticks".into());
        }
        if action.sticks > state.remaining {
            return Err(format!("Only {} sticks left", state.remaining));
        }
        Ok(())
    }

    fn apply(&self, state: &Pile, role: Role, action: &Take) -> Pile {
        Pile {
            remaining: state.remaining - action.sticks,
            turn: role.other(),
            last_to_take: Some(role),
        }
    }

    fn view(&self, state: &Pile, role: Role) -> PileView {
        PileView {
            remaining: state.remaining,
            turn: state.turn,
            you: role,
        }
    }

    fn outcome(&self, state: &Pile) -> Option<Outcome> {
        if state.remaining > 0 {
            return None;
        }
        state.last_to_take.map(|role| Outcome::Winner { role })
    }
}

// ---------------------------------------------------------------------------
// Server bootstrap
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), DuetError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "duet=info,duet_server=info".into()),
        )
        .init();

    let mut games = GameRegistry::with_builtin();
    games.register("nim", Nim);

    let server = DuetServer::builder()
        .bind("0.0.0.0:8080")
        .games(games)
        .build()
        .await?;

    tracing::info!(addr = "0.0.0.0:8080", "duet server listening");
    server.run().await
}
