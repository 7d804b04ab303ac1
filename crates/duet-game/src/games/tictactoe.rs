use duet_protocol::{Outcome, Role};
use serde::{Deserialize, Serialize};

use crate::Game;

/// Classic 3x3 tic-tac-toe. The host plays first.
pub struct TicTacToe;

const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

#[derive(Debug, Clone)]
pub struct Board {
    cells: [Option<Role>; 9],
    turn: Role,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Place {
    pub cell: usize,
}

#[derive(Debug, Serialize)]
pub struct BoardView {
    cells: [Option<Role>; 9],
    turn: Role,
    you: Role,
}

impl Game for TicTacToe {
    type State = Board;
    type Action = Place;
    type View = BoardView;

    fn init(&self, _seed: Option<u64>) -> Board {
        Board {
            cells: [None; 9],
            turn: Role::Host,
        }
    }

    fn validate(&self, state: &Board, role: Role, action: &Place) -> Result<(), String> {
        if self.outcome(state).is_some() {
            return Err("Game is over".into());
        }
        if role != state.turn {
            return Err("Not your turn".into());
        }
        if action.cell >= 9 {
            return Err(format!("Cell {} is out of range", action.cell));
        }
        if state.cells[action.cell].is_some() {
            return Err("Cell is already occupied".into());
        }
        Ok(())
    }

    fn apply(&self, state: &Board, role: Role, action: &Place) -> Board {
        let mut next = state.clone();
        next.cells[action.cell] = Some(role);
        next.turn = role.other();
        next
    }

    fn view(&self, state: &Board, role: Role) -> BoardView {
        BoardView {
            cells: state.cells,
            turn: state.turn,
            you: role,
        }
    }

    fn outcome(&self, state: &Board) -> Option<Outcome> {
        for [a, b, c] in LINES {
            match state.cells[a] {
                Some(role) if state.cells[b] == Some(role) && state.cells[c] == Some(role) => {
                    return Some(Outcome::Winner { role });
                }
                _ => {}
            }
        }
        if state.cells.iter().all(|c| c.is_some()) {
            return Some(Outcome::Draw);
        }
        None
    }
}
