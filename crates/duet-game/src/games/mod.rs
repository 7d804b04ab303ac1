//! Bundled games.
//!
//! `tictactoe` is the turn-based reference implementation; `lockstep` is
//! a cooperative counter that exercises the role-agnostic path.

mod lockstep;
mod tictactoe;

pub use lockstep::Lockstep;
pub use tictactoe::TicTacToe;
