//! Game rules for xoxo matches.
//!
//! Pure, synchronous logic with no I/O: every mutation happens through a
//! method call that either succeeds completely or leaves the state untouched.
//! Callers (the match controller, bots, tests) own the `GameState` and decide
//! what to do with rejected moves.
//!
//! # Components
//!
//! - [`GameState`]: board, turn, roster, outcome, rematch countdown
//! - [`Board`]: 3x3 grid with the fixed winning-line scan
//! - [`GameError`]: every way an `add` or `apply_move` can be rejected
//! - [`env::Environment`]: time and randomness, injected by the runtime
//!
//! # Invariants
//!
//! - `winner` and `draw` are never both set
//! - turn is terminal iff the game has a winner or is drawn
//! - the rematch countdown is only non-zero on a terminal game
//! - each accepted move writes exactly one previously empty cell

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod board;
pub mod env;
pub mod error;
mod game;

pub use board::{Board, LINES};
pub use error::GameError;
pub use game::{Countdown, GameState, Outcome};
