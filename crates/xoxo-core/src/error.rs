//! Game rule violations.
//!
//! None of these are fatal. Move errors are logged and dropped by the match
//! controller; admission errors are returned to the joining party.

use thiserror::Error;

/// Reasons a `GameState` mutation was rejected.
///
/// A rejected call never mutates the state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    /// Move coordinates fall outside the board
    #[error("invalid coordinate: row {row}, col {col}")]
    InvalidCoordinate {
        /// 1-based row as received
        row: i32,
        /// 1-based column as received
        col: i32,
    },

    /// Target cell already claimed
    #[error("cell occupied: row {row}, col {col}")]
    CellOccupied {
        /// 1-based row as received
        row: i32,
        /// 1-based column as received
        col: i32,
    },

    /// Game has a winner or is drawn
    #[error("game is already over")]
    GameAlreadyOver,

    /// Turn is not a player slot
    #[error("turn does not name a player")]
    InvalidTurnState,

    /// Mover is not in the roster
    #[error("unknown player: {0}")]
    UnknownPlayer(String),

    /// Mover is in the roster but it is the other player's turn
    #[error("not your turn: player {player}, turn {turn}")]
    NotYourTurn {
        /// Mover's player number
        player: u8,
        /// Player number whose turn it is
        turn: u8,
    },

    /// Two players already seated
    #[error("match is full")]
    SessionFull,

    /// A player with this user id is already seated
    #[error("player already in match: {0}")]
    DuplicatePlayer(String),
}
