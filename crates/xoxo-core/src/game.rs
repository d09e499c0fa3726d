//! Game state machine.
//!
//! `GameState` owns the board, the roster and the outcome. It is mutated only
//! through [`GameState::add`], [`GameState::apply_move`] and the rematch
//! countdown, and replaced wholesale by [`GameState::rematch`].

use std::fmt;

use xoxo_proto::{Cell, Move, Player, Seat, StateSnapshot, Turn};

use crate::{Board, GameError};

/// Result of an accepted move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Game continues; this seat moves next.
    Continue(Seat),
    /// The mover completed a line.
    Won(Seat),
    /// Board filled with no line.
    Draw,
}

impl Outcome {
    /// Game ended with this move.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Continue(_))
    }
}

/// Rematch countdown progress after one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Countdown {
    /// No countdown running.
    Idle,
    /// Countdown running; ticks remaining.
    Pending(u32),
    /// Countdown reached zero on this tick; time to rematch.
    Expired,
}

/// Authoritative tic-tac-toe state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    board: Board,
    turn: Turn,
    players: Vec<Player>,
    winner: Option<Seat>,
    draw: bool,
    rematch_countdown: u32,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState {
    /// Empty board, no players, player one to move.
    #[must_use]
    pub fn new() -> Self {
        Self {
            board: Board::new(),
            turn: Turn::Seat(Seat::One),
            players: Vec::with_capacity(2),
            winner: None,
            draw: false,
            rematch_countdown: 0,
        }
    }

    /// Seat a player. The first player added is player one.
    ///
    /// # Errors
    ///
    /// - `GameError::SessionFull` if two players are already seated
    /// - `GameError::DuplicatePlayer` if the user id is already seated
    pub fn add(&mut self, player: Player) -> Result<Seat, GameError> {
        let Some(seat) = Seat::from_index(self.players.len()) else {
            return Err(GameError::SessionFull);
        };
        if self.players.iter().any(|p| p.user_id == player.user_id) {
            return Err(GameError::DuplicatePlayer(player.user_id));
        }
        self.players.push(player);
        Ok(seat)
    }

    /// Apply a move on behalf of `user_id`.
    ///
    /// Checks run in a fixed order so the reported error is deterministic:
    /// coordinates, cell emptiness, game over, turn validity, membership,
    /// then turn ownership.
    ///
    /// # Errors
    ///
    /// Any [`GameError`] move variant. State is unchanged on error.
    pub fn apply_move(&mut self, user_id: &str, mv: Move) -> Result<Outcome, GameError> {
        let Some((row, col)) = mv.zero_based() else {
            return Err(GameError::InvalidCoordinate { row: mv.row, col: mv.col });
        };
        if self.board.get(row, col) != Some(Cell::Empty) {
            return Err(GameError::CellOccupied { row: mv.row, col: mv.col });
        }
        if self.is_terminal() {
            return Err(GameError::GameAlreadyOver);
        }
        let Some(turn) = self.turn.seat() else {
            return Err(GameError::InvalidTurnState);
        };
        let Some(seat) = self.seat_of(user_id) else {
            return Err(GameError::UnknownPlayer(user_id.to_string()));
        };
        if seat != turn {
            return Err(GameError::NotYourTurn { player: seat.number(), turn: turn.number() });
        }

        self.board.claim(row, col, seat);
        self.turn = Turn::Seat(seat.other());
        self.winner = self.board.winner();
        self.draw = self.winner.is_none() && self.board.is_full();

        if let Some(winner) = self.winner {
            self.turn = Turn::Terminal;
            return Ok(Outcome::Won(winner));
        }
        if self.draw {
            self.turn = Turn::Terminal;
            return Ok(Outcome::Draw);
        }
        Ok(Outcome::Continue(seat.other()))
    }

    /// Start the rematch countdown. No-op unless the game is over.
    ///
    /// Returns whether the countdown was armed.
    pub fn arm_rematch(&mut self, ticks: u32) -> bool {
        if !self.is_terminal() {
            return false;
        }
        self.rematch_countdown = ticks;
        true
    }

    /// Advance the rematch countdown by one tick.
    pub fn tick_rematch(&mut self) -> Countdown {
        match self.rematch_countdown {
            0 => Countdown::Idle,
            1 => {
                self.rematch_countdown = 0;
                Countdown::Expired
            },
            n => {
                self.rematch_countdown = n - 1;
                Countdown::Pending(n - 1)
            },
        }
    }

    /// Fresh game with the same roster, in the same order.
    #[must_use]
    pub fn rematch(&self) -> Self {
        let mut next = Self::new();
        next.players.clone_from(&self.players);
        next
    }

    /// Game has a winner or is drawn.
    pub fn is_terminal(&self) -> bool {
        self.winner.is_some() || self.draw
    }

    /// Seat of a user, if seated.
    pub fn seat_of(&self, user_id: &str) -> Option<Seat> {
        self.players.iter().position(|p| p.user_id == user_id).and_then(Seat::from_index)
    }

    /// Player in a seat.
    pub fn player(&self, seat: Seat) -> Option<&Player> {
        self.players.get(seat.index())
    }

    /// Seated players, in join order.
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// Board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Whose turn it is.
    pub fn turn(&self) -> Turn {
        self.turn
    }

    /// Winner, if any.
    pub fn winner(&self) -> Option<Seat> {
        self.winner
    }

    /// Board full with no winner.
    pub fn draw(&self) -> bool {
        self.draw
    }

    /// Ticks until rematch; 0 when no countdown is running.
    pub fn rematch_countdown(&self) -> u32 {
        self.rematch_countdown
    }

    /// Empty cells as 0-based `(row, col)`, row-major.
    pub fn available(&self) -> Vec<(usize, usize)> {
        self.board.available()
    }

    /// Wire snapshot of the current state.
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            cells: *self.board.cells(),
            player_turn: self.turn,
            players: self.players.clone(),
            winner: self.winner,
            draw: self.draw,
            rematch_countdown: self.rematch_countdown,
        }
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let uid = |seat: Seat| self.player(seat).map_or("(nil)", |p| p.user_id.as_str());
        write!(
            f,
            "1:{} 2:{} turn:{} winner:{} draw:{} cells:[",
            uid(Seat::One),
            uid(Seat::Two),
            self.turn.number(),
            self.winner.map_or(0, Seat::number),
            self.draw,
        )?;
        for (r, row) in self.board.cells().iter().enumerate() {
            if r > 0 {
                f.write_str(" ")?;
            }
            for cell in row {
                write!(f, "{}", cell.mark())?;
            }
        }
        f.write_str("]")
    }
}
