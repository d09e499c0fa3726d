//! Match controller.
//!
//! Sans-IO lifecycle for a single match: admission, per-tick move
//! processing, projected broadcasts, the rematch countdown and termination.
//! Events go in, [`MatchAction`]s come out; the runtime executes them.
//!
//! # Invariants
//!
//! - at most two presences are ever admitted, in join order
//! - every broadcast sends one view per present recipient, and the views
//!   differ only in `your_turn`
//! - rejected moves and undecodable messages never abort the tick
//! - a tick with at least one decoded move broadcasts once after applying
//!   them, so a rejected move is answered with the unchanged state

use std::collections::HashSet;

use xoxo_core::{Countdown, GameError, GameState};
use xoxo_proto::{Frame, Opcode, Payload, Player, ProjectedView, Seat, Turn};

use crate::config::MatchConfig;

/// Lifecycle phase of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPhase {
    /// Fewer than two players have joined.
    AwaitingPlayers,
    /// Both players joined; moves are processed.
    Active,
    /// A player left; the match is destroyed after the grace period.
    Terminating,
    /// Terminated. All further events are ignored.
    Destroyed,
}

/// A message delivered to the match by a player.
#[derive(Debug, Clone)]
pub struct MatchData {
    /// Sender's user id, as authenticated by the transport.
    pub user_id: String,
    /// Raw frame.
    pub frame: Frame,
}

/// Events the controller processes.
#[derive(Debug, Clone)]
pub enum MatchEvent {
    /// Previously admitted presences joined.
    Join {
        /// Current tick
        tick: u64,
        /// Joined presences
        presences: Vec<Player>,
    },

    /// Presences left the match.
    Leave {
        /// Current tick
        tick: u64,
        /// Departed presences
        presences: Vec<Player>,
    },

    /// Periodic tick with the messages buffered since the previous one.
    Tick {
        /// Tick number, monotonically increasing
        tick: u64,
        /// Messages in arrival order
        messages: Vec<MatchData>,
    },
}

/// Actions produced by the controller.
#[derive(Debug, Clone)]
pub enum MatchAction {
    /// Deliver a frame to one presence.
    Send {
        /// Recipient session
        session_id: String,
        /// Recipient user, for logging
        user_id: String,
        /// Frame to send
        frame: Frame,
    },

    /// Log a message.
    Log {
        /// Log level
        level: LogLevel,
        /// Tick the event occurred on
        tick: u64,
        /// Message to log
        message: String,
    },

    /// Stop the match and release its resources.
    Terminate,
}

/// Log levels for controller actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug information
    Debug,
    /// Informational message
    Info,
    /// Warning
    Warn,
    /// Error
    Error,
}

/// Authoritative controller for one match.
#[derive(Debug)]
pub struct MatchController {
    config: MatchConfig,
    game: GameState,
    /// Admitted presences, in join order. Index 0 is player one.
    presences: Vec<Player>,
    /// Session ids of presences that have left.
    departed: HashSet<String>,
    /// Tick on which termination was requested.
    term_tick: Option<u64>,
    phase: MatchPhase,
}

impl MatchController {
    /// Create a controller with an empty game.
    pub fn new(config: MatchConfig) -> Self {
        Self {
            config,
            game: GameState::new(),
            presences: Vec::with_capacity(2),
            departed: HashSet::new(),
            term_tick: None,
            phase: MatchPhase::AwaitingPlayers,
        }
    }

    /// Validate and seat a joining presence.
    ///
    /// # Errors
    ///
    /// - `GameError::SessionFull` if two presences are already admitted
    /// - `GameError::DuplicatePlayer` if the user id is already admitted
    pub fn admit(&mut self, presence: &Player) -> Result<(), GameError> {
        if self.presences.len() >= 2 {
            return Err(GameError::SessionFull);
        }
        self.game.add(presence.clone())?;
        self.presences.push(presence.clone());
        Ok(())
    }

    /// Process an event and return actions to execute.
    pub fn process_event(&mut self, event: MatchEvent) -> Vec<MatchAction> {
        if self.phase == MatchPhase::Destroyed {
            return Vec::new();
        }
        match event {
            MatchEvent::Join { tick, presences } => self.handle_join(tick, &presences),
            MatchEvent::Leave { tick, presences } => self.handle_leave(tick, &presences),
            MatchEvent::Tick { tick, messages } => self.handle_tick(tick, messages),
        }
    }

    /// Current phase.
    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    /// Current game state.
    pub fn game(&self) -> &GameState {
        &self.game
    }

    /// Admitted presences, in join order.
    pub fn presences(&self) -> &[Player] {
        &self.presences
    }

    /// Tick on which termination was requested, if any.
    pub fn term_tick(&self) -> Option<u64> {
        self.term_tick
    }

    fn handle_join(&mut self, tick: u64, presences: &[Player]) -> Vec<MatchAction> {
        let mut actions = vec![log(
            LogLevel::Debug,
            tick,
            format!("join: {} presence(s), {} admitted", presences.len(), self.presences.len()),
        )];

        if self.presences.len() == 2 && self.phase == MatchPhase::AwaitingPlayers {
            self.phase = MatchPhase::Active;
            actions.extend(self.broadcast(tick));
        }
        actions
    }

    fn handle_leave(&mut self, tick: u64, presences: &[Player]) -> Vec<MatchAction> {
        let mut actions =
            vec![log(LogLevel::Debug, tick, format!("leave: {} presence(s)", presences.len()))];

        // Final state goes to whoever is still connected.
        self.departed.extend(presences.iter().map(|p| p.session_id.clone()));
        actions.extend(self.broadcast(tick));

        if self.term_tick.is_none() {
            self.term_tick = Some(tick);
            self.phase = MatchPhase::Terminating;
        }
        actions
    }

    fn handle_tick(&mut self, tick: u64, messages: Vec<MatchData>) -> Vec<MatchAction> {
        if let Some(term_tick) = self.term_tick {
            if tick.saturating_sub(term_tick) >= self.config.termination_grace_ticks {
                self.phase = MatchPhase::Destroyed;
                return vec![log(LogLevel::Info, tick, "terminating".to_string()), MatchAction::Terminate];
            }
        } else if self.presences.len() != 2 {
            return vec![log(LogLevel::Debug, tick, "waiting for players".to_string())];
        }

        let mut actions = Vec::new();
        // Decoded moves are answered even when rejected.
        let mut answered = false;

        for message in messages {
            if message.frame.opcode_enum() != Some(Opcode::Move) {
                actions.push(log(
                    LogLevel::Debug,
                    tick,
                    format!("ignoring opcode {} from {}", message.frame.opcode, message.user_id),
                ));
                continue;
            }

            let mv = match Payload::from_frame(&message.frame) {
                Ok(Payload::Move(mv)) => mv,
                Ok(other) => {
                    actions.push(log(
                        LogLevel::Debug,
                        tick,
                        format!("unexpected payload {other:?} from {}", message.user_id),
                    ));
                    continue;
                },
                Err(e) => {
                    actions.push(log(
                        LogLevel::Debug,
                        tick,
                        format!("unable to decode move from {}: {e}", message.user_id),
                    ));
                    continue;
                },
            };

            answered = true;
            match self.game.apply_move(&message.user_id, mv) {
                Ok(outcome) => {
                    actions.push(log(
                        LogLevel::Debug,
                        tick,
                        format!("move {mv:?} by {}: {outcome:?} state={}", message.user_id, self.game),
                    ));
                    if outcome.is_terminal() {
                        self.game.arm_rematch(self.config.rematch_ticks());
                    }
                },
                Err(e) => {
                    actions.push(log(
                        LogLevel::Debug,
                        tick,
                        format!("unable to move {mv:?} by {}: {e}", message.user_id),
                    ));
                },
            }
        }

        if answered {
            actions.extend(self.broadcast(tick));
        }

        match self.game.tick_rematch() {
            Countdown::Idle => {},
            Countdown::Pending(_) => actions.extend(self.broadcast(tick)),
            Countdown::Expired => {
                self.game = self.game.rematch();
                actions.push(log(LogLevel::Info, tick, format!("rematch: {}", self.game)));
                actions.extend(self.broadcast(tick));
            },
        }

        actions
    }

    /// Project the current state for each present recipient.
    ///
    /// Active/other are resolved globally from the turn; a terminal turn
    /// keeps player one as active.
    fn broadcast(&self, tick: u64) -> Vec<MatchAction> {
        if self.presences.len() != 2 {
            return vec![log(
                LogLevel::Debug,
                tick,
                format!("skipping broadcast with {} presence(s)", self.presences.len()),
            )];
        }

        let snapshot = self.game.snapshot();
        let (mut active, mut other) =
            (self.game.player(Seat::One).cloned(), self.game.player(Seat::Two).cloned());
        if self.game.turn() == Turn::Seat(Seat::Two) {
            std::mem::swap(&mut active, &mut other);
        }

        let mut actions = vec![log(LogLevel::Debug, tick, format!("broadcast state={}", self.game))];
        for (index, presence) in self.presences.iter().enumerate() {
            if self.departed.contains(&presence.session_id) {
                continue;
            }
            let view = ProjectedView {
                active_player: active.clone(),
                other_player: other.clone(),
                state: snapshot.clone(),
                your_turn: Seat::from_index(index).is_some_and(|seat| self.game.turn() == Turn::Seat(seat)),
            };
            match Payload::State(view).into_frame() {
                Ok(frame) => actions.push(MatchAction::Send {
                    session_id: presence.session_id.clone(),
                    user_id: presence.user_id.clone(),
                    frame,
                }),
                Err(e) => actions.push(log(
                    LogLevel::Error,
                    tick,
                    format!("unable to encode state for {}: {e}", presence.session_id),
                )),
            }
        }
        actions
    }
}

fn log(level: LogLevel, tick: u64, message: String) -> MatchAction {
    MatchAction::Log { level, tick, message }
}
