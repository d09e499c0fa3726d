//! Fuzz target for the match controller state machine
//!
//! Drives a `MatchController` with arbitrary joins, leaves, ticks and move
//! frames (well-formed or not) from a small pool of users.
//!
//! # Invariants
//!
//! - Never panics, whatever the event order
//! - At most two presences admitted
//! - Winner and draw are mutually exclusive; terminal iff either is set
//! - Occupied cell count never exceeds 9
//! - Every broadcast sends at most one frame per presence
//! - Nothing is emitted after `Terminate`

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use xoxo_proto::{Frame, Move, Opcode, Payload, Player, Turn};
use xoxo_server::{MatchAction, MatchConfig, MatchController, MatchData, MatchEvent, MatchPhase};

const USERS: [&str; 3] = ["a", "b", "c"];

#[derive(Debug, Clone, Arbitrary)]
enum Op {
    Join { user: u8 },
    Leave { user: u8 },
    Tick { messages: Vec<Message> },
}

#[derive(Debug, Clone, Arbitrary)]
enum Message {
    Move { user: u8, row: i8, col: i8 },
    Raw { user: u8, opcode: u16, bytes: Vec<u8> },
}

fn player(user: u8) -> Player {
    let id = USERS[usize::from(user) % USERS.len()];
    Player::new("fuzz", format!("s-{id}"), id, id.to_uppercase())
}

fn message(msg: Message) -> MatchData {
    match msg {
        Message::Move { user, row, col } => {
            let frame = Payload::Move(Move { row: i32::from(row), col: i32::from(col) })
                .into_frame()
                .unwrap_or_else(|_| Frame::new(Opcode::Move, Vec::new()));
            MatchData { user_id: player(user).user_id, frame }
        },
        Message::Raw { user, opcode, bytes } => {
            MatchData { user_id: player(user).user_id, frame: Frame::from_raw(opcode, bytes) }
        },
    }
}

fuzz_target!(|ops: Vec<Op>| {
    let config = MatchConfig { rematch_secs: 2, ..MatchConfig::default() };
    let mut controller = MatchController::new(config);
    let mut tick = 0u64;
    let mut terminated = false;

    for op in ops.into_iter().take(256) {
        let actions = match op {
            Op::Join { user } => {
                let presence = player(user);
                if controller.admit(&presence).is_err() {
                    continue;
                }
                controller.process_event(MatchEvent::Join { tick, presences: vec![presence] })
            },
            Op::Leave { user } => {
                controller.process_event(MatchEvent::Leave { tick, presences: vec![player(user)] })
            },
            Op::Tick { messages } => {
                tick += 1;
                let messages = messages.into_iter().take(16).map(message).collect();
                controller.process_event(MatchEvent::Tick { tick, messages })
            },
        };

        let sends = actions.iter().filter(|a| matches!(a, MatchAction::Send { .. })).count();
        if terminated {
            assert!(actions.is_empty(), "actions after terminate");
        }
        if actions.iter().any(|a| matches!(a, MatchAction::Terminate)) {
            terminated = true;
            assert_eq!(controller.phase(), MatchPhase::Destroyed);
        }
        // A tick may broadcast the accepted move and the countdown.
        assert!(sends <= 2 * controller.presences().len().max(1));

        let game = controller.game();
        assert!(game.players().len() <= 2);
        assert!(!(game.winner().is_some() && game.draw()));
        assert_eq!(game.turn() == Turn::Terminal, game.is_terminal());
        assert!(game.board().filled() <= 9);
    }
});
