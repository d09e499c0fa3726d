//! Property tests for the match controller.
//!
//! Drives a started match through random ticks (legal moves, illegal moves
//! and idle ticks) and checks every broadcast the controller emits.

use proptest::prelude::*;
use xoxo_proto::{Move, Payload, Player, ProjectedView, Turn};
use xoxo_server::{MatchAction, MatchConfig, MatchController, MatchData, MatchEvent};

/// One tick's worth of input.
#[derive(Debug, Clone)]
enum Step {
    Idle,
    /// The player on turn claims the `pick`-th free cell.
    Legal(usize),
    /// The player off turn claims a cell.
    OutOfTurn(usize),
    /// Anyone claims any cell, possibly off the board.
    Wild { user: bool, row: i32, col: i32 },
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        1 => Just(Step::Idle),
        4 => (0usize..9).prop_map(Step::Legal),
        1 => (0usize..9).prop_map(Step::OutOfTurn),
        1 => (any::<bool>(), -1i32..5, -1i32..5).prop_map(|(user, row, col)| Step::Wild { user, row, col }),
    ]
}

fn player(id: &str) -> Player {
    Player::new("node-1", format!("s-{id}"), id, id)
}

fn started(config: MatchConfig) -> MatchController {
    let mut controller = MatchController::new(config);
    for id in ["a", "b"] {
        controller.admit(&player(id)).unwrap();
        controller.process_event(MatchEvent::Join { tick: 0, presences: vec![player(id)] });
    }
    controller
}

fn message(user: &str, mv: Move) -> MatchData {
    MatchData { user_id: user.to_string(), frame: Payload::Move(mv).into_frame().unwrap() }
}

fn messages(controller: &MatchController, step: &Step) -> Vec<MatchData> {
    let game = controller.game();
    let (on_turn, off_turn) = match game.turn() {
        Turn::Seat(seat) => (
            game.player(seat).map(|p| p.user_id.clone()),
            game.player(seat.other()).map(|p| p.user_id.clone()),
        ),
        Turn::Terminal => (Some("a".to_string()), Some("b".to_string())),
    };
    let free = game.available();
    let pick = |i: usize| free.get(i % free.len().max(1)).copied();

    match step {
        Step::Idle => Vec::new(),
        Step::Legal(i) => match (on_turn, pick(*i)) {
            (Some(user), Some((row, col))) => vec![message(&user, Move::at(row, col))],
            _ => Vec::new(),
        },
        Step::OutOfTurn(i) => match (off_turn, pick(*i)) {
            (Some(user), Some((row, col))) => vec![message(&user, Move::at(row, col))],
            _ => Vec::new(),
        },
        Step::Wild { user, row, col } => {
            let user = if *user { "a" } else { "b" };
            vec![message(user, Move { row: *row, col: *col })]
        },
    }
}

fn sent_views(actions: &[MatchAction]) -> Vec<(String, ProjectedView)> {
    actions
        .iter()
        .filter_map(|action| match action {
            MatchAction::Send { session_id, frame, .. } => match Payload::from_frame(frame) {
                Ok(Payload::State(view)) => Some((session_id.clone(), view)),
                _ => None,
            },
            _ => None,
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn broadcasts_agree_except_your_turn(steps in prop::collection::vec(step(), 1..80)) {
        let mut controller = started(MatchConfig { rematch_secs: 3, ..MatchConfig::default() });

        for (tick, step) in steps.iter().enumerate() {
            let messages = messages(&controller, step);
            let actions = controller.process_event(MatchEvent::Tick { tick: tick as u64 + 1, messages });
            let views = sent_views(&actions);
            prop_assert!(views.len() % 2 == 0);

            for pair in views.chunks(2) {
                let ((first_session, first), (second_session, second)) = (&pair[0], &pair[1]);
                prop_assert_eq!(first_session.as_str(), "s-a");
                prop_assert_eq!(second_session.as_str(), "s-b");
                prop_assert_eq!(&first.state, &second.state);
                prop_assert_eq!(&first.active_player, &second.active_player);

                let turns = usize::from(first.your_turn) + usize::from(second.your_turn);
                if first.state.is_terminal() {
                    prop_assert_eq!(turns, 0);
                } else {
                    prop_assert_eq!(turns, 1);
                    let mover = if first.your_turn { "a" } else { "b" };
                    prop_assert_eq!(first.active_player.as_ref().map(|p| p.user_id.as_str()), Some(mover));
                }
            }
        }
    }

    #[test]
    fn countdown_steps_down_to_fresh_board(steps in prop::collection::vec(step(), 1..80)) {
        let mut controller = started(MatchConfig { rematch_secs: 3, ..MatchConfig::default() });

        for (tick, step) in steps.iter().enumerate() {
            let before = controller.game().rematch_countdown();
            let messages = messages(&controller, step);
            let actions = controller.process_event(MatchEvent::Tick { tick: tick as u64 + 1, messages });
            let after = controller.game().rematch_countdown();

            if before > 0 {
                prop_assert_eq!(after, before - 1);
                if after == 0 {
                    prop_assert_eq!(controller.game().board().filled(), 0);
                    prop_assert!(!controller.game().is_terminal());
                }
            } else if after > 0 {
                // Armed to 3 by the finishing move, decremented on the same tick.
                prop_assert_eq!(after, 2);
                prop_assert!(controller.game().is_terminal());
            }

            if let Some((_, view)) = sent_views(&actions).last() {
                prop_assert_eq!(view.state.rematch_countdown, after);
            }
        }
    }

    #[test]
    fn rejected_moves_are_answered_unchanged(row in -1i32..5, col in -1i32..5) {
        let mut controller = started(MatchConfig::default());
        // "b" is off turn, so this never lands.
        let before = controller.game().snapshot();
        let actions = controller.process_event(MatchEvent::Tick {
            tick: 1,
            messages: vec![message("b", Move { row, col })],
        });

        let views = sent_views(&actions);
        prop_assert_eq!(views.len(), 2);
        for (_, view) in &views {
            prop_assert_eq!(&view.state, &before);
        }
        prop_assert_eq!(controller.game().snapshot(), before);
    }
}
