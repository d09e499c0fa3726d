//! ClientSync behavior against a scripted transport.

use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use proptest::prelude::*;
use tokio::sync::Notify;
use xoxo_client::{
    CancellationToken, ClientConfig, ClientError, ClientEvent, ClientIdentity, ClientSync,
    Handlers, Transport, TransportError,
};
use xoxo_proto::{Frame, Opcode, Payload, Player, ProjectedView, Seat, StateSnapshot, Turn};

/// Records every outbound call.
#[derive(Default)]
struct MockTransport {
    calls: Mutex<Vec<String>>,
    fail_send: bool,
    /// Holds `matchmaker_add` until notified.
    add_gate: Option<Arc<Notify>>,
}

impl MockTransport {
    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn matchmaker_add(&self) -> Result<String, TransportError> {
        self.record("matchmaker_add".into());
        if let Some(gate) = &self.add_gate {
            gate.notified().await;
        }
        Ok("ticket-1".into())
    }

    async fn matchmaker_remove(&self, ticket_id: &str) -> Result<(), TransportError> {
        self.record(format!("matchmaker_remove {ticket_id}"));
        Ok(())
    }

    async fn match_join(&self, match_id: &str) -> Result<String, TransportError> {
        self.record(format!("match_join {match_id}"));
        if match_id == "gone" {
            return Err(TransportError::Rejected("match not found".into()));
        }
        Ok(match_id.to_string())
    }

    async fn match_leave(&self, match_id: &str) -> Result<(), TransportError> {
        self.record(format!("match_leave {match_id}"));
        Ok(())
    }

    async fn send_match_data(&self, match_id: &str, frame: Frame) -> Result<(), TransportError> {
        self.record(format!("send {match_id} {}", String::from_utf8_lossy(&frame.payload)));
        if self.fail_send {
            return Err(TransportError::Closed);
        }
        Ok(())
    }
}

fn client_with(transport: MockTransport, handlers: Handlers) -> (Arc<ClientSync<MockTransport>>, Arc<MockTransport>) {
    let transport = Arc::new(transport);
    let client = ClientSync::with_handlers(
        Arc::clone(&transport),
        ClientIdentity::new("alice", "Alice"),
        &ClientConfig::default(),
        handlers,
    );
    (Arc::new(client), transport)
}

fn client() -> (Arc<ClientSync<MockTransport>>, Arc<MockTransport>) {
    client_with(MockTransport::default(), Handlers::default())
}

fn view(your_turn: bool) -> ProjectedView {
    ProjectedView {
        active_player: Some(Player::new("", "s-a", "alice", "Alice")),
        other_player: Some(Player::new("", "s-b", "bob", "Bob")),
        state: StateSnapshot::default(),
        your_turn,
    }
}

fn state_event(view: ProjectedView) -> ClientEvent {
    ClientEvent::MatchData {
        match_id: "m1".into(),
        frame: Payload::State(view).into_frame().unwrap(),
    }
}

async fn matched(client: &ClientSync<MockTransport>) {
    client.join().await.unwrap();
    client
        .handle_event(ClientEvent::MatchmakerMatched {
            ticket_id: "ticket-1".into(),
            match_id: "m1".into(),
        })
        .await;
}

#[tokio::test]
async fn move_without_match_fails() {
    let (client, transport) = client();

    assert_eq!(client.make_move(0, 0).await, Err(ClientError::NoActiveMatch));

    // Match id but no view yet.
    matched(&client).await;
    assert_eq!(client.make_move(0, 0).await, Err(ClientError::NoActiveMatch));
    assert!(!transport.calls().iter().any(|c| c.starts_with("send")));
}

#[tokio::test]
async fn second_move_rejected_until_fresh_view() {
    let (client, transport) = client();
    matched(&client).await;
    client.handle_event(state_event(view(true))).await;

    client.make_move(1, 2).await.unwrap();
    assert!(client.is_waiting());
    assert_eq!(client.make_move(0, 0).await, Err(ClientError::MoveInFlight));

    client.handle_event(state_event(view(false))).await;
    assert!(!client.is_waiting());

    let sends: Vec<_> = transport.calls().into_iter().filter(|c| c.starts_with("send")).collect();
    assert_eq!(sends, vec![r#"send m1 {"row":2,"col":3}"#.to_string()]);
}

#[tokio::test]
async fn failed_send_allows_retry() {
    let (client, _) = client_with(MockTransport { fail_send: true, ..MockTransport::default() }, Handlers::default());
    matched(&client).await;
    client.handle_event(state_event(view(true))).await;

    let result = client.make_move(0, 0).await;
    assert_eq!(result, Err(ClientError::Transport(TransportError::Closed)));
    assert!(!client.is_waiting());
}

#[tokio::test]
async fn matched_joins_and_records_match() {
    let (client, transport) = client();
    matched(&client).await;

    assert_eq!(client.match_id().as_deref(), Some("m1"));
    assert_eq!(client.ticket_id(), None);
    assert_eq!(transport.calls(), vec!["matchmaker_add".to_string(), "match_join m1".to_string()]);
}

#[tokio::test]
async fn failed_matched_join_reports_error() {
    let errors = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&errors);
    let handlers = Handlers {
        on_join_error: Some(Box::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        })),
        ..Handlers::default()
    };
    let (client, _) = client_with(MockTransport::default(), handlers);

    client
        .handle_event(ClientEvent::MatchmakerMatched {
            ticket_id: "t".into(),
            match_id: "gone".into(),
        })
        .await;

    assert_eq!(client.match_id(), None);
    assert_eq!(errors.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn join_refused_while_ticket_pending() {
    let (client, _) = client();
    client.join().await.unwrap();

    assert_eq!(client.join().await, Err(ClientError::TicketPending("ticket-1".into())));
}

fn gated_client() -> (Arc<ClientSync<MockTransport>>, Arc<MockTransport>, Arc<Notify>) {
    let gate = Arc::new(Notify::new());
    let transport = MockTransport { add_gate: Some(Arc::clone(&gate)), ..MockTransport::default() };
    let (client, transport) = client_with(transport, Handlers::default());
    (client, transport, gate)
}

async fn spawn_gated_join(
    client: &Arc<ClientSync<MockTransport>>,
    transport: &MockTransport,
) -> tokio::task::JoinHandle<Result<(), ClientError>> {
    let joining = {
        let client = Arc::clone(client);
        tokio::spawn(async move { client.join().await })
    };
    while !transport.calls().iter().any(|c| c == "matchmaker_add") {
        tokio::task::yield_now().await;
    }
    joining
}

#[tokio::test]
async fn matched_before_ticket_returns_leaves_no_stale_ticket() {
    let (client, transport, gate) = gated_client();
    let joining = spawn_gated_join(&client, &transport).await;

    assert!(matches!(client.join().await, Err(ClientError::TicketPending(_))));

    client
        .handle_event(ClientEvent::MatchmakerMatched {
            ticket_id: "ticket-1".into(),
            match_id: "m1".into(),
        })
        .await;
    gate.notify_one();
    assert_eq!(joining.await.unwrap(), Ok(()));

    assert_eq!(client.ticket_id(), None);
    assert_eq!(client.match_id().as_deref(), Some("m1"));
    assert!(!transport.calls().iter().any(|c| c.starts_with("matchmaker_remove")));

    gate.notify_one();
    assert_eq!(client.join().await, Ok(()));
    assert_eq!(client.ticket_id().as_deref(), Some("ticket-1"));
}

#[tokio::test]
async fn leave_during_ticket_request_removes_ticket() {
    let (client, transport, gate) = gated_client();
    let joining = spawn_gated_join(&client, &transport).await;

    client.leave().await.unwrap();
    gate.notify_one();
    assert_eq!(joining.await.unwrap(), Ok(()));

    assert_eq!(client.ticket_id(), None);
    assert!(transport.calls().contains(&"matchmaker_remove ticket-1".to_string()));
}

#[tokio::test]
async fn leave_resets_everything() {
    let (client, transport) = client();
    matched(&client).await;
    client.handle_event(state_event(view(true))).await;

    client.leave().await.unwrap();

    assert_eq!(client.state(), None);
    assert_eq!(client.match_id(), None);
    assert!(client.is_waiting());
    assert!(transport.calls().contains(&"match_leave m1".to_string()));
    assert_eq!(client.make_move(0, 0).await, Err(ClientError::NoActiveMatch));
}

#[tokio::test]
async fn undecodable_state_clears_view() {
    let (client, _) = client();
    matched(&client).await;
    client.handle_event(state_event(view(true))).await;
    assert!(client.state().is_some());

    client
        .handle_event(ClientEvent::MatchData {
            match_id: "m1".into(),
            frame: Frame::new(Opcode::State, &br#"{"unexpected":1}"#[..]),
        })
        .await;

    assert_eq!(client.state(), None);
    assert!(client.is_waiting());
}

#[tokio::test]
async fn presence_leave_clears_view() {
    let (client, _) = client();
    matched(&client).await;
    client.handle_event(state_event(view(true))).await;

    client
        .handle_event(ClientEvent::MatchPresence {
            match_id: "m1".into(),
            joins: vec![],
            leaves: vec![Player::new("", "s-b", "bob", "Bob")],
        })
        .await;

    assert_eq!(client.state(), None);
}

#[tokio::test]
async fn disconnect_clears_view() {
    let (client, _) = client();
    client.handle_event(ClientEvent::Connected).await;
    assert!(client.is_connected());
    client.handle_event(state_event(view(true))).await;

    client.handle_event(ClientEvent::Disconnected { reason: None }).await;

    assert!(!client.is_connected());
    assert_eq!(client.state(), None);
    assert!(client.is_waiting());
}

#[tokio::test]
async fn state_callback_fires_on_meaningful_changes_only() {
    let fired = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&fired);
    let handlers = Handlers {
        on_state_change: Some(Box::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        })),
        ..Handlers::default()
    };
    let (client, _) = client_with(MockTransport::default(), handlers);

    client.handle_event(state_event(view(false))).await; // appeared
    client.handle_event(state_event(view(false))).await; // unchanged
    client.handle_event(state_event(view(true))).await; // turn flipped
    assert_eq!(fired.load(Ordering::SeqCst), 2);

    let mut over = view(false);
    over.state.winner = Some(Seat::One);
    over.state.player_turn = Turn::Terminal;
    client.handle_event(state_event(over.clone())).await; // terminal
    client.handle_event(state_event(over)).await; // terminal again
    assert_eq!(fired.load(Ordering::SeqCst), 4);
}

#[tokio::test(start_paused = true)]
async fn next_wakes_on_your_turn() {
    let (client, _) = client();
    matched(&client).await;
    client.handle_event(state_event(view(false))).await;

    let cancel = CancellationToken::new();
    let waiter = {
        let client = Arc::clone(&client);
        let cancel = cancel.clone();
        tokio::spawn(async move { client.next(&cancel).await })
    };

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!waiter.is_finished());

    client.handle_event(state_event(view(true))).await;
    assert!(waiter.await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn next_false_when_game_over() {
    let (client, _) = client();
    matched(&client).await;

    let mut over = view(true);
    over.state.winner = Some(Seat::Two);
    over.state.player_turn = Turn::Terminal;
    over.state.rematch_countdown = 9;
    client.handle_event(state_event(over)).await;

    assert!(!client.next(&CancellationToken::new()).await);
}

#[tokio::test(start_paused = true)]
async fn waits_stop_on_cancel() {
    let (client, _) = client();
    let cancel = CancellationToken::new();

    let waiter = {
        let client = Arc::clone(&client);
        let cancel = cancel.clone();
        tokio::spawn(async move { (client.ready(&cancel).await, client.next(&cancel).await) })
    };

    tokio::time::sleep(Duration::from_millis(120)).await;
    cancel.cancel();

    assert_eq!(waiter.await.unwrap(), (false, false));
}

#[tokio::test(start_paused = true)]
async fn cancel_releases_wait_on_opponent_turn() {
    let (client, _) = client();
    matched(&client).await;
    client.handle_event(state_event(view(false))).await;

    let cancel = CancellationToken::new();
    let start = tokio::time::Instant::now();
    let waiter = {
        let client = Arc::clone(&client);
        let cancel = cancel.clone();
        tokio::spawn(async move { client.next(&cancel).await })
    };

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(!waiter.is_finished());
    cancel.cancel();

    assert!(!waiter.await.unwrap());
    assert!(tokio::time::Instant::now() - start < Duration::from_millis(100));
}

#[tokio::test(start_paused = true)]
async fn ready_waits_for_countdown_to_finish() {
    let (client, _) = client();
    let mut pending = view(false);
    pending.state.rematch_countdown = 3;
    client.handle_event(state_event(pending)).await;

    let cancel = CancellationToken::new();
    let waiter = {
        let client = Arc::clone(&client);
        let cancel = cancel.clone();
        tokio::spawn(async move { client.ready(&cancel).await })
    };

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!waiter.is_finished());

    client.handle_event(state_event(view(true))).await;
    assert!(waiter.await.unwrap());
}

#[tokio::test]
async fn async_variants_report_results() {
    let (client, _) = client();
    let (tx, rx) = tokio::sync::oneshot::channel();

    client.make_move_async(0, 0, move |result| {
        let _ = tx.send(result);
    });

    assert_eq!(rx.await.unwrap(), Err(ClientError::NoActiveMatch));
}

#[derive(Debug, Clone)]
enum Op {
    Ingest(bool),
    Move(usize, usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![any::<bool>().prop_map(Op::Ingest), (0usize..3, 0usize..3).prop_map(|(r, c)| Op::Move(r, c))]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn at_most_one_move_per_view(ops in prop::collection::vec(op(), 0..40)) {
        let runtime = tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap();
        runtime.block_on(async {
            let (client, transport) = client();
            matched(&client).await;

            let mut has_view = false;
            let mut fresh = false;
            let mut accepted = 0;
            for op in ops {
                match op {
                    Op::Ingest(your_turn) => {
                        client.handle_event(state_event(view(your_turn))).await;
                        has_view = true;
                        fresh = true;
                    },
                    Op::Move(row, col) => {
                        let expected = if !has_view {
                            Err(ClientError::NoActiveMatch)
                        } else if fresh {
                            Ok(())
                        } else {
                            Err(ClientError::MoveInFlight)
                        };
                        assert_eq!(client.make_move(row, col).await, expected);
                        if expected.is_ok() {
                            accepted += 1;
                            fresh = false;
                        }
                    },
                }
                assert_eq!(client.is_waiting(), !fresh);
            }

            let sends = transport.calls().iter().filter(|c| c.starts_with("send")).count();
            assert_eq!(sends, accepted);
        });
    }
}
