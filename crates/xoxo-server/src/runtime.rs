//! Match runtime.
//!
//! Runs each [`MatchController`] on its own tokio task, driven by a fixed-rate
//! tick from the [`Environment`]. Joins and leaves are processed as soon as
//! they arrive; move messages are buffered and handed to the controller on
//! the next tick. Actions are executed in order; a failed send is logged and
//! does not affect other recipients.

use std::{ops::ControlFlow, sync::Arc};

use tokio::sync::{RwLock, mpsc, oneshot};
use xoxo_core::{GameError, env::Environment};
use xoxo_proto::Player;

use crate::{
    config::MatchConfig,
    controller::{LogLevel, MatchAction, MatchController, MatchData, MatchEvent},
    dispatcher::Dispatcher,
    error::ServerError,
    registry::{MatchHandle, MatchRegistry},
};

/// Requests sent from [`MatchServer`] to a match task.
#[derive(Debug)]
pub(crate) enum MatchCommand {
    Join { presence: Player, reply: oneshot::Sender<Result<(), GameError>> },
    Leave { presence: Player, reply: oneshot::Sender<()> },
    Data(MatchData),
}

/// Hosts matches and routes requests to them.
///
/// Cheap to clone; clones share the registry.
pub struct MatchServer<E, D>
where
    E: Environment,
    D: Dispatcher,
{
    env: E,
    dispatcher: Arc<D>,
    config: MatchConfig,
    registry: Arc<RwLock<MatchRegistry>>,
}

impl<E, D> Clone for MatchServer<E, D>
where
    E: Environment,
    D: Dispatcher,
{
    fn clone(&self) -> Self {
        Self {
            env: self.env.clone(),
            dispatcher: Arc::clone(&self.dispatcher),
            config: self.config.clone(),
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<E, D> MatchServer<E, D>
where
    E: Environment,
    D: Dispatcher,
{
    /// Create a server. Matches are only started by [`Self::create_match`].
    pub fn new(env: E, dispatcher: Arc<D>, config: MatchConfig) -> Self {
        Self { env, dispatcher, config, registry: Arc::new(RwLock::new(MatchRegistry::new())) }
    }

    /// Start a new match task and return its id.
    pub async fn create_match(&self) -> String {
        let (tx, rx) = mpsc::channel(self.config.queue_capacity.max(1));

        let match_id = {
            let mut registry = self.registry.write().await;
            loop {
                let candidate = format!("{:032x}", self.env.random_u128());
                if registry.insert(candidate.clone(), MatchHandle { tx: tx.clone() }) {
                    break candidate;
                }
            }
        };

        let task = MatchTask {
            match_id: match_id.clone(),
            controller: MatchController::new(self.config.clone()),
            config: self.config.clone(),
            env: self.env.clone(),
            dispatcher: Arc::clone(&self.dispatcher),
            registry: Arc::clone(&self.registry),
            buffered: Vec::new(),
            tick: 0,
        };
        tokio::spawn(task.run(rx));

        tracing::info!(match_id = %match_id, "match created");
        match_id
    }

    /// Join a presence to a match.
    ///
    /// # Errors
    ///
    /// - `ServerError::MatchNotFound` if no such match is running
    /// - `ServerError::MatchClosed` if the match stopped mid-request
    /// - `ServerError::Rejected` if the match refused the presence
    pub async fn join(&self, match_id: &str, presence: Player) -> Result<(), ServerError> {
        let (reply, rx) = oneshot::channel();
        self.send(match_id, MatchCommand::Join { presence, reply }).await?;
        rx.await.map_err(|_| ServerError::MatchClosed(match_id.to_string()))??;
        Ok(())
    }

    /// Remove a presence from a match.
    ///
    /// Returns once the match has sent its final state to the remaining
    /// presences.
    ///
    /// # Errors
    ///
    /// - `ServerError::MatchNotFound` / `ServerError::MatchClosed`
    pub async fn leave(&self, match_id: &str, presence: Player) -> Result<(), ServerError> {
        let (reply, rx) = oneshot::channel();
        self.send(match_id, MatchCommand::Leave { presence, reply }).await?;
        rx.await.map_err(|_| ServerError::MatchClosed(match_id.to_string()))
    }

    /// Queue a player message for the match's next tick.
    ///
    /// # Errors
    ///
    /// - `ServerError::MatchNotFound` / `ServerError::MatchClosed`
    pub async fn submit(&self, match_id: &str, data: MatchData) -> Result<(), ServerError> {
        self.send(match_id, MatchCommand::Data(data)).await
    }

    /// Whether a match is still running.
    pub async fn contains(&self, match_id: &str) -> bool {
        self.registry.read().await.contains(match_id)
    }

    /// Number of running matches.
    pub async fn match_count(&self) -> usize {
        self.registry.read().await.len()
    }

    async fn send(&self, match_id: &str, command: MatchCommand) -> Result<(), ServerError> {
        let tx = {
            let registry = self.registry.read().await;
            let Some(handle) = registry.get(match_id) else {
                return Err(ServerError::MatchNotFound(match_id.to_string()));
            };
            handle.tx.clone()
        };
        tx.send(command).await.map_err(|_| ServerError::MatchClosed(match_id.to_string()))
    }
}

/// State owned by one match task.
struct MatchTask<E, D>
where
    E: Environment,
    D: Dispatcher,
{
    match_id: String,
    controller: MatchController,
    config: MatchConfig,
    env: E,
    dispatcher: Arc<D>,
    registry: Arc<RwLock<MatchRegistry>>,
    /// Messages received since the last tick.
    buffered: Vec<MatchData>,
    tick: u64,
}

impl<E, D> MatchTask<E, D>
where
    E: Environment,
    D: Dispatcher,
{
    async fn run(mut self, mut rx: mpsc::Receiver<MatchCommand>) {
        let interval = self.config.tick_interval();
        // Sleep futures borrow the env; commands need `&mut self`.
        let env = self.env.clone();

        'ticks: loop {
            let sleep = env.sleep(interval);
            tokio::pin!(sleep);

            loop {
                tokio::select! {
                    () = &mut sleep => break,
                    command = rx.recv() => {
                        let Some(command) = command else {
                            tracing::debug!(match_id = %self.match_id, "all handles dropped");
                            break 'ticks;
                        };
                        if self.handle_command(command).await.is_break() {
                            break 'ticks;
                        }
                    },
                }
            }

            self.tick += 1;
            let messages = std::mem::take(&mut self.buffered);
            let actions =
                self.controller.process_event(MatchEvent::Tick { tick: self.tick, messages });
            if self.execute(actions).await.is_break() {
                break;
            }
        }

        self.registry.write().await.remove(&self.match_id);
        tracing::info!(match_id = %self.match_id, tick = self.tick, "match destroyed");
    }

    async fn handle_command(&mut self, command: MatchCommand) -> ControlFlow<()> {
        match command {
            MatchCommand::Join { presence, reply } => {
                if let Err(e) = self.controller.admit(&presence) {
                    tracing::debug!(
                        match_id = %self.match_id,
                        user_id = %presence.user_id,
                        error = %e,
                        "join rejected"
                    );
                    let _ = reply.send(Err(e));
                    return ControlFlow::Continue(());
                }

                let event = MatchEvent::Join { tick: self.tick, presences: vec![presence] };
                let actions = self.controller.process_event(event);
                let flow = self.execute(actions).await;
                // Joiner may have given up waiting; admission still stands.
                let _ = reply.send(Ok(()));
                flow
            },
            MatchCommand::Leave { presence, reply } => {
                let event = MatchEvent::Leave { tick: self.tick, presences: vec![presence] };
                let actions = self.controller.process_event(event);
                let flow = self.execute(actions).await;
                let _ = reply.send(());
                flow
            },
            MatchCommand::Data(data) => {
                self.buffered.push(data);
                ControlFlow::Continue(())
            },
        }
    }

    /// Execute controller actions in order.
    async fn execute(&self, actions: Vec<MatchAction>) -> ControlFlow<()> {
        let match_id = self.match_id.as_str();
        for action in actions {
            match action {
                MatchAction::Send { session_id, user_id, frame } => {
                    if let Err(e) = self.dispatcher.send(&session_id, frame).await {
                        tracing::warn!(match_id, %session_id, %user_id, error = %e, "send failed");
                    }
                },
                MatchAction::Log { level, tick, message } => match level {
                    LogLevel::Debug => tracing::debug!(match_id, tick, "{}", message),
                    LogLevel::Info => tracing::info!(match_id, tick, "{}", message),
                    LogLevel::Warn => tracing::warn!(match_id, tick, "{}", message),
                    LogLevel::Error => tracing::error!(match_id, tick, "{}", message),
                },
                MatchAction::Terminate => return ControlFlow::Break(()),
            }
        }
        ControlFlow::Continue(())
    }
}
