//! Client synchronization.
//!
//! `ClientSync` ingests projected views pushed by the server, keeps the latest
//! one behind a single lock, and lets callers wait for "ready" or "my turn"
//! without polling the network themselves.
//!
//! # Invariants
//!
//! - the cached view is only replaced by [`ClientSync::handle_event`] and
//!   cleared by leave/close/disconnect
//! - `waiting` is set before a move is sent and cleared only by a freshly
//!   ingested view, so at most one move is ever outstanding
//! - the lock is never held across an `.await` or while a callback runs

use std::{
    sync::{
        Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use tokio::{sync::Notify, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use xoxo_proto::{Move, Payload, ProjectedView};

use crate::{
    config::{ClientConfig, ClientIdentity},
    error::ClientError,
    event::{ClientEvent, EventHandler, Handlers, is_meaningful},
    transport::Transport,
};

/// State shared between the event pump and command callers.
#[derive(Debug)]
struct Cached {
    view: Option<ProjectedView>,
    /// No fresh view since the last move, leave or decode failure.
    waiting: bool,
    ticket_id: Option<String>,
    /// A matchmaker request is in flight and has not returned a ticket yet.
    requesting: bool,
    match_id: Option<String>,
}

impl Default for Cached {
    fn default() -> Self {
        Self { view: None, waiting: true, ticket_id: None, requesting: false, match_id: None }
    }
}

/// What a waiter decided after inspecting the cached state.
enum Wait {
    Done(bool),
    Pending,
}

/// Client-side match synchronization.
pub struct ClientSync<T: Transport> {
    transport: Arc<T>,
    identity: ClientIdentity,
    poll_interval: Duration,
    cached: RwLock<Cached>,
    notify: Notify,
    connected: AtomicBool,
    handlers: Handlers,
}

impl<T: Transport> std::fmt::Debug for ClientSync<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSync")
            .field("identity", &self.identity)
            .field("cached", &*self.read())
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}

impl<T: Transport> ClientSync<T> {
    /// Create a client bound to a transport session.
    pub fn new(transport: Arc<T>, identity: ClientIdentity, config: &ClientConfig) -> Self {
        Self::with_handlers(transport, identity, config, Handlers::default())
    }

    /// Create a client with callbacks installed.
    pub fn with_handlers(
        transport: Arc<T>,
        identity: ClientIdentity,
        config: &ClientConfig,
        handlers: Handlers,
    ) -> Self {
        Self {
            transport,
            identity,
            poll_interval: config.poll_interval,
            cached: RwLock::new(Cached::default()),
            notify: Notify::new(),
            connected: AtomicBool::new(false),
            handlers,
        }
    }

    /// Process one event from the session.
    pub async fn handle_event(&self, event: ClientEvent) {
        match &event {
            ClientEvent::Connected => {
                tracing::debug!(user_id = %self.identity.user_id, "connected");
                self.connected.store(true, Ordering::SeqCst);
                fire(self.handlers.on_connect.as_ref(), &event);
            },
            ClientEvent::Disconnected { reason } => {
                tracing::debug!(user_id = %self.identity.user_id, ?reason, "disconnected");
                self.connected.store(false, Ordering::SeqCst);
                self.replace_view(None);
                fire(self.handlers.on_disconnect.as_ref(), &event);
            },
            ClientEvent::Error { message } => {
                tracing::warn!(user_id = %self.identity.user_id, %message, "server error");
                fire(self.handlers.on_error.as_ref(), &event);
            },
            ClientEvent::MatchData { match_id, frame } => {
                match Payload::from_frame(frame) {
                    Ok(Payload::State(view)) => self.replace_view(Some(view)),
                    Ok(Payload::Move(_)) => {
                        tracing::debug!(%match_id, "ignoring move frame from server");
                    },
                    Err(e) => {
                        tracing::debug!(%match_id, error = %e, "unable to decode match data");
                        self.replace_view(None);
                    },
                }
                fire(self.handlers.on_match_data.as_ref(), &event);
            },
            ClientEvent::MatchPresence { match_id, leaves, .. } => {
                if !leaves.is_empty() {
                    tracing::debug!(%match_id, leaves = leaves.len(), "presence left");
                    self.clear_view();
                }
                fire(self.handlers.on_presence.as_ref(), &event);
            },
            ClientEvent::MatchmakerMatched { ticket_id, match_id } => {
                tracing::debug!(%ticket_id, %match_id, "matched, joining");
                match self.transport.match_join(match_id).await {
                    Ok(joined) => {
                        // The match consumed our only ticket, whether or not
                        // `join` has stored it yet.
                        let mut cached = self.write();
                        cached.ticket_id = None;
                        cached.requesting = false;
                        cached.match_id = Some(joined);
                    },
                    Err(e) => {
                        tracing::warn!(%match_id, error = %e, "unable to join matched match");
                        if let Some(handler) = &self.handlers.on_join_error {
                            handler(&e);
                        }
                    },
                }
                self.notify.notify_waiters();
                fire(self.handlers.on_matched.as_ref(), &event);
            },
        }
    }

    /// Wait until a view exists and no rematch countdown is running.
    ///
    /// Returns `false` if `cancel` fires first.
    pub async fn ready(&self, cancel: &CancellationToken) -> bool {
        self.wait(cancel, |cached| match &cached.view {
            Some(view) if view.state.rematch_countdown == 0 => Wait::Done(true),
            _ => Wait::Pending,
        })
        .await
    }

    /// Wait until it is this client's turn.
    ///
    /// Returns `false` if the game is over, a rematch is pending, or `cancel`
    /// fires first.
    pub async fn next(&self, cancel: &CancellationToken) -> bool {
        self.wait(cancel, |cached| {
            let Some(view) = cached.view.as_ref().filter(|_| !cached.waiting) else {
                return Wait::Pending;
            };
            if view.state.is_terminal() || view.state.rematch_countdown != 0 {
                Wait::Done(false)
            } else if view.your_turn {
                Wait::Done(true)
            } else {
                Wait::Pending
            }
        })
        .await
    }

    /// Request a match from the matchmaker.
    ///
    /// # Errors
    ///
    /// - `ClientError::TicketPending` if a ticket is already outstanding or
    ///   being requested
    /// - `ClientError::Transport` if the request fails
    pub async fn join(&self) -> Result<(), ClientError> {
        {
            let mut cached = self.write();
            if let Some(ticket_id) = cached.ticket_id.clone() {
                return Err(ClientError::TicketPending(ticket_id));
            }
            if cached.requesting {
                return Err(ClientError::TicketPending("requested".into()));
            }
            cached.requesting = true;
        }

        let ticket_id = match self.transport.matchmaker_add().await {
            Ok(ticket_id) => ticket_id,
            Err(e) => {
                self.write().requesting = false;
                return Err(e.into());
            },
        };

        let cancelled = {
            let mut cached = self.write();
            if cached.requesting {
                cached.requesting = false;
                cached.ticket_id = Some(ticket_id.clone());
                false
            } else {
                // Matched or left while the request was in flight.
                cached.match_id.is_none()
            }
        };
        tracing::debug!(user_id = %self.identity.user_id, %ticket_id, cancelled, "matchmaker ticket added");

        if cancelled {
            if let Err(e) = self.transport.matchmaker_remove(&ticket_id).await {
                tracing::debug!(%ticket_id, error = %e, "unable to remove ticket");
            }
        }
        Ok(())
    }

    /// Cancel any pending ticket, leave the current match and drop the view.
    ///
    /// Local state is reset before the transport calls, so it is cleared even
    /// if they fail.
    ///
    /// # Errors
    ///
    /// - `ClientError::Transport` from the first failing transport call
    pub async fn leave(&self) -> Result<(), ClientError> {
        let (ticket_id, match_id, had_view) = {
            let mut cached = self.write();
            let had_view = cached.view.is_some();
            let ticket_id = cached.ticket_id.take();
            let match_id = cached.match_id.take();
            cached.requesting = false;
            cached.view = None;
            cached.waiting = true;
            (ticket_id, match_id, had_view)
        };
        self.notify.notify_waiters();
        if had_view {
            self.fire_state(None);
        }

        let mut result = Ok(());
        if let Some(ticket_id) = ticket_id {
            if let Err(e) = self.transport.matchmaker_remove(&ticket_id).await {
                tracing::debug!(%ticket_id, error = %e, "unable to remove ticket");
                result = Err(e.into());
            }
        }
        if let Some(match_id) = match_id {
            if let Err(e) = self.transport.match_leave(&match_id).await {
                tracing::debug!(%match_id, error = %e, "unable to leave match");
                result = result.and(Err(e.into()));
            }
        }
        result
    }

    /// Send a move at 0-based `(row, col)`.
    ///
    /// # Errors
    ///
    /// - `ClientError::NoActiveMatch` without a match id or a view
    /// - `ClientError::MoveInFlight` while a previous move is unanswered
    /// - `ClientError::Encode` / `ClientError::Transport` on send failure
    pub async fn make_move(&self, row: usize, col: usize) -> Result<(), ClientError> {
        let frame = Payload::Move(Move::at(row, col)).into_frame()?;

        let match_id = {
            let mut cached = self.write();
            let Some(match_id) = cached.match_id.clone().filter(|_| cached.view.is_some()) else {
                return Err(ClientError::NoActiveMatch);
            };
            if cached.waiting {
                return Err(ClientError::MoveInFlight);
            }
            cached.waiting = true;
            match_id
        };

        tracing::debug!(%match_id, row, col, "sending move");
        if let Err(e) = self.transport.send_match_data(&match_id, frame).await {
            // Nothing reached the server; allow a retry.
            self.write().waiting = false;
            return Err(e.into());
        }
        Ok(())
    }

    /// Leave and mark the session closed.
    ///
    /// # Errors
    ///
    /// - any error from [`Self::leave`]
    pub async fn close(&self) -> Result<(), ClientError> {
        let result = self.leave().await;
        self.connected.store(false, Ordering::SeqCst);
        result
    }

    /// Latest cached view.
    pub fn state(&self) -> Option<ProjectedView> {
        self.read().view.clone()
    }

    /// Current match id.
    pub fn match_id(&self) -> Option<String> {
        self.read().match_id.clone()
    }

    /// Pending matchmaker ticket.
    pub fn ticket_id(&self) -> Option<String> {
        self.read().ticket_id.clone()
    }

    /// Whether a move is awaiting a fresh view (or no view has arrived yet).
    pub fn is_waiting(&self) -> bool {
        self.read().waiting
    }

    /// Session connection status.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// This client's user id.
    pub fn user_id(&self) -> &str {
        &self.identity.user_id
    }

    /// This client's identity.
    pub fn identity(&self) -> &ClientIdentity {
        &self.identity
    }

    /// Replace the cached view and fire the state callback if meaningful.
    ///
    /// `None` marks the client as waiting; a view clears the flag.
    fn replace_view(&self, view: Option<ProjectedView>) {
        let (fire, current) = {
            let mut cached = self.write();
            let fire = is_meaningful(cached.view.as_ref(), view.as_ref());
            cached.waiting = view.is_none();
            cached.view = view;
            (fire, cached.view.clone())
        };
        self.notify.notify_waiters();
        if fire {
            self.fire_state(current.as_ref());
        }
    }

    /// Drop the view without touching `waiting`; always fires the callback.
    fn clear_view(&self) {
        self.write().view = None;
        self.notify.notify_waiters();
        self.fire_state(None);
    }

    fn fire_state(&self, view: Option<&ProjectedView>) {
        if let Some(handler) = &self.handlers.on_state_change {
            handler(view);
        }
    }

    async fn wait<F>(&self, cancel: &CancellationToken, check: F) -> bool
    where
        F: Fn(&Cached) -> Wait,
    {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if cancel.is_cancelled() {
                return false;
            }
            let decision = check(&self.read());
            if let Wait::Done(result) = decision {
                return result;
            }

            tokio::select! {
                biased;
                () = cancel.cancelled() => return false,
                () = &mut notified => {},
                () = tokio::time::sleep(self.poll_interval) => {},
            }
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Cached> {
        self.cached.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Cached> {
        self.cached.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Transport> ClientSync<T> {
    /// [`Self::join`] on a background task; `f` receives the result.
    pub fn join_async<F>(self: &Arc<Self>, f: F) -> JoinHandle<()>
    where
        F: FnOnce(Result<(), ClientError>) + Send + 'static,
    {
        let client = Arc::clone(self);
        tokio::spawn(async move { f(client.join().await) })
    }

    /// [`Self::leave`] on a background task; `f` receives the result.
    pub fn leave_async<F>(self: &Arc<Self>, f: F) -> JoinHandle<()>
    where
        F: FnOnce(Result<(), ClientError>) + Send + 'static,
    {
        let client = Arc::clone(self);
        tokio::spawn(async move { f(client.leave().await) })
    }

    /// [`Self::make_move`] on a background task; `f` receives the result.
    pub fn make_move_async<F>(self: &Arc<Self>, row: usize, col: usize, f: F) -> JoinHandle<()>
    where
        F: FnOnce(Result<(), ClientError>) + Send + 'static,
    {
        let client = Arc::clone(self);
        tokio::spawn(async move { f(client.make_move(row, col).await) })
    }

    /// Feed events from `events` until the channel closes or `cancel` fires.
    pub async fn run(
        &self,
        mut events: tokio::sync::mpsc::UnboundedReceiver<ClientEvent>,
        cancel: &CancellationToken,
    ) {
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                event = events.recv() => match event {
                    Some(event) => self.handle_event(event).await,
                    None => break,
                },
            }
        }
    }
}

fn fire(handler: Option<&EventHandler>, event: &ClientEvent) {
    if let Some(handler) = handler {
        handler(event);
    }
}
