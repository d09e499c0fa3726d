//! In-process session hub.
//!
//! Stands in for the real session server: it hands out per-client
//! [`HubSession`] transports, pairs matchmaker tickets on a fixed interval,
//! forwards match traffic to a [`MatchServer`], and routes outbound frames
//! and presence notifications back to each client's event queue.

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use async_trait::async_trait;
use tokio::sync::mpsc;
use xoxo_client::{CancellationToken, ClientEvent, ClientIdentity, Transport, TransportError};
use xoxo_core::env::Environment;
use xoxo_proto::{Frame, Player};
use xoxo_server::{DispatchError, Dispatcher, MatchConfig, MatchData, MatchServer};

use crate::error::HubError;

/// Hub configuration.
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Configuration for every match the hub creates.
    pub match_config: MatchConfig,
    /// How often waiting tickets are paired.
    pub matchmaker_interval: Duration,
    /// Node name stamped on every presence.
    pub node: String,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            match_config: MatchConfig::default(),
            matchmaker_interval: Duration::from_millis(100),
            node: "local".to_string(),
        }
    }
}

/// A connected session.
struct SessionEntry {
    tx: mpsc::UnboundedSender<ClientEvent>,
    player: Player,
    match_id: Option<String>,
}

/// Session table shared by the hub and the match server's dispatcher.
#[derive(Default)]
pub struct HubRouter {
    sessions: Mutex<HashMap<String, SessionEntry>>,
}

impl std::fmt::Debug for HubRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HubRouter").field("sessions", &self.lock().len()).finish()
    }
}

impl HubRouter {
    fn lock(&self) -> MutexGuard<'_, HashMap<String, SessionEntry>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn deliver(&self, session_id: &str, event: ClientEvent) -> Result<(), DispatchError> {
        let sessions = self.lock();
        let Some(entry) = sessions.get(session_id) else {
            return Err(DispatchError::SessionNotFound(session_id.to_string()));
        };
        entry.tx.send(event).map_err(|_| DispatchError::Closed(session_id.to_string()))
    }

    fn set_match(&self, session_id: &str, match_id: Option<String>) {
        if let Some(entry) = self.lock().get_mut(session_id) {
            entry.match_id = match_id;
        }
    }

    /// Sessions currently in a match, excluding `except`.
    fn members(&self, match_id: &str, except: &str) -> Vec<String> {
        let mut members: Vec<String> = self
            .lock()
            .iter()
            .filter(|(id, entry)| id.as_str() != except && entry.match_id.as_deref() == Some(match_id))
            .map(|(id, _)| id.clone())
            .collect();
        members.sort();
        members
    }

    fn notify_presence(&self, match_id: &str, except: &str, joins: Vec<Player>, leaves: Vec<Player>) {
        for session_id in self.members(match_id, except) {
            let event = ClientEvent::MatchPresence {
                match_id: match_id.to_string(),
                joins: joins.clone(),
                leaves: leaves.clone(),
            };
            if let Err(e) = self.deliver(&session_id, event) {
                tracing::debug!(%session_id, error = %e, "presence notification dropped");
            }
        }
    }
}

#[async_trait]
impl Dispatcher for HubRouter {
    async fn send(&self, session_id: &str, frame: Frame) -> Result<(), DispatchError> {
        let match_id = self
            .lock()
            .get(session_id)
            .and_then(|entry| entry.match_id.clone())
            .unwrap_or_default();
        self.deliver(session_id, ClientEvent::MatchData { match_id, frame })
    }
}

/// A waiting matchmaker ticket.
#[derive(Debug)]
struct Ticket {
    ticket_id: String,
    session_id: String,
}

struct HubInner<E: Environment> {
    env: E,
    config: HubConfig,
    server: MatchServer<E, HubRouter>,
    router: Arc<HubRouter>,
    tickets: Mutex<VecDeque<Ticket>>,
}

impl<E: Environment> HubInner<E> {
    fn tickets(&self) -> MutexGuard<'_, VecDeque<Ticket>> {
        self.tickets.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// In-process matchmaker, session router and match host.
pub struct LocalHub<E: Environment> {
    inner: Arc<HubInner<E>>,
}

impl<E: Environment> Clone for LocalHub<E> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<E: Environment> LocalHub<E> {
    /// Create a hub. Call [`Self::run_matchmaker`] to start pairing tickets.
    pub fn new(env: E, config: HubConfig) -> Self {
        let router = Arc::new(HubRouter::default());
        let server = MatchServer::new(env.clone(), Arc::clone(&router), config.match_config.clone());
        Self {
            inner: Arc::new(HubInner {
                env,
                config,
                server,
                router,
                tickets: Mutex::new(VecDeque::new()),
            }),
        }
    }

    /// Open a session for `identity`.
    ///
    /// Returns the session's transport and its event queue. A `Connected`
    /// event is already queued.
    pub fn connect(
        &self,
        identity: &ClientIdentity,
    ) -> (Arc<HubSession<E>>, mpsc::UnboundedReceiver<ClientEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let session_id = format!("{:016x}", self.inner.env.random_u64());
        let player = Player::new(
            self.inner.config.node.clone(),
            session_id.clone(),
            identity.user_id.clone(),
            identity.username.clone(),
        );

        // Receiver is alive; this cannot fail.
        let _ = tx.send(ClientEvent::Connected);
        self.inner
            .router
            .lock()
            .insert(session_id, SessionEntry { tx, player: player.clone(), match_id: None });

        tracing::debug!(user_id = %player.user_id, session_id = %player.session_id, "session connected");
        (Arc::new(HubSession { hub: Arc::clone(&self.inner), player }), rx)
    }

    /// Close a session.
    ///
    /// Queues a `Disconnected` event, drops any waiting tickets and, if the
    /// session was in a match, leaves it.
    ///
    /// # Errors
    ///
    /// - `HubError::SessionNotFound` if the session is not connected
    pub async fn disconnect(&self, session_id: &str) -> Result<(), HubError> {
        let Some(entry) = self.inner.router.lock().remove(session_id) else {
            return Err(HubError::SessionNotFound(session_id.to_string()));
        };
        self.inner.tickets().retain(|ticket| ticket.session_id != session_id);
        let _ = entry.tx.send(ClientEvent::Disconnected { reason: Some("closed by hub".into()) });

        if let Some(match_id) = entry.match_id {
            if let Err(e) = self.inner.server.leave(&match_id, entry.player.clone()).await {
                tracing::debug!(%match_id, error = %e, "leave on disconnect failed");
            }
            self.inner.router.notify_presence(&match_id, session_id, vec![], vec![entry.player]);
        }
        Ok(())
    }

    /// Pair waiting tickets, two at a time, into new matches.
    ///
    /// Returns the number of matches created.
    pub async fn pair_tickets(&self) -> usize {
        let mut created = 0;
        loop {
            let pair = {
                let mut tickets = self.inner.tickets();
                if tickets.len() < 2 {
                    break;
                }
                (tickets.pop_front(), tickets.pop_front())
            };
            let (Some(first), Some(second)) = pair else {
                break;
            };

            let match_id = self.inner.server.create_match().await;
            for ticket in [first, second] {
                let event = ClientEvent::MatchmakerMatched {
                    ticket_id: ticket.ticket_id.clone(),
                    match_id: match_id.clone(),
                };
                if let Err(e) = self.inner.router.deliver(&ticket.session_id, event) {
                    tracing::warn!(%match_id, ticket_id = %ticket.ticket_id, error = %e, "matched session gone");
                }
            }
            created += 1;
        }
        created
    }

    /// Pair tickets every `matchmaker_interval` until `cancel` fires.
    pub async fn run_matchmaker(&self, cancel: CancellationToken) {
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                () = self.inner.env.sleep(self.inner.config.matchmaker_interval) => {
                    self.pair_tickets().await;
                },
            }
        }
    }

    /// The hosted match server.
    pub fn server(&self) -> &MatchServer<E, HubRouter> {
        &self.inner.server
    }
}

/// One client's view of the hub.
pub struct HubSession<E: Environment> {
    hub: Arc<HubInner<E>>,
    player: Player,
}

impl<E: Environment> std::fmt::Debug for HubSession<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HubSession").field("player", &self.player).finish_non_exhaustive()
    }
}

impl<E: Environment> HubSession<E> {
    /// Session id assigned by the hub.
    pub fn session_id(&self) -> &str {
        &self.player.session_id
    }

    /// Presence this session joins matches as.
    pub fn player(&self) -> &Player {
        &self.player
    }

    fn ensure_connected(&self) -> Result<(), TransportError> {
        if self.hub.router.lock().contains_key(&self.player.session_id) {
            Ok(())
        } else {
            Err(TransportError::NotConnected)
        }
    }
}

#[async_trait]
impl<E: Environment> Transport for HubSession<E> {
    async fn matchmaker_add(&self) -> Result<String, TransportError> {
        self.ensure_connected()?;
        let ticket_id = format!("{:016x}", self.hub.env.random_u64());
        self.hub.tickets().push_back(Ticket {
            ticket_id: ticket_id.clone(),
            session_id: self.player.session_id.clone(),
        });
        Ok(ticket_id)
    }

    async fn matchmaker_remove(&self, ticket_id: &str) -> Result<(), TransportError> {
        self.hub.tickets().retain(|ticket| ticket.ticket_id != ticket_id);
        Ok(())
    }

    async fn match_join(&self, match_id: &str) -> Result<String, TransportError> {
        self.ensure_connected()?;
        let session_id = self.player.session_id.as_str();

        // Route the join broadcast with the right match id.
        self.hub.router.set_match(session_id, Some(match_id.to_string()));
        if let Err(e) = self.hub.server.join(match_id, self.player.clone()).await {
            self.hub.router.set_match(session_id, None);
            return Err(TransportError::Rejected(e.to_string()));
        }

        self.hub.router.notify_presence(match_id, session_id, vec![self.player.clone()], vec![]);
        Ok(match_id.to_string())
    }

    async fn match_leave(&self, match_id: &str) -> Result<(), TransportError> {
        let session_id = self.player.session_id.as_str();
        let result = self.hub.server.leave(match_id, self.player.clone()).await;
        self.hub.router.set_match(session_id, None);
        self.hub.router.notify_presence(match_id, session_id, vec![], vec![self.player.clone()]);
        result.map_err(|e| TransportError::Rejected(e.to_string()))
    }

    async fn send_match_data(&self, match_id: &str, frame: Frame) -> Result<(), TransportError> {
        self.ensure_connected()?;
        let data = MatchData { user_id: self.player.user_id.clone(), frame };
        self.hub
            .server
            .submit(match_id, data)
            .await
            .map_err(|e| TransportError::Rejected(e.to_string()))
    }
}
