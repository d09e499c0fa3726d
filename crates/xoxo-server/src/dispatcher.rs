//! Outbound delivery seam.
//!
//! The runtime hands every `MatchAction::Send` to a [`Dispatcher`]. Production
//! wires this to the session transport; the harness wires it to in-process
//! channels.

use async_trait::async_trait;
use thiserror::Error;
use xoxo_proto::Frame;

/// Delivers frames to connected sessions.
#[async_trait]
pub trait Dispatcher: Send + Sync + 'static {
    /// Send a frame to one session.
    ///
    /// # Errors
    ///
    /// Any [`DispatchError`]. The runtime logs it and moves on to the next
    /// recipient.
    async fn send(&self, session_id: &str, frame: Frame) -> Result<(), DispatchError>;
}

/// Delivery failures for a single recipient.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// No session with this id is connected
    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// Session exists but its outbound queue is closed
    #[error("session closed: {0}")]
    Closed(String),
}
