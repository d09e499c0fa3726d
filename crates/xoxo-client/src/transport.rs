//! Transport seam.
//!
//! Everything the client sends goes through a [`Transport`]; everything it
//! receives arrives as a [`crate::ClientEvent`]. One transport instance is
//! bound to one authenticated session.

use async_trait::async_trait;
use xoxo_proto::Frame;

use crate::error::TransportError;

/// Outbound session operations.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Request a two-player match. Returns the matchmaker ticket id.
    async fn matchmaker_add(&self) -> Result<String, TransportError>;

    /// Cancel a matchmaker ticket.
    async fn matchmaker_remove(&self, ticket_id: &str) -> Result<(), TransportError>;

    /// Join a match. Returns the joined match id.
    async fn match_join(&self, match_id: &str) -> Result<String, TransportError>;

    /// Leave a match.
    async fn match_leave(&self, match_id: &str) -> Result<(), TransportError>;

    /// Send a frame to a match.
    async fn send_match_data(&self, match_id: &str, frame: Frame) -> Result<(), TransportError>;
}
