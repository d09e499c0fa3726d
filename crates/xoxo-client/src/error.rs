//! Client error types.

use thiserror::Error;
use xoxo_proto::ProtocolError;

/// Failures reported by a [`crate::Transport`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Session is not connected
    #[error("not connected")]
    NotConnected,

    /// Server refused the request
    #[error("rejected: {0}")]
    Rejected(String),

    /// Underlying connection closed mid-request
    #[error("connection closed")]
    Closed,
}

/// Errors returned by [`crate::ClientSync`] commands.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// No match id or no state received yet
    #[error("no active match")]
    NoActiveMatch,

    /// A previous move has not been answered by a fresh state
    #[error("move already in flight")]
    MoveInFlight,

    /// Matchmaker ticket already pending
    #[error("waiting on matchmaker ticket {0}")]
    TicketPending(String),

    /// Transport failure
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Move could not be encoded
    #[error("encode error: {0}")]
    Encode(#[from] ProtocolError),
}
