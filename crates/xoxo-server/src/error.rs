//! Server error types.

use thiserror::Error;
use xoxo_core::GameError;

/// Errors returned to callers of [`crate::MatchServer`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServerError {
    /// No running match with this id
    #[error("match not found: {0}")]
    MatchNotFound(String),

    /// Match task stopped before handling the request
    #[error("match closed: {0}")]
    MatchClosed(String),

    /// Join attempt rejected by the match
    #[error("join rejected: {0}")]
    Rejected(#[from] GameError),
}
