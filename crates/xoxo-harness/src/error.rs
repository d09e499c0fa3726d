//! Harness error types.

use std::time::Duration;

use thiserror::Error;
use xoxo_client::ClientError;

/// Errors from hub and simulation operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HubError {
    /// No connected session with this id
    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// A bot's client command failed
    #[error("client error: {0}")]
    Client(#[from] ClientError),

    /// Simulation did not finish in time
    #[error("simulation timed out after {0:?}")]
    Timeout(Duration),
}
