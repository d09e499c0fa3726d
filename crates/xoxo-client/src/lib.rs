//! Client synchronization for xoxo matches.
//!
//! # Architecture
//!
//! The session (real network or the in-process hub) pushes [`ClientEvent`]s
//! into [`ClientSync::handle_event`]. Commands (`join`, `leave`,
//! `make_move`) go out through a [`Transport`]. Game loops block on
//! [`ClientSync::ready`] and [`ClientSync::next`], which wake on every
//! ingested view and stop as soon as their `CancellationToken` fires.
//!
//! # Components
//!
//! - [`ClientSync`]: cached view, wait primitives, commands
//! - [`Transport`]: outbound session operations
//! - [`Handlers`]: named optional callbacks
//! - [`ClientConfig`] / [`ClientIdentity`]: who the client plays as

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod client;
mod config;
mod error;
mod event;
mod transport;

pub use client::ClientSync;
pub use config::{ClientConfig, ClientIdentity};
pub use error::{ClientError, TransportError};
pub use event::{ClientEvent, EventHandler, Handlers, JoinErrorHandler, StateHandler};
pub use tokio_util::sync::CancellationToken;
pub use transport::Transport;
