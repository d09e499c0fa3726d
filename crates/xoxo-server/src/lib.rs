//! Authoritative xoxo match server.
//!
//! # Architecture
//!
//! [`MatchController`] is the sans-IO core: it consumes [`MatchEvent`]s and
//! returns [`MatchAction`]s without touching the network or the clock.
//! [`MatchServer`] runs one controller per match on its own tokio task,
//! ticking at [`MatchConfig::tick_rate`], and executes the actions through a
//! [`Dispatcher`].
//!
//! # Components
//!
//! - [`MatchController`]: admission, move processing, broadcast, rematch,
//!   termination
//! - [`MatchServer`]: match registry plus per-match tick tasks
//! - [`Dispatcher`]: outbound delivery seam
//! - [`SystemEnv`]: production environment (real time, OS RNG)

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod config;
mod controller;
mod dispatcher;
mod error;
mod registry;
mod runtime;
mod system_env;

pub use config::MatchConfig;
pub use controller::{LogLevel, MatchAction, MatchController, MatchData, MatchEvent, MatchPhase};
pub use dispatcher::{DispatchError, Dispatcher};
pub use error::ServerError;
pub use runtime::MatchServer;
pub use system_env::SystemEnv;
