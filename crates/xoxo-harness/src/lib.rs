//! Deterministic in-process simulation for xoxo matches.
//!
//! Replaces the network with an in-process [`LocalHub`] (matchmaker, session
//! router and match host in one) and the OS with a seeded [`SimEnv`], so
//! complete client/server games run inside a single test, reproducibly.
//!
//! # Components
//!
//! - [`SimEnv`]: seeded environment
//! - [`LocalHub`] / [`HubSession`]: in-process transport and dispatcher
//! - [`RandomBot`]: plays random legal moves through a `ClientSync`
//! - [`simulate`]: two bots, N games, one seed

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod bot;
mod error;
pub mod hub;
pub mod scenario;
mod sim_env;

pub use bot::{GameResult, RandomBot};
pub use error::HubError;
pub use hub::{HubConfig, HubRouter, HubSession, LocalHub};
pub use scenario::{SimConfig, SimReport, simulate};
pub use sim_env::SimEnv;
