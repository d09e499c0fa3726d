//! xoxo simulation binary.
//!
//! Runs two random bots against each other through an in-process hub and
//! logs every game's result.
//!
//! # Usage
//!
//! ```bash
//! # Three games, one tick per second
//! xoxo --count 3
//!
//! # Reproduce a run quickly, with per-move logs
//! xoxo --seed 42 --count 10 --tick-rate 20 --rematch-secs 1 --log-level debug
//! ```

use std::time::Duration;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use xoxo_harness::{HubConfig, SimConfig, simulate};
use xoxo_server::MatchConfig;

/// Ticks a single game may take, excluding the rematch countdown.
const GAME_TICK_BUDGET: u64 = 20;

/// Bot-vs-bot tic-tac-toe over an authoritative match
#[derive(Parser, Debug)]
#[command(name = "xoxo")]
#[command(about = "Play seeded bot-vs-bot tic-tac-toe matches")]
#[command(version)]
struct Args {
    /// RNG seed for identities, match ids and moves
    #[arg(short, long, default_value = "0")]
    seed: u64,

    /// Number of games to play
    #[arg(short, long, default_value = "1")]
    count: usize,

    /// Match ticks per second
    #[arg(long, default_value = "1")]
    tick_rate: u32,

    /// Seconds between a finished game and the rematch
    #[arg(long, default_value = "10")]
    rematch_secs: u32,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn sim_config(&self) -> SimConfig {
        let match_config = MatchConfig {
            tick_rate: self.tick_rate,
            rematch_secs: self.rematch_secs,
            ..MatchConfig::default()
        };
        let ticks_per_game = u64::from(match_config.rematch_ticks()) + GAME_TICK_BUDGET;
        let timeout = match_config.tick_interval().saturating_mul(
            u32::try_from(ticks_per_game * (self.count as u64 + 1)).unwrap_or(u32::MAX),
        );

        SimConfig {
            seed: self.seed,
            games: self.count,
            hub: HubConfig { match_config, ..HubConfig::default() },
            timeout: timeout.max(Duration::from_secs(1)),
            ..SimConfig::default()
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    let config = args.sim_config();
    tracing::info!(
        seed = config.seed,
        games = config.games,
        tick_rate = config.hub.match_config.tick_rate,
        "starting simulation"
    );

    let report = simulate(&config).await?;
    for (game, (first, second)) in report.results[0].iter().zip(&report.results[1]).enumerate() {
        tracing::info!(
            game = game + 1,
            "{}: {first}, {}: {second}",
            report.players[0],
            report.players[1]
        );
    }
    tracing::info!("{report}");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_server_defaults() {
        let args = Args::parse_from(["xoxo"]);
        let config = args.sim_config();

        assert_eq!(config.seed, 0);
        assert_eq!(config.games, 1);
        assert_eq!(config.hub.match_config.tick_rate, 1);
        assert_eq!(config.hub.match_config.rematch_ticks(), 10);
        assert_eq!(config.timeout, Duration::from_secs(60));
    }

    #[test]
    fn flags_reach_match_config() {
        let args = Args::parse_from([
            "xoxo",
            "--seed",
            "9",
            "--count",
            "4",
            "--tick-rate",
            "10",
            "--rematch-secs",
            "2",
        ]);
        let config = args.sim_config();

        assert_eq!(config.seed, 9);
        assert_eq!(config.games, 4);
        assert_eq!(config.hub.match_config.tick_interval(), Duration::from_millis(100));
        assert_eq!(config.hub.match_config.rematch_ticks(), 20);
    }
}
