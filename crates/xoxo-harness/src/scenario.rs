//! Two-bot simulation.
//!
//! Wires a [`LocalHub`], two [`ClientSync`]s and two [`RandomBot`]s together
//! and plays a fixed number of games. Everything random flows from one seed.

use std::{fmt, sync::Arc, time::Duration};

use xoxo_client::{CancellationToken, ClientConfig, ClientSync};

use crate::{
    SimEnv,
    bot::{GameResult, RandomBot},
    error::HubError,
    hub::{HubConfig, LocalHub},
};

/// Simulation parameters.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// RNG seed for identities, match ids and moves.
    pub seed: u64,
    /// Games to play.
    pub games: usize,
    /// Hub and match configuration.
    pub hub: HubConfig,
    /// Client configuration shared by both bots.
    pub client: ClientConfig,
    /// Give up after this long.
    pub timeout: Duration,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            games: 1,
            hub: HubConfig::default(),
            client: ClientConfig::default(),
            timeout: Duration::from_secs(600),
        }
    }
}

/// Results of one simulation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimReport {
    /// Seed the run was played with.
    pub seed: u64,
    /// Bot usernames, first-queued first.
    pub players: [String; 2],
    /// Per-game results for each bot.
    pub results: [Vec<GameResult>; 2],
}

impl SimReport {
    /// `(wins, losses, draws)` for a bot.
    pub fn tally(&self, bot: usize) -> (usize, usize, usize) {
        let results = self.results.get(bot).map_or(&[][..], Vec::as_slice);
        let count = |r| results.iter().filter(|&&x| x == r).count();
        (count(GameResult::Won), count(GameResult::Lost), count(GameResult::Draw))
    }
}

impl fmt::Display for SimReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "seed {} games {}", self.seed, self.results[0].len())?;
        for (i, name) in self.players.iter().enumerate() {
            let (w, l, d) = self.tally(i);
            write!(f, " | {name}: {w}W {l}L {d}D")?;
        }
        Ok(())
    }
}

/// Play `config.games` games between two random bots.
///
/// # Errors
///
/// - `HubError::Timeout` if the games do not finish within `config.timeout`
/// - `HubError::Client` if a bot command fails
pub async fn simulate(config: &SimConfig) -> Result<SimReport, HubError> {
    let env = SimEnv::with_seed(config.seed);
    let hub = LocalHub::new(env.clone(), config.hub.clone());
    let cancel = CancellationToken::new();

    let matchmaker = {
        let hub = hub.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { hub.run_matchmaker(cancel).await })
    };

    let mut bots = Vec::with_capacity(2);
    for _ in 0..2 {
        let identity = config.client.identity(&env);
        let (session, events) = hub.connect(&identity);
        let client = Arc::new(ClientSync::new(session, identity, &config.client));

        let pump = Arc::clone(&client);
        let pump_cancel = cancel.clone();
        tokio::spawn(async move { pump.run(events, &pump_cancel).await });

        bots.push(RandomBot::new(client, env.clone()));
    }
    let players = [
        bots[0].client().identity().username.clone(),
        bots[1].client().identity().username.clone(),
    ];

    let games = async {
        tokio::join!(bots[0].play(config.games, &cancel), bots[1].play(config.games, &cancel))
    };
    let outcome = tokio::time::timeout(config.timeout, games).await;

    for bot in &bots {
        if let Err(e) = bot.client().leave().await {
            tracing::debug!(user_id = %bot.client().user_id(), error = %e, "leave failed");
        }
    }
    cancel.cancel();
    let _ = matchmaker.await;

    let (first, second) = outcome.map_err(|_| HubError::Timeout(config.timeout))?;
    Ok(SimReport { seed: config.seed, players, results: [first?, second?] })
}
