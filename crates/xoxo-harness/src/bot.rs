//! Random-move bot.

use std::{fmt, sync::Arc};

use xoxo_client::{CancellationToken, ClientError, ClientSync, Transport};
use xoxo_core::env::Environment;
use xoxo_proto::ProjectedView;

use crate::error::HubError;

/// Outcome of one game from a bot's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameResult {
    /// This bot completed a line.
    Won,
    /// The opponent completed a line.
    Lost,
    /// Board filled with no line.
    Draw,
}

impl GameResult {
    /// The same game seen from the other seat.
    pub fn flipped(self) -> Self {
        match self {
            Self::Won => Self::Lost,
            Self::Lost => Self::Won,
            Self::Draw => Self::Draw,
        }
    }

    fn from_view(view: &ProjectedView, user_id: &str) -> Option<Self> {
        let state = &view.state;
        if state.draw {
            return Some(Self::Draw);
        }
        let winner = state.winner?;
        let won = state.player(winner).is_some_and(|p| p.user_id == user_id);
        Some(if won { Self::Won } else { Self::Lost })
    }
}

impl fmt::Display for GameResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Won => "won",
            Self::Lost => "lost",
            Self::Draw => "draw",
        })
    }
}

/// Plays uniformly random legal moves.
pub struct RandomBot<T: Transport, E: Environment> {
    client: Arc<ClientSync<T>>,
    env: E,
}

impl<T: Transport, E: Environment> RandomBot<T, E> {
    /// Create a bot driving `client`, drawing moves from `env`.
    pub fn new(client: Arc<ClientSync<T>>, env: E) -> Self {
        Self { client, env }
    }

    /// The bot's client.
    pub fn client(&self) -> &Arc<ClientSync<T>> {
        &self.client
    }

    /// Join the matchmaker and play `games` consecutive games.
    ///
    /// The bot stays in the match afterwards so the opponent can observe the
    /// final state; call `leave` on its client when both sides are done.
    /// Stops early if `cancel` fires; results of completed games are returned
    /// either way.
    ///
    /// # Errors
    ///
    /// - `HubError::Client` if joining or moving fails
    pub async fn play(
        &self,
        games: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<GameResult>, HubError> {
        let user_id = self.client.user_id().to_string();
        self.client.join().await?;

        let mut results = Vec::with_capacity(games);
        while results.len() < games {
            if !self.client.ready(cancel).await {
                break;
            }

            while self.client.next(cancel).await {
                let Some(view) = self.client.state() else {
                    break;
                };
                let available = view.state.available();
                let Some(&(row, col)) = available.get(self.env.random_index(available.len())) else {
                    break;
                };
                tracing::debug!(%user_id, row, col, "bot move");
                match self.client.make_move(row, col).await {
                    Ok(()) => {},
                    // Opponent left between the wait and the move.
                    Err(ClientError::NoActiveMatch) => break,
                    Err(e) => return Err(e.into()),
                }
            }

            let Some(result) =
                self.client.state().and_then(|view| GameResult::from_view(&view, &user_id))
            else {
                break;
            };
            tracing::info!(%user_id, %result, game = results.len() + 1, "game over");
            results.push(result);
        }

        Ok(results)
    }
}
