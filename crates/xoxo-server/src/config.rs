//! Match configuration.

use std::time::Duration;

/// Per-match timing configuration.
#[derive(Debug, Clone)]
pub struct MatchConfig {
    /// Ticks per second.
    pub tick_rate: u32,
    /// Seconds between a finished game and the automatic rematch.
    pub rematch_secs: u32,
    /// Ticks a match lingers after a player leaves before it is destroyed.
    pub termination_grace_ticks: u64,
    /// Capacity of each match's inbound command queue.
    pub queue_capacity: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self { tick_rate: 1, rematch_secs: 10, termination_grace_ticks: 5, queue_capacity: 64 }
    }
}

impl MatchConfig {
    /// Wall-clock time between ticks.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(1) / self.tick_rate.max(1)
    }

    /// Rematch countdown length in ticks.
    pub fn rematch_ticks(&self) -> u32 {
        self.rematch_secs.saturating_mul(self.tick_rate.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_one_tick_per_second() {
        let config = MatchConfig::default();
        assert_eq!(config.tick_interval(), Duration::from_secs(1));
        assert_eq!(config.rematch_ticks(), 10);
        assert_eq!(config.termination_grace_ticks, 5);
    }

    #[test]
    fn zero_tick_rate_is_clamped() {
        let config = MatchConfig { tick_rate: 0, ..MatchConfig::default() };
        assert_eq!(config.tick_interval(), Duration::from_secs(1));
        assert_eq!(config.rematch_ticks(), 10);
    }
}
