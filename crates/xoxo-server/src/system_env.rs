//! Production environment using system time and OS randomness.
//!
//! Real `Instant`s, tokio sleep for the tick loop, and getrandom for match
//! ids and default client identities. Not reproducible; use the harness
//! environment for deterministic runs.

use std::time::Duration;

use xoxo_core::env::Environment;

/// Production environment using system time and OS RNG.
///
/// # Panics
///
/// `random_bytes` panics if the OS RNG fails. RNG failure indicates an
/// OS-level fault and there is no meaningful way to continue generating ids.
#[derive(Debug, Clone, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    type Instant = std::time::Instant;

    fn now(&self) -> Self::Instant {
        std::time::Instant::now()
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }

    #[allow(clippy::expect_used)]
    fn random_bytes(&self, buffer: &mut [u8]) {
        getrandom::fill(buffer).expect("invariant: OS RNG failure is unrecoverable");
    }
}
