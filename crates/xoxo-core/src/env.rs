//! Environment abstraction for deterministic testing.
//!
//! Decouples match logic from system resources (time, randomness). The
//! server runtime uses real time and OS entropy; the harness plugs in a
//! seeded RNG so whole matches replay identically from a seed.

use std::time::Duration;

/// Abstract environment providing time, randomness, and async sleep.
///
/// # Invariants
///
/// - `now()` never goes backwards
/// - given the same seed, a simulated environment yields the same random
///   sequence
pub trait Environment: Clone + Send + Sync + 'static {
    /// The instant type used by this environment.
    type Instant: Copy + Ord + Send + Sync + std::ops::Sub<Output = Duration>;

    /// Current time (monotonic).
    fn now(&self) -> Self::Instant;

    /// Sleeps for the specified duration.
    ///
    /// Only runtimes call this (the match tick loop); game logic never does.
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;

    /// Fills the provided buffer with random bytes.
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Generates a random `u64`.
    fn random_u64(&self) -> u64 {
        let mut bytes = [0u8; 8];
        self.random_bytes(&mut bytes);
        u64::from_be_bytes(bytes)
    }

    /// Generates a random `u128`.
    ///
    /// Used for match ids.
    fn random_u128(&self) -> u128 {
        let mut bytes = [0u8; 16];
        self.random_bytes(&mut bytes);
        u128::from_be_bytes(bytes)
    }

    /// Random index in `0..len`. Returns 0 when `len` is 0.
    fn random_index(&self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        (self.random_u64() % len as u64) as usize
    }
}
