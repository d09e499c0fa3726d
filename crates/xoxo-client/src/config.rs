//! Client configuration and identity.

use std::time::Duration;

use xoxo_core::env::Environment;

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Stable user id. Generated from the environment RNG when unset.
    pub user_id: Option<String>,
    /// Display name. Generated when unset.
    pub username: Option<String>,
    /// Fallback re-check interval for [`crate::ClientSync::ready`] and
    /// [`crate::ClientSync::next`].
    pub poll_interval: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self { user_id: None, username: None, poll_interval: Duration::from_millis(50) }
    }
}

impl ClientConfig {
    /// Resolve the configured identity, filling gaps from `env`.
    pub fn identity<E: Environment>(&self, env: &E) -> ClientIdentity {
        let user_id = self.user_id.clone().unwrap_or_else(|| format!("{:032x}", env.random_u128()));
        let username =
            self.username.clone().unwrap_or_else(|| format!("player-{:08x}", env.random_u64() as u32));
        ClientIdentity { user_id, username }
    }
}

/// Who this client plays as.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientIdentity {
    /// Stable user id.
    pub user_id: String,
    /// Display name.
    pub username: String,
}

impl ClientIdentity {
    /// Create an identity.
    pub fn new(user_id: impl Into<String>, username: impl Into<String>) -> Self {
        Self { user_id: user_id.into(), username: username.into() }
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;

    /// Every random byte is `0xab`.
    #[derive(Clone)]
    struct FixedEnv;

    impl Environment for FixedEnv {
        type Instant = Instant;

        fn now(&self) -> Instant {
            Instant::now()
        }

        fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
            tokio::time::sleep(duration)
        }

        fn random_bytes(&self, buffer: &mut [u8]) {
            buffer.fill(0xab);
        }
    }

    #[test]
    fn configured_identity_is_kept() {
        let config = ClientConfig {
            user_id: Some("u1".into()),
            username: Some("Una".into()),
            ..ClientConfig::default()
        };
        assert_eq!(config.identity(&FixedEnv), ClientIdentity::new("u1", "Una"));
    }

    #[test]
    fn missing_identity_comes_from_env() {
        let identity = ClientConfig::default().identity(&FixedEnv);
        assert_eq!(identity.user_id, "ab".repeat(16));
        assert_eq!(identity.username, "player-abababab");
    }
}
