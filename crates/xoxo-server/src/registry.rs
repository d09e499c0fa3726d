//! Match registry.
//!
//! Maps match ids to the command queue of the task running that match.
//! Matches share no state; the registry only routes.

use std::collections::HashMap;

use tokio::sync::mpsc;

use crate::runtime::MatchCommand;

/// Handle to a running match task.
#[derive(Debug, Clone)]
pub struct MatchHandle {
    pub(crate) tx: mpsc::Sender<MatchCommand>,
}

/// Registry of running matches.
#[derive(Debug, Default)]
pub struct MatchRegistry {
    matches: HashMap<String, MatchHandle>,
}

impl MatchRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a match. Returns `false` if the id is already taken.
    pub fn insert(&mut self, match_id: String, handle: MatchHandle) -> bool {
        if self.matches.contains_key(&match_id) {
            return false;
        }
        self.matches.insert(match_id, handle);
        true
    }

    /// Look up a running match.
    pub fn get(&self, match_id: &str) -> Option<&MatchHandle> {
        self.matches.get(match_id)
    }

    /// Remove a match. Returns whether it was registered.
    pub fn remove(&mut self, match_id: &str) -> bool {
        self.matches.remove(match_id).is_some()
    }

    /// Whether a match is registered.
    pub fn contains(&self, match_id: &str) -> bool {
        self.matches.contains_key(match_id)
    }

    /// Number of running matches.
    pub fn len(&self) -> usize {
        self.matches.len()
    }
}
