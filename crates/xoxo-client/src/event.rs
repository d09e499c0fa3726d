//! Client events and callback slots.

use xoxo_proto::{Frame, Player, ProjectedView};

use crate::error::TransportError;

/// Notifications delivered to the client by its session.
#[derive(Debug, Clone)]
pub enum ClientEvent {
    /// Session connected.
    Connected,

    /// Session disconnected.
    Disconnected {
        /// Cause, if known.
        reason: Option<String>,
    },

    /// Server reported an error.
    Error {
        /// Error message.
        message: String,
    },

    /// Data received from a match.
    MatchData {
        /// Originating match.
        match_id: String,
        /// Received frame.
        frame: Frame,
    },

    /// Presences joined or left a match.
    MatchPresence {
        /// Match the presences belong to.
        match_id: String,
        /// Joined presences.
        joins: Vec<Player>,
        /// Departed presences.
        leaves: Vec<Player>,
    },

    /// Matchmaker paired this session into a match.
    MatchmakerMatched {
        /// Ticket that was matched.
        ticket_id: String,
        /// Match to join.
        match_id: String,
    },
}

/// Callback for raw client events.
pub type EventHandler = Box<dyn Fn(&ClientEvent) + Send + Sync>;

/// Callback for meaningful state transitions. Receives the new cached view.
pub type StateHandler = Box<dyn Fn(Option<&ProjectedView>) + Send + Sync>;

/// Callback for a failed background join after a matchmaker match.
pub type JoinErrorHandler = Box<dyn Fn(&TransportError) + Send + Sync>;

/// Optional callbacks, one slot per notification kind.
///
/// Callbacks run on the task that delivered the event, after the cached
/// state has been updated and its lock released.
#[derive(Default)]
pub struct Handlers {
    /// Session connected.
    pub on_connect: Option<EventHandler>,
    /// Session disconnected.
    pub on_disconnect: Option<EventHandler>,
    /// Server error.
    pub on_error: Option<EventHandler>,
    /// Any match data, decodable or not.
    pub on_match_data: Option<EventHandler>,
    /// Match presence changes.
    pub on_presence: Option<EventHandler>,
    /// Matchmaker match.
    pub on_matched: Option<EventHandler>,
    /// Joining a matched match failed.
    pub on_join_error: Option<JoinErrorHandler>,
    /// The cached view changed in a way a UI cares about.
    pub on_state_change: Option<StateHandler>,
}

impl std::fmt::Debug for Handlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handlers")
            .field("on_connect", &self.on_connect.is_some())
            .field("on_disconnect", &self.on_disconnect.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("on_match_data", &self.on_match_data.is_some())
            .field("on_presence", &self.on_presence.is_some())
            .field("on_matched", &self.on_matched.is_some())
            .field("on_join_error", &self.on_join_error.is_some())
            .field("on_state_change", &self.on_state_change.is_some())
            .finish()
    }
}

/// Whether a view transition should fire the state callback.
///
/// Fires when a view appears or vanishes, `your_turn` flips, the rematch
/// countdown changes, or the new view is terminal.
pub(crate) fn is_meaningful(prev: Option<&ProjectedView>, next: Option<&ProjectedView>) -> bool {
    match (prev, next) {
        (None, None) => false,
        (None, Some(_)) | (Some(_), None) => true,
        (Some(prev), Some(next)) => {
            prev.your_turn != next.your_turn
                || prev.state.rematch_countdown != next.state.rematch_countdown
                || next.state.is_terminal()
        },
    }
}
