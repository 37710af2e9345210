//! Conversation Session Registry.
//!
//! Maps a client-chosen session id to its conversation history. Clients that
//! send no id share the `default` session. The map is bounded: idle sessions
//! expire and, past `max_sessions`, the least recently used are evicted.

use std::time::Duration;

use axum::http::HeaderMap;
use moka::sync::Cache;
use tracing::debug;

use framewise_core::{ConversationHistory, SharedHistory};

pub type SessionId = String;

pub const SESSION_HEADER: &str = "x-session-id";
pub const DEFAULT_SESSION: &str = "default";
const MAX_SESSION_ID_LEN: usize = 128;

#[derive(Clone)]
pub struct SessionRegistry {
    sessions: Cache<SessionId, SharedHistory>,
    max_turns: usize,
}

impl SessionRegistry {
    pub fn new(max_turns: usize, max_sessions: u64, idle: Duration) -> Self {
        Self {
            sessions: Cache::builder()
                .max_capacity(max_sessions.max(1))
                .time_to_idle(idle)
                .build(),
            max_turns,
        }
    }

    /// History handle for `session_id`, created on first use.
    ///
    /// A handle already held by an in-flight request stays valid after its
    /// session is evicted; the next request simply starts a fresh history.
    pub fn history(&self, session_id: &str) -> SharedHistory {
        self.sessions.get_with(session_id.to_string(), || {
            debug!(session_id, sessions = self.len(), "Opened conversation session");
            ConversationHistory::shared(self.max_turns)
        })
    }

    /// Approximate number of live sessions.
    pub fn len(&self) -> u64 {
        self.sessions.entry_count()
    }
}

/// Session id from the request headers; absent, blank or oversized ids fall
/// back to the default session.
pub fn session_id(headers: &HeaderMap) -> SessionId {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty() && id.len() <= MAX_SESSION_ID_LEN)
        .unwrap_or(DEFAULT_SESSION)
        .to_string()
}
