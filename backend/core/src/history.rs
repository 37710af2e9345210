//! Bounded conversation memory.
//!
//! Each session owns one `ConversationHistory`; it keeps only the most recent
//! turns so the remote payload stays small.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::message::{ChatMessage, ConversationTurn};

/// Number of turns retained when no explicit limit is configured.
pub const DEFAULT_HISTORY_LIMIT: usize = 24;

/// History handle shared by the requests of one session.
pub type SharedHistory = Arc<Mutex<ConversationHistory>>;

#[derive(Debug, Clone)]
pub struct ConversationHistory {
    turns: VecDeque<ConversationTurn>,
    limit: usize,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_HISTORY_LIMIT)
    }

    /// A limit of zero is treated as one; a history must hold the last reply.
    pub fn with_limit(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            turns: VecDeque::with_capacity(limit + 1),
            limit,
        }
    }

    pub fn shared(limit: usize) -> SharedHistory {
        Arc::new(Mutex::new(Self::with_limit(limit)))
    }

    /// Append a turn, dropping the oldest ones beyond the limit.
    pub fn push(&mut self, turn: ConversationTurn) {
        self.turns.push_back(turn);
        while self.turns.len() > self.limit {
            self.turns.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn turns(&self) -> impl Iterator<Item = &ConversationTurn> {
        self.turns.iter()
    }

    /// Copy of the retained turns as chat-completion messages, oldest first.
    pub fn to_messages(&self) -> Vec<ChatMessage> {
        self.turns.iter().map(ChatMessage::from).collect()
    }
}

impl Default for ConversationHistory {
    fn default() -> Self {
        Self::new()
    }
}
