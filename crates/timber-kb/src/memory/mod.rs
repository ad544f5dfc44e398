//! Per-user conversation memory.
//!
//! Strictly append-only and scoped per user; readers get an ordered-by-time
//! window of the most recent turns. Concurrent appends from the same user
//! are last-write-wins, which is acceptable because chat UIs serialize a
//! user's own requests.

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

use crate::types::ConversationTurn;

/// History collaborator consumed by the engine.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Most recent `limit` turns for a user, oldest first.
    async fn history(&self, user_id: &str, limit: usize) -> Result<Vec<ConversationTurn>>;

    async fn append(&self, turn: ConversationTurn) -> Result<()>;
}

/// In-memory rolling history, capped per user.
pub struct InMemoryConversationStore {
    max_turns_per_user: usize,
    turns: RwLock<HashMap<String, Vec<ConversationTurn>>>,
}

impl InMemoryConversationStore {
    pub fn new(max_turns_per_user: usize) -> Self {
        Self {
            max_turns_per_user,
            turns: RwLock::new(HashMap::new()),
        }
    }

    pub fn turn_count(&self, user_id: &str) -> usize {
        self.turns.read().get(user_id).map_or(0, |t| t.len())
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn history(&self, user_id: &str, limit: usize) -> Result<Vec<ConversationTurn>> {
        let turns = self.turns.read();
        let user_turns = match turns.get(user_id) {
            Some(t) => t,
            None => return Ok(Vec::new()),
        };
        let start = user_turns.len().saturating_sub(limit);
        Ok(user_turns[start..].to_vec())
    }

    async fn append(&self, turn: ConversationTurn) -> Result<()> {
        let mut turns = self.turns.write();
        let user_turns = turns.entry(turn.user_id.clone()).or_default();
        user_turns.push(turn);
        if user_turns.len() > self.max_turns_per_user {
            let excess = user_turns.len() - self.max_turns_per_user;
            user_turns.drain(..excess);
        }
        Ok(())
    }
}
