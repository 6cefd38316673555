//! Per-user conversation history.
//!
//! History lives in process memory only. Each user id maps to an ordered list
//! of [`ConversationTurn`]s, oldest first.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SpeechError};

/// One completed exchange. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub transcript: String,
    pub emotion: String,
    pub reply: String,
    pub recorded_at: DateTime<Utc>,
}

impl ConversationTurn {
    /// New turn stamped with the current time.
    pub fn new(
        transcript: impl Into<String>,
        emotion: impl Into<String>,
        reply: impl Into<String>,
    ) -> Self {
        Self {
            transcript: transcript.into(),
            emotion: emotion.into(),
            reply: reply.into(),
            recorded_at: Utc::now(),
        }
    }
}

/// Storage seam for conversation history.
pub trait ConversationStore: Send + Sync {
    /// Append a turn to the end of `user_id`'s history.
    ///
    /// # Errors
    ///
    /// Returns [`SpeechError::Memory`] if the store is unusable.
    fn append(&self, user_id: &str, turn: ConversationTurn) -> Result<()>;

    /// Snapshot of `user_id`'s history, oldest first. Unknown users get an
    /// empty list.
    ///
    /// # Errors
    ///
    /// Returns [`SpeechError::Memory`] if the store is unusable.
    fn history(&self, user_id: &str) -> Result<Vec<ConversationTurn>>;

    /// Number of turns recorded for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns [`SpeechError::Memory`] if the store is unusable.
    fn turn_count(&self, user_id: &str) -> Result<usize> {
        Ok(self.history(user_id)?.len())
    }
}

/// In-memory [`ConversationStore`].
#[derive(Debug, Default)]
pub struct ConversationMemory {
    turns: RwLock<HashMap<String, Vec<ConversationTurn>>>,
    max_turns_per_user: usize,
}

impl ConversationMemory {
    /// Unbounded store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store keeping at most `max_turns_per_user` turns per user, evicting the
    /// oldest first. 0 means unbounded.
    pub fn with_max_turns(max_turns_per_user: usize) -> Self {
        Self {
            turns: RwLock::default(),
            max_turns_per_user,
        }
    }

    /// Number of users with at least one recorded turn.
    ///
    /// # Errors
    ///
    /// Returns [`SpeechError::Memory`] if the lock is poisoned.
    pub fn user_count(&self) -> Result<usize> {
        let turns = self.turns.read().map_err(poisoned)?;
        Ok(turns.len())
    }
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> SpeechError {
    SpeechError::Memory("conversation memory lock poisoned".into())
}

impl ConversationStore for ConversationMemory {
    fn append(&self, user_id: &str, turn: ConversationTurn) -> Result<()> {
        let mut turns = self.turns.write().map_err(poisoned)?;
        let history = turns.entry(user_id.to_owned()).or_default();
        history.push(turn);
        if self.max_turns_per_user > 0 && history.len() > self.max_turns_per_user {
            let excess = history.len() - self.max_turns_per_user;
            history.drain(..excess);
        }
        Ok(())
    }

    fn history(&self, user_id: &str) -> Result<Vec<ConversationTurn>> {
        let turns = self.turns.read().map_err(poisoned)?;
        Ok(turns.get(user_id).cloned().unwrap_or_default())
    }

    fn turn_count(&self, user_id: &str) -> Result<usize> {
        let turns = self.turns.read().map_err(poisoned)?;
        Ok(turns.get(user_id).map_or(0, Vec::len))
    }
}
