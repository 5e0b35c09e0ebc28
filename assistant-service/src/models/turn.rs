//! Conversation turns and the retention policy applied to them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One message of a conversation, user or assistant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationTurn {
    pub text: String,
    pub is_user: bool,
    pub timestamp: DateTime<Utc>,
}

/// How much history a conversation keeps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct HistoryRetention {
    /// Maximum number of turns kept; `None` keeps everything.
    #[serde(default)]
    pub max_turns: Option<usize>,
}

impl HistoryRetention {
    pub fn unbounded() -> Self {
        Self { max_turns: None }
    }

    pub fn capped(max_turns: usize) -> Self {
        Self {
            max_turns: Some(max_turns),
        }
    }

    /// Exchanges (user + reply) worth of model context to keep.
    pub fn max_exchanges(&self) -> Option<usize> {
        self.max_turns.map(|turns| (turns / 2).max(1))
    }
}

/// Append-only, chronological turn log.
#[derive(Debug, Clone, Default)]
pub struct ConversationHistory {
    turns: Vec<ConversationTurn>,
    retention: HistoryRetention,
}

impl ConversationHistory {
    pub fn new(retention: HistoryRetention) -> Self {
        Self {
            turns: Vec::new(),
            retention,
        }
    }

    pub fn push_user(&mut self, text: impl Into<String>) {
        self.push(text.into(), true);
    }

    pub fn push_assistant(&mut self, text: impl Into<String>) {
        self.push(text.into(), false);
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    fn push(&mut self, text: String, is_user: bool) {
        // Wall clock may step backwards; keep timestamps non-decreasing
        let now = Utc::now();
        let timestamp = match self.turns.last() {
            Some(last) if last.timestamp > now => last.timestamp,
            _ => now,
        };

        self.turns.push(ConversationTurn {
            text,
            is_user,
            timestamp,
        });

        if let Some(max) = self.retention.max_turns {
            let excess = self.turns.len().saturating_sub(max);
            if excess > 0 {
                self.turns.drain(..excess);
            }
        }
    }
}
