//! Bounded conversation log sent with each chat request.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Maximum number of turns retained for context.
pub const MAX_TURNS: usize = 16;

/// Author of a conversation turn.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The visitor typing into the widget.
    User,
    /// The backend assistant.
    Assistant,
}

/// One chat turn, in the shape the backend expects as history.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// Turn author.
    pub role: Role,
    /// Turn text.
    pub content: String,
}

impl ConversationTurn {
    /// Create a user turn.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant turn.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Ordered log of the most recent turns, evicted FIFO beyond [`MAX_TURNS`].
///
/// Owned exclusively by one chat session; never persisted.
#[derive(Debug, Default)]
pub struct ConversationLog {
    turns: VecDeque<ConversationTurn>,
}

impl ConversationLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a turn at the tail, evicting from the head past the cap.
    ///
    /// The length never exceeds [`MAX_TURNS`] once this returns; callers
    /// never observe an over-cap log.
    pub fn append(&mut self, turn: ConversationTurn) {
        self.turns.push_back(turn);
        while self.turns.len() > MAX_TURNS {
            self.turns.pop_front();
        }
    }

    /// Point-in-time copy of the log for an outgoing request.
    ///
    /// Mutations after the snapshot do not affect an in-flight request.
    #[must_use]
    pub fn snapshot(&self) -> Vec<ConversationTurn> {
        self.turns.iter().cloned().collect()
    }

    /// Number of retained turns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Whether the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cap_keeps_last_sixteen_in_order() {
        let mut log = ConversationLog::new();
        for i in 0..20 {
            log.append(ConversationTurn::user(format!("turn {i}")));
        }
        let snapshot = log.snapshot();
        assert_eq!(snapshot.len(), MAX_TURNS);
        assert_eq!(snapshot[0].content, "turn 4");
        assert_eq!(snapshot[15].content, "turn 19");
    }

    #[test]
    fn test_snapshot_is_point_in_time() {
        let mut log = ConversationLog::new();
        log.append(ConversationTurn::user("hello"));
        let snapshot = log.snapshot();
        log.append(ConversationTurn::assistant("hi"));
        assert_eq!(snapshot.len(), 1);
        assert_eq!(log.len(), 2);
    }
}
