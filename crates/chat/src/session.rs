//! Per-session conversation state.
//!
//! A session is owned exclusively by its orchestrator: turns are append-only
//! and never shared or mutated across sessions.

use chrono::{DateTime, Utc};
use pathway_llm::ChatMessage;

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnRole {
    User,
    Assistant,
}

/// One message of a conversation. Never mutated or reordered after creation.
#[derive(Debug, Clone)]
pub struct Turn {
    pub role: TurnRole,
    pub content: String,
}

/// Ordered conversation history for a single session.
#[derive(Debug)]
pub struct ConversationSession {
    session_id: String,
    started_at: DateTime<Utc>,
    turns: Vec<Turn>,
}

impl ConversationSession {
    pub fn new() -> Self {
        let session_id = uuid::Uuid::new_v4().to_string();
        tracing::debug!("Starting conversation session {}", session_id);
        Self {
            session_id,
            started_at: Utc::now(),
            turns: Vec::new(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.turns.push(Turn {
            role: TurnRole::User,
            content: content.into(),
        });
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.turns.push(Turn {
            role: TurnRole::Assistant,
            content: content.into(),
        });
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Convert the history to LLM chat messages.
    pub fn to_chat_messages(&self) -> Vec<ChatMessage> {
        self.turns
            .iter()
            .map(|turn| match turn.role {
                TurnRole::User => ChatMessage::user(&turn.content),
                TurnRole::Assistant => ChatMessage::assistant(&turn.content),
            })
            .collect()
    }
}

impl Default for ConversationSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turns_are_appended_in_order() {
        let mut session = ConversationSession::new();
        session.push_user("question");
        session.push_assistant("answer");

        let turns = session.turns();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role, TurnRole::User);
        assert_eq!(turns[0].content, "question");
        assert_eq!(turns[1].role, TurnRole::Assistant);
    }

    #[test]
    fn test_sessions_have_distinct_ids() {
        let a = ConversationSession::new();
        let b = ConversationSession::new();
        assert_ne!(a.session_id(), b.session_id());
    }

    #[test]
    fn test_chat_message_conversion() {
        let mut session = ConversationSession::new();
        session.push_user("hi");
        session.push_assistant("hello");

        let messages = session.to_chat_messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, pathway_llm::Role::User);
        assert_eq!(messages[1].role, pathway_llm::Role::Assistant);
    }
}
