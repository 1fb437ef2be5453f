//! Chat message type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single message in a conversation.
///
/// Messages are immutable once created; a conversation only ever appends
/// them or drops a prefix of them during compaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Opaque unique identifier.
    pub id: String,
    /// Message body.
    pub content: String,
    /// Whether the user (as opposed to the assistant) wrote it.
    pub is_user: bool,
    /// Creation time.
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    /// Create a user message stamped with the current time.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(content, true)
    }

    /// Create an assistant message stamped with the current time.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(content, false)
    }

    fn new(content: impl Into<String>, is_user: bool) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            content: content.into(),
            is_user,
            timestamp: Utc::now(),
        }
    }

    /// Speaker label used in transcripts.
    pub fn speaker(&self) -> &'static str {
        if self.is_user {
            "User"
        } else {
            "Assistant"
        }
    }
}

/// Render messages as a `User: ...` / `Assistant: ...` transcript,
/// separated by blank lines.
pub fn render_transcript(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .map(|msg| format!("{}: {}", msg.speaker(), msg.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        let user = ChatMessage::user("hi");
        let assistant = ChatMessage::assistant("hello");

        assert!(user.is_user);
        assert!(!assistant.is_user);
        assert_ne!(user.id, assistant.id);
    }

    #[test]
    fn test_render_transcript() {
        let messages = vec![ChatMessage::user("Hi"), ChatMessage::assistant("Hello there")];
        assert_eq!(render_transcript(&messages), "User: Hi\n\nAssistant: Hello there");
        assert_eq!(render_transcript(&[]), "");
    }

    #[test]
    fn test_serializes_camel_case_with_string_timestamp() {
        let msg = ChatMessage::user("hi");
        let value = serde_json::to_value(&msg).unwrap();

        assert_eq!(value["isUser"], true);
        assert!(value["timestamp"].is_string());

        let back: ChatMessage = serde_json::from_value(value).unwrap();
        assert_eq!(back, msg);
    }
}
