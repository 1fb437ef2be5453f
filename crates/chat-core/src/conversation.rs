//! Conversation records and the persisted store state.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::PersistenceError;
use crate::message::ChatMessage;
use crate::words::{message_preview, word_count};

/// Title a conversation carries until one is generated.
pub const DEFAULT_TITLE: &str = "New Chat";

/// Title shown for records persisted without one.
pub const UNTITLED_TITLE: &str = "Untitled Chat";

/// Default length of `last_message_preview`.
pub const PREVIEW_MAX_CHARS: usize = 50;

/// A single chat thread with its history, running summary and side context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    /// Running digest of compacted history.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// User-supplied side document sent alongside every turn.
    #[serde(default)]
    pub context: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_summarized_at: Option<DateTime<Utc>>,
    /// Derived: words across context, messages and summary.
    #[serde(default)]
    pub total_words: usize,
    /// Transient; true while a compaction is in flight.
    #[serde(default)]
    pub is_summarizing: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Derived: truncated copy of the last message body.
    #[serde(default)]
    pub last_message_preview: String,
}

impl Conversation {
    /// Create an empty conversation with the default title.
    pub fn new(context: impl Into<String>) -> Self {
        let now = Utc::now();
        let mut conversation = Self {
            id: Self::generate_id(),
            title: DEFAULT_TITLE.to_string(),
            messages: Vec::new(),
            summary: None,
            context: context.into(),
            last_summarized_at: None,
            total_words: 0,
            is_summarizing: false,
            created_at: now,
            updated_at: now,
            last_message_preview: String::new(),
        };
        conversation.refresh_derived(PREVIEW_MAX_CHARS);
        conversation
    }

    /// Allocate a fresh `conv_<millis>_<suffix>` identifier.
    pub fn generate_id() -> String {
        let suffix = Uuid::new_v4().simple().to_string();
        format!("conv_{}_{}", Utc::now().timestamp_millis(), &suffix[..9])
    }

    /// Recompute the word total from context, messages and summary.
    pub fn calculate_word_count(&self) -> usize {
        word_count(&self.context)
            + self
                .messages
                .iter()
                .map(|msg| word_count(&msg.content))
                .sum::<usize>()
            + self.summary.as_deref().map(word_count).unwrap_or(0)
    }

    /// Preview of the last message, or empty when there are none.
    pub fn calculate_preview(&self, max_chars: usize) -> String {
        self.messages
            .last()
            .map(|msg| message_preview(&msg.content, max_chars))
            .unwrap_or_default()
    }

    /// Bring `total_words` and `last_message_preview` back in line with the
    /// record's content.
    pub fn refresh_derived(&mut self, preview_max_chars: usize) {
        self.total_words = self.calculate_word_count();
        self.last_message_preview = self.calculate_preview(preview_max_chars);
    }

    /// Whether the word budget is exhausted and no compaction is running.
    pub fn needs_summarization(&self, threshold: usize) -> bool {
        self.total_words >= threshold && !self.is_summarizing
    }

    /// Split messages into the compactable head and the retained tail of at
    /// most `keep_recent` messages.
    pub fn split_for_summarization(&self, keep_recent: usize) -> (&[ChatMessage], &[ChatMessage]) {
        let split_at = self.messages.len().saturating_sub(keep_recent);
        self.messages.split_at(split_at)
    }

    /// Whether the title is still the default sentinel.
    pub fn has_default_title(&self) -> bool {
        self.title == DEFAULT_TITLE
    }

    /// Fill in display defaults for records persisted with blank fields.
    pub fn normalized(mut self) -> Self {
        if self.title.trim().is_empty() {
            self.title = UNTITLED_TITLE.to_string();
        }
        self
    }
}

/// The whole persisted state: every conversation plus the current pointer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreState {
    #[serde(default)]
    pub conversations: IndexMap<String, Conversation>,
    #[serde(default)]
    pub current_conversation_id: Option<String>,
}

impl StoreState {
    /// Parse a persisted blob.
    pub fn from_json(blob: &str) -> Result<Self, PersistenceError> {
        serde_json::from_str(blob).map_err(|e| PersistenceError::Corrupt(e.to_string()))
    }

    /// Serialize to the persisted blob format.
    pub fn to_json(&self) -> Result<String, PersistenceError> {
        serde_json::to_string(self).map_err(|e| PersistenceError::Backend(e.to_string()))
    }

    /// Resolve the current pointer. Dangling pointers resolve to `None`.
    pub fn current(&self) -> Option<&Conversation> {
        self.current_conversation_id
            .as_ref()
            .and_then(|id| self.conversations.get(id))
    }
}
