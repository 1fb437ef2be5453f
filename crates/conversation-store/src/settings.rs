//! Memory budget settings.

use std::env;

use chat_core::PREVIEW_MAX_CHARS;

/// Word budget at which a conversation is compacted (80% of the nominal budget).
pub const SUMMARIZATION_THRESHOLD: usize = 200_000;

/// Messages kept verbatim when a conversation is compacted.
pub const RECENT_MESSAGES_TO_KEEP: usize = 15;

/// Maximum words in a generated title.
pub const TITLE_MAX_WORDS: usize = 5;

/// Nominal context budget in words; a context document may not exceed it.
pub const MAX_CONTEXT_WORDS: usize = 262_144;

/// Memory settings for budgets, compaction and display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemorySettings {
    pub summarization_threshold: usize,
    pub recent_messages_to_keep: usize,
    pub title_max_words: usize,
    pub preview_max_chars: usize,
    pub max_context_words: usize,
}

impl Default for MemorySettings {
    fn default() -> Self {
        Self {
            summarization_threshold: SUMMARIZATION_THRESHOLD,
            recent_messages_to_keep: RECENT_MESSAGES_TO_KEEP,
            title_max_words: TITLE_MAX_WORDS,
            preview_max_chars: PREVIEW_MAX_CHARS,
            max_context_words: MAX_CONTEXT_WORDS,
        }
    }
}

impl MemorySettings {
    /// Load memory settings from environment variables.
    ///
    /// Optional environment variables (unset, unparsable or zero values keep
    /// the default):
    /// - `CHAT_MEMORY_SUMMARIZATION_THRESHOLD` (default: 200000)
    /// - `CHAT_MEMORY_RECENT_MESSAGES` (default: 15)
    /// - `CHAT_MEMORY_TITLE_MAX_WORDS` (default: 5)
    /// - `CHAT_MEMORY_PREVIEW_MAX_CHARS` (default: 50)
    /// - `CHAT_MEMORY_MAX_CONTEXT_WORDS` (default: 262144)
    pub fn from_env() -> Self {
        let mut settings = Self::default();

        if let Some(value) = env_usize("CHAT_MEMORY_SUMMARIZATION_THRESHOLD") {
            settings.summarization_threshold = value;
        }
        if let Some(value) = env_usize("CHAT_MEMORY_RECENT_MESSAGES") {
            settings.recent_messages_to_keep = value;
        }
        if let Some(value) = env_usize("CHAT_MEMORY_TITLE_MAX_WORDS") {
            settings.title_max_words = value;
        }
        if let Some(value) = env_usize("CHAT_MEMORY_PREVIEW_MAX_CHARS") {
            settings.preview_max_chars = value;
        }
        if let Some(value) = env_usize("CHAT_MEMORY_MAX_CONTEXT_WORDS") {
            settings.max_context_words = value;
        }

        settings
    }
}

fn env_usize(key: &str) -> Option<usize> {
    env::var(key)
        .ok()?
        .trim()
        .parse()
        .ok()
        .filter(|value| *value > 0)
}
