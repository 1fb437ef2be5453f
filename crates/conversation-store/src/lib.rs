//! Conversation store for the chat client.
//!
//! Holds every conversation with its messages, running summary and context
//! document, tracks which one is current, and keeps word counts current so
//! callers can decide when to compact. State is persisted through a
//! pluggable [`chat_core::StateBackend`]; this crate ships an in-memory and
//! a JSON file backend, and the `database` crate provides a SQLite one.

pub mod backend;
pub mod error;
pub mod events;
pub mod settings;
pub mod store;

pub use backend::{InMemoryBackend, JsonFileBackend};
pub use error::{Result, StoreError};
pub use events::StoreEvent;
pub use settings::{
    MemorySettings, MAX_CONTEXT_WORDS, RECENT_MESSAGES_TO_KEEP, SUMMARIZATION_THRESHOLD,
    TITLE_MAX_WORDS,
};
pub use store::{ConversationStore, MemoryStats, MessageSplit};
