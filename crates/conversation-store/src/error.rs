//! Error types for store operations.

use chat_core::{BudgetError, PersistenceError};
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An operation needed a current conversation and none is selected.
    #[error("no active conversation")]
    NoActiveConversation,

    /// The referenced conversation does not exist.
    #[error("conversation not found: {0}")]
    ConversationNotFound(String),

    /// A compaction result no longer matches the conversation it came from.
    #[error("compaction is stale for conversation {id}")]
    StaleCompaction { id: String },

    /// User-supplied text exceeded the word budget.
    #[error(transparent)]
    Budget(#[from] BudgetError),

    /// The persistence backend failed.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
