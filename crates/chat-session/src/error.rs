//! Error types for chat session operations.

use chat_core::CompletionError;
use conversation_store::StoreError;
use thiserror::Error;

/// Errors that can occur while driving a chat session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The conversation store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The completion delegate failed.
    #[error("completion error: {0}")]
    Completion(#[from] CompletionError),

    /// The session could not be configured.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The user message was empty.
    #[error("message is empty")]
    EmptyMessage,
}

/// Result type for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;
