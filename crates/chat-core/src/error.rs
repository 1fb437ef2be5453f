//! Error types shared across the workspace.

use thiserror::Error;

use crate::completer::Provider;

/// Errors that can occur while delegating a prompt to a model provider.
#[derive(Debug, Error)]
pub enum CompletionError {
    /// No API key is configured for the selected provider.
    #[error("no API key configured for {0}")]
    MissingApiKey(Provider),

    /// The client could not be configured.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The request never reached the provider or the connection failed.
    #[error("network error: {0}")]
    Network(String),

    /// The provider answered with a non-success status.
    #[error("provider error ({status}): {message}")]
    Provider { status: u16, message: String },

    /// The provider answered but the body carried no usable text.
    #[error("provider returned an empty response")]
    EmptyResponse,

    /// The request took longer than the configured timeout.
    #[error("request timed out")]
    Timeout,
}

/// Errors returned by durable storage backends.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// The stored blob exists but could not be parsed.
    #[error("stored state is corrupt: {0}")]
    Corrupt(String),

    /// The backend itself failed (I/O, database, serialization).
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Errors raised when user-supplied text does not fit the word budget.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BudgetError {
    /// The context document alone exceeds the nominal context budget.
    #[error("context has {words} words, limit is {max}")]
    ContextTooLong { words: usize, max: usize },
}
