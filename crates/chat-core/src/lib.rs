//! Core types and contracts for the conversation memory workspace.
//!
//! This crate provides the shared vocabulary used by the store, the
//! summarization pipeline and the provider clients. It defines:
//!
//! - [`ChatMessage`] / [`Conversation`] / [`StoreState`] - The persisted data model
//! - [`word_count`] - The whitespace word estimator used for every budget decision
//! - [`Completer`] - The trait that model delegates must implement
//! - [`StateBackend`] - The trait that durable storage backends must implement
//! - [`CompletionError`] / [`PersistenceError`] / [`BudgetError`] - Error types
//!
//! # Example
//!
//! ```rust
//! use chat_core::{async_trait, Completer, CompletionError, Provider};
//!
//! struct Shouty;
//!
//! #[async_trait]
//! impl Completer for Shouty {
//!     async fn complete(
//!         &self,
//!         prompt: &str,
//!         _api_key: &str,
//!         _provider: Provider,
//!     ) -> Result<String, CompletionError> {
//!         Ok(prompt.to_uppercase())
//!     }
//!
//!     fn name(&self) -> &str {
//!         "Shouty"
//!     }
//! }
//! ```

mod completer;
mod conversation;
mod error;
mod memory;
mod message;
mod persistence;
mod prompt;
mod words;

pub use completer::{Completer, Provider};
pub use conversation::{
    Conversation, StoreState, DEFAULT_TITLE, PREVIEW_MAX_CHARS, UNTITLED_TITLE,
};
pub use error::{BudgetError, CompletionError, PersistenceError};
pub use memory::{build_turn_context, build_turn_prompt};
pub use message::{render_transcript, ChatMessage};
pub use persistence::StateBackend;
pub use prompt::hash_prompt;
pub use words::{
    check_context_budget, message_preview, truncate_to_word_budget, word_count,
};

// Re-export async_trait for convenience
pub use async_trait::async_trait;
