//! Chat turn flow over a bounded-memory conversation store.
//!
//! This crate provides the [`ChatSession`] type, which sends user messages
//! to a completion delegate while keeping each conversation under its word
//! budget.
//!
//! # Architecture
//!
//! ```text
//! send_message(text)
//!          ↓
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       CHAT SESSION                          │
//! │                                                             │
//! │  1. Capture current conversation id, append user message    │
//! │         ↓                                                   │
//! │  2. No API key? → inline notice, stop                       │
//! │         ↓                                                   │
//! │  3. Concurrently:                                           │
//! │     • first message → TitleGenerator                        │
//! │     • over threshold → Compactor, then the chat turn        │
//! │         ↓                                                   │
//! │  4. Append reply to the captured conversation               │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use chat_session::{ChatSession, SessionConfig};
//! use conversation_store::{ConversationStore, InMemoryBackend, MemorySettings};
//! use mock_completer::EchoCompleter;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), chat_session::SessionError> {
//!     let store = Arc::new(ConversationStore::new(
//!         Arc::new(InMemoryBackend::new()),
//!         MemorySettings::default(),
//!     ));
//!     let config = SessionConfig::builder().gemini_api_key("test-key").build();
//!     let session = ChatSession::new(store, Arc::new(EchoCompleter::with_prefix("Echo: ")), config);
//!
//!     session.new_conversation().await?;
//!     let turn = session.send_message("Hello!").await?;
//!     assert_eq!(turn.reply.content, "Echo: Hello!");
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod session;
mod summarization;
mod title;

pub use config::{SessionConfig, SessionConfigBuilder};
pub use error::{Result, SessionError};
pub use session::{
    inline_error_text, missing_key_text, ChatSession, TurnReply, TurnStatus, FAILED_SEND_TEXT,
};
pub use summarization::{build_summarization_prompt, CompactionOutcome, Compactor};
pub use title::{
    build_title_prompt, clean_title, fallback_title, TitleGenerator, FALLBACK_TITLE_CHARS,
    MIN_TITLE_CHARS,
};
