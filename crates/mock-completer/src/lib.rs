//! Mock completer implementations for testing chat sessions.
//!
//! This crate provides mock implementations of the `Completer` trait:
//! - `EchoCompleter` - Echoes the prompt back
//! - `ScriptedCompleter` - Replies from rules and a queue, recording prompts
//! - `FailingCompleter` - Fails every call with a fixed error
//! - `DelayedCompleter` - Wraps another completer with artificial delay
//!
//! For real provider traffic, use the `llm-providers` crate instead.
//!
//! # Example
//!
//! ```rust
//! use mock_completer::{Completer, EchoCompleter, Provider};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), mock_completer::CompletionError> {
//!     let completer = EchoCompleter::new();
//!     let reply = completer.complete("Hello!", "test-key", Provider::Gemini).await?;
//!     assert_eq!(reply, "Hello!");
//!     Ok(())
//! }
//! ```

mod delayed;
mod echo;
mod scripted;

// Re-export chat-core types for convenience
pub use chat_core::{async_trait, Completer, CompletionError, Provider};

pub use delayed::DelayedCompleter;
pub use echo::EchoCompleter;
pub use scripted::{FailingCompleter, RecordedCall, ScriptedCompleter};
