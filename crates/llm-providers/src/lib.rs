//! Completion transport for the hosted Gemini and OpenAI APIs.
//!
//! [`ProviderClient`] implements [`chat_core::Completer`]: it takes a fully
//! built prompt, the user's API key and the selected provider, and returns
//! the reply text.
//!
//! # Usage
//!
//! ```rust,no_run
//! use chat_core::{Completer, Provider};
//! use llm_providers::ProviderClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ProviderClient::from_env()?;
//!     let key = std::env::var("GEMINI_API_KEY")?;
//!     let reply = client.complete("Hello", &key, Provider::Gemini).await?;
//!     println!("{}", reply);
//!     Ok(())
//! }
//! ```

mod api_types;
mod client;
mod config;

pub use client::{ProviderClient, VERIFY_PROMPT};
pub use config::{
    ProviderConfig, ProviderConfigBuilder, DEFAULT_GEMINI_API_URL, DEFAULT_GEMINI_MODEL,
    DEFAULT_OPENAI_API_URL, DEFAULT_OPENAI_MODEL, DEFAULT_TIMEOUT_SECS,
};

// Re-export core types for convenience
pub use chat_core::{Completer, CompletionError, Provider};
