//! The Completer trait definition.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CompletionError;

/// Model providers a prompt can be delegated to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Gemini,
    OpenAi,
}

impl Provider {
    /// All supported providers.
    pub const ALL: [Provider; 2] = [Provider::Gemini, Provider::OpenAi];

    /// Stable lowercase identifier, as stored in settings.
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Gemini => "gemini",
            Provider::OpenAi => "openai",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" | "google" => Ok(Provider::Gemini),
            "openai" | "open_ai" | "open-ai" => Ok(Provider::OpenAi),
            other => Err(format!("unknown provider: {}", other)),
        }
    }
}

/// A delegate that turns a prompt into model text.
///
/// Implementations range from real HTTP clients to scripted test doubles.
/// This trait is object-safe and can be used with `Arc<dyn Completer>`.
#[async_trait]
pub trait Completer: Send + Sync {
    /// Send a single prompt to the provider and return the raw response text.
    ///
    /// # Arguments
    ///
    /// * `prompt` - The full prompt text.
    /// * `api_key` - Credential for the selected provider.
    /// * `provider` - Which provider to call.
    async fn complete(
        &self,
        prompt: &str,
        api_key: &str,
        provider: Provider,
    ) -> Result<String, CompletionError>;

    /// Get a human-readable name for this completer implementation.
    fn name(&self) -> &str;
}
