//! Configuration for a chat session.

use std::env;
use std::path::Path;

use chat_core::Provider;

use crate::error::SessionError;

/// Configuration for [`crate::ChatSession`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionConfig {
    /// Provider every completion is sent to.
    pub provider: Provider,

    /// Gemini API key.
    pub gemini_api_key: Option<String>,

    /// OpenAI API key.
    pub openai_api_key: Option<String>,

    /// Context document seeded into new conversations.
    pub context: String,
}

impl SessionConfig {
    /// Create configuration from environment variables.
    ///
    /// Optional environment variables:
    /// - `CHAT_PROVIDER` - `gemini` or `openai` (default: gemini)
    /// - `GEMINI_API_KEY` - Gemini API key
    /// - `OPENAI_API_KEY` - OpenAI API key
    /// - `CHAT_CONTEXT` - Context document (overrides context file)
    /// - `CHAT_CONTEXT_FILE` - Path to a context document file
    pub fn from_env() -> Result<Self, SessionError> {
        let provider = match env::var("CHAT_PROVIDER") {
            Ok(value) if !value.trim().is_empty() => value
                .parse::<Provider>()
                .map_err(SessionError::Configuration)?,
            _ => Provider::default(),
        };

        let gemini_api_key = env::var("GEMINI_API_KEY").ok().and_then(non_blank);
        let openai_api_key = env::var("OPENAI_API_KEY").ok().and_then(non_blank);

        // Context: env var takes precedence, then try loading from file
        let context = if let Ok(context) = env::var("CHAT_CONTEXT") {
            context
        } else {
            env::var("CHAT_CONTEXT_FILE")
                .ok()
                .and_then(load_context_file)
                .unwrap_or_default()
        };

        Ok(Self {
            provider,
            gemini_api_key,
            openai_api_key,
            context,
        })
    }

    /// Create a new config builder.
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder::default()
    }

    /// The key for the selected provider, if one is configured.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key_for(self.provider)
    }

    /// The key for a specific provider. Blank keys count as absent.
    pub fn api_key_for(&self, provider: Provider) -> Option<&str> {
        let key = match provider {
            Provider::Gemini => self.gemini_api_key.as_deref(),
            Provider::OpenAi => self.openai_api_key.as_deref(),
        };
        key.map(str::trim).filter(|k| !k.is_empty())
    }

    /// Set or clear the key for a provider.
    pub fn set_api_key(&mut self, provider: Provider, key: Option<String>) {
        let key = key.and_then(non_blank);
        match provider {
            Provider::Gemini => self.gemini_api_key = key,
            Provider::OpenAi => self.openai_api_key = key,
        }
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Load a context file, returning None if not found or empty.
fn load_context_file(path: impl AsRef<Path>) -> Option<String> {
    std::fs::read_to_string(path).ok().and_then(non_blank)
}

/// Builder for SessionConfig.
#[derive(Debug, Default)]
pub struct SessionConfigBuilder {
    config: SessionConfig,
}

impl SessionConfigBuilder {
    /// Set the provider.
    pub fn provider(mut self, provider: Provider) -> Self {
        self.config.provider = provider;
        self
    }

    /// Set the Gemini API key.
    pub fn gemini_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.set_api_key(Provider::Gemini, Some(key.into()));
        self
    }

    /// Set the OpenAI API key.
    pub fn openai_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.set_api_key(Provider::OpenAi, Some(key.into()));
        self
    }

    /// Set the context document.
    pub fn context(mut self, context: impl Into<String>) -> Self {
        self.config.context = context.into();
        self
    }

    /// Build the configuration.
    pub fn build(self) -> SessionConfig {
        self.config
    }
}
