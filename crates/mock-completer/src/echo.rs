//! Echo completer implementation - echoes prompts back.

use async_trait::async_trait;
use chat_core::{Completer, CompletionError, Provider};

/// A simple completer that echoes the prompt back.
///
/// Useful for testing the turn flow without any provider.
#[derive(Debug, Clone, Default)]
pub struct EchoCompleter {
    /// Optional prefix to add before the echo.
    prefix: Option<String>,
}

impl EchoCompleter {
    /// Create a new EchoCompleter with no prefix.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new EchoCompleter with a custom prefix.
    ///
    /// # Example
    ///
    /// ```rust
    /// use mock_completer::EchoCompleter;
    ///
    /// let completer = EchoCompleter::with_prefix("Echo: ");
    /// // Will respond with "Echo: <prompt>"
    /// ```
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }
}

#[async_trait]
impl Completer for EchoCompleter {
    async fn complete(
        &self,
        prompt: &str,
        api_key: &str,
        provider: Provider,
    ) -> Result<String, CompletionError> {
        if api_key.trim().is_empty() {
            return Err(CompletionError::MissingApiKey(provider));
        }

        Ok(match &self.prefix {
            Some(prefix) => format!("{}{}", prefix, prompt),
            None => prompt.to_string(),
        })
    }

    fn name(&self) -> &str {
        "EchoCompleter"
    }
}
