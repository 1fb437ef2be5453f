//! Configuration for the provider client.

use std::env;
use std::time::Duration;

/// Default Gemini API base URL.
pub const DEFAULT_GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com";

/// Default Gemini model.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

/// Default OpenAI API base URL.
pub const DEFAULT_OPENAI_API_URL: &str = "https://api.openai.com";

/// Default OpenAI model.
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Configuration for [`crate::ProviderClient`].
///
/// API keys are not part of the configuration; they are passed per request.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderConfig {
    /// Gemini API base URL.
    pub gemini_api_url: String,

    /// Gemini model name.
    pub gemini_model: String,

    /// OpenAI API base URL.
    pub openai_api_url: String,

    /// OpenAI model name.
    pub openai_model: String,

    /// Maximum tokens for a response.
    pub max_tokens: Option<u32>,

    /// Temperature for generation.
    pub temperature: Option<f32>,

    /// Whole-request timeout.
    pub timeout: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            gemini_api_url: DEFAULT_GEMINI_API_URL.to_string(),
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            openai_api_url: DEFAULT_OPENAI_API_URL.to_string(),
            openai_model: DEFAULT_OPENAI_MODEL.to_string(),
            max_tokens: None,
            temperature: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ProviderConfig {
    /// Create configuration from environment variables.
    ///
    /// Optional environment variables:
    /// - `GEMINI_API_URL` - Gemini base URL (default: https://generativelanguage.googleapis.com)
    /// - `GEMINI_MODEL` - Gemini model (default: gemini-2.5-flash)
    /// - `OPENAI_API_URL` - OpenAI base URL (default: https://api.openai.com)
    /// - `OPENAI_MODEL` - OpenAI model (default: gpt-4o-mini)
    /// - `LLM_MAX_TOKENS` - Max tokens (default: provider default)
    /// - `LLM_TEMPERATURE` - Temperature (default: provider default)
    /// - `LLM_TIMEOUT_SECS` - Request timeout (default: 60)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let gemini_api_url = env::var("GEMINI_API_URL").unwrap_or(defaults.gemini_api_url);
        let gemini_model = env::var("GEMINI_MODEL").unwrap_or(defaults.gemini_model);
        let openai_api_url = env::var("OPENAI_API_URL").unwrap_or(defaults.openai_api_url);
        let openai_model = env::var("OPENAI_MODEL").unwrap_or(defaults.openai_model);

        let max_tokens = env::var("LLM_MAX_TOKENS")
            .ok()
            .and_then(|v| v.parse().ok());

        let temperature = env::var("LLM_TEMPERATURE")
            .ok()
            .and_then(|v| v.parse().ok());

        let timeout = env::var("LLM_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout);

        Self {
            gemini_api_url: trim_base(gemini_api_url),
            gemini_model,
            openai_api_url: trim_base(openai_api_url),
            openai_model,
            max_tokens,
            temperature,
            timeout,
        }
    }

    /// Create a new config builder.
    pub fn builder() -> ProviderConfigBuilder {
        ProviderConfigBuilder::default()
    }
}

fn trim_base(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

/// Builder for ProviderConfig.
#[derive(Debug, Default)]
pub struct ProviderConfigBuilder {
    config: ProviderConfig,
}

impl ProviderConfigBuilder {
    /// Set the Gemini base URL.
    pub fn gemini_api_url(mut self, url: impl Into<String>) -> Self {
        self.config.gemini_api_url = trim_base(url.into());
        self
    }

    /// Set the Gemini model.
    pub fn gemini_model(mut self, model: impl Into<String>) -> Self {
        self.config.gemini_model = model.into();
        self
    }

    /// Set the OpenAI base URL.
    pub fn openai_api_url(mut self, url: impl Into<String>) -> Self {
        self.config.openai_api_url = trim_base(url.into());
        self
    }

    /// Set the OpenAI model.
    pub fn openai_model(mut self, model: impl Into<String>) -> Self {
        self.config.openai_model = model.into();
        self
    }

    /// Set the max tokens.
    pub fn max_tokens(mut self, tokens: u32) -> Self {
        self.config.max_tokens = Some(tokens);
        self
    }

    /// Set the temperature.
    pub fn temperature(mut self, temp: f32) -> Self {
        self.config.temperature = Some(temp);
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> ProviderConfig {
        self.config
    }
}
