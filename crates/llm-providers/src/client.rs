//! HTTP client for Gemini and OpenAI.

use async_trait::async_trait;
use chat_core::{Completer, CompletionError, Provider};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::api_types::{
    ApiError, ChatCompletionRequest, ChatCompletionResponse, GenerateContentRequest,
    GenerateContentResponse, GenerationConfig, OpenAiMessage,
};
use crate::config::ProviderConfig;

/// Prompt sent by [`ProviderClient::verify_key`].
pub const VERIFY_PROMPT: &str = "Hello";

/// A [`Completer`] that talks to the hosted Gemini and OpenAI APIs.
///
/// One client serves both providers; the provider and API key are chosen
/// per request.
pub struct ProviderClient {
    client: Client,
    config: ProviderConfig,
}

impl ProviderClient {
    /// Create a new client with the given configuration.
    pub fn new(config: ProviderConfig) -> Result<Self, CompletionError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                CompletionError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        info!(
            "ProviderClient initialized with gemini model: {}, openai model: {}",
            config.gemini_model, config.openai_model
        );

        Ok(Self { client, config })
    }

    /// Create a client from environment variables.
    ///
    /// See [`ProviderConfig::from_env`] for the variables read.
    pub fn from_env() -> Result<Self, CompletionError> {
        Self::new(ProviderConfig::from_env())
    }

    /// Get the configuration.
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Check that a key is accepted by sending a minimal prompt.
    pub async fn verify_key(&self, provider: Provider, api_key: &str) -> Result<(), CompletionError> {
        self.complete(VERIFY_PROMPT, api_key, provider).await?;
        info!("{} API key verified", provider);
        Ok(())
    }

    async fn complete_gemini(&self, prompt: &str, api_key: &str) -> Result<String, CompletionError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.gemini_api_url, self.config.gemini_model
        );

        let mut request = GenerateContentRequest::user(prompt);
        if self.config.max_tokens.is_some() || self.config.temperature.is_some() {
            request.generation_config = Some(GenerationConfig {
                max_output_tokens: self.config.max_tokens,
                temperature: self.config.temperature,
            });
        }

        debug!(model = %self.config.gemini_model, "Sending request to Gemini API");

        let response = self
            .client
            .post(&url)
            .query(&[("key", api_key)])
            .json(&request)
            .send()
            .await
            .map_err(map_transport_error)?;

        let body: GenerateContentResponse = read_json(Provider::Gemini, response).await?;
        non_empty(body.text())
    }

    async fn complete_openai(&self, prompt: &str, api_key: &str) -> Result<String, CompletionError> {
        let url = format!("{}/v1/chat/completions", self.config.openai_api_url);

        let request = ChatCompletionRequest {
            model: self.config.openai_model.clone(),
            messages: vec![OpenAiMessage::user(prompt)],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        debug!(model = %self.config.openai_model, "Sending request to OpenAI API");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(map_transport_error)?;

        let body: ChatCompletionResponse = read_json(Provider::OpenAi, response).await?;

        if let Some(usage) = &body.usage {
            debug!(
                "Token usage - prompt: {}, completion: {}, total: {}",
                usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
            );
        }

        non_empty(body.text().map(str::to_string))
    }
}

#[async_trait]
impl Completer for ProviderClient {
    async fn complete(
        &self,
        prompt: &str,
        api_key: &str,
        provider: Provider,
    ) -> Result<String, CompletionError> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(CompletionError::MissingApiKey(provider));
        }

        match provider {
            Provider::Gemini => self.complete_gemini(prompt, api_key).await,
            Provider::OpenAi => self.complete_openai(prompt, api_key).await,
        }
    }

    fn name(&self) -> &str {
        "ProviderClient"
    }
}

fn map_transport_error(err: reqwest::Error) -> CompletionError {
    if err.is_timeout() {
        CompletionError::Timeout
    } else {
        CompletionError::Network(format!("Failed to send request: {}", err))
    }
}

async fn read_json<T: DeserializeOwned>(
    provider: Provider,
    response: Response,
) -> Result<T, CompletionError> {
    let status = response.status();

    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ApiError>(&error_text) {
            Ok(api_error) => api_error.error.message,
            Err(_) => error_text,
        };
        warn!("{} API error ({}): {}", provider, status.as_u16(), message);
        return Err(CompletionError::Provider {
            status: status.as_u16(),
            message,
        });
    }

    let text = response.text().await.map_err(map_transport_error)?;
    serde_json::from_str(&text).map_err(|e| CompletionError::Provider {
        status: status.as_u16(),
        message: format!("Failed to parse response: {}", e),
    })
}

fn non_empty(text: Option<String>) -> Result<String, CompletionError> {
    match text.map(|t| t.trim().to_string()) {
        Some(text) if !text.is_empty() => Ok(text),
        _ => Err(CompletionError::EmptyResponse),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// A single-shot HTTP stub. Returns the base URL and a handle resolving
    /// to the raw request it received.
    async fn serve_once(status: u16, body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                if request_complete(&request) {
                    break;
                }
            }

            let response = format!(
                "HTTP/1.1 {} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&request).to_string()
        });

        (format!("http://{}", addr), handle)
    }

    fn request_complete(raw: &[u8]) -> bool {
        let text = String::from_utf8_lossy(raw);
        let Some(header_end) = text.find("\r\n\r\n") else {
            return false;
        };
        let content_length = text[..header_end]
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        raw.len() >= header_end + 4 + content_length
    }

    fn client_for(base: &str) -> ProviderClient {
        let config = ProviderConfig::builder()
            .gemini_api_url(base)
            .openai_api_url(base)
            .timeout(Duration::from_secs(5))
            .build();
        ProviderClient::new(config).unwrap()
    }

    #[test]
    fn test_client_name() {
        let client = ProviderClient::new(ProviderConfig::default()).unwrap();
        assert_eq!(client.name(), "ProviderClient");
    }

    #[tokio::test]
    async fn test_blank_key_is_missing() {
        let client = ProviderClient::new(ProviderConfig::default()).unwrap();
        let result = client.complete("hi", "   ", Provider::OpenAi).await;
        assert!(matches!(
            result,
            Err(CompletionError::MissingApiKey(Provider::OpenAi))
        ));
    }

    #[tokio::test]
    async fn test_gemini_success() {
        let (base, server) = serve_once(
            200,
            r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"  Hi there  "}]}}]}"#,
        )
        .await;
        let client = client_for(&base);

        let reply = client
            .complete("Hello model", "gem-key", Provider::Gemini)
            .await
            .unwrap();
        assert_eq!(reply, "Hi there");

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /v1beta/models/gemini-2.5-flash:generateContent?key=gem-key"));
        assert!(request.contains("Hello model"));
    }

    #[tokio::test]
    async fn test_openai_success() {
        let (base, server) = serve_once(
            200,
            r#"{"choices":[{"message":{"role":"assistant","content":"Sure."},"finish_reason":"stop"}]}"#,
        )
        .await;
        let client = client_for(&base);

        let reply = client
            .complete("Question", "sk-test", Provider::OpenAi)
            .await
            .unwrap();
        assert_eq!(reply, "Sure.");

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /v1/chat/completions"));
        assert!(request
            .to_ascii_lowercase()
            .contains("authorization: bearer sk-test"));
    }

    #[tokio::test]
    async fn test_provider_error_uses_api_message() {
        let (base, _server) = serve_once(
            401,
            r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#,
        )
        .await;
        let client = client_for(&base);

        let result = client.verify_key(Provider::OpenAi, "sk-bad").await;
        match result {
            Err(CompletionError::Provider { status, message }) => {
                assert_eq!(status, 401);
                assert_eq!(message, "Incorrect API key provided");
            }
            other => panic!("Expected Provider error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_candidates_is_empty_response() {
        let (base, _server) = serve_once(200, r#"{"candidates":[]}"#).await;
        let client = client_for(&base);

        let result = client.complete("x", "key", Provider::Gemini).await;
        assert!(matches!(result, Err(CompletionError::EmptyResponse)));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = client_for(&format!("http://{}", addr));
        let result = client.complete("x", "key", Provider::OpenAi).await;
        assert!(matches!(result, Err(CompletionError::Network(_))));
    }
}
