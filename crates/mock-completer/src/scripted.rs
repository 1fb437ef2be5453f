//! Scripted completer implementation - replies from a prepared script.

use std::collections::VecDeque;

use async_trait::async_trait;
use chat_core::{Completer, CompletionError, Provider};
use tokio::sync::Mutex;

/// A recorded call to a [`ScriptedCompleter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub prompt: String,
    pub api_key: String,
    pub provider: Provider,
}

#[derive(Debug, Default)]
struct Script {
    rules: Vec<(String, Result<String, CompletionError>)>,
    queue: VecDeque<Result<String, CompletionError>>,
    fallback: Option<String>,
    calls: Vec<RecordedCall>,
}

/// A completer that answers from a script and records every prompt.
///
/// Resolution order for each call: the first rule whose needle appears in
/// the prompt, then the next queued response, then the fallback reply.
/// With none of those available the call fails with
/// [`CompletionError::EmptyResponse`].
///
/// Rules are the way to script concurrent callers (title generation runs
/// alongside the chat turn), since their call order is not deterministic.
#[derive(Debug, Default)]
pub struct ScriptedCompleter {
    script: Mutex<Script>,
}

impl ScriptedCompleter {
    /// Create an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a completer that always replies with `reply`.
    pub fn always(reply: impl Into<String>) -> Self {
        Self {
            script: Mutex::new(Script {
                fallback: Some(reply.into()),
                ..Script::default()
            }),
        }
    }

    /// Reply with `reply` whenever the prompt contains `needle`.
    pub async fn when_prompt_contains(&self, needle: impl Into<String>, reply: impl Into<String>) {
        self.script
            .lock()
            .await
            .rules
            .push((needle.into(), Ok(reply.into())));
    }

    /// Fail with `error` whenever the prompt contains `needle`.
    pub async fn fail_when_prompt_contains(&self, needle: impl Into<String>, error: CompletionError) {
        self.script
            .lock()
            .await
            .rules
            .push((needle.into(), Err(error)));
    }

    /// Queue a reply for the next unmatched call.
    pub async fn push_reply(&self, reply: impl Into<String>) {
        self.script.lock().await.queue.push_back(Ok(reply.into()));
    }

    /// Queue a failure for the next unmatched call.
    pub async fn push_error(&self, error: CompletionError) {
        self.script.lock().await.queue.push_back(Err(error));
    }

    /// Set the reply used once rules and queue are exhausted.
    pub async fn set_fallback(&self, reply: impl Into<String>) {
        self.script.lock().await.fallback = Some(reply.into());
    }

    /// Every call received so far, in order.
    pub async fn calls(&self) -> Vec<RecordedCall> {
        self.script.lock().await.calls.clone()
    }

    /// Prompts received so far, in order.
    pub async fn prompts(&self) -> Vec<String> {
        self.script
            .lock()
            .await
            .calls
            .iter()
            .map(|c| c.prompt.clone())
            .collect()
    }

    /// Number of calls received so far.
    pub async fn call_count(&self) -> usize {
        self.script.lock().await.calls.len()
    }
}

#[async_trait]
impl Completer for ScriptedCompleter {
    async fn complete(
        &self,
        prompt: &str,
        api_key: &str,
        provider: Provider,
    ) -> Result<String, CompletionError> {
        let mut script = self.script.lock().await;
        script.calls.push(RecordedCall {
            prompt: prompt.to_string(),
            api_key: api_key.to_string(),
            provider,
        });

        if let Some((_, response)) = script
            .rules
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
        {
            return clone_response(response);
        }

        if let Some(response) = script.queue.pop_front() {
            return response;
        }

        script
            .fallback
            .clone()
            .ok_or(CompletionError::EmptyResponse)
    }

    fn name(&self) -> &str {
        "ScriptedCompleter"
    }
}

/// A completer that fails every call with the same error.
#[derive(Debug)]
pub struct FailingCompleter {
    error: CompletionError,
}

impl FailingCompleter {
    /// Fail every call with `error`.
    pub fn new(error: CompletionError) -> Self {
        Self { error }
    }

    /// Fail every call with a network error carrying `message`.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(CompletionError::Network(message.into()))
    }
}

#[async_trait]
impl Completer for FailingCompleter {
    async fn complete(
        &self,
        _prompt: &str,
        _api_key: &str,
        _provider: Provider,
    ) -> Result<String, CompletionError> {
        Err(clone_error(&self.error))
    }

    fn name(&self) -> &str {
        "FailingCompleter"
    }
}

fn clone_response(response: &Result<String, CompletionError>) -> Result<String, CompletionError> {
    match response {
        Ok(reply) => Ok(reply.clone()),
        Err(err) => Err(clone_error(err)),
    }
}

fn clone_error(err: &CompletionError) -> CompletionError {
    match err {
        CompletionError::MissingApiKey(provider) => CompletionError::MissingApiKey(*provider),
        CompletionError::Configuration(msg) => CompletionError::Configuration(msg.clone()),
        CompletionError::Network(msg) => CompletionError::Network(msg.clone()),
        CompletionError::Provider { status, message } => CompletionError::Provider {
            status: *status,
            message: message.clone(),
        },
        CompletionError::EmptyResponse => CompletionError::EmptyResponse,
        CompletionError::Timeout => CompletionError::Timeout,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_queue_then_fallback() {
        let completer = ScriptedCompleter::new();
        completer.push_reply("first").await;
        completer.push_error(CompletionError::Timeout).await;

        assert_eq!(
            completer.complete("a", "k", Provider::Gemini).await.unwrap(),
            "first"
        );
        assert!(matches!(
            completer.complete("b", "k", Provider::Gemini).await,
            Err(CompletionError::Timeout)
        ));
        assert!(matches!(
            completer.complete("c", "k", Provider::Gemini).await,
            Err(CompletionError::EmptyResponse)
        ));

        completer.set_fallback("later").await;
        assert_eq!(
            completer.complete("d", "k", Provider::Gemini).await.unwrap(),
            "later"
        );
        assert_eq!(completer.prompts().await, vec!["a", "b", "c", "d"]);
    }

    #[tokio::test]
    async fn test_rules_take_precedence() {
        let completer = ScriptedCompleter::always("default");
        completer.when_prompt_contains("chat title", "Weather Forecast").await;
        completer
            .fail_when_prompt_contains("summarize", CompletionError::Network("down".into()))
            .await;

        assert_eq!(
            completer
                .complete("generate a concise chat title", "k", Provider::OpenAi)
                .await
                .unwrap(),
            "Weather Forecast"
        );
        assert!(matches!(
            completer.complete("please summarize", "k", Provider::OpenAi).await,
            Err(CompletionError::Network(_))
        ));
        assert_eq!(
            completer.complete("hello", "k", Provider::OpenAi).await.unwrap(),
            "default"
        );

        let calls = completer.calls().await;
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0].provider, Provider::OpenAi);
        assert_eq!(calls[0].api_key, "k");
    }

    #[tokio::test]
    async fn test_failing_completer() {
        let completer = FailingCompleter::new(CompletionError::Provider {
            status: 429,
            message: "rate limited".to_string(),
        });

        for _ in 0..2 {
            match completer.complete("x", "k", Provider::Gemini).await {
                Err(CompletionError::Provider { status, .. }) => assert_eq!(status, 429),
                other => panic!("Expected Provider error, got {:?}", other),
            }
        }
        assert_eq!(completer.name(), "FailingCompleter");
    }
}
