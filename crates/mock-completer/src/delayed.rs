//! Delayed completer implementation - wraps another completer with artificial delay.

use std::time::Duration;

use async_trait::async_trait;
use chat_core::{Completer, CompletionError, Provider};
use tokio::time::sleep;

/// A completer that wraps another completer and adds artificial delay.
///
/// Useful for testing races between an in-flight request and user actions
/// such as switching or deleting conversations.
pub struct DelayedCompleter<C: Completer> {
    inner: C,
    delay: Duration,
}

impl<C: Completer> DelayedCompleter<C> {
    /// Create a new DelayedCompleter wrapping the given completer.
    pub fn new(inner: C, delay: Duration) -> Self {
        Self { inner, delay }
    }

    /// Create a completer with a delay in milliseconds.
    pub fn with_millis(inner: C, millis: u64) -> Self {
        Self::new(inner, Duration::from_millis(millis))
    }

    /// The wrapped completer.
    pub fn inner(&self) -> &C {
        &self.inner
    }
}

#[async_trait]
impl<C: Completer> Completer for DelayedCompleter<C> {
    async fn complete(
        &self,
        prompt: &str,
        api_key: &str,
        provider: Provider,
    ) -> Result<String, CompletionError> {
        sleep(self.delay).await;
        self.inner.complete(prompt, api_key, provider).await
    }

    fn name(&self) -> &str {
        "DelayedCompleter"
    }
}
