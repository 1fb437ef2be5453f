//! Summarization-triggered compaction.
//!
//! When a conversation crosses the word threshold, the messages older than
//! the retained tail are sent to the model for summarization and replaced by
//! the returned summary. Compaction is best effort: any delegate failure
//! leaves the conversation untouched, and it is retried on the next turn.

use std::sync::Arc;

use chat_core::{
    hash_prompt, render_transcript, word_count, ChatMessage, Completer, Provider,
};
use conversation_store::{ConversationStore, StoreError};
use tracing::{debug, info, warn};

use crate::error::Result;

/// Result of a compaction attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompactionOutcome {
    /// The conversation is under the threshold or already being summarized.
    NotNeeded,
    /// Over the threshold, but every message is in the retained tail.
    NothingToCompact,
    /// Old messages were replaced by a summary.
    Compacted { removed: usize, summary_words: usize },
    /// The attempt failed and nothing was changed.
    Aborted { reason: String },
}

/// Build the prompt asking the model to summarize `messages`.
///
/// The user's context document and the previous summary, when present, are
/// included ahead of the transcript so repeated compactions carry earlier
/// history forward.
pub fn build_summarization_prompt(
    messages: &[ChatMessage],
    context: &str,
    previous_summary: Option<&str>,
) -> String {
    let mut prompt = String::from(
        "Please summarize this conversation history while preserving key details and maintaining context for future responses. Focus on:\n\
         \n\
         1. Important decisions, preferences, and key information shared\n\
         2. User's specific requirements or constraints mentioned\n\
         3. Any important context or background information\n\
         4. The overall flow and progression of the conversation\n\
         5. Any technical details or specific instructions given\n\
         \n\
         Keep the summary concise but comprehensive. This summary will be used to maintain context in future conversations.\n",
    );

    if !context.trim().is_empty() {
        prompt.push_str(&format!("\nUser Context: {}\n", context));
    }

    if let Some(summary) = previous_summary.filter(|s| !s.trim().is_empty()) {
        prompt.push_str(&format!("\nPrevious summary: {}\n", summary));
    }

    prompt.push_str(&format!(
        "\nConversation to summarize:\n{}\n\n\
         Please provide a clear, well-structured summary that captures the essential information while being concise.",
        render_transcript(messages)
    ));

    prompt
}

/// Runs compactions against a store using a completion delegate.
#[derive(Clone)]
pub struct Compactor {
    store: Arc<ConversationStore>,
    completer: Arc<dyn Completer>,
}

impl Compactor {
    /// Create a compactor.
    pub fn new(store: Arc<ConversationStore>, completer: Arc<dyn Completer>) -> Self {
        Self { store, completer }
    }

    /// Compact `id` if it is over the summarization threshold.
    pub async fn compact_if_needed(
        &self,
        id: &str,
        api_key: &str,
        provider: Provider,
    ) -> Result<CompactionOutcome> {
        if !self.store.needs_summarization_for(id).await? {
            return Ok(CompactionOutcome::NotNeeded);
        }
        self.compact(id, api_key, provider).await
    }

    /// Compact `id` regardless of the threshold.
    pub async fn compact(
        &self,
        id: &str,
        api_key: &str,
        provider: Provider,
    ) -> Result<CompactionOutcome> {
        let conversation = self
            .store
            .get_conversation(id)
            .await?
            .ok_or_else(|| StoreError::ConversationNotFound(id.to_string()))?;

        if conversation.is_summarizing {
            debug!(conversation_id = %id, "Compaction already in flight");
            return Ok(CompactionOutcome::NotNeeded);
        }

        let split = self.store.messages_for_summarization(id).await?;
        if !split.has_old() {
            debug!(conversation_id = %id, "Nothing old enough to compact");
            return Ok(CompactionOutcome::NothingToCompact);
        }

        let prompt = build_summarization_prompt(
            &split.old,
            &conversation.context,
            conversation.summary.as_deref(),
        );
        let summarized_ids: Vec<String> = split.old.iter().map(|m| m.id.clone()).collect();

        info!(
            conversation_id = %id,
            "Summarizing {} of {} messages ({} words)",
            split.old.len(),
            conversation.messages.len(),
            conversation.total_words
        );
        debug!(conversation_id = %id, "Summarization prompt fingerprint: {}", hash_prompt(&prompt));

        self.store.set_summarizing(id, true).await?;

        let summary = match self.completer.complete(&prompt, api_key, provider).await {
            Ok(summary) if !summary.trim().is_empty() => summary,
            Ok(_) => return self.abort(id, "summary was empty".to_string()).await,
            Err(err) => return self.abort(id, err.to_string()).await,
        };

        match self
            .store
            .apply_compaction(id, &summarized_ids, summary)
            .await
        {
            Ok(updated) => {
                let summary_words = updated.summary.as_deref().map(word_count).unwrap_or(0);
                info!(
                    conversation_id = %id,
                    "Compacted {} messages into a {}-word summary, {} words total",
                    summarized_ids.len(),
                    summary_words,
                    updated.total_words
                );
                Ok(CompactionOutcome::Compacted {
                    removed: summarized_ids.len(),
                    summary_words,
                })
            }
            Err(err @ StoreError::StaleCompaction { .. })
            | Err(err @ StoreError::ConversationNotFound(_)) => {
                self.abort(id, err.to_string()).await
            }
            Err(err) => {
                self.clear_flag(id).await;
                Err(err.into())
            }
        }
    }

    async fn abort(&self, id: &str, reason: String) -> Result<CompactionOutcome> {
        warn!(conversation_id = %id, "Compaction aborted: {}", reason);
        self.clear_flag(id).await;
        Ok(CompactionOutcome::Aborted { reason })
    }

    async fn clear_flag(&self, id: &str) {
        if let Err(err) = self.store.set_summarizing(id, false).await {
            warn!(conversation_id = %id, "Failed to clear summarizing flag: {}", err);
        }
    }
}
