//! The conversation store.
//!
//! Owns the durable map of conversations and the single "current" pointer.
//! Every operation reads the whole state from the backend, mutates it and
//! writes it back; derived fields (`total_words`, `last_message_preview`)
//! are recomputed on every mutation that touches their inputs.

use std::cmp::Ordering;
use std::sync::Arc;

use chat_core::{
    check_context_budget, ChatMessage, Conversation, PersistenceError, StateBackend, StoreState,
};
use chrono::Utc;
use serde::Serialize;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, error, info, warn};

use crate::error::{Result, StoreError};
use crate::events::StoreEvent;
use crate::settings::MemorySettings;

/// Capacity of the event channel; slow subscribers observe `Lagged`.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Messages split at the compaction boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageSplit {
    /// Candidates for compaction, oldest first.
    pub old: Vec<ChatMessage>,
    /// The retained tail, always kept verbatim.
    pub recent: Vec<ChatMessage>,
}

impl MessageSplit {
    /// Whether there is anything to compact.
    pub fn has_old(&self) -> bool {
        !self.old.is_empty()
    }
}

/// Aggregate word usage across the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MemoryStats {
    pub total_conversations: usize,
    pub total_words: usize,
    pub current_words: usize,
}

/// Conversation store backed by an injected [`StateBackend`].
///
/// Operations are serialized through an internal lock, so concurrent tasks
/// sharing one store never interleave a read-modify-write. Separate store
/// instances over the same backend are not coordinated; the last save wins.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use chat_core::ChatMessage;
/// use conversation_store::{ConversationStore, InMemoryBackend, MemorySettings};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> Result<(), conversation_store::StoreError> {
///     let store = ConversationStore::new(Arc::new(InMemoryBackend::new()), MemorySettings::default());
///
///     store.create_conversation("").await?;
///     let conversation = store.add_message(ChatMessage::user("hello world")).await?;
///
///     assert_eq!(conversation.total_words, 2);
///     assert_eq!(conversation.last_message_preview, "hello world");
///     Ok(())
/// }
/// ```
pub struct ConversationStore {
    backend: Arc<dyn StateBackend>,
    settings: MemorySettings,
    lock: Mutex<()>,
    events: broadcast::Sender<StoreEvent>,
}

impl std::fmt::Debug for ConversationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationStore")
            .field("backend", &self.backend.name())
            .field("settings", &self.settings)
            .finish()
    }
}

impl ConversationStore {
    /// Create a store over the given backend.
    pub fn new(backend: Arc<dyn StateBackend>, settings: MemorySettings) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            backend,
            settings,
            lock: Mutex::new(()),
            events,
        }
    }

    /// Create a store and clear `is_summarizing` flags left behind by a
    /// process that stopped mid-compaction.
    pub async fn open(backend: Arc<dyn StateBackend>, settings: MemorySettings) -> Result<Self> {
        let store = Self::new(backend, settings);
        let recovered = store.recover_interrupted().await?;
        if recovered > 0 {
            info!("Cleared {} interrupted summarization flag(s)", recovered);
        }
        Ok(store)
    }

    /// The settings in use.
    pub fn settings(&self) -> &MemorySettings {
        &self.settings
    }

    /// Subscribe to state change events.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Create an empty conversation and make it current.
    pub async fn create_conversation(&self, context: impl Into<String>) -> Result<Conversation> {
        let _guard = self.lock.lock().await;
        let mut state = self.read_state().await?;

        let mut conversation = Conversation::new(context);
        conversation.refresh_derived(self.settings.preview_max_chars);

        state
            .conversations
            .insert(conversation.id.clone(), conversation.clone());
        state.current_conversation_id = Some(conversation.id.clone());
        self.write_state(&state).await?;

        debug!(conversation_id = %conversation.id, "Created conversation");
        self.emit(StoreEvent::Created {
            id: conversation.id.clone(),
        });
        Ok(conversation)
    }

    /// The current conversation, or `None` if unset or dangling.
    pub async fn get_current_conversation(&self) -> Result<Option<Conversation>> {
        let _guard = self.lock.lock().await;
        let state = self.read_state().await?;
        Ok(state.current().cloned())
    }

    /// Id of the current conversation, if it resolves.
    pub async fn current_conversation_id(&self) -> Result<Option<String>> {
        Ok(self.get_current_conversation().await?.map(|c| c.id))
    }

    /// Look up a conversation by id.
    pub async fn get_conversation(&self, id: &str) -> Result<Option<Conversation>> {
        let _guard = self.lock.lock().await;
        let state = self.read_state().await?;
        Ok(state.conversations.get(id).cloned())
    }

    /// Append a message to the current conversation.
    pub async fn add_message(&self, message: ChatMessage) -> Result<Conversation> {
        let _guard = self.lock.lock().await;
        let mut state = self.read_state().await?;

        let id = state
            .current()
            .map(|c| c.id.clone())
            .ok_or(StoreError::NoActiveConversation)?;
        self.append_locked(&mut state, &id, message).await
    }

    /// Append a message to a specific conversation, current or not.
    pub async fn add_message_to(&self, id: &str, message: ChatMessage) -> Result<Conversation> {
        let _guard = self.lock.lock().await;
        let mut state = self.read_state().await?;
        self.append_locked(&mut state, id, message).await
    }

    async fn append_locked(
        &self,
        state: &mut StoreState,
        id: &str,
        message: ChatMessage,
    ) -> Result<Conversation> {
        let conversation = state
            .conversations
            .get_mut(id)
            .ok_or_else(|| StoreError::ConversationNotFound(id.to_string()))?;

        let message_id = message.id.clone();
        conversation.messages.push(message);
        conversation.refresh_derived(self.settings.preview_max_chars);
        conversation.updated_at = Utc::now();
        let updated = conversation.clone();

        self.write_state(state).await?;
        self.emit(StoreEvent::MessageAdded {
            id: id.to_string(),
            message_id,
        });
        Ok(updated)
    }

    /// Replace a whole record by id, inserting it if unknown.
    ///
    /// Derived fields are recomputed and `updated_at` is bumped.
    pub async fn update_conversation(&self, mut conversation: Conversation) -> Result<Conversation> {
        let _guard = self.lock.lock().await;
        let mut state = self.read_state().await?;

        conversation.refresh_derived(self.settings.preview_max_chars);
        conversation.updated_at = Utc::now();
        state
            .conversations
            .insert(conversation.id.clone(), conversation.clone());
        self.write_state(&state).await?;

        self.emit(StoreEvent::Updated {
            id: conversation.id.clone(),
        });
        Ok(conversation)
    }

    /// Rewrite a conversation's title. Returns `false` if the id is unknown.
    pub async fn update_conversation_title(&self, id: &str, title: &str) -> Result<bool> {
        let _guard = self.lock.lock().await;
        let mut state = self.read_state().await?;

        let Some(conversation) = state.conversations.get_mut(id) else {
            debug!(conversation_id = %id, "Title update for unknown conversation ignored");
            return Ok(false);
        };
        conversation.title = title.to_string();
        conversation.updated_at = Utc::now();
        self.write_state(&state).await?;

        self.emit(StoreEvent::TitleChanged {
            id: id.to_string(),
            title: title.to_string(),
        });
        Ok(true)
    }

    /// Replace a conversation's context document.
    ///
    /// Context longer than `max_context_words` is rejected.
    pub async fn update_conversation_context(
        &self,
        id: &str,
        context: &str,
    ) -> Result<Conversation> {
        check_context_budget(context, self.settings.max_context_words)?;

        let _guard = self.lock.lock().await;
        let mut state = self.read_state().await?;

        let conversation = state
            .conversations
            .get_mut(id)
            .ok_or_else(|| StoreError::ConversationNotFound(id.to_string()))?;
        conversation.context = context.to_string();
        conversation.refresh_derived(self.settings.preview_max_chars);
        conversation.updated_at = Utc::now();
        let updated = conversation.clone();
        self.write_state(&state).await?;

        self.emit(StoreEvent::ContextChanged { id: id.to_string() });
        Ok(updated)
    }

    /// Make `id` current if it exists.
    pub async fn switch_to_conversation(&self, id: &str) -> Result<Option<Conversation>> {
        let _guard = self.lock.lock().await;
        let mut state = self.read_state().await?;

        let Some(conversation) = state.conversations.get(id).cloned() else {
            return Ok(None);
        };
        state.current_conversation_id = Some(id.to_string());
        self.write_state(&state).await?;

        self.emit(StoreEvent::Switched { id: id.to_string() });
        Ok(Some(conversation))
    }

    /// Remove a conversation. Clears the current pointer if it pointed here;
    /// no other conversation is selected in its place.
    pub async fn delete_conversation(&self, id: &str) -> Result<bool> {
        let _guard = self.lock.lock().await;
        let mut state = self.read_state().await?;

        let removed = state.conversations.shift_remove(id).is_some();
        let was_current = state.current_conversation_id.as_deref() == Some(id);
        if was_current {
            state.current_conversation_id = None;
        }
        if !removed && !was_current {
            return Ok(false);
        }
        self.write_state(&state).await?;

        self.emit(StoreEvent::Deleted {
            id: id.to_string(),
            was_current,
        });
        Ok(removed)
    }

    /// All conversations, most recently updated first.
    ///
    /// Records persisted without a title come back as "Untitled Chat". Ties
    /// on `updated_at` are broken by id.
    pub async fn get_all_conversations(&self) -> Result<Vec<Conversation>> {
        let _guard = self.lock.lock().await;
        let state = self.read_state().await?;

        let mut conversations: Vec<Conversation> = state
            .conversations
            .into_values()
            .map(Conversation::normalized)
            .collect();
        conversations.sort_by(sort_by_recency);
        Ok(conversations)
    }

    /// Whether the current conversation is over the summarization threshold
    /// and not already being summarized.
    pub async fn needs_summarization(&self) -> Result<bool> {
        Ok(self
            .get_current_conversation()
            .await?
            .map(|c| c.needs_summarization(self.settings.summarization_threshold))
            .unwrap_or(false))
    }

    /// Like [`Self::needs_summarization`] for a specific conversation.
    pub async fn needs_summarization_for(&self, id: &str) -> Result<bool> {
        Ok(self
            .get_conversation(id)
            .await?
            .map(|c| c.needs_summarization(self.settings.summarization_threshold))
            .unwrap_or(false))
    }

    /// Split the current conversation's messages into old and recent.
    pub async fn get_messages_for_summarization(&self) -> Result<MessageSplit> {
        let conversation = self
            .get_current_conversation()
            .await?
            .ok_or(StoreError::NoActiveConversation)?;
        Ok(self.split(&conversation))
    }

    /// Split a specific conversation's messages into old and recent.
    pub async fn messages_for_summarization(&self, id: &str) -> Result<MessageSplit> {
        let conversation = self
            .get_conversation(id)
            .await?
            .ok_or_else(|| StoreError::ConversationNotFound(id.to_string()))?;
        Ok(self.split(&conversation))
    }

    fn split(&self, conversation: &Conversation) -> MessageSplit {
        let (old, recent) =
            conversation.split_for_summarization(self.settings.recent_messages_to_keep);
        MessageSplit {
            old: old.to_vec(),
            recent: recent.to_vec(),
        }
    }

    /// Word usage across all conversations and the current one.
    pub async fn get_memory_stats(&self) -> Result<MemoryStats> {
        let _guard = self.lock.lock().await;
        let state = self.read_state().await?;

        Ok(MemoryStats {
            total_conversations: state.conversations.len(),
            total_words: state.conversations.values().map(|c| c.total_words).sum(),
            current_words: state.current().map(|c| c.total_words).unwrap_or(0),
        })
    }

    /// Set the transient summarizing flag. Returns `false` if the id is
    /// unknown. Does not bump `updated_at`.
    pub async fn set_summarizing(&self, id: &str, is_summarizing: bool) -> Result<bool> {
        let _guard = self.lock.lock().await;
        let mut state = self.read_state().await?;

        let Some(conversation) = state.conversations.get_mut(id) else {
            return Ok(false);
        };
        if conversation.is_summarizing == is_summarizing {
            return Ok(true);
        }
        conversation.is_summarizing = is_summarizing;
        self.write_state(&state).await?;

        self.emit(StoreEvent::SummarizingChanged {
            id: id.to_string(),
            is_summarizing,
        });
        Ok(true)
    }

    /// Commit a compaction in one write.
    ///
    /// The conversation must still start with exactly `summarized_ids`; those
    /// messages are dropped and `summary` replaces the previous summary.
    /// Messages appended after the split was taken are kept.
    pub async fn apply_compaction(
        &self,
        id: &str,
        summarized_ids: &[String],
        summary: String,
    ) -> Result<Conversation> {
        let _guard = self.lock.lock().await;
        let mut state = self.read_state().await?;

        let conversation = state
            .conversations
            .get_mut(id)
            .ok_or_else(|| StoreError::ConversationNotFound(id.to_string()))?;

        let prefix_matches = conversation.messages.len() >= summarized_ids.len()
            && conversation
                .messages
                .iter()
                .zip(summarized_ids)
                .all(|(msg, expected)| &msg.id == expected);
        if !prefix_matches {
            return Err(StoreError::StaleCompaction { id: id.to_string() });
        }

        let removed = summarized_ids.len();
        conversation.messages.drain(..removed);
        conversation.summary = Some(summary);
        conversation.last_summarized_at = Some(Utc::now());
        conversation.is_summarizing = false;
        conversation.refresh_derived(self.settings.preview_max_chars);
        conversation.updated_at = Utc::now();
        let updated = conversation.clone();
        self.write_state(&state).await?;

        self.emit(StoreEvent::Compacted {
            id: id.to_string(),
            removed,
        });
        Ok(updated)
    }

    /// Drop every conversation and the current pointer.
    pub async fn clear_all(&self) -> Result<()> {
        let _guard = self.lock.lock().await;
        self.backend.clear().await.map_err(|err| {
            error!(backend = self.backend.name(), "Failed to clear state: {}", err);
            StoreError::from(err)
        })?;

        info!("Cleared all conversation memory");
        self.emit(StoreEvent::Cleared);
        Ok(())
    }

    async fn recover_interrupted(&self) -> Result<usize> {
        let _guard = self.lock.lock().await;
        let mut state = self.read_state().await?;

        let mut recovered = 0;
        for conversation in state.conversations.values_mut() {
            if conversation.is_summarizing {
                conversation.is_summarizing = false;
                recovered += 1;
            }
        }
        if recovered > 0 {
            self.write_state(&state).await?;
        }
        Ok(recovered)
    }

    async fn read_state(&self) -> Result<StoreState> {
        match self.backend.load().await {
            Ok(state) => Ok(state),
            Err(PersistenceError::Corrupt(reason)) => {
                warn!(
                    backend = self.backend.name(),
                    "Stored conversation state is corrupt, starting empty: {}", reason
                );
                Ok(StoreState::default())
            }
            Err(err) => {
                error!(backend = self.backend.name(), "Failed to load state: {}", err);
                Err(err.into())
            }
        }
    }

    async fn write_state(&self, state: &StoreState) -> Result<()> {
        self.backend.save(state).await.map_err(|err| {
            error!(backend = self.backend.name(), "Failed to save state: {}", err);
            StoreError::from(err)
        })
    }

    fn emit(&self, event: StoreEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

fn sort_by_recency(a: &Conversation, b: &Conversation) -> Ordering {
    b.updated_at
        .cmp(&a.updated_at)
        .then_with(|| a.id.cmp(&b.id))
}
