//! The chat turn flow.

use std::sync::Arc;

use chat_core::{
    build_turn_context, build_turn_prompt, ChatMessage, Completer, CompletionError, Conversation,
    Provider,
};
use conversation_store::{ConversationStore, StoreError};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::error::{Result, SessionError};
use crate::summarization::{CompactionOutcome, Compactor};
use crate::title::TitleGenerator;

/// Reply shown when the request never reached the provider.
pub const FAILED_SEND_TEXT: &str = "Failed to send message. Please try again.";

/// Inline reply shown when the selected provider has no key.
pub fn missing_key_text(provider: Provider) -> String {
    format!("Please add your {} API key in the settings dialog.", provider)
}

/// Inline reply text for a failed completion.
pub fn inline_error_text(err: &CompletionError) -> String {
    match err {
        CompletionError::Network(_) | CompletionError::Timeout => FAILED_SEND_TEXT.to_string(),
        CompletionError::Provider { message, .. } => format!("Error: {}", message),
        CompletionError::MissingApiKey(provider) => missing_key_text(*provider),
        other => format!("Error: {}", other),
    }
}

/// How a turn ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnStatus {
    /// The reply was appended to the conversation.
    Answered,
    /// The conversation was deleted while the turn was in flight; any reply
    /// was dropped, and none is requested if the deletion is noticed first.
    Stale,
    /// No key for the selected provider; the reply is an inline notice.
    MissingApiKey,
    /// The completion failed; the reply is an inline error.
    Failed,
}

/// Outcome of [`ChatSession::send_message`].
#[derive(Debug, Clone)]
pub struct TurnReply {
    /// Conversation the turn was sent from.
    pub conversation_id: String,
    /// The persisted user message.
    pub user_message: ChatMessage,
    /// The assistant reply, or an inline notice that is never persisted.
    pub reply: ChatMessage,
    pub status: TurnStatus,
    /// Title generated for the conversation by this turn, if any.
    pub title: Option<String>,
    pub compaction: CompactionOutcome,
}

impl TurnReply {
    /// Whether the reply was stored in the conversation.
    pub fn is_persisted(&self) -> bool {
        self.status == TurnStatus::Answered
    }
}

/// A chat session over a conversation store and a completion delegate.
///
/// Each call to [`ChatSession::send_message`] captures the current
/// conversation id up front; everything the turn produces (title, summary,
/// reply) is written to that conversation, even if the user has switched
/// away by the time it arrives.
pub struct ChatSession {
    store: Arc<ConversationStore>,
    completer: Arc<dyn Completer>,
    compactor: Compactor,
    titles: TitleGenerator,
    config: RwLock<SessionConfig>,
}

impl ChatSession {
    /// Create a session.
    pub fn new(
        store: Arc<ConversationStore>,
        completer: Arc<dyn Completer>,
        config: SessionConfig,
    ) -> Self {
        let compactor = Compactor::new(store.clone(), completer.clone());
        let titles = TitleGenerator::new(completer.clone())
            .with_max_words(store.settings().title_max_words);

        info!(
            "ChatSession initialized with provider: {}, completer: {}",
            config.provider,
            completer.name()
        );

        Self {
            store,
            completer,
            compactor,
            titles,
            config: RwLock::new(config),
        }
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<ConversationStore> {
        &self.store
    }

    /// A snapshot of the current configuration.
    pub async fn config(&self) -> SessionConfig {
        self.config.read().await.clone()
    }

    /// Select the provider used by subsequent turns.
    pub async fn set_provider(&self, provider: Provider) {
        self.config.write().await.provider = provider;
        info!("Provider set to {}", provider);
    }

    /// Set or clear the key for a provider.
    pub async fn set_api_key(&self, provider: Provider, key: Option<String>) {
        self.config.write().await.set_api_key(provider, key);
    }

    /// Start a new conversation seeded with the session context.
    pub async fn new_conversation(&self) -> Result<Conversation> {
        let context = self.config.read().await.context.clone();
        Ok(self.store.create_conversation(context).await?)
    }

    /// The current conversation, creating one if none is selected.
    pub async fn ensure_conversation(&self) -> Result<Conversation> {
        match self.store.get_current_conversation().await? {
            Some(conversation) => Ok(conversation),
            None => self.new_conversation().await,
        }
    }

    /// Delete a conversation. Deleting the current one starts a new one.
    pub async fn delete_conversation(&self, id: &str) -> Result<bool> {
        let was_current = self.store.current_conversation_id().await?.as_deref() == Some(id);
        let removed = self.store.delete_conversation(id).await?;
        if was_current {
            self.new_conversation().await?;
        }
        Ok(removed)
    }

    /// Replace the context document for the session and the current
    /// conversation.
    pub async fn update_context(&self, context: &str) -> Result<Conversation> {
        let id = self
            .store
            .current_conversation_id()
            .await?
            .ok_or(StoreError::NoActiveConversation)?;
        let updated = self.store.update_conversation_context(&id, context).await?;
        self.config.write().await.context = context.to_string();
        Ok(updated)
    }

    /// Compact the current conversation now, regardless of the threshold.
    pub async fn compact_current(&self) -> Result<CompactionOutcome> {
        let config = self.config().await;
        let api_key = config
            .api_key()
            .ok_or(CompletionError::MissingApiKey(config.provider))?;
        let id = self
            .store
            .current_conversation_id()
            .await?
            .ok_or(StoreError::NoActiveConversation)?;
        self.compactor.compact(&id, api_key, config.provider).await
    }

    /// Send a user message in the current conversation.
    ///
    /// The user message is always persisted. Missing keys and delegate
    /// failures come back as an inline reply rather than an error.
    pub async fn send_message(&self, text: &str) -> Result<TurnReply> {
        if text.trim().is_empty() {
            return Err(SessionError::EmptyMessage);
        }

        let config = self.config().await;
        let conversation = self
            .store
            .get_current_conversation()
            .await?
            .ok_or(StoreError::NoActiveConversation)?;
        let id = conversation.id.clone();
        let is_first = conversation.messages.is_empty();

        let user_message = ChatMessage::user(text);
        self.store
            .add_message_to(&id, user_message.clone())
            .await?;
        debug!(conversation_id = %id, "User message appended");

        let Some(api_key) = config.api_key() else {
            warn!(conversation_id = %id, "No API key for {}", config.provider);
            return Ok(TurnReply {
                conversation_id: id,
                user_message,
                reply: ChatMessage::assistant(missing_key_text(config.provider)),
                status: TurnStatus::MissingApiKey,
                title: None,
                compaction: CompactionOutcome::NotNeeded,
            });
        };

        let wants_title = is_first && conversation.has_default_title();
        let title_task = async {
            if wants_title {
                Some(self.titles.generate(text, api_key, config.provider).await)
            } else {
                None
            }
        };
        let turn_task = self.run_turn(&id, &user_message, &config, api_key);

        let (title, turn) = tokio::join!(title_task, turn_task);

        if let Some(title) = &title {
            match self.store.update_conversation_title(&id, title).await {
                Ok(true) => info!(conversation_id = %id, "Title set to {:?}", title),
                Ok(false) => debug!(conversation_id = %id, "Conversation gone before title landed"),
                Err(err) => warn!(conversation_id = %id, "Failed to store title: {}", err),
            }
        }

        let (compaction, result) = turn?;

        let (reply, status) = match result {
            None => {
                warn!(conversation_id = %id, "Conversation deleted during compaction, skipping reply");
                (ChatMessage::assistant(String::new()), TurnStatus::Stale)
            }
            Some(Ok(text)) => {
                let reply = ChatMessage::assistant(text);
                match self.store.add_message_to(&id, reply.clone()).await {
                    Ok(_) => (reply, TurnStatus::Answered),
                    Err(StoreError::ConversationNotFound(_)) => {
                        warn!(conversation_id = %id, "Conversation deleted before reply arrived, dropping reply");
                        (reply, TurnStatus::Stale)
                    }
                    Err(err) => return Err(err.into()),
                }
            }
            Some(Err(err)) => {
                warn!(conversation_id = %id, "Completion failed: {}", err);
                (
                    ChatMessage::assistant(inline_error_text(&err)),
                    TurnStatus::Failed,
                )
            }
        };

        Ok(TurnReply {
            conversation_id: id,
            user_message,
            reply,
            status,
            title,
            compaction,
        })
    }

    async fn run_turn(
        &self,
        id: &str,
        user_message: &ChatMessage,
        config: &SessionConfig,
        api_key: &str,
    ) -> Result<(CompactionOutcome, Option<std::result::Result<String, CompletionError>>)> {
        let compaction = match self
            .compactor
            .compact_if_needed(id, api_key, config.provider)
            .await
        {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(conversation_id = %id, "Compaction failed: {}", err);
                CompactionOutcome::Aborted {
                    reason: err.to_string(),
                }
            }
        };

        let Some(conversation) = self.store.get_conversation(id).await? else {
            return Ok((compaction, None));
        };

        let history_len = conversation
            .messages
            .iter()
            .position(|m| m.id == user_message.id)
            .unwrap_or(conversation.messages.len());
        let history = &conversation.messages[..history_len];

        let context = if config.context.trim().is_empty() {
            conversation.context.as_str()
        } else {
            config.context.as_str()
        };

        let block = build_turn_context(context, conversation.summary.as_deref(), history);
        let prompt = build_turn_prompt(&block, &user_message.content);

        debug!(
            conversation_id = %id,
            "Sending turn with {} history messages to {}",
            history.len(),
            config.provider
        );

        let result = self
            .completer
            .complete(&prompt, api_key, config.provider)
            .await;
        Ok((compaction, Some(result)))
    }
}
