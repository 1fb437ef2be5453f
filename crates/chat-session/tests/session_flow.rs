//! End-to-end tests for the chat turn flow.
//!
//! These run the session against real store backends (in-memory, JSON file
//! and SQLite) with scripted completers standing in for the providers.

use std::sync::Arc;
use std::time::Duration;

use chat_core::{Completer, Provider, StateBackend};
use chat_session::{ChatSession, CompactionOutcome, SessionConfig, TurnStatus};
use conversation_store::{
    ConversationStore, InMemoryBackend, JsonFileBackend, MemorySettings, StoreEvent,
};
use database::{Database, SqliteStateBackend};
use mock_completer::{DelayedCompleter, ScriptedCompleter};

const TITLE_NEEDLE: &str = "generate a concise chat title";
const SUMMARY_NEEDLE: &str = "Please summarize this conversation history";

async fn scripted() -> Arc<ScriptedCompleter> {
    let completer = Arc::new(ScriptedCompleter::always("ok"));
    completer
        .when_prompt_contains(TITLE_NEEDLE, "Numbered Messages")
        .await;
    completer
        .when_prompt_contains(SUMMARY_NEEDLE, "Condensed history.")
        .await;
    completer
}

fn config() -> SessionConfig {
    SessionConfig::builder()
        .provider(Provider::Gemini)
        .gemini_api_key("test-key")
        .build()
}

fn store_over(backend: Arc<dyn StateBackend>, threshold: usize) -> Arc<ConversationStore> {
    let settings = MemorySettings {
        summarization_threshold: threshold,
        ..MemorySettings::default()
    };
    Arc::new(ConversationStore::new(backend, settings))
}

// ============================================================================
// Compaction during a turn
// ============================================================================

#[tokio::test]
async fn test_turn_compacts_when_over_threshold() {
    let completer = scripted().await;
    let store = store_over(Arc::new(InMemoryBackend::new()), 40);
    let session = ChatSession::new(store.clone(), completer.clone(), config());
    let conversation = session.new_conversation().await.unwrap();
    let mut events = store.subscribe();

    // Each turn adds a 3-word user message and a 1-word reply.
    for i in 1..=10 {
        let turn = session
            .send_message(&format!("message number {}", i))
            .await
            .unwrap();
        assert_eq!(turn.status, TurnStatus::Answered);
        assert_eq!(turn.compaction, CompactionOutcome::NotNeeded);
    }

    let turn = session.send_message("message number 11").await.unwrap();
    assert_eq!(
        turn.compaction,
        CompactionOutcome::Compacted {
            removed: 6,
            summary_words: 2
        }
    );

    let stored = store.get_conversation(&conversation.id).await.unwrap().unwrap();
    assert_eq!(stored.title, "Numbered Messages");
    assert_eq!(stored.messages.len(), 16);
    assert_eq!(stored.summary.as_deref(), Some("Condensed history."));
    assert!(stored.last_summarized_at.is_some());
    assert!(!stored.is_summarizing);
    assert_eq!(stored.total_words, stored.calculate_word_count());

    let prompts = completer.prompts().await;
    let turn_prompt = prompts.last().unwrap();
    assert!(turn_prompt.starts_with("Previous conversation summary: Condensed history."));
    assert!(turn_prompt.ends_with("User: message number 11"));
    assert!(!turn_prompt.contains("message number 3\n"));

    let mut compacted = false;
    while let Ok(event) = events.try_recv() {
        if let StoreEvent::Compacted { id, removed } = event {
            assert_eq!(id, conversation.id);
            assert_eq!(removed, 6);
            compacted = true;
        }
    }
    assert!(compacted);
}

#[tokio::test]
async fn test_failed_compaction_retries_next_turn() {
    let completer = Arc::new(ScriptedCompleter::always("ok"));
    let store = store_over(Arc::new(InMemoryBackend::new()), 40);
    let session = ChatSession::new(store.clone(), completer.clone(), config());
    let conversation = session.new_conversation().await.unwrap();

    // Summarization always fails.
    completer
        .fail_when_prompt_contains(
            SUMMARY_NEEDLE,
            chat_core::CompletionError::Network("offline".into()),
        )
        .await;

    for i in 1..=10 {
        session
            .send_message(&format!("message number {}", i))
            .await
            .unwrap();
    }

    let turn = session.send_message("message number 11").await.unwrap();
    assert!(matches!(turn.compaction, CompactionOutcome::Aborted { .. }));
    assert_eq!(turn.status, TurnStatus::Answered);

    let stored = store.get_conversation(&conversation.id).await.unwrap().unwrap();
    assert_eq!(stored.messages.len(), 22);
    assert!(stored.summary.is_none());
    assert!(store.needs_summarization_for(&conversation.id).await.unwrap());
}

// ============================================================================
// Stale completions
// ============================================================================

#[tokio::test]
async fn test_reply_lands_in_originating_conversation() {
    let inner = ScriptedCompleter::always("late answer");
    let completer = Arc::new(DelayedCompleter::with_millis(inner, 200));
    let store = store_over(Arc::new(InMemoryBackend::new()), 200_000);
    let session = Arc::new(ChatSession::new(store.clone(), completer, config()));

    let original = session.new_conversation().await.unwrap();

    let pending = {
        let session = session.clone();
        tokio::spawn(async move { session.send_message("slow question").await })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    let other = session.new_conversation().await.unwrap();

    let turn = pending.await.unwrap().unwrap();
    assert_eq!(turn.status, TurnStatus::Answered);
    assert_eq!(turn.conversation_id, original.id);

    let original = store.get_conversation(&original.id).await.unwrap().unwrap();
    assert_eq!(original.messages.len(), 2);
    assert_eq!(original.messages[1].content, "late answer");

    let other = store.get_conversation(&other.id).await.unwrap().unwrap();
    assert!(other.messages.is_empty());
    assert_eq!(
        store.current_conversation_id().await.unwrap(),
        Some(other.id)
    );
}

#[tokio::test]
async fn test_reply_for_deleted_conversation_is_dropped() {
    let inner = ScriptedCompleter::always("nobody is listening");
    let completer = Arc::new(DelayedCompleter::with_millis(inner, 200));
    let store = store_over(Arc::new(InMemoryBackend::new()), 200_000);
    let session = Arc::new(ChatSession::new(store.clone(), completer, config()));

    let original = session.new_conversation().await.unwrap();

    let pending = {
        let session = session.clone();
        tokio::spawn(async move { session.send_message("question").await })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    store.delete_conversation(&original.id).await.unwrap();

    let turn = pending.await.unwrap().unwrap();
    assert_eq!(turn.status, TurnStatus::Stale);
    assert!(!turn.is_persisted());
    assert!(store.get_conversation(&original.id).await.unwrap().is_none());
    assert!(store.get_all_conversations().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_during_compaction_is_stale() {
    let inner = ScriptedCompleter::always("ok");
    inner
        .when_prompt_contains(SUMMARY_NEEDLE, "Condensed history.")
        .await;
    let completer = Arc::new(DelayedCompleter::with_millis(inner, 200));
    let store = store_over(Arc::new(InMemoryBackend::new()), 40);
    let session = Arc::new(ChatSession::new(store.clone(), completer.clone(), config()));
    let conversation = session.new_conversation().await.unwrap();

    for i in 1..=10 {
        session
            .send_message(&format!("message number {}", i))
            .await
            .unwrap();
    }

    let pending = {
        let session = session.clone();
        tokio::spawn(async move { session.send_message("message number 11").await })
    };

    // The summarization request is in flight.
    tokio::time::sleep(Duration::from_millis(50)).await;
    store.delete_conversation(&conversation.id).await.unwrap();

    let turn = pending.await.unwrap().unwrap();
    assert_eq!(turn.status, TurnStatus::Stale);
    assert!(!turn.is_persisted());
    assert_eq!(turn.conversation_id, conversation.id);
    assert!(matches!(turn.compaction, CompactionOutcome::Aborted { .. }));

    let prompts = completer.inner().prompts().await;
    assert!(prompts.last().unwrap().contains(SUMMARY_NEEDLE));
    assert!(!prompts
        .iter()
        .any(|p| p.ends_with("User: message number 11")));
    assert!(store.get_all_conversations().await.unwrap().is_empty());
}

// ============================================================================
// Durable backends
// ============================================================================

#[tokio::test]
async fn test_json_file_state_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chat_memory.json");
    let completer = scripted().await;

    let conversation_id = {
        let store = store_over(Arc::new(JsonFileBackend::new(&path)), 200_000);
        let session = ChatSession::new(store, completer.clone() as Arc<dyn Completer>, config());
        let conversation = session.new_conversation().await.unwrap();
        session.send_message("hello world").await.unwrap();
        conversation.id
    };

    let reopened = ConversationStore::open(
        Arc::new(JsonFileBackend::new(&path)),
        MemorySettings::default(),
    )
    .await
    .unwrap();

    let current = reopened.get_current_conversation().await.unwrap().unwrap();
    assert_eq!(current.id, conversation_id);
    assert_eq!(current.title, "Numbered Messages");
    assert_eq!(current.messages.len(), 2);
    assert_eq!(current.total_words, 3);
    assert_eq!(current.last_message_preview, "ok");
}

#[tokio::test]
async fn test_sqlite_state_survives_restart() {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    db.migrate().await.unwrap();
    let completer = scripted().await;

    {
        let store = store_over(Arc::new(SqliteStateBackend::new(db.clone())), 200_000);
        let session = ChatSession::new(store, completer.clone() as Arc<dyn Completer>, config());
        session.new_conversation().await.unwrap();
        session.send_message("first conversation").await.unwrap();
        session.new_conversation().await.unwrap();
        session.send_message("second conversation").await.unwrap();
    }

    let reopened = ConversationStore::open(
        Arc::new(SqliteStateBackend::new(db)),
        MemorySettings::default(),
    )
    .await
    .unwrap();

    let all = reopened.get_all_conversations().await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].messages[0].content, "second conversation");
    assert_eq!(all[1].messages[0].content, "first conversation");

    let stats = reopened.get_memory_stats().await.unwrap();
    assert_eq!(stats.total_conversations, 2);
    assert_eq!(stats.total_words, 6);
    assert_eq!(stats.current_words, 3);
}
