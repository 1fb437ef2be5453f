//! Terminal chat client.
//!
//! Reads lines from stdin and either runs a shell command (`/help` lists
//! them) or sends the line as a chat message through a [`ChatSession`].
//!
//! State lives in a SQLite database (`--db`), a JSON file (`--state-file`)
//! or, with neither, in memory for the lifetime of the process.
//!
//! Usage:
//!   GEMINI_API_KEY=... cargo run --bin chat-shell -- --db sqlite:chat.db

mod commands;

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use chat_core::{truncate_to_word_budget, word_count, Provider, StateBackend};
use chat_session::{ChatSession, CompactionOutcome, SessionConfig, SessionError, TurnStatus};
use clap::Parser;
use conversation_store::{ConversationStore, InMemoryBackend, JsonFileBackend, MemorySettings};
use database::{Database, SqliteStateBackend};
use llm_providers::ProviderClient;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::commands::{Command, HELP_TEXT};

#[derive(Debug, Parser)]
#[command(name = "chat-shell")]
#[command(about = "Chat with Gemini or OpenAI from the terminal")]
struct Args {
    /// SQLite database URL for conversation state
    #[arg(long, env = "DATABASE_URL", conflicts_with = "state_file")]
    db: Option<String>,

    /// JSON file for conversation state
    #[arg(long, env = "CHAT_STATE_FILE")]
    state_file: Option<PathBuf>,

    /// Provider to use (overrides CHAT_PROVIDER)
    #[arg(long)]
    provider: Option<Provider>,

    /// Check the API key before starting
    #[arg(long)]
    verify: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    // Logs go to stderr so they do not interleave with replies
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("chat_shell=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let backend = open_backend(&args).await?;
    let settings = MemorySettings::from_env();
    let store = Arc::new(ConversationStore::open(backend, settings.clone()).await?);

    let client = Arc::new(ProviderClient::from_env()?);

    let mut config = SessionConfig::from_env()?;
    if let Some(provider) = args.provider {
        config.provider = provider;
    }
    if word_count(&config.context) > settings.max_context_words {
        warn!(
            "Context has {} words, truncating to {}",
            word_count(&config.context),
            settings.max_context_words
        );
        config.context = truncate_to_word_budget(&config.context, settings.max_context_words);
    }

    if args.verify {
        verify(&client, &config).await;
    }

    let session = ChatSession::new(store, client.clone(), config);
    let current = session.ensure_conversation().await?;
    info!("Current conversation: {}", current.id);

    println!("Chatting in \"{}\" ({}). Type /help for commands.", current.title, current.id);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };

        let command = Command::parse(&line);
        if command == Command::Quit {
            break;
        }
        if let Err(err) = run_command(&session, &client, command).await {
            println!("error: {}", err);
        }
    }

    println!("Bye.");
    Ok(())
}

async fn open_backend(args: &Args) -> Result<Arc<dyn StateBackend>, Box<dyn std::error::Error>> {
    if let Some(url) = &args.db {
        info!("Using SQLite state at {}", url);
        let db = Database::connect(url).await?;
        db.migrate().await?;
        return Ok(Arc::new(SqliteStateBackend::new(db)));
    }
    if let Some(path) = &args.state_file {
        info!("Using JSON state file {}", path.display());
        return Ok(Arc::new(JsonFileBackend::new(path)));
    }
    warn!("No --db or --state-file given, conversations will not be saved");
    Ok(Arc::new(InMemoryBackend::new()))
}

async fn verify(client: &ProviderClient, config: &SessionConfig) {
    let Some(key) = config.api_key() else {
        println!("No {} API key configured.", config.provider);
        return;
    };
    match client.verify_key(config.provider, key).await {
        Ok(()) => println!("{} API key verified.", config.provider),
        Err(err) => println!("{} API key check failed: {}", config.provider, err),
    }
}

fn prompt() -> std::io::Result<()> {
    print!("> ");
    std::io::stdout().flush()
}

async fn run_command(
    session: &ChatSession,
    client: &ProviderClient,
    command: Command,
) -> Result<(), SessionError> {
    let store = session.store();

    match command {
        Command::Empty | Command::Quit => {}
        Command::Help => println!("{}", HELP_TEXT),
        Command::Invalid(message) => println!("{}", message),
        Command::New => {
            let conversation = session.new_conversation().await?;
            println!("Started {}", conversation.id);
        }
        Command::List => {
            let current = store.current_conversation_id().await?;
            let conversations = store.get_all_conversations().await?;
            if conversations.is_empty() {
                println!("No conversations.");
            }
            for conversation in conversations {
                let marker = if current.as_deref() == Some(conversation.id.as_str()) {
                    '*'
                } else {
                    ' '
                };
                println!(
                    "{} {}  {}  ({} words)  {}",
                    marker,
                    conversation.id,
                    conversation.title,
                    conversation.total_words,
                    conversation.last_message_preview
                );
            }
        }
        Command::Switch(id) => match store.switch_to_conversation(&id).await? {
            Some(conversation) => {
                println!("Switched to \"{}\"", conversation.title);
                for message in &conversation.messages {
                    println!("{}: {}", message.speaker(), message.content);
                }
            }
            None => println!("No conversation {}", id),
        },
        Command::Delete(id) => {
            if session.delete_conversation(&id).await? {
                println!("Deleted {}", id);
            } else {
                println!("No conversation {}", id);
            }
        }
        Command::Rename { id, title } => {
            if store.update_conversation_title(&id, &title).await? {
                println!("Renamed {} to \"{}\"", id, title);
            } else {
                println!("No conversation {}", id);
            }
        }
        Command::Context(None) => match store.get_current_conversation().await? {
            Some(conversation) if !conversation.context.is_empty() => {
                println!("{}", conversation.context)
            }
            _ => println!("No context set."),
        },
        Command::Context(Some(text)) => {
            let conversation = session.update_context(&text).await?;
            println!("Context updated ({} words total).", conversation.total_words);
        }
        Command::Provider(provider) => {
            session.set_provider(provider).await;
            println!("Using {}", provider);
        }
        Command::Key { provider, key } => {
            session.set_api_key(provider, Some(key)).await;
            println!("{} API key set for this session.", provider);
        }
        Command::Verify => verify(client, &session.config().await).await,
        Command::Stats => {
            let stats = store.get_memory_stats().await?;
            println!(
                "{} conversations, {} words total, {} in the current one (summarizes above {})",
                stats.total_conversations,
                stats.total_words,
                stats.current_words,
                store.settings().summarization_threshold
            );
        }
        Command::Compact => {
            print_compaction(&session.compact_current().await?);
        }
        Command::ClearAll => {
            store.clear_all().await?;
            let conversation = session.new_conversation().await?;
            println!("Cleared. Started {}", conversation.id);
        }
        Command::Message(text) => {
            let turn = session.send_message(&text).await?;
            if matches!(
                turn.compaction,
                CompactionOutcome::Compacted { .. } | CompactionOutcome::Aborted { .. }
            ) {
                print_compaction(&turn.compaction);
            }
            if let Some(title) = &turn.title {
                println!("[title: {}]", title);
            }
            match turn.status {
                TurnStatus::Answered => println!("{}", turn.reply.content),
                TurnStatus::Stale => println!("[reply dropped, conversation was deleted]"),
                TurnStatus::MissingApiKey | TurnStatus::Failed => {
                    println!("! {}", turn.reply.content)
                }
            }
        }
    }

    Ok(())
}

fn print_compaction(outcome: &CompactionOutcome) {
    match outcome {
        CompactionOutcome::Compacted {
            removed,
            summary_words,
        } => println!(
            "[summarized {} older messages into {} words]",
            removed, summary_words
        ),
        CompactionOutcome::Aborted { reason } => println!("[summary skipped: {}]", reason),
        CompactionOutcome::NothingToCompact => println!("[nothing to summarize yet]"),
        CompactionOutcome::NotNeeded => {}
    }
}
