//! SQLite-backed [`StateBackend`] for the conversation store.

use async_trait::async_trait;
use chat_core::{PersistenceError, StateBackend, StoreState};
use tracing::debug;

use crate::kv;
use crate::Database;

/// Storage key the conversation store is persisted under.
pub const DEFAULT_STATE_KEY: &str = "chat_memory";

/// Persists the whole store state as one JSON blob in the `kv_store` table.
#[derive(Debug, Clone)]
pub struct SqliteStateBackend {
    database: Database,
    key: String,
}

impl SqliteStateBackend {
    /// Create a backend storing state under [`DEFAULT_STATE_KEY`].
    pub fn new(database: Database) -> Self {
        Self::with_key(database, DEFAULT_STATE_KEY)
    }

    /// Create a backend storing state under a custom key.
    pub fn with_key(database: Database, key: impl Into<String>) -> Self {
        Self {
            database,
            key: key.into(),
        }
    }

    /// The storage key in use.
    pub fn key(&self) -> &str {
        &self.key
    }
}

#[async_trait]
impl StateBackend for SqliteStateBackend {
    async fn load(&self) -> Result<StoreState, PersistenceError> {
        match kv::get_entry(self.database.pool(), &self.key).await? {
            Some(entry) => StoreState::from_json(&entry.value),
            None => {
                debug!(key = %self.key, "No persisted state, starting empty");
                Ok(StoreState::default())
            }
        }
    }

    async fn save(&self, state: &StoreState) -> Result<(), PersistenceError> {
        let blob = state.to_json()?;
        kv::upsert_value(self.database.pool(), &self.key, &blob).await?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), PersistenceError> {
        kv::delete_value(self.database.pool(), &self.key).await?;
        Ok(())
    }

    fn name(&self) -> &str {
        "SqliteStateBackend"
    }
}
