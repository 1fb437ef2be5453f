//! Database models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A stored key/value entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct KvEntry {
    /// Storage key (e.g. "chat_memory").
    pub key: String,
    /// Serialized value.
    pub value: String,
    /// Last update timestamp.
    pub updated_at: String,
}
