//! Durable storage contract for the conversation store.

use async_trait::async_trait;

use crate::conversation::StoreState;
use crate::error::PersistenceError;

/// A backend that persists the whole store state as one unit.
///
/// The store reads the entire state, mutates it and writes it back; there is
/// no partial-record durability. Concurrent writers are not coordinated and
/// the last save wins.
#[async_trait]
pub trait StateBackend: Send + Sync {
    /// Load the persisted state. A missing state is an empty `StoreState`.
    ///
    /// Unparsable data must be reported as [`PersistenceError::Corrupt`] so
    /// the caller can decide whether to recover.
    async fn load(&self) -> Result<StoreState, PersistenceError>;

    /// Replace the persisted state.
    async fn save(&self, state: &StoreState) -> Result<(), PersistenceError>;

    /// Remove the persisted state entirely.
    async fn clear(&self) -> Result<(), PersistenceError>;

    /// Get a human-readable name for this backend.
    fn name(&self) -> &str;
}
