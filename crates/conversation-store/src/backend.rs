//! In-process and file-based [`StateBackend`] implementations.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chat_core::{PersistenceError, StateBackend, StoreState};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::debug;

/// Keeps the serialized state blob in memory.
///
/// The blob goes through the same JSON encoding as durable backends, so
/// date re-parsing and field defaults behave identically.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    blob: RwLock<Option<String>>,
}

impl InMemoryBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a backend pre-seeded with a raw blob (which may be corrupt).
    pub fn with_blob(blob: impl Into<String>) -> Self {
        Self {
            blob: RwLock::new(Some(blob.into())),
        }
    }

    /// The raw blob currently stored, if any.
    pub async fn raw(&self) -> Option<String> {
        self.blob.read().await.clone()
    }
}

#[async_trait]
impl StateBackend for InMemoryBackend {
    async fn load(&self) -> Result<StoreState, PersistenceError> {
        match self.blob.read().await.as_deref() {
            Some(blob) => StoreState::from_json(blob),
            None => Ok(StoreState::default()),
        }
    }

    async fn save(&self, state: &StoreState) -> Result<(), PersistenceError> {
        let blob = state.to_json()?;
        *self.blob.write().await = Some(blob);
        Ok(())
    }

    async fn clear(&self) -> Result<(), PersistenceError> {
        *self.blob.write().await = None;
        Ok(())
    }

    fn name(&self) -> &str {
        "InMemoryBackend"
    }
}

/// Persists the state blob as a single JSON file.
///
/// Writes go to a sibling temp file first and are renamed into place, so a
/// crash mid-write leaves the previous state intact.
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    /// Create a backend for the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The file path in use.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl StateBackend for JsonFileBackend {
    async fn load(&self) -> Result<StoreState, PersistenceError> {
        match fs::read_to_string(&self.path).await {
            Ok(blob) => StoreState::from_json(&blob),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "State file missing, starting empty");
                Ok(StoreState::default())
            }
            Err(err) => Err(PersistenceError::Backend(format!(
                "failed to read {}: {}",
                self.path.display(),
                err
            ))),
        }
    }

    async fn save(&self, state: &StoreState) -> Result<(), PersistenceError> {
        let blob = state.to_json()?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(|e| {
                PersistenceError::Backend(format!("failed to create {}: {}", parent.display(), e))
            })?;
        }

        let temp = self.temp_path();
        fs::write(&temp, blob).await.map_err(|e| {
            PersistenceError::Backend(format!("failed to write {}: {}", temp.display(), e))
        })?;
        fs::rename(&temp, &self.path).await.map_err(|e| {
            PersistenceError::Backend(format!("failed to replace {}: {}", self.path.display(), e))
        })?;

        Ok(())
    }

    async fn clear(&self) -> Result<(), PersistenceError> {
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(PersistenceError::Backend(format!(
                "failed to remove {}: {}",
                self.path.display(),
                err
            ))),
        }
    }

    fn name(&self) -> &str {
        "JsonFileBackend"
    }
}
