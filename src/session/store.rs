use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::fs as async_fs;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// Storage key for the persisted user record
pub const USER_KEY: &str = "@user";

/// Storage key for the persisted bearer token
pub const TOKEN_KEY: &str = "@token";

/// Persistence errors for the session store
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StorageError {
    #[error("failed to read from session store: {0}")]
    ReadFailed(String),
    #[error("failed to write to session store: {0}")]
    WriteFailed(String),
    #[error("session store data is corrupt: {0}")]
    Corrupt(String),
    #[error("session store operation timed out")]
    Timeout,
}

/// Persistent key-value store backing the session manager.
///
/// `remove` of absent keys succeeds, which is what makes logout idempotent.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError>;

    async fn remove(&self, keys: &[&str]) -> Result<(), StorageError>;
}

/// Volatile in-memory store for tests and previews
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, keys: &[&str]) -> Result<(), StorageError> {
        let mut entries = self.entries.write().await;
        for key in keys {
            entries.remove(*key);
        }
        Ok(())
    }
}

/// File-backed store with one file per key under a root directory.
///
/// Writes go to a temp file first and are renamed into place, so a
/// partially written value never replaces a good one.
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Create a store rooted at the given directory, creating it if needed
    pub fn new(root: PathBuf) -> Result<Self, StorageError> {
        std::fs::create_dir_all(&root)
            .map_err(|e| StorageError::WriteFailed(format!("{}: {e}", root.display())))?;
        Ok(Self { root })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        // Keys are fixed short names like "@user"; strip the sigil for the
        // on-disk file name
        self.root.join(key.trim_start_matches('@'))
    }
}

#[async_trait]
impl SessionStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        match async_fs::read(self.path_for(key)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::ReadFailed(e.to_string())),
        }
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
        let final_path = self.path_for(key);
        let temp_path = self.root.join(format!(".{}.tmp", Uuid::new_v4()));

        async_fs::write(&temp_path, &value)
            .await
            .map_err(|e| StorageError::WriteFailed(e.to_string()))?;
        async_fs::rename(&temp_path, &final_path)
            .await
            .map_err(|e| StorageError::WriteFailed(e.to_string()))?;

        debug!("Persisted {} ({} bytes)", key, value.len());
        Ok(())
    }

    async fn remove(&self, keys: &[&str]) -> Result<(), StorageError> {
        for key in keys {
            match async_fs::remove_file(self.path_for(key)).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(StorageError::WriteFailed(e.to_string())),
            }
        }
        Ok(())
    }
}
