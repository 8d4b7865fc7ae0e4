//! Durable key-value storage for client state
//!
//! This module provides the storage seam used for credentials and the cached
//! profile, with a file-backed implementation that survives restarts and an
//! in-memory one for tests and ephemeral sessions.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::StoreResult;

/// Async key-value storage with group writes
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Get a value by key
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Set several key-value pairs as one write
    async fn set_many(&self, entries: &[(&str, String)]) -> StoreResult<()>;

    /// Delete several keys as one write
    async fn delete_many(&self, keys: &[&str]) -> StoreResult<()>;

    /// Set a single key-value pair
    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.set_many(&[(key, value.to_string())]).await
    }

    /// Delete a single key
    async fn delete(&self, key: &str) -> StoreResult<()> {
        self.delete_many(&[key]).await
    }
}

/// JSON file store
///
/// All entries live in one JSON object. Every write replaces the file through
/// a sibling temp file and a rename, so a group of keys is never half written.
pub struct FileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within the process.
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Create a store backed by the file at `path`
    ///
    /// The file and its parent directory are created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        info!("File store initialized at {}", path.display());
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> StoreResult<BTreeMap<String, String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) if contents.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_all(&self, entries: &BTreeMap<String, String>) -> StoreResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let contents = serde_json::to_vec_pretty(entries)?;
        let mut tmp_name = self.path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        write_private(&tmp_path, &contents).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;

        debug!("Wrote {} entries to {}", entries.len(), self.path.display());
        Ok(())
    }
}

#[cfg(unix)]
async fn write_private(path: &Path, contents: &[u8]) -> StoreResult<()> {
    use tokio::io::AsyncWriteExt;

    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
        .await?;
    file.write_all(contents).await?;
    file.sync_all().await?;
    Ok(())
}

#[cfg(not(unix))]
async fn write_private(path: &Path, contents: &[u8]) -> StoreResult<()> {
    tokio::fs::write(path, contents).await?;
    Ok(())
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let entries = self.read_all().await?;
        Ok(entries.get(key).cloned())
    }

    async fn set_many(&self, entries: &[(&str, String)]) -> StoreResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut current = self.read_all().await?;
        for (key, value) in entries {
            current.insert((*key).to_string(), value.clone());
        }
        self.write_all(&current).await
    }

    async fn delete_many(&self, keys: &[&str]) -> StoreResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut current = self.read_all().await?;
        let before = current.len();
        for key in keys {
            current.remove(*key);
        }
        if current.len() == before {
            return Ok(());
        }
        self.write_all(&current).await
    }
}

/// In-memory store
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set_many(&self, entries: &[(&str, String)]) -> StoreResult<()> {
        let mut current = self.entries.lock().await;
        for (key, value) in entries {
            current.insert((*key).to_string(), value.clone());
        }
        Ok(())
    }

    async fn delete_many(&self, keys: &[&str]) -> StoreResult<()> {
        let mut current = self.entries.lock().await;
        for key in keys {
            current.remove(*key);
        }
        Ok(())
    }
}
