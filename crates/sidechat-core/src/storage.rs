//! Local key-value storage.
//!
//! Values are whole JSON documents addressed by a key (`chatHistory`,
//! `projects`, `elevenLabsVoices`). Writing a key replaces its value
//! atomically; there is no cross-key transaction.
//!
//! # Disk format
//!
//! `JsonFileStore` keeps one `<key>.json` file per key under its directory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{Result, SidechatError};
use crate::utils;

/// Async key-value persistence used by the history store and voice cache.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a key. `Ok(None)` when the key has never been written.
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Replace a key's value.
    async fn set(&self, key: &str, value: Value) -> Result<()>;

    /// Delete a key. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;
}

// ─────────────────────────────────────────────
// JsonFileStore
// ─────────────────────────────────────────────

/// File-per-key store under a single directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| {
            SidechatError::storage(format!("cannot create {}: {}", dir.display(), e))
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", utils::safe_filename(key)))
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let path = self.key_path(key);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(SidechatError::storage(format!(
                    "cannot read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        let value = serde_json::from_str(&content).map_err(|e| {
            SidechatError::storage(format!("corrupt value in {}: {}", path.display(), e))
        })?;
        Ok(Some(value))
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        let path = self.key_path(key);
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_vec_pretty(&value).map_err(SidechatError::storage)?;

        tokio::fs::write(&tmp, json).await.map_err(|e| {
            SidechatError::storage(format!("cannot write {}: {}", tmp.display(), e))
        })?;
        tokio::fs::rename(&tmp, &path).await.map_err(|e| {
            SidechatError::storage(format!("cannot replace {}: {}", path.display(), e))
        })?;

        debug!(key = key, path = %path.display(), "stored value");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let path = self.key_path(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SidechatError::storage(format!(
                "cannot delete {}: {}",
                path.display(),
                e
            ))),
        }
    }
}

// ─────────────────────────────────────────────
// MemoryStore
// ─────────────────────────────────────────────

/// In-process store. Contents vanish with the value.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        self.values.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.values.write().await.remove(key);
        Ok(())
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
