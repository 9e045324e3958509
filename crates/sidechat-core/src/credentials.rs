//! Credential store: provider id → secret key, loaded once and cached.
//!
//! The backing resource is a JSON object such as
//! `{"openai": "sk-...", "elevenlabs": "..."}`. Loading never fails: a
//! missing or broken file yields an empty set plus a warning, so the UI can
//! still come up with degraded functionality.
//!
//! Each known provider can also be supplied through
//! `SIDECHAT_PROVIDERS__<NAME>__API_KEY`, which wins over the file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{Result, SidechatError};

/// Provider ids the credential resource is expected to carry.
pub const KNOWN_PROVIDERS: &[&str] = &["openai", "anthropic", "gemini", "perplexity", "elevenlabs"];

// ─────────────────────────────────────────────
// Secret
// ─────────────────────────────────────────────

/// An API key. `Debug` output is redacted so keys never reach the logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Secret(value.into())
    }

    /// The raw key, for building request headers.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Secret(***)")
    }
}

// ─────────────────────────────────────────────
// CredentialSet
// ─────────────────────────────────────────────

/// Mapping from provider id to secret. Blank values are never stored.
#[derive(Clone, Debug, Default)]
pub struct CredentialSet {
    keys: HashMap<String, Secret>,
}

impl CredentialSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a key; blank keys remove the entry instead.
    pub fn insert(&mut self, provider: impl Into<String>, key: impl Into<String>) {
        let provider = provider.into();
        let key = key.into();
        if key.trim().is_empty() {
            self.keys.remove(&provider);
        } else {
            self.keys.insert(provider, Secret(key));
        }
    }

    pub fn get(&self, provider: &str) -> Option<&Secret> {
        self.keys.get(provider)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Parse the JSON resource. Non-string and blank values are skipped.
    fn from_json(content: &str) -> std::result::Result<Self, String> {
        let raw: Value = serde_json::from_str(content).map_err(|e| e.to_string())?;
        let object = raw
            .as_object()
            .ok_or_else(|| "credential resource is not a JSON object".to_string())?;

        let mut set = CredentialSet::new();
        for (provider, value) in object {
            match value.as_str() {
                Some(key) if !key.trim().is_empty() => set.insert(provider.clone(), key),
                Some(_) => debug!(provider = %provider, "blank API key, treating as absent"),
                None => warn!(provider = %provider, "API key is not a string, skipping"),
            }
        }
        Ok(set)
    }

    fn to_json(&self) -> Value {
        let map = self
            .keys
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.0.clone())))
            .collect();
        Value::Object(map)
    }

    fn apply_env_overrides(&mut self) {
        for name in KNOWN_PROVIDERS {
            let var = format!("SIDECHAT_PROVIDERS__{}__API_KEY", name.to_uppercase());
            if let Ok(val) = std::env::var(var) {
                self.insert(*name, val);
            }
        }
    }
}

// ─────────────────────────────────────────────
// CredentialStore
// ─────────────────────────────────────────────

/// Cached credential lookup.
///
/// The set is read lazily on first use and kept for the lifetime of the
/// store; `reload` forces a fresh read.
pub struct CredentialStore {
    /// `None` for purely in-memory stores.
    path: Option<PathBuf>,
    cache: RwLock<Option<CredentialSet>>,
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl CredentialStore {
    /// Store backed by a JSON file. Nothing is read until first use.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            cache: RwLock::new(None),
        }
    }

    /// Store preloaded with a fixed set and no backing file.
    pub fn from_set(set: CredentialSet) -> Self {
        Self {
            path: None,
            cache: RwLock::new(Some(set)),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Return the cached set, loading it on first call.
    pub fn load(&self) -> CredentialSet {
        if let Ok(cache) = self.cache.read() {
            if let Some(set) = cache.as_ref() {
                return set.clone();
            }
        }
        self.reload()
    }

    /// Drop the cache and read the resource again.
    pub fn reload(&self) -> CredentialSet {
        let set = match &self.path {
            Some(path) => read_credentials(path),
            None => self.cached().unwrap_or_default(),
        };
        if let Ok(mut cache) = self.cache.write() {
            *cache = Some(set.clone());
        }
        set
    }

    /// Look up a provider's key. `None` means not configured.
    pub fn get(&self, provider: &str) -> Option<Secret> {
        self.load().get(provider).cloned()
    }

    pub fn is_available(&self, provider: &str) -> bool {
        self.get(provider).is_some()
    }

    /// Whether at least one provider has a key.
    pub fn verify(&self) -> bool {
        !self.load().is_empty()
    }

    /// Set (or clear, with a blank key) a provider's key and persist it.
    ///
    /// Only the file's own entries are written back; env overrides stay in
    /// the environment and are re-applied to the cached set.
    pub fn set(&self, provider: &str, key: &str) -> Result<()> {
        let set = match &self.path {
            Some(path) => {
                let mut on_disk = read_file_set(path);
                on_disk.insert(provider, key);
                write_credentials(path, &on_disk)?;
                on_disk.apply_env_overrides();
                on_disk
            }
            None => {
                let mut set = self.load();
                set.insert(provider, key);
                set
            }
        };
        if let Ok(mut cache) = self.cache.write() {
            *cache = Some(set);
        }
        info!(provider = provider, "API key updated");
        Ok(())
    }

    fn cached(&self) -> Option<CredentialSet> {
        self.cache.read().ok().and_then(|c| c.clone())
    }
}

/// Credential file merged with env overrides.
fn read_credentials(path: &Path) -> CredentialSet {
    let mut set = read_file_set(path);
    set.apply_env_overrides();
    set
}

/// Read and parse the credential file alone. Failure is logged, never returned.
fn read_file_set(path: &Path) -> CredentialSet {
    match std::fs::read_to_string(path) {
        Ok(content) => match CredentialSet::from_json(&content) {
            Ok(set) => {
                debug!(count = set.len(), "API keys loaded");
                set
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "invalid API keys file, using empty set");
                CredentialSet::new()
            }
        },
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read API keys file, using empty set");
            CredentialSet::new()
        }
    }
}

fn write_credentials(path: &Path, set: &CredentialSet) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(SidechatError::storage)?;
    }
    let json = serde_json::to_string_pretty(&set.to_json()).map_err(SidechatError::storage)?;
    std::fs::write(path, json).map_err(SidechatError::storage)
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::tempdir;

    /// Serializes tests that touch `SIDECHAT_PROVIDERS__PERPLEXITY__API_KEY`.
    /// No other test here reads perplexity.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn write_keys(dir: &Path, content: &str) -> PathBuf {
        let path = dir.join("api-keys.json");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_valid_file() {
        let dir = tempdir().unwrap();
        let path = write_keys(dir.path(), r#"{"openai": "sk-test", "anthropic": "sk-ant"}"#);

        let store = CredentialStore::new(path);
        assert_eq!(store.get("openai").unwrap().expose(), "sk-test");
        assert_eq!(store.get("anthropic").unwrap().expose(), "sk-ant");
        assert!(store.get("gemini").is_none());
    }

    #[test]
    fn test_missing_file_is_empty_not_error() {
        let store = CredentialStore::new("/nonexistent/api-keys.json");
        let set = store.load();
        assert!(set.get("openai").is_none());
        assert!(store.get("openai").is_none());
    }

    #[test]
    fn test_invalid_json_is_empty() {
        let dir = tempdir().unwrap();
        let path = write_keys(dir.path(), "{ not json");
        let store = CredentialStore::new(path);
        assert!(store.get("openai").is_none());
    }

    #[test]
    fn test_non_object_is_empty() {
        let dir = tempdir().unwrap();
        let path = write_keys(dir.path(), r#"["sk-test"]"#);
        let store = CredentialStore::new(path);
        assert!(store.get("openai").is_none());
    }

    #[test]
    fn test_blank_and_non_string_values_are_absent() {
        let dir = tempdir().unwrap();
        let path = write_keys(dir.path(), r#"{"openai": "  ", "anthropic": 42, "gemini": "g-key"}"#);
        let store = CredentialStore::new(path);
        assert!(!store.is_available("openai"));
        assert!(!store.is_available("anthropic"));
        assert!(store.is_available("gemini"));
    }

    #[test]
    fn test_cache_survives_file_change_until_reload() {
        let dir = tempdir().unwrap();
        let path = write_keys(dir.path(), r#"{"openai": "first"}"#);
        let store = CredentialStore::new(path.clone());
        assert_eq!(store.get("openai").unwrap().expose(), "first");

        std::fs::write(&path, r#"{"openai": "second"}"#).unwrap();
        assert_eq!(store.get("openai").unwrap().expose(), "first");

        store.reload();
        assert_eq!(store.get("openai").unwrap().expose(), "second");
    }

    #[test]
    fn test_set_persists_to_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("api-keys.json");
        let store = CredentialStore::new(path.clone());

        store.set("elevenlabs", "xi-123").unwrap();
        assert!(store.is_available("elevenlabs"));

        let fresh = CredentialStore::new(path);
        assert_eq!(fresh.get("elevenlabs").unwrap().expose(), "xi-123");
    }

    #[test]
    fn test_set_blank_clears_key() {
        let mut set = CredentialSet::new();
        set.insert("openai", "sk");
        let store = CredentialStore::from_set(set);
        store.set("openai", "").unwrap();
        assert!(!store.is_available("openai"));
    }

    #[test]
    fn test_verify() {
        assert!(!CredentialStore::from_set(CredentialSet::new()).verify());
        let mut set = CredentialSet::new();
        set.insert("gemini", "g");
        assert!(CredentialStore::from_set(set).verify());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let secret = Secret::new("sk-very-secret");
        assert_eq!(format!("{:?}", secret), "Secret(***)");

        let mut set = CredentialSet::new();
        set.insert("openai", "sk-very-secret");
        assert!(!format!("{:?}", set).contains("sk-very-secret"));
    }

    #[test]
    fn test_env_override_wins_over_file() {
        let dir = tempdir().unwrap();
        let path = write_keys(dir.path(), r#"{"perplexity": "from-file"}"#);

        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        std::env::set_var("SIDECHAT_PROVIDERS__PERPLEXITY__API_KEY", "from-env");
        let store = CredentialStore::new(path);
        let key = store.get("perplexity");
        std::env::remove_var("SIDECHAT_PROVIDERS__PERPLEXITY__API_KEY");

        assert_eq!(key.unwrap().expose(), "from-env");
    }

    #[test]
    fn test_set_does_not_persist_env_keys() {
        let dir = tempdir().unwrap();
        let path = write_keys(dir.path(), r#"{"openai": "sk-file"}"#);

        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        std::env::set_var("SIDECHAT_PROVIDERS__PERPLEXITY__API_KEY", "pplx-env-secret");
        let store = CredentialStore::new(path.clone());
        let before = store.get("perplexity");
        store.set("elevenlabs", "xi-new").unwrap();
        let after = store.get("perplexity");
        std::env::remove_var("SIDECHAT_PROVIDERS__PERPLEXITY__API_KEY");

        let written: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, serde_json::json!({"openai": "sk-file", "elevenlabs": "xi-new"}));
        assert_eq!(before.unwrap().expose(), "pplx-env-secret");
        assert_eq!(after.unwrap().expose(), "pplx-env-secret");
    }
}
