//! Wiring: config → credential store, storage, history, dispatcher.
//!
//! Built once per process; every command borrows it.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use sidechat_core::config::{load_config, Config, VoiceConfig};
use sidechat_core::{CredentialStore, HistoryStore, JsonFileStore, VoiceCache};
use sidechat_providers::{ChatSession, DispatchOptions, Dispatcher, SpeechClient};

pub struct App {
    pub config: Config,
    pub credentials: Arc<CredentialStore>,
    pub store: Arc<JsonFileStore>,
    pub history: Arc<HistoryStore>,
    pub dispatcher: Arc<Dispatcher>,
}

impl App {
    pub fn load() -> Result<Self> {
        Self::from_config(load_config(None))
    }

    pub fn from_config(config: Config) -> Result<Self> {
        let credentials = Arc::new(CredentialStore::new(config.credentials_path()));

        let storage_dir = config.storage_path();
        let store = Arc::new(
            JsonFileStore::open(&storage_dir)
                .with_context(|| format!("failed to open storage at {}", storage_dir.display()))?,
        );
        let history = Arc::new(HistoryStore::with_limits(
            store.clone(),
            config.history.global_cap,
            config.history.context_window,
        ));

        let dispatcher = Arc::new(
            Dispatcher::from_config(credentials.clone(), &config).context("failed to build dispatcher")?,
        );

        debug!(storage = %storage_dir.display(), "app initialised");
        Ok(Self {
            config,
            credentials,
            store,
            history,
            dispatcher,
        })
    }

    pub fn session(&self) -> ChatSession {
        ChatSession::new(self.dispatcher.clone(), self.history.clone())
    }

    pub fn speech(&self) -> Result<SpeechClient> {
        SpeechClient::new(self.credentials.clone(), &DispatchOptions::from_config(&self.config))
            .context("failed to build speech client")
    }

    pub fn voice_cache(&self) -> VoiceCache {
        VoiceCache::new(self.store.clone(), cache_ttl(self.config.voice.cache_ttl_secs))
    }
}

/// Voice cache TTL from config, falling back to the default when out of range.
fn cache_ttl(secs: u64) -> chrono::Duration {
    let ttl = i64::try_from(secs).ok().and_then(chrono::Duration::try_seconds);
    match ttl {
        Some(ttl) => ttl,
        None => {
            let default_secs = VoiceConfig::default().cache_ttl_secs;
            warn!(configured = secs, default = default_secs, "voice.cacheTtlSecs out of range, using default");
            chrono::Duration::seconds(default_secs as i64)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_from_config_uses_configured_paths() {
        let dir = tempdir().unwrap();
        let mut config = Config::default();
        config.history.storage_dir = dir.path().join("storage").to_string_lossy().into_owned();
        config.credentials.path = dir.path().join("keys.json").to_string_lossy().into_owned();
        config.history.global_cap = 3;

        let app = App::from_config(config).unwrap();
        assert_eq!(app.store.dir(), dir.path().join("storage"));
        assert_eq!(app.history.global_cap(), 3);
        assert_eq!(app.credentials.path(), Some(dir.path().join("keys.json").as_path()));
        assert!(app.voice_cache().get().await.unwrap().is_none());
    }

    #[test]
    fn test_cache_ttl_in_range() {
        assert_eq!(cache_ttl(60), chrono::Duration::seconds(60));
    }

    #[test]
    fn test_cache_ttl_out_of_range_uses_default() {
        let day = chrono::Duration::hours(24);
        assert_eq!(cache_ttl(u64::MAX), day);
        assert_eq!(cache_ttl(i64::MAX as u64), day);
    }
}
