//! Locally cached copy of the speech provider's voice list.
//!
//! Stored under the `elevenLabsVoices` key as
//! `{"fetchedAt": "<rfc3339>", "voices": [...]}`. An entry at least `ttl`
//! old is treated as absent, so callers refetch.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Result, SidechatError};
use crate::storage::KeyValueStore;
use crate::types::Voice;

const VOICES_KEY: &str = "elevenLabsVoices";

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CachedVoices {
    fetched_at: DateTime<Utc>,
    voices: Vec<Voice>,
}

pub struct VoiceCache {
    store: Arc<dyn KeyValueStore>,
    ttl: Duration,
}

impl VoiceCache {
    pub fn new(store: Arc<dyn KeyValueStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// Cached voices, or `None` when missing, stale, or unreadable.
    pub async fn get(&self) -> Result<Option<Vec<Voice>>> {
        self.get_at(Utc::now()).await
    }

    async fn get_at(&self, now: DateTime<Utc>) -> Result<Option<Vec<Voice>>> {
        let Some(raw) = self.store.get(VOICES_KEY).await? else {
            return Ok(None);
        };

        let cached: CachedVoices = match serde_json::from_value(raw) {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "ignoring unreadable voice cache");
                return Ok(None);
            }
        };

        if now - cached.fetched_at >= self.ttl {
            debug!(fetched_at = %cached.fetched_at, "voice cache expired");
            return Ok(None);
        }
        Ok(Some(cached.voices))
    }

    /// Replace the cached list, stamped with the current time.
    pub async fn put(&self, voices: &[Voice]) -> Result<()> {
        self.put_at(voices, Utc::now()).await
    }

    async fn put_at(&self, voices: &[Voice], fetched_at: DateTime<Utc>) -> Result<()> {
        let cached = CachedVoices {
            fetched_at,
            voices: voices.to_vec(),
        };
        let value = serde_json::to_value(&cached).map_err(SidechatError::storage)?;
        self.store.set(VOICES_KEY, value).await?;
        debug!(count = voices.len(), "voice cache refreshed");
        Ok(())
    }

    pub async fn invalidate(&self) -> Result<()> {
        self.store.remove(VOICES_KEY).await
    }
}
