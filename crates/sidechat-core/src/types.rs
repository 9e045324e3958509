//! Persisted domain types: chat entries, projects, and speech voices.
//!
//! Field names on disk are camelCase for projects (`chatHistory`,
//! `createdAt`) and follow the vendor's snake_case for voices.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────
// Chat entries
// ─────────────────────────────────────────────

fn unknown() -> String {
    "unknown".to_string()
}

/// One completed prompt/response exchange. Immutable once written.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ChatEntry {
    pub prompt: String,
    pub response: String,
    /// When the exchange completed (serialized as RFC 3339).
    pub timestamp: DateTime<Utc>,
    #[serde(default = "unknown")]
    pub provider: String,
    #[serde(default = "unknown")]
    pub model: String,
}

impl ChatEntry {
    /// Create an entry stamped with the current time.
    pub fn new(
        prompt: impl Into<String>,
        response: impl Into<String>,
        provider: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            response: response.into(),
            timestamp: Utc::now(),
            provider: provider.into(),
            model: model.into(),
        }
    }

    /// Case-insensitive substring match on prompt or response.
    pub fn matches(&self, query_lower: &str) -> bool {
        self.prompt.to_lowercase().contains(query_lower)
            || self.response.to_lowercase().contains(query_lower)
    }
}

// ─────────────────────────────────────────────
// Projects
// ─────────────────────────────────────────────

/// A user-named conversation scope that owns its own history.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub chat_history: Vec<ChatEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            chat_history: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

// ─────────────────────────────────────────────
// Voices
// ─────────────────────────────────────────────

/// A text-to-speech voice as listed by the speech provider.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Voice {
    pub voice_id: String,
    pub name: String,
}

/// Synthesis parameters sent with each text-to-speech request.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct VoiceSettings {
    pub stability: f64,
    pub similarity_boost: f64,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            stability: 0.75,
            similarity_boost: 0.75,
        }
    }
}
