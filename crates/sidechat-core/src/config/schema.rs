//! Configuration schema.
//!
//! Hierarchy: `Config` → `CredentialsConfig`, `ProvidersConfig`,
//! `DispatchConfig`, `HistoryConfig`, `VoiceConfig`.
//!
//! JSON on disk uses **camelCase** keys; Rust uses snake_case.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Root configuration, loaded from `~/.sidechat/config.json` + env vars.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub credentials: CredentialsConfig,
    pub providers: ProvidersConfig,
    pub dispatch: DispatchConfig,
    pub history: HistoryConfig,
    pub voice: VoiceConfig,
}

impl Config {
    /// Credential resource path with `~` expanded.
    pub fn credentials_path(&self) -> PathBuf {
        crate::utils::expand_home(&self.credentials.path)
    }

    /// Key-value storage directory with `~` expanded.
    pub fn storage_path(&self) -> PathBuf {
        crate::utils::expand_home(&self.history.storage_dir)
    }
}

// ─────────────────────────────────────────────
// Credentials
// ─────────────────────────────────────────────

/// Where the provider-id → secret JSON object lives.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CredentialsConfig {
    pub path: String,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            path: "~/.sidechat/api-keys.json".to_string(),
        }
    }
}

// ─────────────────────────────────────────────
// Providers
// ─────────────────────────────────────────────

/// Per-provider connection overrides. Keys never live here.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProviderConfig {
    /// Custom API base URL (overrides the registry default).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProvidersConfig {
    pub openai: ProviderConfig,
    pub anthropic: ProviderConfig,
    pub gemini: ProviderConfig,
    pub perplexity: ProviderConfig,
    pub elevenlabs: ProviderConfig,
}

impl ProvidersConfig {
    /// Get a provider config by name (e.g. `"anthropic"`).
    pub fn get_by_name(&self, name: &str) -> Option<&ProviderConfig> {
        match name {
            "openai" => Some(&self.openai),
            "anthropic" => Some(&self.anthropic),
            "gemini" => Some(&self.gemini),
            "perplexity" => Some(&self.perplexity),
            "elevenlabs" => Some(&self.elevenlabs),
            _ => None,
        }
    }

    pub(crate) fn get_by_name_mut(&mut self, name: &str) -> Option<&mut ProviderConfig> {
        match name {
            "openai" => Some(&mut self.openai),
            "anthropic" => Some(&mut self.anthropic),
            "gemini" => Some(&mut self.gemini),
            "perplexity" => Some(&mut self.perplexity),
            "elevenlabs" => Some(&mut self.elevenlabs),
            _ => None,
        }
    }

    /// Configured base URL overrides, keyed by provider name.
    pub fn api_bases(&self) -> HashMap<String, String> {
        crate::credentials::KNOWN_PROVIDERS
            .iter()
            .filter_map(|name| {
                self.get_by_name(name)
                    .and_then(|c| c.api_base.clone())
                    .map(|base| (name.to_string(), base))
            })
            .collect()
    }
}

// ─────────────────────────────────────────────
// Dispatch
// ─────────────────────────────────────────────

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DispatchConfig {
    /// Provider used when the caller does not pick one.
    pub default_provider: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Sampling temperature for providers that accept one.
    pub temperature: f64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            default_provider: "openai".to_string(),
            timeout_secs: 30,
            temperature: 0.7,
        }
    }
}

// ─────────────────────────────────────────────
// History
// ─────────────────────────────────────────────

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HistoryConfig {
    /// Directory for the key-value store files.
    pub storage_dir: String,
    /// Maximum number of entries kept in the global history.
    pub global_cap: usize,
    /// How many recent project entries are prepended as context.
    pub context_window: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            storage_dir: "~/.sidechat/storage".to_string(),
            global_cap: crate::history::GLOBAL_HISTORY_CAP,
            context_window: crate::history::CONTEXT_WINDOW,
        }
    }
}

// ─────────────────────────────────────────────
// Voice
// ─────────────────────────────────────────────

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VoiceConfig {
    /// How long a fetched voice list stays fresh.
    pub cache_ttl_secs: u64,
    pub stability: f64,
    pub similarity_boost: f64,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: 24 * 60 * 60,
            stability: 0.75,
            similarity_boost: 0.75,
        }
    }
}

impl VoiceConfig {
    pub fn settings(&self) -> crate::types::VoiceSettings {
        crate::types::VoiceSettings {
            stability: self.stability,
            similarity_boost: self.similarity_boost,
        }
    }
}
