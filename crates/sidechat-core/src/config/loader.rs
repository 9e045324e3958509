//! Config loader: reads `~/.sidechat/config.json` and merges env vars.
//!
//! # Loading precedence
//! 1. Defaults (from `Config::default()`)
//! 2. JSON file at `~/.sidechat/config.json`
//! 3. Environment variables `SIDECHAT_<SECTION>__<FIELD>` (override JSON)

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::schema::Config;
use crate::credentials::KNOWN_PROVIDERS;

/// Default config file path.
pub fn get_config_path() -> PathBuf {
    crate::utils::get_data_path().join("config.json")
}

/// Load configuration from the default path + env vars.
///
/// Falls back to `Config::default()` if the file doesn't exist or can't be parsed.
pub fn load_config(path: Option<&Path>) -> Config {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    load_config_from_path(&config_path)
}

fn load_config_from_path(path: &Path) -> Config {
    if !path.exists() {
        info!("No config file found at {}, using defaults", path.display());
        return apply_env_overrides(Config::default());
    }

    debug!("Loading config from {}", path.display());

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read config file {}: {}", path.display(), e);
            return apply_env_overrides(Config::default());
        }
    };

    let config: Config = match serde_json::from_str(&content) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to parse config JSON: {}", e);
            return apply_env_overrides(Config::default());
        }
    };

    apply_env_overrides(config)
}

/// Save configuration to disk (pretty-printed JSON with camelCase keys).
pub fn save_config(config: &Config, path: Option<&Path>) -> std::io::Result<()> {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(config).map_err(std::io::Error::other)?;

    std::fs::write(&config_path, json)?;
    debug!("Config saved to {}", config_path.display());
    Ok(())
}

/// Apply environment variable overrides on top of a loaded config.
///
/// Supported overrides:
/// - `SIDECHAT_CREDENTIALS__PATH` → `credentials.path`
/// - `SIDECHAT_PROVIDERS__<NAME>__API_BASE` → `providers.<name>.api_base`
/// - `SIDECHAT_DISPATCH__DEFAULT_PROVIDER` → `dispatch.default_provider`
/// - `SIDECHAT_DISPATCH__TIMEOUT_SECS` → `dispatch.timeout_secs`
/// - `SIDECHAT_DISPATCH__TEMPERATURE` → `dispatch.temperature`
/// - `SIDECHAT_HISTORY__STORAGE_DIR` → `history.storage_dir`
fn apply_env_overrides(mut config: Config) -> Config {
    if let Ok(val) = std::env::var("SIDECHAT_CREDENTIALS__PATH") {
        config.credentials.path = val;
    }

    for name in KNOWN_PROVIDERS {
        let var = format!("SIDECHAT_PROVIDERS__{}__API_BASE", name.to_uppercase());
        if let Ok(val) = std::env::var(var) {
            if let Some(provider) = config.providers.get_by_name_mut(name) {
                provider.api_base = Some(val);
            }
        }
    }

    if let Ok(val) = std::env::var("SIDECHAT_DISPATCH__DEFAULT_PROVIDER") {
        config.dispatch.default_provider = val;
    }
    if let Ok(val) = std::env::var("SIDECHAT_DISPATCH__TIMEOUT_SECS") {
        if let Ok(n) = val.parse::<u64>() {
            config.dispatch.timeout_secs = n;
        }
    }
    if let Ok(val) = std::env::var("SIDECHAT_DISPATCH__TEMPERATURE") {
        if let Ok(t) = val.parse::<f64>() {
            config.dispatch.temperature = t;
        }
    }

    if let Ok(val) = std::env::var("SIDECHAT_HISTORY__STORAGE_DIR") {
        config.history.storage_dir = val;
    }

    config
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
