//! Core building blocks for Sidechat.
//!
//! # Architecture
//!
//! - [`credentials::CredentialStore`]: cached provider-id → secret lookup
//! - [`history::HistoryStore`]: global chat log + per-project histories
//! - [`storage`]: the key-value persistence seam both stores sit on
//! - [`voices::VoiceCache`]: TTL cache for the speech provider's voice list
//! - [`config`]: `~/.sidechat/config.json` + env var overrides
//! - [`error::SidechatError`]: the error taxonomy surfaced to the UI

pub mod config;
pub mod credentials;
pub mod error;
pub mod history;
pub mod presets;
pub mod storage;
pub mod types;
pub mod utils;
pub mod voices;

pub use credentials::{CredentialSet, CredentialStore, Secret};
pub use error::{Result, SidechatError};
pub use history::HistoryStore;
pub use storage::{JsonFileStore, KeyValueStore, MemoryStore};
pub use types::{ChatEntry, Project, Voice, VoiceSettings};
pub use voices::VoiceCache;
