//! `sidechat onboard` — initialize configuration and storage.
//!
//! - Creates `~/.sidechat/config.json` with defaults
//! - Creates the storage directory
//! - Creates an API key file with an empty slot per provider

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

use sidechat_core::config::{get_config_path, load_config, save_config};
use sidechat_core::credentials::KNOWN_PROVIDERS;

pub fn run() -> Result<()> {
    println!();
    println!("{}", "💬 Sidechat — Setup".cyan().bold());
    println!();

    let config_path = get_config_path();
    let config = load_config(None);

    // 1. Config
    if config_path.exists() {
        println!("  {} config already exists at {}", "✓".green(), config_path.display());
    } else {
        save_config(&config, Some(config_path.as_path()))?;
        println!("  {} created config at {}", "✓".green(), config_path.display());
    }

    // 2. Storage
    let storage = config.storage_path();
    std::fs::create_dir_all(&storage)
        .with_context(|| format!("failed to create {}", storage.display()))?;
    println!("  {} storage at {}", "✓".green(), storage.display());

    // 3. Key file template
    let keys_path = config.credentials_path();
    create_key_template(&keys_path)?;

    println!();
    println!(
        "{}",
        "  Setup complete! Add a key with `sidechat keys set openai sk-...`, then run `sidechat chat`."
            .green()
    );
    println!();
    Ok(())
}

fn create_key_template(path: &Path) -> Result<()> {
    if path.exists() {
        println!("  {} API key file already exists at {}", "✓".green(), path.display());
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, key_template())
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!("  {} created API key file at {}", "✓".green(), path.display());
    Ok(())
}

fn key_template() -> String {
    let slots: serde_json::Map<String, serde_json::Value> = KNOWN_PROVIDERS
        .iter()
        .map(|name| (name.to_string(), serde_json::Value::String(String::new())))
        .collect();
    serde_json::to_string_pretty(&slots).unwrap_or_else(|_| "{}".to_string())
}
