//! `sidechat keys` — inspect and update the credential store.
//!
//! Keys are never printed; `list` only shows which providers have one.

use anyhow::{bail, Result};
use clap::Subcommand;
use colored::Colorize;

use sidechat_core::credentials::KNOWN_PROVIDERS;

use crate::app::App;

#[derive(Subcommand)]
pub enum KeysCommands {
    /// Show which providers have a key
    List,
    /// Store a key (an empty KEY removes it)
    Set { provider: String, key: String },
}

pub fn dispatch(app: &App, action: KeysCommands) -> Result<()> {
    match action {
        KeysCommands::List => {
            if let Some(path) = app.credentials.path() {
                println!("  {} {}", "File:".bold(), path.display());
            }
            for name in KNOWN_PROVIDERS {
                let status = if app.credentials.is_available(name) {
                    format!("{} key set", "✓".green())
                } else {
                    format!("{}", "· not configured".dimmed())
                };
                println!("    {:<14} {}", name, status);
            }
        }
        KeysCommands::Set { provider, key } => {
            let provider = provider.to_lowercase();
            if !KNOWN_PROVIDERS.contains(&provider.as_str()) {
                bail!(
                    "unknown provider '{}' (expected one of: {})",
                    provider,
                    KNOWN_PROVIDERS.join(", ")
                );
            }
            app.credentials.set(&provider, &key)?;
            if key.trim().is_empty() {
                println!("  {} removed key for {}", "✓".green(), provider);
            } else {
                println!("  {} saved key for {}", "✓".green(), provider);
            }
        }
    }
    Ok(())
}
