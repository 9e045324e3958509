//! `sidechat history` — global chat history.

use std::path::PathBuf;

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use sidechat_core::HistoryStore;

use crate::app::App;
use crate::helpers;

#[derive(Subcommand)]
pub enum HistoryCommands {
    /// Show recent entries, newest last
    List {
        /// Show at most this many entries
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },
    /// Delete all global history
    Clear,
    /// Export history as JSON
    Export {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Replace history with a previously exported JSON file
    Import { file: PathBuf },
    /// Case-insensitive search over prompts and responses
    Search { query: String },
}

pub async fn dispatch(app: &App, action: HistoryCommands) -> Result<()> {
    let history = &app.history;
    match action {
        HistoryCommands::List { limit } => list(history, limit).await,
        HistoryCommands::Clear => {
            history.clear_global().await?;
            println!("  {} history cleared", "✓".green());
            Ok(())
        }
        HistoryCommands::Export { out } => {
            let json = history.export_global().await?;
            helpers::write_or_print(out.as_deref(), &json)
        }
        HistoryCommands::Import { file } => {
            let json = helpers::read_file(&file)?;
            let count = history.import_global(&json).await?;
            println!("  {} imported {} entries", "✓".green(), count);
            Ok(())
        }
        HistoryCommands::Search { query } => {
            let hits = history.search_global(&query).await?;
            if hits.is_empty() {
                println!("{}", format!("No entries match '{}'.", query).dimmed());
            }
            for (i, entry) in hits.iter().enumerate() {
                println!("{}", helpers::format_entry(i + 1, entry));
            }
            Ok(())
        }
    }
}

async fn list(history: &HistoryStore, limit: usize) -> Result<()> {
    let entries = history.global_history().await?;
    if entries.is_empty() {
        println!("{}", "No history yet.".dimmed());
        return Ok(());
    }

    let start = entries.len().saturating_sub(limit);
    for (i, entry) in entries.iter().enumerate().skip(start) {
        println!("{}", helpers::format_entry(i + 1, entry));
    }
    println!(
        "{}",
        format!("{} of {} entries", entries.len() - start, entries.len()).dimmed()
    );
    Ok(())
}
