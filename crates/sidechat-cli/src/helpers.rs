//! Shared CLI helpers — response printing, banners, file output.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Local, Utc};
use colored::Colorize;

use sidechat_core::utils::truncate_string;
use sidechat_core::ChatEntry;
use sidechat_providers::registry::model_display_name;
use sidechat_providers::Completion;

/// Print a model response to stdout.
pub fn print_response(completion: &Completion) {
    println!();
    println!(
        "{} {}",
        "💬 Sidechat".cyan().bold(),
        format!("({} · {})", completion.provider, model_display_name(&completion.model)).dimmed()
    );
    if completion.text.is_empty() {
        println!("{}", "(no response)".dimmed());
    } else {
        println!("{}", completion.text);
    }
    println!();
}

/// Print the banner shown at REPL start.
pub fn print_banner(provider: &str, model: Option<&str>, project: Option<&str>) {
    let version = env!("CARGO_PKG_VERSION");
    println!();
    println!("{}  v{}", "💬 Sidechat".cyan().bold(), version.dimmed());
    println!(
        "{}",
        format!(
            "provider: {} · model: {} · project: {}",
            provider,
            model.unwrap_or("default"),
            project.unwrap_or("none")
        )
        .dimmed()
    );
    println!(
        "{}",
        "Type a message, /help for commands, or \"exit\" to quit.".dimmed()
    );
    println!();
}

pub fn print_error(err: &dyn std::fmt::Display) {
    eprintln!("\n{} {}\n", "❌ Error:".red().bold(), err);
}

pub fn print_thinking() {
    eprint!("{}", "⠿ thinking...".dimmed());
}

pub fn clear_thinking() {
    eprint!("\r{}\r", " ".repeat(40));
}

/// One-line summary of a history entry for listings.
pub fn format_entry(index: usize, entry: &ChatEntry) -> String {
    format!(
        "{:>3}. {} {} {}\n     {} {}",
        index,
        format_timestamp(&entry.timestamp).dimmed(),
        format!("[{}/{}]", entry.provider, entry.model).dimmed(),
        truncate_string(&single_line(&entry.prompt), 70).bold(),
        "→".dimmed(),
        truncate_string(&single_line(&entry.response), 70),
    )
}

pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

fn single_line(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Write `content` to `out`, or print it when no path is given.
pub fn write_or_print(out: Option<&Path>, content: &str) -> Result<()> {
    match out {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("  {} wrote {}", "✓".green(), path.display());
        }
        None => println!("{content}"),
    }
    Ok(())
}

pub fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn single_line_collapses_whitespace() {
        assert_eq!(single_line("a\n  b\tc "), "a b c");
    }

    #[test]
    fn format_entry_truncates() {
        let entry = ChatEntry::new("x".repeat(200), "short", "openai", "gpt-4");
        let line = format_entry(1, &entry);
        assert!(line.contains("..."));
        assert!(line.contains("short"));
    }

    #[test]
    fn write_or_print_to_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.json");
        write_or_print(Some(&path), "[]").unwrap();
        assert_eq!(read_file(&path).unwrap(), "[]");
    }

    #[test]
    fn read_file_missing() {
        assert!(read_file(Path::new("/nonexistent/file.json")).is_err());
    }
}
