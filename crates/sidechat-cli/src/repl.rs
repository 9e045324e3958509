//! Interactive REPL.
//!
//! Uses `rustyline` for readline-style editing with persistent history.
//! Lines starting with `/` are session commands; everything else is a prompt.

use anyhow::Result;
use colored::Colorize;
use rustyline::config::Configurer;
use rustyline::history::DefaultHistory;
use rustyline::{DefaultEditor, Editor};
use tracing::debug;

use sidechat_core::presets::PRESETS;
use sidechat_providers::registry;
use sidechat_providers::ChatSession;

use crate::app::App;
use crate::helpers;

/// Exit commands (case-insensitive match).
const EXIT_COMMANDS: &[&str] = &["exit", "quit", "/exit", "/quit", ":q"];

/// A parsed REPL line.
#[derive(Debug, PartialEq)]
enum ReplCommand {
    Exit,
    Help,
    Provider(String),
    /// `None` resets to the provider's default model.
    Model(Option<String>),
    /// `None` clears the active project.
    Project(Option<String>),
    Presets,
    /// 1-based preset index plus the text to apply it to.
    Preset(usize, String),
    Prompt(String),
    Unknown(String),
}

/// Run the interactive REPL loop.
pub async fn run(app: &App, provider: String, model: Option<String>, project: Option<String>) -> Result<()> {
    let mut session = app.session();
    let mut provider = provider;
    let mut model = model;

    if let Some(id) = project.as_deref() {
        session.select_project(Some(id)).await?;
    }

    helpers::print_banner(&provider, model.as_deref(), session.active_project());
    let mut editor = create_editor()?;

    loop {
        let input = match editor.readline("You: ") {
            Ok(line) => line,
            Err(rustyline::error::ReadlineError::Interrupted) => break,
            Err(rustyline::error::ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("Input error: {e}");
                break;
            }
        };

        let trimmed = input.trim();
        if trimmed.is_empty() {
            continue;
        }
        let _ = editor.add_history_entry(&input);

        match parse_input(trimmed) {
            ReplCommand::Exit => {
                println!("\nGoodbye! 👋");
                break;
            }
            ReplCommand::Help => print_help(),
            ReplCommand::Provider(name) => match registry::describe(&name) {
                Ok(spec) if spec.is_chat() => {
                    provider = spec.name.to_string();
                    model = None;
                    println!("  {} provider: {}", "✓".green(), spec.display_name);
                    if !app.dispatcher.is_provider_available(spec.name) {
                        println!("  {}", format!("no API key set for {}", spec.name).yellow());
                    }
                }
                Ok(spec) => helpers::print_error(&format!("'{}' is not a chat provider", spec.name)),
                Err(e) => helpers::print_error(&e),
            },
            ReplCommand::Model(next) => {
                println!(
                    "  {} model: {}",
                    "✓".green(),
                    next.as_deref().unwrap_or("default")
                );
                model = next;
            }
            ReplCommand::Project(next) => match session.select_project(next.as_deref()).await {
                Ok(()) => println!(
                    "  {} project: {}",
                    "✓".green(),
                    session.active_project().unwrap_or("none")
                ),
                Err(e) => helpers::print_error(&e),
            },
            ReplCommand::Presets => print_presets(),
            ReplCommand::Preset(index, text) => match PRESETS.get(index.wrapping_sub(1)) {
                Some(preset) => match sidechat_core::presets::compose_prompt(preset.instruction, &text) {
                    Ok(prompt) => send(&session, &provider, model.as_deref(), &prompt).await,
                    Err(e) => helpers::print_error(&e),
                },
                None => helpers::print_error(&format!("no preset #{} (see /presets)", index)),
            },
            ReplCommand::Prompt(prompt) => send(&session, &provider, model.as_deref(), &prompt).await,
            ReplCommand::Unknown(cmd) => {
                helpers::print_error(&format!("unknown command '{}' (try /help)", cmd))
            }
        }
    }

    save_history(&mut editor);
    Ok(())
}

async fn send(session: &ChatSession, provider: &str, model: Option<&str>, prompt: &str) {
    debug!(provider = provider, "sending prompt");
    helpers::print_thinking();
    let result = session.ask(provider, prompt, model).await;
    helpers::clear_thinking();

    match result {
        Ok(completion) => helpers::print_response(&completion),
        Err(e) => helpers::print_error(&e),
    }
}

fn parse_input(input: &str) -> ReplCommand {
    if is_exit_command(input) {
        return ReplCommand::Exit;
    }
    let Some(rest) = input.strip_prefix('/') else {
        return ReplCommand::Prompt(input.to_string());
    };

    let (cmd, arg) = match rest.split_once(char::is_whitespace) {
        Some((cmd, arg)) => (cmd, arg.trim()),
        None => (rest, ""),
    };
    let optional = |arg: &str| match arg {
        "" | "none" | "default" => None,
        other => Some(other.to_string()),
    };

    match cmd.to_lowercase().as_str() {
        "help" | "?" => ReplCommand::Help,
        "provider" if !arg.is_empty() => ReplCommand::Provider(arg.to_lowercase()),
        "model" => ReplCommand::Model(optional(arg)),
        "project" => ReplCommand::Project(optional(arg)),
        "presets" => ReplCommand::Presets,
        "preset" => {
            let (index, text) = arg.split_once(char::is_whitespace).unwrap_or((arg, ""));
            match index.parse::<usize>() {
                Ok(n) => ReplCommand::Preset(n, text.trim().to_string()),
                Err(_) => ReplCommand::Unknown(input.to_string()),
            }
        }
        _ => ReplCommand::Unknown(input.to_string()),
    }
}

fn print_help() {
    println!();
    println!("  {:<22} {}", "/provider NAME".bold(), "switch provider");
    println!("  {:<22} {}", "/model ID|default".bold(), "switch model");
    println!("  {:<22} {}", "/project ID|none".bold(), "select or clear the project");
    println!("  {:<22} {}", "/presets".bold(), "list prompt presets");
    println!("  {:<22} {}", "/preset N TEXT".bold(), "apply preset N to TEXT");
    println!("  {:<22} {}", "exit".bold(), "leave the REPL");
    println!();
}

fn print_presets() {
    println!();
    for (i, preset) in PRESETS.iter().enumerate() {
        println!("  {:>2}. {:<24} {}", i + 1, preset.label, preset.instruction.dimmed());
    }
    println!();
}

/// Create a rustyline editor with history.
fn create_editor() -> Result<Editor<(), DefaultHistory>> {
    let mut editor = DefaultEditor::new()?;
    editor.set_max_history_size(1000)?;

    let history_path = history_path();
    if history_path.exists() {
        let _ = editor.load_history(&history_path);
        debug!("loaded REPL history from {}", history_path.display());
    }

    Ok(editor)
}

fn save_history(editor: &mut Editor<(), DefaultHistory>) {
    let path = history_path();
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    if let Err(e) = editor.save_history(&path) {
        debug!("failed to save history: {e}");
    }
}

fn history_path() -> std::path::PathBuf {
    sidechat_core::utils::get_data_path().join("history").join("cli_history")
}

fn is_exit_command(input: &str) -> bool {
    let lower = input.to_lowercase();
    EXIT_COMMANDS.contains(&lower.as_str())
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_commands() {
        assert!(is_exit_command("exit"));
        assert!(is_exit_command("EXIT"));
        assert!(is_exit_command("/quit"));
        assert!(is_exit_command(":q"));
        assert!(!is_exit_command("hello"));
        assert_eq!(parse_input("quit"), ReplCommand::Exit);
    }

    #[test]
    fn plain_text_is_prompt() {
        assert_eq!(
            parse_input("What is Rust?"),
            ReplCommand::Prompt("What is Rust?".into())
        );
    }

    #[test]
    fn provider_and_model_commands() {
        assert_eq!(parse_input("/provider Anthropic"), ReplCommand::Provider("anthropic".into()));
        assert_eq!(parse_input("/model gpt-4"), ReplCommand::Model(Some("gpt-4".into())));
        assert_eq!(parse_input("/model default"), ReplCommand::Model(None));
        assert!(matches!(parse_input("/provider"), ReplCommand::Unknown(_)));
    }

    #[test]
    fn project_commands() {
        assert_eq!(
            parse_input("/project proj-123"),
            ReplCommand::Project(Some("proj-123".into()))
        );
        assert_eq!(parse_input("/project none"), ReplCommand::Project(None));
        assert_eq!(parse_input("/project"), ReplCommand::Project(None));
    }

    #[test]
    fn preset_commands() {
        assert_eq!(parse_input("/presets"), ReplCommand::Presets);
        assert_eq!(
            parse_input("/preset 3 their going home"),
            ReplCommand::Preset(3, "their going home".into())
        );
        assert_eq!(parse_input("/preset 2"), ReplCommand::Preset(2, String::new()));
        assert!(matches!(parse_input("/preset x"), ReplCommand::Unknown(_)));
    }

    #[test]
    fn unknown_command() {
        assert_eq!(parse_input("/frobnicate"), ReplCommand::Unknown("/frobnicate".into()));
    }

    #[test]
    fn history_path_under_data_dir() {
        let path = history_path();
        assert!(path.to_string_lossy().contains(".sidechat"));
        assert!(path.to_string_lossy().contains("cli_history"));
    }
}
