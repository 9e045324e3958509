//! Sidechat CLI — entry point.
//!
//! # Commands
//!
//! - `sidechat ask [-p PROVIDER] [-m MODEL] [--project ID] [--action NAME] TEXT...`
//! - `sidechat chat [-p PROVIDER] [-m MODEL] [--project ID]` — interactive REPL
//! - `sidechat history list|clear|export|import|search`
//! - `sidechat project create|list|rename|delete|clear|export|import|context`
//! - `sidechat voices [--refresh]`, `sidechat speak --voice ID TEXT...`
//! - `sidechat keys list|set`, `sidechat onboard`
//! - `sidechat providers`, `sidechat presets`, `sidechat status`

mod app;
mod helpers;
mod history_cmd;
mod keys_cmd;
mod onboard;
mod project_cmd;
mod repl;
mod status;
mod voice_cmd;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use sidechat_core::presets::QuickAction;

use crate::app::App;

// ─────────────────────────────────────────────
// CLI definition
// ─────────────────────────────────────────────

/// Sidechat — multi-provider LLM chat with history and projects
#[derive(Parser)]
#[command(name = "sidechat", version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(long, global = true, default_value_t = false)]
    logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one prompt and print the response
    Ask {
        /// Provider id (defaults to dispatch.defaultProvider)
        #[arg(short, long)]
        provider: Option<String>,

        /// Model id (defaults to the provider's first model)
        #[arg(short, long)]
        model: Option<String>,

        /// Project whose recent history is used as context
        #[arg(long)]
        project: Option<String>,

        /// Quick action applied to TEXT: summarize, generate, translate
        #[arg(long)]
        action: Option<String>,

        /// Prompt text (or the selection, with --action)
        #[arg(required = true, trailing_var_arg = true)]
        text: Vec<String>,
    },

    /// Interactive chat (REPL)
    Chat {
        #[arg(short, long)]
        provider: Option<String>,

        #[arg(short, long)]
        model: Option<String>,

        #[arg(long)]
        project: Option<String>,
    },

    /// Global chat history
    History {
        #[command(subcommand)]
        action: history_cmd::HistoryCommands,
    },

    /// Projects and their histories
    Project {
        #[command(subcommand)]
        action: project_cmd::ProjectCommands,
    },

    /// List text-to-speech voices
    Voices {
        /// Ignore the local cache and refetch
        #[arg(long, default_value_t = false)]
        refresh: bool,
    },

    /// Synthesize speech to an audio file
    Speak {
        /// Voice id (see `sidechat voices`)
        #[arg(long)]
        voice: String,

        /// Output file
        #[arg(short, long, default_value = "speech.mp3")]
        out: PathBuf,

        #[arg(required = true, trailing_var_arg = true)]
        text: Vec<String>,
    },

    /// Manage API keys
    Keys {
        #[command(subcommand)]
        action: keys_cmd::KeysCommands,
    },

    /// List providers, their models, and key status
    Providers,

    /// List prompt presets and quick actions
    Presets,

    /// Initialize configuration and storage
    Onboard,

    /// Show configuration and storage status
    Status,
}

// ─────────────────────────────────────────────
// Entrypoint
// ─────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.logs);

    match cli.command {
        Commands::Ask {
            provider,
            model,
            project,
            action,
            text,
        } => run_ask(provider, model, project, action, text).await,
        Commands::Chat {
            provider,
            model,
            project,
        } => {
            let app = App::load()?;
            let provider = provider.unwrap_or_else(|| app.config.dispatch.default_provider.clone());
            repl::run(&app, provider, model, project).await
        }
        Commands::History { action } => history_cmd::dispatch(&App::load()?, action).await,
        Commands::Project { action } => project_cmd::dispatch(&App::load()?, action).await,
        Commands::Voices { refresh } => voice_cmd::list(&App::load()?, refresh).await,
        Commands::Speak { voice, out, text } => {
            voice_cmd::speak(&App::load()?, &voice, &out, &text.join(" ")).await
        }
        Commands::Keys { action } => keys_cmd::dispatch(&App::load()?, action),
        Commands::Providers => status::providers(&App::load()?),
        Commands::Presets => status::presets(),
        Commands::Onboard => onboard::run(),
        Commands::Status => status::run(&App::load()?).await,
    }
}

// ─────────────────────────────────────────────
// Ask command
// ─────────────────────────────────────────────

async fn run_ask(
    provider: Option<String>,
    model: Option<String>,
    project: Option<String>,
    action: Option<String>,
    text: Vec<String>,
) -> Result<()> {
    let app = App::load()?;
    let provider = provider.unwrap_or_else(|| app.config.dispatch.default_provider.clone());
    let text = text.join(" ");

    let mut session = app.session();
    if let Some(id) = project.as_deref() {
        session
            .select_project(Some(id))
            .await
            .with_context(|| format!("cannot use project '{}'", id))?;
    }

    info!(provider = %provider, project = ?project, "asking");
    helpers::print_thinking();
    let result = match action.as_deref() {
        Some(name) => {
            let action = QuickAction::from_name(name)
                .with_context(|| format!("unknown action '{}' (try summarize, generate, translate)", name))?;
            session.quick_action(&provider, action, &text, model.as_deref()).await
        }
        None => session.ask(&provider, &text, model.as_deref()).await,
    };
    helpers::clear_thinking();

    let completion = result?;
    helpers::print_response(&completion);
    Ok(())
}

/// Initialize tracing/logging.
fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("sidechat=debug,sidechat_core=debug,sidechat_providers=debug,info")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .with_writer(std::io::stderr)
        .init();
}
