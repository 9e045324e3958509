//! `sidechat status`, `sidechat providers`, `sidechat presets`.

use anyhow::Result;
use colored::Colorize;

use sidechat_core::config::get_config_path;
use sidechat_core::presets::{QuickAction, PRESETS};
use sidechat_providers::registry::{model_display_name, PROVIDERS};

use crate::app::App;

/// Show paths, dispatch settings, and storage counts.
pub async fn run(app: &App) -> Result<()> {
    let config = &app.config;
    let config_path = get_config_path();

    println!();
    println!("{}", "💬 Sidechat Status".cyan().bold());
    println!();

    println!(
        "  {:<18} {} {}",
        "Config:".bold(),
        config_path.display(),
        found_marker(config_path.exists())
    );

    let keys_path = config.credentials_path();
    println!(
        "  {:<18} {} {}",
        "API keys:".bold(),
        keys_path.display(),
        found_marker(keys_path.exists())
    );
    println!("  {:<18} {}", "Storage:".bold(), app.store.dir().display());

    println!(
        "  {:<18} {}",
        "Default provider:".bold(),
        config.dispatch.default_provider
    );
    println!(
        "  {:<18} {}",
        "Parameters:".bold(),
        format!(
            "temp: {} | timeout: {}s",
            config.dispatch.temperature, config.dispatch.timeout_secs
        )
        .dimmed(),
    );

    // Storage counts are informational; a broken store shouldn't hide the rest
    println!();
    match app.history.global_history().await {
        Ok(entries) => println!(
            "  {:<18} {} / {}",
            "History:".bold(),
            entries.len(),
            app.history.global_cap()
        ),
        Err(e) => println!("  {:<18} {}", "History:".bold(), e.to_string().red()),
    }
    match app.history.list_projects().await {
        Ok(projects) => println!(
            "  {:<18} {} {}",
            "Projects:".bold(),
            projects.len(),
            format!("(context: last {} entries)", app.history.context_window()).dimmed()
        ),
        Err(e) => println!("  {:<18} {}", "Projects:".bold(), e.to_string().red()),
    }

    println!();
    print_key_status(app);
    println!();
    Ok(())
}

/// List every provider with its models and key status.
pub fn providers(app: &App) -> Result<()> {
    println!();
    for spec in PROVIDERS {
        println!(
            "  {} {} {}",
            spec.display_name.bold(),
            format!("({})", spec.name).dimmed(),
            key_marker(app.credentials.is_available(spec.name))
        );
        if spec.models.is_empty() {
            println!("      {}", "text-to-speech".dimmed());
        }
        for (i, model) in spec.models.iter().enumerate() {
            let default = if i == 0 { " (default)" } else { "" };
            println!(
                "      {:<28} {}{}",
                model.id,
                format!("{} · {}", model_display_name(model.id), model.description).dimmed(),
                default.dimmed()
            );
        }
    }
    println!();
    Ok(())
}

/// List prompt presets and quick actions.
pub fn presets() -> Result<()> {
    println!();
    println!("  {}", "Presets:".bold());
    for (i, preset) in PRESETS.iter().enumerate() {
        println!("    {:>2}. {:<24} {}", i + 1, preset.label, preset.instruction.dimmed());
    }
    println!();
    println!("  {}", "Quick actions (sidechat ask --action NAME):".bold());
    for action in QuickAction::ALL {
        println!("    {:<12} {}", action.name(), action.instruction().dimmed());
    }
    println!();
    Ok(())
}

fn print_key_status(app: &App) {
    println!("  {}", "Providers:".bold());
    for spec in PROVIDERS {
        println!(
            "    {:<20} {}",
            spec.display_name,
            key_marker(app.credentials.is_available(spec.name))
        );
    }
}

fn found_marker(exists: bool) -> String {
    if exists {
        "✓".green().to_string()
    } else {
        "(not found)".red().to_string()
    }
}

fn key_marker(available: bool) -> String {
    if available {
        format!("{} (key set)", "✓".green())
    } else {
        format!("{}", "· not configured".dimmed())
    }
}
