//! `sidechat project` — create, inspect, and manage projects.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;

use sidechat_core::Project;

use crate::app::App;
use crate::helpers;

#[derive(Subcommand)]
pub enum ProjectCommands {
    /// Create an empty project
    Create { name: String },
    /// List projects
    List,
    /// Show a project's history
    Show { id: String },
    /// Rename a project
    Rename { id: String, name: String },
    /// Delete a project and its history
    Delete { id: String },
    /// Clear a project's history, keeping the project
    Clear { id: String },
    /// Export a project as JSON
    Export {
        id: String,
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Import an exported project under a new id
    Import { file: PathBuf },
    /// Print the context that would be prepended to the next prompt
    Context { id: String },
}

pub async fn dispatch(app: &App, action: ProjectCommands) -> Result<()> {
    let history = &app.history;
    match action {
        ProjectCommands::Create { name } => {
            let id = history.create_project(&name).await?;
            println!("  {} created project {} ({})", "✓".green(), name.trim().bold(), id);
        }
        ProjectCommands::List => {
            let projects = history.list_projects().await?;
            if projects.is_empty() {
                println!("{}", "No projects yet. Create one with `sidechat project create NAME`.".dimmed());
            }
            for project in &projects {
                println!("{}", format_project(project));
            }
        }
        ProjectCommands::Show { id } => {
            let project = history.get_project(&id).await?;
            println!("{}", format_project(&project));
            for (i, entry) in project.chat_history.iter().enumerate() {
                println!("{}", helpers::format_entry(i + 1, entry));
            }
        }
        ProjectCommands::Rename { id, name } => {
            history.rename_project(&id, &name).await?;
            println!("  {} renamed {}", "✓".green(), id);
        }
        ProjectCommands::Delete { id } => {
            history.delete_project(&id).await?;
            println!("  {} deleted {}", "✓".green(), id);
        }
        ProjectCommands::Clear { id } => {
            history.clear_project_history(&id).await?;
            println!("  {} cleared history of {}", "✓".green(), id);
        }
        ProjectCommands::Export { id, out } => {
            let project = history.export_project(&id).await?;
            let json = serde_json::to_string_pretty(&project)?;
            helpers::write_or_print(out.as_deref(), &json)?;
        }
        ProjectCommands::Import { file } => {
            let json = helpers::read_file(&file)?;
            let project: Project = serde_json::from_str(&json)
                .with_context(|| format!("{} is not an exported project", file.display()))?;
            let id = history.import_project(project).await?;
            println!("  {} imported as {}", "✓".green(), id);
        }
        ProjectCommands::Context { id } => {
            let context = history.context_for(&id).await?;
            if context.is_empty() {
                println!("{}", "(no history, prompts are sent as-is)".dimmed());
            } else {
                println!("{context}");
            }
        }
    }
    Ok(())
}

fn format_project(project: &Project) -> String {
    format!(
        "  {:<20} {:<28} {} {}",
        project.id.dimmed(),
        project.name.bold(),
        format!("{} entries", project.chat_history.len()),
        format!("updated {}", helpers::format_timestamp(&project.updated_at)).dimmed()
    )
}
