//! `sidechat voices` and `sidechat speak` — ElevenLabs text-to-speech.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

use crate::app::App;

pub async fn list(app: &App, refresh: bool) -> Result<()> {
    let speech = app.speech()?;
    let cache = app.voice_cache();
    let voices = speech.voices(&cache, refresh).await?;

    if voices.is_empty() {
        println!("{}", "No voices available.".dimmed());
        return Ok(());
    }
    for voice in &voices {
        println!("  {:<24} {}", voice.voice_id.dimmed(), voice.name);
    }
    Ok(())
}

pub async fn speak(app: &App, voice_id: &str, out: &Path, text: &str) -> Result<()> {
    let speech = app.speech()?;
    let audio = speech
        .synthesize(text, voice_id, app.config.voice.settings())
        .await?;

    std::fs::write(out, &audio).with_context(|| format!("failed to write {}", out.display()))?;
    println!(
        "  {} wrote {} ({} bytes)",
        "✓".green(),
        out.display(),
        audio.len()
    );
    Ok(())
}
