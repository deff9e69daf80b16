//! Credential check command.

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;

pub async fn execute(config: Option<&Path>) -> Result<()> {
    let (settings, client) = super::load_client(config)?;

    println!("{} Checking model {} at {}", "→".dimmed(), settings.model, settings.base_url);
    client
        .verify()
        .await
        .with_context(|| format!("Model '{}' is not reachable with this key", settings.model))?;

    println!("{} API key accepted, model available", "✓".green().bold());
    Ok(())
}
