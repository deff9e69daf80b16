//! CLI command definitions and handlers.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use medigenie_core::{GeminiClient, Settings};

pub mod analyze;
pub mod check;
pub mod serve;

/// MediGenie - AI-Powered Medical Image Analysis
#[derive(Parser)]
#[command(name = "medigenie")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a medigenie.toml config file
    #[arg(short, long, global = true, env = "MEDIGENIE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the web interface
    Serve(serve::ServeArgs),

    /// Analyze image files from the terminal
    Analyze(analyze::AnalyzeArgs),

    /// Verify the API key and model
    Check,
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let config = self.config;

        match self.command {
            Commands::Serve(args) => serve::execute(args, config.as_deref()).await,
            Commands::Analyze(args) => analyze::execute(args, config.as_deref()).await,
            Commands::Check => check::execute(config.as_deref()).await,
        }
    }
}

/// Load settings and build the model client. Any failure here is fatal.
pub(crate) fn load_client(config: Option<&std::path::Path>) -> Result<(Settings, GeminiClient)> {
    let settings = Settings::load(config).context("Invalid configuration")?;
    let client = GeminiClient::new(&settings).context("Cannot initialize the Gemini client")?;
    Ok((settings, client))
}
