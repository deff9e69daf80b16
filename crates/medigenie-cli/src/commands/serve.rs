//! Web server command.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::{Path, PathBuf};

#[derive(Args)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(long, default_value = "8501")]
    pub port: u16,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Verify the API key against the service before serving
    #[arg(long)]
    pub verify_key: bool,

    /// Also write logs to a file
    #[arg(long)]
    pub log: bool,

    /// Log file path, used with --log (default: logs/medigenie.log)
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

pub async fn execute(args: ServeArgs, config: Option<&Path>) -> Result<()> {
    let (settings, client) = super::load_client(config)?;

    if args.verify_key {
        client
            .verify()
            .await
            .context("API key verification failed; refusing to start")?;
        println!("{} API key verified for {}", "✓".green().bold(), settings.model);
    }

    println!();
    println!("  {} {}", "MediGenie".cyan().bold(), "Web Server".bold());
    println!();
    println!("  {}  http://{}:{}", "Interface".green(), args.host, args.port);
    println!("  {}        http://{}:{}/api", "API".green(), args.host, args.port);
    println!("  {}      {}", "Model".green(), settings.model);
    println!();
    println!("  {}", "Ctrl+C to stop".dimmed());
    println!();

    medigenie_web::run_server(&settings, client, &args.host, args.port).await?;

    Ok(())
}
