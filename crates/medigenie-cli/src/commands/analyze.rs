//! Terminal analysis command.
//!
//! All files given in one invocation share a single chat session, the same
//! way consecutive submissions from one browser do.

use anyhow::{bail, Result};
use clap::Args;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use medigenie_core::{SubmissionHandler, Upload};

use crate::output;

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Image files to analyze (PNG, JPG, JPEG)
    #[arg(required = true)]
    pub images: Vec<PathBuf>,

    /// Print outcomes as JSON lines
    #[arg(long)]
    pub json: bool,
}

pub async fn execute(args: AnalyzeArgs, config: Option<&Path>) -> Result<()> {
    let (_settings, client) = super::load_client(config)?;
    let mut handler = SubmissionHandler::new(Arc::new(client));

    let mut failures = 0usize;
    for path in &args.images {
        let upload = match std::fs::read(path) {
            Ok(bytes) => Upload::new(bytes, path.file_name().map(|n| n.to_string_lossy().into_owned())),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Cannot read file");
                if args.json {
                    output::print_read_error_json(path, &e)?;
                } else {
                    output::print_read_error(path, &e);
                }
                failures += 1;
                continue;
            }
        };

        let spinner = (!args.json).then(|| {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::with_template("{spinner:.cyan} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            pb.set_message("Analyzing the image, please wait...");
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        });

        let outcome = handler.handle_submission(true, Some(upload)).await;

        if let Some(pb) = spinner {
            pb.finish_and_clear();
        }

        let Some(outcome) = outcome else { continue };
        if !outcome.result.is_success() {
            failures += 1;
        }

        if args.json {
            output::print_outcome_json(path, &outcome)?;
        } else {
            output::print_outcome(path, &outcome);
        }
    }

    if failures > 0 {
        bail!("{} of {} image(s) could not be analyzed", failures, args.images.len());
    }

    if !args.json {
        println!("{}", "Analysis complete.".green().bold());
    }
    Ok(())
}
