//! Terminal output formatting.

use anyhow::Result;
use colored::Colorize;
use medigenie_core::{AnalysisResult, Outcome};
use serde_json::Value;
use std::path::Path;

/// Print one outcome for humans.
pub fn print_outcome(path: &Path, outcome: &Outcome) {
    println!();
    let format = outcome
        .image
        .as_ref()
        .map(|img| format!(" ({})", img.mime_type()))
        .unwrap_or_default();
    println!("{}{}", path.display().to_string().cyan().bold(), format.dimmed());
    println!();

    match &outcome.result {
        AnalysisResult::Success { text } => {
            println!("{}", "📋 Analysis Result:".bold());
            println!();
            println!("{}", text);
        }
        AnalysisResult::ValidationError { message } => {
            println!("{} {}", "⚠".yellow().bold(), message.yellow());
        }
        AnalysisResult::RequestError { message } => {
            println!("{} {}", "✗".red().bold(), message.red());
        }
    }
    println!();
}

/// Print a file that could not be read.
pub fn print_read_error(path: &Path, err: &std::io::Error) {
    println!("{} {}: {}", "✗".red().bold(), path.display(), err);
}

/// Print one outcome as a JSON line.
pub fn print_outcome_json(path: &Path, outcome: &Outcome) -> Result<()> {
    println!("{}", serde_json::to_string(&outcome_json(path, outcome)?)?);
    Ok(())
}

/// Print an unreadable file as a JSON line.
pub fn print_read_error_json(path: &Path, err: &std::io::Error) -> Result<()> {
    println!("{}", serde_json::to_string(&read_error_json(path, err))?);
    Ok(())
}

fn outcome_json(path: &Path, outcome: &Outcome) -> Result<Value> {
    let mut value = serde_json::to_value(&outcome.result)?;
    if let Some(obj) = value.as_object_mut() {
        obj.insert("file".to_string(), path.display().to_string().into());
        if let Some(image) = &outcome.image {
            obj.insert("mime_type".to_string(), image.mime_type().into());
        }
    }
    Ok(value)
}

fn read_error_json(path: &Path, err: &std::io::Error) -> Value {
    serde_json::json!({
        "status": "validation-error",
        "file": path.display().to_string(),
        "message": format!("cannot read file: {err}"),
    })
}
