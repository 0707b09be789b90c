//! The `script` commands

use std::path::Path;

use colored::Colorize;

use metasync_core::{ActionKind, ImportScript};

use crate::cli::OutputFormat;
use crate::error::Result;

/// Print the entries of a built import script.
pub fn run_script_show(path: &Path, format: OutputFormat) -> Result<()> {
    let script = ImportScript::read_from(path)?;

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(script.entries())?);
        return Ok(());
    }

    println!(
        "{} {} ({} entries)",
        "=>".blue().bold(),
        path.display(),
        script.len()
    );
    for entry in script.entries() {
        let action = match entry.action {
            ActionKind::Create => entry.action.as_str().green(),
            ActionKind::Update => entry.action.as_str().yellow(),
            ActionKind::Noop => entry.action.as_str().dimmed(),
        };
        println!(
            "   {:<6} {:<12} {} ({} attributes)",
            action,
            entry.resource_type.as_str(),
            entry.external_id.cyan(),
            entry.payload.len()
        );
    }
    Ok(())
}
