//! Summary rendering

use colored::Colorize;

use metasync_core::{ImportOutcome, RunStatus, RunSummary};

use crate::cli::OutputFormat;
use crate::error::Result;

pub fn summary(summary: &RunSummary, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(summary)?),
        OutputFormat::Text => print_text(summary),
    }
    Ok(())
}

fn print_text(summary: &RunSummary) {
    let status = match summary.status {
        RunStatus::Completed => summary.status.as_str().green().bold(),
        RunStatus::CompletedWithErrors => summary.status.as_str().yellow().bold(),
        RunStatus::Aborted => summary.status.as_str().red().bold(),
    };
    println!("{} {}", "=>".blue().bold(), status);

    if let Some(run) = &summary.run {
        println!("   pair {} ({}), run {}", run.pair.cyan(), run.mode, run.run_id.dimmed());
    }

    let actions = summary.batch.counts();
    println!(
        "   batch: {} create, {} update, {} unchanged",
        actions.create, actions.update, actions.noop
    );
    println!(
        "   {} succeeded, {} failed, {} skipped",
        summary.counts.succeeded.to_string().green(),
        summary.counts.failed.to_string().red(),
        summary.counts.skipped.to_string().yellow()
    );

    if summary.short_circuited {
        println!("   {} upstream unchanged since the previous export", "-".dimmed());
    }
    if let Some(path) = &summary.script_path {
        println!("   import script: {}", path.display().to_string().cyan());
    }

    for result in summary
        .results
        .iter()
        .filter(|r| r.outcome == ImportOutcome::Failed)
    {
        println!(
            "   {} {} {} {}: {}",
            "!".red(),
            result.action,
            result.resource_type,
            result.external_id.cyan(),
            result.detail.as_deref().unwrap_or("failed")
        );
    }

    if let Some(reason) = &summary.abort_reason {
        println!("   {} {}", "aborted:".red(), reason);
    }
    for warning in &summary.warnings {
        println!("   {} {}", "warning:".yellow(), warning);
    }

    let trail: Vec<_> = summary.states.iter().map(|s| s.as_str()).collect();
    if !trail.is_empty() {
        println!("   {}", trail.join(" -> ").dimmed());
    }
}
