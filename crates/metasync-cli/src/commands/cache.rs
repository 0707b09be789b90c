//! The `cache` commands

use std::path::Path;

use colored::Colorize;
use serde_json::json;

use metasync_core::{PreviousExportCache, SyncProfile};
use metasync_fs::{RunLock, StateLayout, checksum};

use crate::cli::OutputFormat;
use crate::error::{CliError, Result};

fn cache_for(
    profile_path: &Path,
    state_dir: &Path,
) -> Result<(String, StateLayout, PreviousExportCache)> {
    let profile = SyncProfile::load(profile_path)?;
    let layout = StateLayout::new(state_dir);
    let cache = PreviousExportCache::for_pair(&layout, &profile.name)?;
    Ok((profile.name, layout, cache))
}

/// Print what the previous export holds.
pub fn run_cache_show(profile_path: &Path, state_dir: &Path, format: OutputFormat) -> Result<()> {
    let (pair, _, cache) = cache_for(profile_path, state_dir)?;

    let snapshot = cache.try_load().map_err(|e| CliError::user(e.to_string()))?;
    match (snapshot, format) {
        (None, OutputFormat::Json) => println!("{}", json!({"pair": pair, "cached": false})),
        (None, OutputFormat::Text) => {
            println!("{} no previous export for {}", "-".dimmed(), pair.cyan());
        }
        (Some(snapshot), OutputFormat::Json) => println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "pair": pair,
                "cached": true,
                "system": snapshot.system(),
                "fetched_at": snapshot.fetched_at(),
                "records": snapshot.len(),
                "digest": snapshot.digest(),
            }))?
        ),
        (Some(snapshot), OutputFormat::Text) => {
            let digest = snapshot.digest();
            println!("{} previous export for {}", "=>".blue().bold(), pair.cyan());
            println!("   system:     {}", snapshot.system());
            println!("   fetched at: {}", snapshot.fetched_at().to_rfc3339());
            println!("   records:    {}", snapshot.len());
            println!("   digest:     {}", checksum::short(&digest).dimmed());
            println!("   path:       {}", cache.path().display());
        }
    }
    Ok(())
}

/// Delete the previous export, unless a run currently holds the pair.
pub fn run_cache_clear(profile_path: &Path, state_dir: &Path) -> Result<()> {
    let (pair, layout, cache) = cache_for(profile_path, state_dir)?;

    let _lock = match RunLock::try_acquire(&layout.run_lock(&pair)?) {
        Ok(lock) => lock,
        Err(metasync_fs::Error::LockHeld { .. }) => {
            return Err(CliError::user(format!(
                "An import is in progress for pair {pair}; not clearing its cache"
            )));
        }
        Err(err) => return Err(err.into()),
    };

    if cache.clear()? {
        println!("{} Cleared previous export for {}", "OK".green().bold(), pair.cyan());
    } else {
        println!("{} No previous export for {}", "OK".green().bold(), pair.cyan());
    }
    Ok(())
}
