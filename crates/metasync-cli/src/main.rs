//! metasync CLI
//!
//! Reconciles a terminology registry against an upstream metadata system.

mod cli;
mod commands;
mod error;
mod logging;
mod render;

use std::path::PathBuf;

use clap::Parser;
use colored::Colorize;

use cli::{CacheAction, Cli, Commands, ScriptAction};
use error::Result;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match execute(cli).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            std::process::exit(1);
        }
    }
}

/// State directory: flag or `METASYNC_STATE_DIR`, else the platform data dir.
fn state_dir(cli: &Cli) -> PathBuf {
    cli.state_dir.clone().unwrap_or_else(|| {
        dirs::data_local_dir()
            .map(|d| d.join("metasync"))
            .unwrap_or_else(|| PathBuf::from(".metasync"))
    })
}

async fn execute(cli: Cli) -> Result<i32> {
    let state_dir = state_dir(&cli);
    tracing::debug!(state_dir = %state_dir.display(), "Resolved state directory");

    match cli.command {
        Commands::Run(args) => commands::run_sync(&args, &state_dir, cli.verbose).await,
        Commands::Cache { action } => {
            match action {
                CacheAction::Show { profile, format } => {
                    commands::run_cache_show(&profile.profile, &state_dir, format)?
                }
                CacheAction::Clear { profile } => {
                    commands::run_cache_clear(&profile.profile, &state_dir)?
                }
            }
            Ok(0)
        }
        Commands::Script { action } => {
            match action {
                ScriptAction::Show { file, format } => commands::run_script_show(&file, format)?,
            }
            Ok(0)
        }
    }
}
