//! The `run` command
//!
//! Folds the profile, flags and environment into one [`RunConfig`], wires the
//! HTTP collaborators and hands over to the orchestrator.

use std::path::Path;
use std::sync::Arc;

use colored::Colorize;

use metasync_core::{
    Credential, Error as CoreError, RunConfig, RunOptions, SyncMode, SyncOrchestrator, SyncProfile,
};
use metasync_fs::StateLayout;
use metasync_remote::client::http_client;
use metasync_remote::{CaptureStore, HttpRegistryImporter, HttpSnapshotFetcher};

use crate::cli::{OutputFormat, RunArgs};
use crate::error::{CliError, Result};
use crate::render;

/// Body printed in JSON mode when another run holds the pair lock.
pub const IN_PROGRESS_RESPONSE: &str =
    r#"{"status_code":409,"result":"There is an import already in progress for this pair"}"#;

/// Exit code when a run could not start because another one is active.
pub const IN_PROGRESS_EXIT_CODE: i32 = 1;

/// Build the immutable run configuration from a profile and CLI arguments.
pub fn build_config(args: &RunArgs, verbosity: u8) -> Result<RunConfig> {
    let mut profile = SyncProfile::load(&args.profile)?;

    if let Some(url) = args.upstream_url.as_ref().or(args.dhis2_env.as_ref()) {
        profile.upstream.base_url = url.clone();
    }
    if let Some(url) = &args.registry_url {
        profile.registry.base_url = url.clone();
    } else if let Some(env) = args.registry_env {
        profile.registry.base_url = env.url().to_string();
    }

    let upstream_credential = match (&args.upstream_user, &args.upstream_password) {
        (Some(username), Some(password)) => Credential::Basic {
            username: username.clone(),
            password: password.clone(),
        },
        (None, None) => Credential::None,
        _ => {
            return Err(CliError::user(
                "Upstream credentials need both --upstream-user and --upstream-password",
            ));
        }
    };
    let registry_credential = args
        .registry_token
        .clone()
        .map_or(Credential::None, Credential::Token);
    let profile = profile.with_credentials(upstream_credential, registry_credential);

    let options = RunOptions {
        mode: args.mode.parse::<SyncMode>()?,
        import_limit: args.import_limit,
        import_delay: RunOptions::delay_from_secs(args.import_delay)?,
        compare_to_previous: args.compare_previous_export,
        upstream_offline: args.upstream_offline,
        registry_offline: args.registry_offline,
        verbosity,
    };

    Ok(RunConfig::new(profile, options)?)
}

/// Run one pass and return the process exit code.
pub async fn run_sync(args: &RunArgs, state_dir: &Path, verbosity: u8) -> Result<i32> {
    let config = build_config(args, verbosity)?;
    let layout = StateLayout::new(state_dir);

    let client = http_client()?;
    let fetcher = Arc::new(HttpSnapshotFetcher::new(
        client.clone(),
        CaptureStore::new(layout.clone()),
    ));
    let importer = Arc::new(HttpRegistryImporter::new(
        client,
        config.registry(),
        config.target().clone(),
    ));

    if args.format == OutputFormat::Text {
        println!(
            "{} Reconciling {} ({})...",
            "=>".blue().bold(),
            config.pair().cyan(),
            config.mode()
        );
    }

    let orchestrator = SyncOrchestrator::new(config, layout, fetcher.clone(), fetcher, importer);
    match orchestrator.run().await {
        Ok(summary) => {
            render::summary(&summary, args.format)?;
            Ok(summary.exit_code())
        }
        Err(CoreError::RunInProgress { pair }) => {
            match args.format {
                OutputFormat::Json => println!("{IN_PROGRESS_RESPONSE}"),
                OutputFormat::Text => eprintln!(
                    "{} An import is already in progress for pair {}",
                    "BUSY".yellow().bold(),
                    pair.cyan()
                ),
            }
            Ok(IN_PROGRESS_EXIT_CODE)
        }
        Err(err) => Err(err.into()),
    }
}
