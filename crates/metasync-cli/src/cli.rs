//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::builder::BoolishValueParser;
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

/// metasync - Reconcile a terminology registry against an upstream system
#[derive(Parser, Debug)]
#[command(name = "metasync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase log volume (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// State directory for caches, captures, scripts and locks
    #[arg(long, env = "METASYNC_STATE_DIR", global = true)]
    pub state_dir: Option<PathBuf>,

    /// The command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one reconciliation pass for a pair
    ///
    /// Examples:
    ///   metasync run --profile pepfar.toml
    ///   metasync run --profile pepfar.toml --mode build-import-script
    ///   metasync run --profile pepfar.toml --registry-env staging --format json
    Run(RunArgs),

    /// Inspect or clear the previous-export cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Inspect built import scripts
    Script {
        #[command(subcommand)]
        action: ScriptAction,
    },
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Pair profile (TOML, JSON or YAML)
    #[arg(short, long)]
    pub profile: PathBuf,

    /// full-import or build-import-script
    #[arg(long, env = "SYNC_MODE", default_value = "full-import")]
    pub mode: String,

    /// Maximum number of registry submissions (0 = unlimited)
    #[arg(long, env = "IMPORT_LIMIT", default_value_t = 0)]
    pub import_limit: usize,

    /// Seconds to wait between registry submissions
    #[arg(long, env = "IMPORT_DELAY", default_value_t = 1.0, allow_negative_numbers = true)]
    pub import_delay: f64,

    /// Skip the import when upstream is unchanged since the previous export
    #[arg(long, env = "COMPARE_PREVIOUS_EXPORT", action = ArgAction::SetTrue, value_parser = BoolishValueParser::new())]
    pub compare_previous_export: bool,

    /// Replay the latest upstream capture instead of fetching
    #[arg(long, env = "RUN_DHIS2_OFFLINE", action = ArgAction::SetTrue, value_parser = BoolishValueParser::new())]
    pub upstream_offline: bool,

    /// Replay the latest registry capture instead of fetching
    #[arg(long, env = "RUN_OCL_OFFLINE", action = ArgAction::SetTrue, value_parser = BoolishValueParser::new())]
    pub registry_offline: bool,

    /// Override the upstream base URL
    #[arg(long, env = "UPSTREAM_URL")]
    pub upstream_url: Option<String>,

    /// Legacy name for the upstream base URL
    #[arg(long, env = "DHIS2_ENV", hide = true)]
    pub dhis2_env: Option<String>,

    #[arg(long, env = "DHIS2_USER")]
    pub upstream_user: Option<String>,

    #[arg(long, env = "DHIS2_PASS", hide_env_values = true)]
    pub upstream_password: Option<String>,

    /// Override the registry base URL
    #[arg(long, env = "REGISTRY_URL", conflicts_with = "registry_env")]
    pub registry_url: Option<String>,

    /// Named registry environment
    #[arg(long, env = "OCL_ENV", value_enum)]
    pub registry_env: Option<RegistryEnv>,

    /// Registry API token
    #[arg(long, env = "OCL_API_TOKEN", hide_env_values = true)]
    pub registry_token: Option<String>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Args, Debug, Clone)]
pub struct ProfileArg {
    /// Pair profile (TOML, JSON or YAML)
    #[arg(short, long)]
    pub profile: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// Show what the previous export holds
    Show {
        #[command(flatten)]
        profile: ProfileArg,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Delete the previous export so the next run diffs from scratch
    Clear {
        #[command(flatten)]
        profile: ProfileArg,
    },
}

#[derive(Subcommand, Debug)]
pub enum ScriptAction {
    /// Print the entries of a built import script
    Show {
        /// Path to an import-*.jsonl file
        file: PathBuf,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Named registry deployments.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryEnv {
    Qa,
    Staging,
    Production,
    Demo,
}

impl RegistryEnv {
    pub fn url(self) -> &'static str {
        match self {
            RegistryEnv::Qa => "https://api.qa.openconceptlab.org",
            RegistryEnv::Staging => "https://api.staging.openconceptlab.org",
            RegistryEnv::Production => "https://api.openconceptlab.org",
            RegistryEnv::Demo => "https://api.demo.openconceptlab.org",
        }
    }
}
