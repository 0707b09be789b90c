//! Per-invocation options and the immutable run configuration

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::profile::{RegistryTarget, SyncProfile};
use crate::executor::ExecutorOptions;
use crate::fetch::SourceDescriptor;
use crate::{Error, Result};

/// What a run does with the computed batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncMode {
    /// Submit the batch to the registry
    #[default]
    FullImport,
    /// Write the import script and submit nothing
    BuildImportScript,
}

impl FromStr for SyncMode {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "full-import" | "full" => Ok(SyncMode::FullImport),
            "build-import-script" | "build" | "script" => Ok(SyncMode::BuildImportScript),
            _ => Err(Error::invalid_config(format!(
                "unknown sync mode {s:?} (expected full-import or build-import-script)"
            ))),
        }
    }
}

impl fmt::Display for SyncMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncMode::FullImport => write!(f, "full-import"),
            SyncMode::BuildImportScript => write!(f, "build-import-script"),
        }
    }
}

/// Knobs for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    pub mode: SyncMode,
    /// Maximum submissions; 0 means unlimited
    pub import_limit: usize,
    pub import_delay: Duration,
    pub compare_to_previous: bool,
    /// Replay the latest upstream capture instead of fetching
    pub upstream_offline: bool,
    /// Replay the latest registry capture instead of fetching
    pub registry_offline: bool,
    /// Log volume only
    pub verbosity: u8,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            mode: SyncMode::FullImport,
            import_limit: 0,
            import_delay: Duration::from_secs(1),
            compare_to_previous: false,
            upstream_offline: false,
            registry_offline: false,
            verbosity: 0,
        }
    }
}

impl RunOptions {
    /// Convert a delay given in (possibly fractional) seconds.
    pub fn delay_from_secs(secs: f64) -> Result<Duration> {
        if !secs.is_finite() || secs < 0.0 {
            return Err(Error::invalid_config(format!(
                "import delay must be a finite, non-negative number of seconds, got {secs}"
            )));
        }
        Duration::try_from_secs_f64(secs)
            .map_err(|e| Error::invalid_config(format!("import delay {secs}: {e}")))
    }
}

/// Immutable configuration of one run, built once before the run starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    profile: SyncProfile,
    options: RunOptions,
}

impl RunConfig {
    pub fn new(profile: SyncProfile, options: RunOptions) -> Result<Self> {
        profile.validate()?;
        Ok(Self { profile, options })
    }

    /// Pair identity.
    pub fn pair(&self) -> &str {
        &self.profile.name
    }

    pub fn profile(&self) -> &SyncProfile {
        &self.profile
    }

    pub fn upstream(&self) -> &SourceDescriptor {
        &self.profile.upstream
    }

    pub fn registry(&self) -> &SourceDescriptor {
        &self.profile.registry
    }

    pub fn target(&self) -> &RegistryTarget {
        &self.profile.target
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    pub fn mode(&self) -> SyncMode {
        self.options.mode
    }

    pub fn executor_options(&self) -> ExecutorOptions {
        ExecutorOptions {
            delay: self.options.import_delay,
            limit: self.options.import_limit,
        }
    }
}
