//! Error types for metasync-core
//!
//! Only [`Error`] ever leaves the orchestrator. The domain errors below are
//! either folded into a [`RunSummary`](crate::RunSummary) (fetch and transport
//! failures abort the run, record rejections fail one entry) or downgraded to a
//! warning (cache corruption).

use std::path::PathBuf;

use crate::sync::SyncState;

/// Result type for metasync-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned to the caller of the engine
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Another run holds the lock for this pair
    #[error("An import is already in progress for pair {pair}")]
    RunInProgress { pair: String },

    /// The run configuration is unusable
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// The orchestrator attempted an illegal state change
    #[error("Illegal sync state transition {from} -> {to}")]
    InvalidTransition { from: SyncState, to: SyncState },

    /// A built import script could not be parsed back
    #[error("Invalid import script at line {line}: {message}")]
    InvalidScript { line: usize, message: String },

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Fs(#[from] metasync_fs::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}

/// Retrieving a snapshot from one of the external systems failed.
///
/// Always fatal for the run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("{system} export request failed with status {status}: {body}")]
    Status {
        system: String,
        status: u16,
        body: String,
    },

    #[error("{system} export request failed: {message}")]
    Transport { system: String, message: String },

    #[error("{system} export is malformed: {message}")]
    Malformed { system: String, message: String },

    #[error("No offline capture for {system} under {path}")]
    CaptureMissing { system: String, path: PathBuf },

    #[error("Failed to read offline capture for {system}: {message}")]
    Capture { system: String, message: String },
}

impl FetchError {
    /// The external system the failure belongs to.
    pub fn system(&self) -> &str {
        match self {
            Self::Status { system, .. }
            | Self::Transport { system, .. }
            | Self::Malformed { system, .. }
            | Self::CaptureMissing { system, .. }
            | Self::Capture { system, .. } => system,
        }
    }

    pub fn malformed(system: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Malformed {
            system: system.into(),
            message: message.into(),
        }
    }
}

/// The registry rejected a single import entry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}{detail}", .status.map(|s| format!("status {s}: ")).unwrap_or_default())]
pub struct RecordImportError {
    /// HTTP status of the rejection, when there was one
    pub status: Option<u16>,
    /// Registry-provided reason
    pub detail: String,
}

impl RecordImportError {
    pub fn new(status: Option<u16>, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }
}

/// The registry became unreachable while a batch was being applied.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("registry unreachable: {detail}")]
pub struct TransportError {
    pub detail: String,
}

impl TransportError {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

/// Outcome of a failed registry submission.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    /// Recoverable at the batch level
    #[error(transparent)]
    Rejected(#[from] RecordImportError),

    /// Aborts the remainder of the batch
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// The previous-export cache exists but cannot be used.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Previous-export cache at {path} is unusable: {message}")]
pub struct CacheCorruptionError {
    pub path: PathBuf,
    pub message: String,
}
