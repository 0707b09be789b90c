//! Snapshot retrieval capability

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::FetchError;
use crate::model::Snapshot;
use crate::normalize::WireFormat;

fn default_timeout_secs() -> u64 {
    60
}

/// Connection parameters for one external system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    /// System name, also the capture directory name
    pub system: String,
    pub base_url: String,
    /// Export endpoint relative to `base_url`
    pub export_path: String,
    pub format: WireFormat,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Supplied at run time, never read from a profile
    #[serde(skip)]
    pub credential: Credential,
}

impl SourceDescriptor {
    pub fn new(
        system: impl Into<String>,
        base_url: impl Into<String>,
        export_path: impl Into<String>,
        format: WireFormat,
    ) -> Self {
        Self {
            system: system.into(),
            base_url: base_url.into(),
            export_path: export_path.into(),
            format,
            timeout_secs: default_timeout_secs(),
            credential: Credential::None,
        }
    }

    pub fn with_credential(mut self, credential: Credential) -> Self {
        self.credential = credential;
        self
    }

    /// Full URL of the export endpoint.
    pub fn export_url(&self) -> String {
        join_url(&self.base_url, &self.export_path)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Join a base URL and a relative path with exactly one `/` between them.
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Authentication for one external system.
#[derive(Clone, Default, PartialEq, Eq)]
pub enum Credential {
    #[default]
    None,
    /// API token, sent as `Authorization: Token <token>`
    Token(String),
    Basic { username: String, password: String },
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Token(_) => f.write_str("Token(<redacted>)"),
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
        }
    }
}

/// Retrieves a full export from one external system.
///
/// `offline` replays the most recent local capture instead of going to the
/// network. Implementations never retry; any failure is fatal for the run.
#[async_trait]
pub trait SnapshotFetcher: Send + Sync {
    async fn fetch(&self, source: &SourceDescriptor, offline: bool) -> Result<Snapshot, FetchError>;
}

/// Normalize raw export bytes into a snapshot for `source`.
///
/// Shared by the live and offline paths.
pub fn snapshot_from_raw(
    source: &SourceDescriptor,
    fetched_at: DateTime<Utc>,
    raw: &[u8],
) -> Result<Snapshot, FetchError> {
    let records = source
        .format
        .normalize(raw)
        .map_err(|e| FetchError::malformed(&source.system, e.to_string()))?;
    Snapshot::new(&source.system, fetched_at, records)
        .map_err(|e| FetchError::malformed(&source.system, e.to_string()))
}
