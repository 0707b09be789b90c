//! Previous-export cache
//!
//! One JSON document per pair holding the upstream snapshot of the last run
//! that reached DONE. Replaced atomically; a reader sees either the old
//! document or the new one.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use metasync_fs::{StateLayout, io};

use crate::Result;
use crate::error::CacheCorruptionError;
use crate::model::Snapshot;

const FORMAT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct CacheDocument {
    format_version: u32,
    saved_at: DateTime<Utc>,
    snapshot: Snapshot,
}

/// On-disk snapshot from the prior successful run of one pair.
#[derive(Debug, Clone)]
pub struct PreviousExportCache {
    path: PathBuf,
}

impl PreviousExportCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn for_pair(layout: &StateLayout, pair: &str) -> Result<Self> {
        Ok(Self::new(layout.previous_export(pair)?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Load the cached snapshot.
    ///
    /// An absent cache is `None`. A corrupt one is logged and also `None`.
    pub fn load(&self) -> Option<Snapshot> {
        match self.try_load() {
            Ok(snapshot) => snapshot,
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "Ignoring unusable previous export");
                None
            }
        }
    }

    /// Load the cached snapshot, reporting corruption to the caller.
    pub fn try_load(&self) -> std::result::Result<Option<Snapshot>, CacheCorruptionError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let corrupt = |message: String| CacheCorruptionError {
            path: self.path.clone(),
            message,
        };

        let bytes = io::read_bytes(&self.path).map_err(|e| corrupt(e.to_string()))?;
        let document: CacheDocument =
            serde_json::from_slice(&bytes).map_err(|e| corrupt(e.to_string()))?;
        if document.format_version != FORMAT_VERSION {
            return Err(corrupt(format!(
                "unsupported format version {}",
                document.format_version
            )));
        }

        tracing::debug!(
            path = %self.path.display(),
            records = document.snapshot.len(),
            saved_at = %document.saved_at,
            "Loaded previous export"
        );
        Ok(Some(document.snapshot))
    }

    /// Replace the cache with `snapshot`.
    pub fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let document = CacheDocument {
            format_version: FORMAT_VERSION,
            saved_at: Utc::now(),
            snapshot: snapshot.clone(),
        };
        let content = serde_json::to_vec_pretty(&document)?;
        io::write_atomic(&self.path, &content)?;

        tracing::debug!(
            path = %self.path.display(),
            records = snapshot.len(),
            "Saved previous export"
        );
        Ok(())
    }

    /// Remove the cache. Returns whether there was one.
    pub fn clear(&self) -> Result<bool> {
        Ok(io::remove_if_exists(&self.path)?)
    }
}
