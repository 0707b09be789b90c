//! State directory layout
//!
//! ```text
//! <state_dir>/
//!   captures/<system>/<source>/<ts>.raw   raw live exports, replayed offline
//!   pairs/<pair>/previous-export.json     previous-export cache
//!   pairs/<pair>/sync.lock                single-writer run lock
//!   pairs/<pair>/scripts/import-<ts>.jsonl built import scripts
//! ```

use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Well-known names inside the state directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateFile {
    /// Directory holding raw captures, one subdirectory per system and source
    CapturesDir,
    /// Directory holding one subdirectory per pair
    PairsDir,
    /// Previous-export cache inside a pair directory
    PreviousExport,
    /// Run lock inside a pair directory
    RunLock,
    /// Built import scripts inside a pair directory
    ScriptsDir,
}

impl StateFile {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CapturesDir => "captures",
            Self::PairsDir => "pairs",
            Self::PreviousExport => "previous-export.json",
            Self::RunLock => "sync.lock",
            Self::ScriptsDir => "scripts",
        }
    }
}

impl AsRef<Path> for StateFile {
    fn as_ref(&self) -> &Path {
        Path::new(self.as_str())
    }
}

impl std::fmt::Display for StateFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Resolves every persisted path from a single state root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateLayout {
    root: PathBuf,
}

impl StateLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory for one source/target pair.
    pub fn pair_dir(&self, pair: &str) -> Result<PathBuf> {
        validate_identifier(pair)?;
        Ok(self.root.join(StateFile::PairsDir).join(pair))
    }

    pub fn previous_export(&self, pair: &str) -> Result<PathBuf> {
        Ok(self.pair_dir(pair)?.join(StateFile::PreviousExport))
    }

    pub fn run_lock(&self, pair: &str) -> Result<PathBuf> {
        Ok(self.pair_dir(pair)?.join(StateFile::RunLock))
    }

    pub fn scripts_dir(&self, pair: &str) -> Result<PathBuf> {
        Ok(self.pair_dir(pair)?.join(StateFile::ScriptsDir))
    }

    /// Raw capture directory for one export of one external system.
    ///
    /// `source` tells apart exports that share a system, such as two
    /// queries against the same DHIS2.
    pub fn captures_dir(&self, system: &str, source: &str) -> Result<PathBuf> {
        validate_identifier(system)?;
        validate_identifier(source)?;
        Ok(self
            .root
            .join(StateFile::CapturesDir)
            .join(system)
            .join(source))
    }
}

/// Validate a pair or system name used as a directory component.
///
/// Allowed: ASCII letters, digits, `.`, `_`, `-`; must not be empty, must not
/// start with `.`, at most 128 characters.
pub fn validate_identifier(value: &str) -> Result<()> {
    let reject = |reason: &str| {
        Err(Error::InvalidIdentifier {
            value: value.to_string(),
            reason: reason.to_string(),
        })
    };

    if value.is_empty() {
        return reject("must not be empty");
    }
    if value.len() > 128 {
        return reject("must be at most 128 characters");
    }
    if value.starts_with('.') {
        return reject("must not start with '.'");
    }
    if let Some(bad) = value
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')))
    {
        return reject(&format!("contains disallowed character {bad:?}"));
    }
    Ok(())
}
