//! Single-writer run lock
//!
//! A sync run for a given pair holds an exclusive advisory lock on the pair's
//! lock file for its whole lifetime. A second run fails fast instead of
//! queueing behind the first.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::{Error, Result};

/// Exclusive lock over one pair's state directory.
///
/// The lock is released when the value is dropped.
#[derive(Debug)]
pub struct RunLock {
    file: File,
    path: PathBuf,
}

impl RunLock {
    /// Try to acquire the lock without blocking.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LockHeld`] when another process (or another handle in
    /// this process) holds the lock, and [`Error::Io`] when the lock file
    /// cannot be created.
    pub fn try_acquire(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| Error::io(path, e))?;

        if file.try_lock_exclusive().is_err() {
            return Err(Error::LockHeld {
                path: path.to_path_buf(),
            });
        }

        // Owner pid is informational only; the advisory lock is the guard
        file.set_len(0).map_err(|e| Error::io(path, e))?;
        writeln!(file, "{}", std::process::id()).map_err(|e| Error::io(path, e))?;

        tracing::debug!(path = %path.display(), "Acquired run lock");
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    /// Check whether some run currently holds the lock at `path`.
    pub fn is_held(path: &Path) -> bool {
        match Self::try_acquire(path) {
            Ok(_lock) => false,
            Err(Error::LockHeld { .. }) => true,
            Err(_) => false,
        }
    }

    /// Path of the lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        if FileExt::unlock(&self.file).is_err() {
            tracing::warn!(path = %self.path.display(), "Failed to release run lock");
        } else {
            tracing::debug!(path = %self.path.display(), "Released run lock");
        }
    }
}
