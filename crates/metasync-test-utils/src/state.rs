//! [`TestState`] temporary state directory.

use std::fs;
use std::path::{Path, PathBuf};

use metasync_fs::StateLayout;
use tempfile::TempDir;

/// A temporary state directory with helpers for setup and assertions.
///
/// # Example
///
/// ```rust,no_run
/// use metasync_test_utils::state::TestState;
///
/// let state = TestState::new();
/// state.write("pairs/demo/previous-export.json", "{ truncated");
/// state.assert_file_exists("pairs/demo/previous-export.json");
/// ```
pub struct TestState {
    temp_dir: TempDir,
}

impl Default for TestState {
    fn default() -> Self {
        Self::new()
    }
}

impl TestState {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn layout(&self) -> StateLayout {
        StateLayout::new(self.root())
    }

    /// Write `content` to `path` relative to the root, creating parents.
    pub fn write(&self, path: &str, content: &str) -> PathBuf {
        let full_path = self.root().join(path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&full_path, content).unwrap();
        full_path
    }

    pub fn read(&self, path: &str) -> String {
        let full_path = self.root().join(path);
        fs::read_to_string(&full_path)
            .unwrap_or_else(|_| panic!("Could not read file: {}", full_path.display()))
    }

    /// Files directly inside `dir` (relative to the root), sorted by name.
    pub fn list(&self, dir: &str) -> Vec<PathBuf> {
        let full_path = self.root().join(dir);
        let Ok(entries) = fs::read_dir(&full_path) else {
            return Vec::new();
        };
        let mut files: Vec<_> = entries.filter_map(|e| e.ok()).map(|e| e.path()).collect();
        files.sort();
        files
    }

    /// # Panics
    /// Panics with a descriptive message if the path does not exist.
    pub fn assert_file_exists(&self, path: &str) {
        let full_path = self.root().join(path);
        assert!(
            full_path.exists(),
            "Expected file to exist: {}",
            full_path.display()
        );
    }

    /// # Panics
    /// Panics with a descriptive message if the path exists.
    pub fn assert_file_not_exists(&self, path: &str) {
        let full_path = self.root().join(path);
        assert!(
            !full_path.exists(),
            "Expected file NOT to exist: {}",
            full_path.display()
        );
    }
}
