//! Raw export captures
//!
//! Every live fetch leaves its response body, byte for byte, at
//! `captures/<system>/<source>/<timestamp>.raw`, where `<source>` is derived
//! from the export path. Offline runs replay the newest capture of the same
//! export, never one of a sibling export on the same system.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, Utc};

use metasync_core::SourceDescriptor;
use metasync_fs::{StateLayout, checksum, io};

const EXTENSION: &str = "raw";
const TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%S%.3fZ";
const SLUG_LEN: usize = 48;

/// Directory name for one export: a readable slug of the export path plus a
/// digest prefix, so paths that slug alike still get distinct directories.
pub fn source_key(export_path: &str) -> String {
    let slug: String = export_path
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let slug = slug.trim_start_matches(['.', '_']);
    let slug = &slug[..slug.len().min(SLUG_LEN)];

    let digest = checksum::digest_bytes(export_path.as_bytes());
    let hash = checksum::short(&digest);
    if slug.is_empty() {
        hash.to_string()
    } else {
        format!("{slug}-{hash}")
    }
}

#[derive(Debug, Clone)]
pub struct CaptureStore {
    layout: StateLayout,
}

impl CaptureStore {
    pub fn new(layout: StateLayout) -> Self {
        Self { layout }
    }

    pub fn dir(&self, source: &SourceDescriptor) -> metasync_fs::Result<PathBuf> {
        self.layout
            .captures_dir(&source.system, &source_key(&source.export_path))
    }

    /// Store a raw response of `source` captured at `at`.
    pub fn save(
        &self,
        source: &SourceDescriptor,
        at: DateTime<Utc>,
        raw: &[u8],
    ) -> metasync_fs::Result<PathBuf> {
        let path = self
            .dir(source)?
            .join(format!("{}.{EXTENSION}", at.format(TIMESTAMP_FORMAT)));
        io::write_atomic(&path, raw)?;
        tracing::debug!(
            system = %source.system,
            path = %path.display(),
            bytes = raw.len(),
            "Captured raw export"
        );
        Ok(path)
    }

    /// Newest capture for `source`, if any.
    pub fn latest(&self, source: &SourceDescriptor) -> metasync_fs::Result<Option<PathBuf>> {
        let dir = self.dir(source)?;
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(metasync_fs::Error::io(&dir, e)),
        };

        // timestamp names sort chronologically
        Ok(entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == EXTENSION))
            .max())
    }

    /// Capture time encoded in a capture file name.
    pub fn captured_at(path: &Path) -> Option<DateTime<Utc>> {
        let stem = path.file_stem()?.to_str()?;
        NaiveDateTime::parse_from_str(stem, TIMESTAMP_FORMAT)
            .ok()
            .map(|naive| naive.and_utc())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use metasync_core::WireFormat;
    use tempfile::TempDir;

    fn dhis2(export_path: &str) -> SourceDescriptor {
        SourceDescriptor::new(
            "dhis2",
            "https://dhis2.example.org",
            export_path,
            WireFormat::Dhis2,
        )
    }

    fn ocl() -> SourceDescriptor {
        SourceDescriptor::new("ocl", "https://api.example.org", "export", WireFormat::Ocl)
    }

    #[test]
    fn latest_picks_newest_capture() {
        let dir = TempDir::new().unwrap();
        let store = CaptureStore::new(StateLayout::new(dir.path()));
        let older = Utc.with_ymd_and_hms(2026, 1, 1, 8, 0, 0).unwrap();
        let newer = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();

        let source = dhis2("api/metadata.json");
        store.save(&source, newer, b"new").unwrap();
        store.save(&source, older, b"old").unwrap();

        let latest = store.latest(&source).unwrap().unwrap();
        assert_eq!(std::fs::read(&latest).unwrap(), b"new");
        assert_eq!(CaptureStore::captured_at(&latest), Some(newer));
    }

    #[test]
    fn no_captures_is_none() {
        let dir = TempDir::new().unwrap();
        let store = CaptureStore::new(StateLayout::new(dir.path()));
        assert!(store.latest(&ocl()).unwrap().is_none());
    }

    #[test]
    fn exports_of_one_system_are_kept_apart() {
        let dir = TempDir::new().unwrap();
        let store = CaptureStore::new(StateLayout::new(dir.path()));
        let moh = dhis2("api/moh.json");
        let sims = dhis2("api/sims.json");
        let earlier = Utc.with_ymd_and_hms(2026, 1, 1, 8, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2026, 1, 2, 8, 0, 0).unwrap();

        store.save(&moh, earlier, b"moh").unwrap();
        store.save(&sims, later, b"sims").unwrap();

        let latest = store.latest(&moh).unwrap().unwrap();
        assert_eq!(std::fs::read(latest).unwrap(), b"moh");
    }

    #[test]
    fn source_key_is_a_valid_identifier() {
        for path in [
            "api/metadata.json",
            "/orgs/PEPFAR/sources/DATIM/export?x=1",
            "",
            "..",
            "../../etc",
        ] {
            let key = source_key(path);
            assert!(metasync_fs::validate_identifier(&key).is_ok(), "{path:?} -> {key:?}");
        }
        assert_ne!(source_key("api/a?b"), source_key("api/a&b"));
    }

    #[test]
    fn other_files_are_ignored() {
        let dir = TempDir::new().unwrap();
        let store = CaptureStore::new(StateLayout::new(dir.path()));
        let capture_dir = store.dir(&ocl()).unwrap();
        std::fs::create_dir_all(&capture_dir).unwrap();
        std::fs::write(capture_dir.join("notes.txt"), b"x").unwrap();

        assert!(store.latest(&ocl()).unwrap().is_none());
    }
}
