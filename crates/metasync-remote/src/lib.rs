//! Network side of metasync
//!
//! - [`HttpSnapshotFetcher`]: live exports over HTTP, captured to disk and
//!   replayable offline
//! - [`CaptureStore`]: raw capture files under the state directory
//! - [`HttpRegistryImporter`]: per-entry submissions to the registry API

pub mod capture;
pub mod client;
pub mod fetcher;
pub mod importer;

pub use capture::CaptureStore;
pub use fetcher::HttpSnapshotFetcher;
pub use importer::HttpRegistryImporter;
