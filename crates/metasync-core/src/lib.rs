//! Synchronization engine for metasync
//!
//! Reconciles a registry against an authoritative upstream system in one
//! operator-triggered pass:
//!
//! ```text
//!  upstream fetcher ─┐
//!                    ├─> diff ─> import script ─┬─> executor ─> RunSummary
//!  registry fetcher ─┘    ^                     └─> script file
//!                         │
//!              previous-export cache
//! ```
//!
//! - **model**: records, snapshots, diff actions, batches and run summaries
//! - **normalize**: wire formats of the two external systems
//! - **fetch**: the [`SnapshotFetcher`] capability and source descriptors
//! - **cache**: the previous-export cache
//! - **diff**: the diff engine
//! - **script**: the import script builder
//! - **executor**: the import executor and the [`RegistryImporter`] capability
//! - **sync**: the orchestrator state machine
//!
//! Network access lives behind the two capability traits so the engine can be
//! driven entirely from memory.

pub mod cache;
pub mod config;
pub mod diff;
pub mod error;
pub mod executor;
pub mod fetch;
pub mod model;
pub mod normalize;
pub mod script;
pub mod sync;

pub use cache::PreviousExportCache;
pub use config::{RegistryTarget, RunConfig, RunOptions, SyncMode, SyncProfile};
pub use diff::diff;
pub use error::{
    CacheCorruptionError, Error, FetchError, RecordImportError, Result, SubmitError,
    TransportError,
};
pub use executor::{ExecutorOptions, ImportExecutor, RegistryImporter};
pub use fetch::{Credential, SnapshotFetcher, SourceDescriptor};
pub use model::{
    ActionKind, Attributes, DiffAction, ImportBatch, ImportOutcome, ImportResult,
    MetadataRecord, OutcomeCounts, ResourceType, RunInfo, RunStatus, RunSummary, Snapshot,
};
pub use normalize::WireFormat;
pub use script::{ImportEntry, ImportScript, ScriptBuilder};
pub use sync::{SyncOrchestrator, SyncState};
