//! Domain types shared by every stage of a run

mod action;
mod record;
mod snapshot;
mod summary;

pub use action::{ActionCounts, ActionKind, DiffAction, ImportBatch};
pub use record::{Attributes, MetadataRecord, RESERVED_KEYS, ResourceType, is_reserved_key};
pub use snapshot::{DuplicateRecordError, Snapshot};
pub use summary::{ImportOutcome, ImportResult, OutcomeCounts, RunInfo, RunStatus, RunSummary};
