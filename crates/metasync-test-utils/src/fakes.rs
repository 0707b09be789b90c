//! In-memory collaborators for the sync engine.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use metasync_core::{
    ActionKind, FetchError, ImportEntry, MetadataRecord, RecordImportError, RegistryImporter,
    Snapshot, SnapshotFetcher, SourceDescriptor, SubmitError, TransportError,
};

/// Serves a fixed snapshot (or error) and counts calls.
pub struct InMemoryFetcher {
    response: Mutex<Result<Snapshot, FetchError>>,
    calls: Mutex<Vec<bool>>,
}

impl InMemoryFetcher {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            response: Mutex::new(Ok(snapshot)),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: FetchError) -> Self {
        Self {
            response: Mutex::new(Err(error)),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Replace what subsequent fetches return.
    pub fn set(&self, snapshot: Snapshot) {
        *self.response.lock().unwrap() = Ok(snapshot);
    }

    pub fn calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// The `offline` flag of every call, in order.
    pub fn offline_flags(&self) -> Vec<bool> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SnapshotFetcher for InMemoryFetcher {
    async fn fetch(&self, _source: &SourceDescriptor, offline: bool) -> Result<Snapshot, FetchError> {
        self.calls.lock().unwrap().push(offline);
        self.response.lock().unwrap().clone()
    }
}

/// A registry that applies submitted entries to an in-memory store.
///
/// Acts as both the registry fetcher and the importer, so a second run sees
/// what the first one wrote. Failures can be injected per id, or as a
/// connectivity loss after a number of submissions.
#[derive(Default)]
pub struct InMemoryRegistry {
    records: Mutex<BTreeMap<String, MetadataRecord>>,
    submitted: Mutex<Vec<ImportEntry>>,
    rejected_ids: Mutex<BTreeSet<String>>,
    unreachable_after: Mutex<Option<usize>>,
}

impl InMemoryRegistry {
    pub fn new(records: Vec<MetadataRecord>) -> Self {
        let registry = Self::default();
        {
            let mut store = registry.records.lock().unwrap();
            for record in records {
                store.insert(record.external_id.clone(), record);
            }
        }
        registry
    }

    /// Reject every submission for `external_id`.
    pub fn reject(&self, external_id: &str) {
        self.rejected_ids
            .lock()
            .unwrap()
            .insert(external_id.to_string());
    }

    /// Fail with a transport error once `count` submissions have been made.
    pub fn go_unreachable_after(&self, count: usize) {
        *self.unreachable_after.lock().unwrap() = Some(count);
    }

    /// Every entry submitted so far, including failed ones.
    pub fn submitted(&self) -> Vec<ImportEntry> {
        self.submitted.lock().unwrap().clone()
    }

    pub fn submitted_ids(&self) -> Vec<String> {
        self.submitted()
            .into_iter()
            .map(|entry| entry.external_id)
            .collect()
    }

    pub fn get(&self, external_id: &str) -> Option<MetadataRecord> {
        self.records.lock().unwrap().get(external_id).cloned()
    }

    pub fn snapshot(&self) -> Snapshot {
        let records = self.records.lock().unwrap().values().cloned().collect();
        Snapshot::new("ocl", Utc::now(), records).expect("store is keyed by id")
    }
}

#[async_trait]
impl SnapshotFetcher for InMemoryRegistry {
    async fn fetch(&self, _source: &SourceDescriptor, _offline: bool) -> Result<Snapshot, FetchError> {
        Ok(self.snapshot())
    }
}

#[async_trait]
impl RegistryImporter for InMemoryRegistry {
    async fn submit(&self, entry: &ImportEntry) -> Result<(), SubmitError> {
        let attempts = {
            let mut submitted = self.submitted.lock().unwrap();
            submitted.push(entry.clone());
            submitted.len()
        };

        if let Some(limit) = *self.unreachable_after.lock().unwrap()
            && attempts > limit
        {
            return Err(TransportError::new("connection refused").into());
        }
        if self.rejected_ids.lock().unwrap().contains(&entry.external_id) {
            return Err(RecordImportError::new(Some(400), "rejected by test registry").into());
        }

        let mut records = self.records.lock().unwrap();
        if entry.action == ActionKind::Create && records.contains_key(&entry.external_id) {
            return Err(RecordImportError::new(Some(409), "already exists").into());
        }
        let mut record = MetadataRecord::new(&entry.external_id, entry.resource_type);
        record.attributes = entry.payload.clone();
        records.insert(entry.external_id.clone(), record);
        Ok(())
    }
}
