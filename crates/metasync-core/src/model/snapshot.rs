//! Immutable point-in-time exports

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::record::MetadataRecord;
use crate::diff;

/// A snapshot contained the same external id twice.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("duplicate external id {external_id:?} in {system} snapshot")]
pub struct DuplicateRecordError {
    pub system: String,
    pub external_id: String,
}

/// All records fetched from one system at one point in time.
///
/// Records are held sorted by external id. A snapshot has no mutators; every
/// run builds fresh ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SnapshotData", into = "SnapshotData")]
pub struct Snapshot {
    system: String,
    fetched_at: DateTime<Utc>,
    records: Vec<MetadataRecord>,
}

#[derive(Serialize, Deserialize)]
struct SnapshotData {
    system: String,
    fetched_at: DateTime<Utc>,
    records: Vec<MetadataRecord>,
}

impl TryFrom<SnapshotData> for Snapshot {
    type Error = DuplicateRecordError;

    fn try_from(data: SnapshotData) -> Result<Self, Self::Error> {
        Snapshot::new(data.system, data.fetched_at, data.records)
    }
}

impl From<Snapshot> for SnapshotData {
    fn from(snapshot: Snapshot) -> Self {
        Self {
            system: snapshot.system,
            fetched_at: snapshot.fetched_at,
            records: snapshot.records,
        }
    }
}

impl Snapshot {
    /// Build a snapshot, rejecting duplicate external ids.
    pub fn new(
        system: impl Into<String>,
        fetched_at: DateTime<Utc>,
        mut records: Vec<MetadataRecord>,
    ) -> Result<Self, DuplicateRecordError> {
        let system = system.into();

        let mut seen = HashSet::with_capacity(records.len());
        for record in &records {
            if !seen.insert(record.external_id.as_str()) {
                return Err(DuplicateRecordError {
                    system,
                    external_id: record.external_id.clone(),
                });
            }
        }

        records.sort_by(|a, b| a.external_id.cmp(&b.external_id));
        Ok(Self {
            system,
            fetched_at,
            records,
        })
    }

    pub fn empty(system: impl Into<String>, fetched_at: DateTime<Utc>) -> Self {
        Self {
            system: system.into(),
            fetched_at,
            records: Vec::new(),
        }
    }

    pub fn system(&self) -> &str {
        &self.system
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    /// Records sorted by external id.
    pub fn records(&self) -> &[MetadataRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, external_id: &str) -> Option<&MetadataRecord> {
        self.records
            .binary_search_by(|r| r.external_id.as_str().cmp(external_id))
            .ok()
            .map(|i| &self.records[i])
    }

    /// Lookup table by external id.
    pub fn index(&self) -> BTreeMap<&str, &MetadataRecord> {
        self.records
            .iter()
            .map(|r| (r.external_id.as_str(), r))
            .collect()
    }

    /// Whether both snapshots hold the same records attribute for attribute.
    ///
    /// Fetch time, source system and version tags are not compared.
    pub fn same_content(&self, other: &Snapshot) -> bool {
        self.records.len() == other.records.len()
            && self.records.iter().zip(&other.records).all(|(a, b)| {
                a.external_id == b.external_id
                    && a.resource_type == b.resource_type
                    && diff::changed_keys(a, b).is_empty()
            })
    }

    /// Content digest over the records, for logs and cache reports.
    pub fn digest(&self) -> String {
        let canonical = serde_json::to_vec(&self.records).unwrap_or_default();
        metasync_fs::checksum::digest_bytes(&canonical)
    }
}
