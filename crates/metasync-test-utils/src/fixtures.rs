//! Record, snapshot and profile builders.

use chrono::{DateTime, Utc};
use serde_json::Value;

use metasync_core::{
    MetadataRecord, RegistryTarget, ResourceType, Snapshot, SourceDescriptor, SyncProfile,
    WireFormat,
};

/// Fixed timestamp for snapshots whose fetch time is irrelevant.
pub fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

/// A Concept with a single `name` attribute.
pub fn concept(id: &str, name: &str) -> MetadataRecord {
    MetadataRecord::new(id, ResourceType::Concept).with_attribute("name", name)
}

/// A record of any type with the given attributes.
pub fn record(id: &str, resource_type: ResourceType, attributes: &[(&str, Value)]) -> MetadataRecord {
    attributes
        .iter()
        .fold(MetadataRecord::new(id, resource_type), |record, (key, value)| {
            record.with_attribute(*key, value.clone())
        })
}

/// Build a snapshot, panicking on duplicate ids.
pub fn snapshot(system: &str, records: Vec<MetadataRecord>) -> Snapshot {
    Snapshot::new(system, epoch(), records).expect("fixture snapshot has duplicate ids")
}

/// Upstream-side snapshot.
pub fn upstream(records: Vec<MetadataRecord>) -> Snapshot {
    snapshot("dhis2", records)
}

/// Registry-side snapshot.
pub fn registry(records: Vec<MetadataRecord>) -> Snapshot {
    snapshot("ocl", records)
}

/// A profile for the pair `name`, pointing both systems at `base_url`.
pub fn profile(name: &str, base_url: &str) -> SyncProfile {
    SyncProfile {
        name: name.to_string(),
        upstream: SourceDescriptor::new("dhis2", base_url, "api/metadata.json", WireFormat::Dhis2),
        registry: SourceDescriptor::new(
            "ocl",
            base_url,
            "orgs/PEPFAR/sources/DATIM/export",
            WireFormat::Ocl,
        ),
        target: RegistryTarget {
            owner: "PEPFAR".to_string(),
            repository: "DATIM".to_string(),
        },
    }
}
