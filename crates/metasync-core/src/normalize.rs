//! Wire formats of the external systems
//!
//! Both fetch paths (live and offline replay) hand the raw export bytes to
//! [`WireFormat::normalize`], so a capture replays to exactly the records the
//! live fetch produced.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::model::{Attributes, MetadataRecord, ResourceType};

/// DHIS2 export collections and the record shape each maps to.
const DHIS2_COLLECTIONS: &[(&str, ResourceType, Option<&str>)] = &[
    ("organisationUnits", ResourceType::Organization, None),
    ("dataSets", ResourceType::Collection, None),
    ("indicators", ResourceType::Concept, Some("Indicator")),
    ("dataElements", ResourceType::Concept, Some("Data Element")),
];

const DHIS2_RESERVED: &[&str] = &["id", "lastUpdated", "created", "href"];

const OCL_RESERVED: &[&str] = &[
    "type",
    "id",
    "uuid",
    "url",
    "version",
    "created_on",
    "updated_on",
    "created_by",
    "updated_by",
];

/// A raw export could not be turned into records.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NormalizeError {
    #[error("not valid JSON: {0}")]
    Json(String),

    #[error("unexpected shape: {0}")]
    Shape(String),

    #[error("{location} has no string id")]
    MissingId { location: String },

    #[error("{location} has unknown type {value:?}")]
    UnknownType { location: String, value: String },
}

/// Wire format of an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireFormat {
    /// Metadata API export keyed by collection
    Dhis2,
    /// Typed entries, as a JSON array or JSON lines
    Ocl,
}

impl WireFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dhis2 => "dhis2",
            Self::Ocl => "ocl",
        }
    }

    /// Parse raw export bytes into records.
    ///
    /// Duplicate ids are not checked here; snapshot construction rejects them.
    pub fn normalize(self, raw: &[u8]) -> Result<Vec<MetadataRecord>, NormalizeError> {
        match self {
            Self::Dhis2 => normalize_dhis2(raw),
            Self::Ocl => normalize_ocl(raw),
        }
    }
}

impl fmt::Display for WireFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WireFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dhis2" => Ok(Self::Dhis2),
            "ocl" => Ok(Self::Ocl),
            other => Err(format!("unknown wire format {other:?} (expected dhis2 or ocl)")),
        }
    }
}

fn normalize_dhis2(raw: &[u8]) -> Result<Vec<MetadataRecord>, NormalizeError> {
    let document: Value =
        serde_json::from_slice(raw).map_err(|e| NormalizeError::Json(e.to_string()))?;
    let Value::Object(document) = document else {
        return Err(NormalizeError::Shape(
            "expected an object keyed by collection".into(),
        ));
    };

    let mut records = Vec::new();
    for (collection, resource_type, concept_class) in DHIS2_COLLECTIONS {
        let Some(items) = document.get(*collection) else {
            continue;
        };
        let Value::Array(items) = items else {
            return Err(NormalizeError::Shape(format!(
                "{collection} is not an array"
            )));
        };

        for (index, item) in items.iter().enumerate() {
            let location = format!("{collection}[{index}]");
            let Value::Object(fields) = item else {
                return Err(NormalizeError::Shape(format!("{location} is not an object")));
            };
            let external_id = string_id(fields, &location)?;

            let mut record = MetadataRecord::new(external_id, *resource_type);
            record.version_tag = fields.get("lastUpdated").and_then(version_tag);
            record.attributes = attributes_without(fields, DHIS2_RESERVED);
            if let Some(class) = concept_class {
                record
                    .attributes
                    .insert("concept_class".into(), Value::from(*class));
            }
            records.push(record);
        }
    }
    Ok(records)
}

fn normalize_ocl(raw: &[u8]) -> Result<Vec<MetadataRecord>, NormalizeError> {
    let text = std::str::from_utf8(raw).map_err(|e| NormalizeError::Json(e.to_string()))?;
    let trimmed = text.trim_start();

    let entries: Vec<(String, Value)> = if trimmed.starts_with('[') {
        let items: Vec<Value> =
            serde_json::from_str(trimmed).map_err(|e| NormalizeError::Json(e.to_string()))?;
        items
            .into_iter()
            .enumerate()
            .map(|(i, v)| (format!("entry {i}"), v))
            .collect()
    } else {
        let mut entries = Vec::new();
        for (number, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let value: Value = serde_json::from_str(line)
                .map_err(|e| NormalizeError::Json(format!("line {}: {e}", number + 1)))?;
            entries.push((format!("line {}", number + 1), value));
        }
        entries
    };

    entries
        .into_iter()
        .map(|(location, value)| {
            let Value::Object(fields) = value else {
                return Err(NormalizeError::Shape(format!("{location} is not an object")));
            };
            let type_name = fields
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or_default();
            let resource_type: ResourceType =
                type_name.parse().map_err(|_| NormalizeError::UnknownType {
                    location: location.clone(),
                    value: type_name.to_string(),
                })?;
            let external_id = string_id(&fields, &location)?;

            let mut record = MetadataRecord::new(external_id, resource_type);
            record.version_tag = fields.get("version").and_then(version_tag);
            record.attributes = attributes_without(&fields, OCL_RESERVED);
            Ok(record)
        })
        .collect()
}

fn string_id(fields: &Map<String, Value>, location: &str) -> Result<String, NormalizeError> {
    match fields.get("id").and_then(Value::as_str) {
        Some(id) if !id.is_empty() => Ok(id.to_string()),
        _ => Err(NormalizeError::MissingId {
            location: location.to_string(),
        }),
    }
}

fn version_tag(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn attributes_without(fields: &Map<String, Value>, reserved: &[&str]) -> Attributes {
    fields
        .iter()
        .filter(|(key, _)| !reserved.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}
