//! Normalized metadata records

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Attribute map of a record. Ordered so serialization is deterministic.
pub type Attributes = BTreeMap<String, Value>;

/// Envelope keys of the registry wire shape. Attributes by these names can
/// never reach the registry, so they take no part in diffing.
pub const RESERVED_KEYS: [&str; 3] = ["type", "id", "__action"];

pub fn is_reserved_key(key: &str) -> bool {
    RESERVED_KEYS.contains(&key)
}

/// Kind of registry resource a record describes.
///
/// Declaration order is the dependency precedence: a resource may only refer
/// to resources of an earlier kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceType {
    Organization,
    Source,
    Collection,
    Concept,
    Mapping,
}

impl ResourceType {
    /// All resource types, parents first.
    pub const PRECEDENCE: [ResourceType; 5] = [
        ResourceType::Organization,
        ResourceType::Source,
        ResourceType::Collection,
        ResourceType::Concept,
        ResourceType::Mapping,
    ];

    /// Position in the dependency order; lower imports first.
    pub fn precedence(self) -> usize {
        match self {
            Self::Organization => 0,
            Self::Source => 1,
            Self::Collection => 2,
            Self::Concept => 3,
            Self::Mapping => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Organization => "Organization",
            Self::Source => "Source",
            Self::Collection => "Collection",
            Self::Concept => "Concept",
            Self::Mapping => "Mapping",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::PRECEDENCE
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown resource type {s:?}"))
    }
}

/// One entity from either system, in the shared shape the diff works on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataRecord {
    /// Correlation key shared by both systems
    pub external_id: String,
    pub resource_type: ResourceType,
    #[serde(default)]
    pub attributes: Attributes,
    /// Opaque version marker from the source system; never compared
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_tag: Option<String>,
}

impl MetadataRecord {
    pub fn new(external_id: impl Into<String>, resource_type: ResourceType) -> Self {
        Self {
            external_id: external_id.into(),
            resource_type,
            attributes: Attributes::new(),
            version_tag: None,
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_version_tag(mut self, tag: impl Into<String>) -> Self {
        self.version_tag = Some(tag.into());
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Attributes the registry can hold.
    pub fn wire_attributes(&self) -> Attributes {
        self.attributes
            .iter()
            .filter(|(key, _)| !is_reserved_key(key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}
