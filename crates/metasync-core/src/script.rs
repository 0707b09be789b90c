//! Import script builder
//!
//! Maps the actionable part of a batch onto the registry's bulk-import wire
//! shape: one JSON object per line.
//!
//! ```text
//! {"type":"Concept","id":"FTRrcoaog83","__action":"CREATE","name":"TX_CURR",...}
//! ```

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use metasync_fs::io;

use crate::model::{ActionKind, Attributes, DiffAction, ImportBatch, ResourceType};
use crate::{Error, Result};

pub use crate::model::RESERVED_KEYS;

/// One registry submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportEntry {
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    #[serde(rename = "id")]
    pub external_id: String,
    #[serde(rename = "__action")]
    pub action: ActionKind,
    #[serde(flatten)]
    pub payload: Attributes,
}

impl ImportEntry {
    fn from_action(action: &DiffAction) -> Self {
        let mut payload = action.payload.clone().unwrap_or_default();
        for key in RESERVED_KEYS {
            if payload.remove(key).is_some() {
                tracing::warn!(
                    external_id = %action.external_id,
                    key,
                    "Dropping attribute that collides with an import script key"
                );
            }
        }

        Self {
            resource_type: action.resource_type,
            external_id: action.external_id.clone(),
            action: action.kind,
            payload,
        }
    }
}

/// Serializable, wire-shaped form of an actionable batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportScript {
    entries: Vec<ImportEntry>,
}

impl ImportScript {
    pub fn new(entries: Vec<ImportEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[ImportEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// JSON-lines document, one entry per line with a trailing newline.
    pub fn to_json_lines(&self) -> Result<String> {
        let mut out = String::new();
        for entry in &self.entries {
            out.push_str(&serde_json::to_string(entry)?);
            out.push('\n');
        }
        Ok(out)
    }

    /// Parse a JSON-lines document. Blank lines are skipped.
    pub fn from_json_lines(text: &str) -> Result<Self> {
        let entries = text
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(index, line)| {
                serde_json::from_str(line).map_err(|e| Error::InvalidScript {
                    line: index + 1,
                    message: e.to_string(),
                })
            })
            .collect::<Result<Vec<ImportEntry>>>()?;
        Ok(Self { entries })
    }

    /// Write the script durably. Never submits anything.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        io::write_atomic(path, self.to_json_lines()?.as_bytes())?;
        tracing::info!(path = %path.display(), entries = self.len(), "Wrote import script");
        Ok(())
    }

    pub fn read_from(path: &Path) -> Result<Self> {
        Self::from_json_lines(&io::read_text(path)?)
    }
}

/// Builds import scripts from batches.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScriptBuilder;

impl ScriptBuilder {
    /// Map every non-NOOP action, in batch order.
    pub fn build(batch: &ImportBatch) -> ImportScript {
        ImportScript::new(batch.actionable().map(ImportEntry::from_action).collect())
    }

    /// File name for a script built at `at`.
    pub fn file_name(at: DateTime<Utc>) -> String {
        format!("import-{}.jsonl", at.format("%Y%m%dT%H%M%S%.3fZ"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Attributes;
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};
    use std::collections::BTreeSet;
    use tempfile::TempDir;

    fn attrs(pairs: &[(&str, Value)]) -> Attributes {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn batch() -> ImportBatch {
        ImportBatch::new(
            vec![
                DiffAction::noop(ResourceType::Concept, "N1"),
                DiffAction::update(
                    ResourceType::Concept,
                    "U1",
                    attrs(&[("name", json!("New"))]),
                    BTreeSet::from(["name".to_string()]),
                ),
                DiffAction::create(
                    ResourceType::Organization,
                    "O1",
                    attrs(&[("name", json!("PEPFAR")), ("extras", json!({"k": [1, 2]}))]),
                ),
            ],
            false,
        )
    }

    #[test]
    fn build_keeps_order_and_drops_noops() {
        let script = ScriptBuilder::build(&batch());
        let ids: Vec<_> = script.entries().iter().map(|e| e.external_id.as_str()).collect();
        assert_eq!(ids, ["O1", "U1"]);
        assert_eq!(script.entries()[1].action, ActionKind::Update);
    }

    #[test]
    fn entries_use_registry_wire_shape() {
        let script = ScriptBuilder::build(&batch());
        let first: Value =
            serde_json::from_str(script.to_json_lines().unwrap().lines().next().unwrap()).unwrap();
        assert_eq!(
            first,
            json!({"type": "Organization", "id": "O1", "__action": "CREATE", "name": "PEPFAR", "extras": {"k": [1, 2]}})
        );
    }

    #[test]
    fn document_parses_back_to_equal_script() {
        let script = ScriptBuilder::build(&batch());
        let text = script.to_json_lines().unwrap();
        assert_eq!(ImportScript::from_json_lines(&text).unwrap(), script);
    }

    #[test]
    fn reserved_attribute_names_are_dropped() {
        let batch = ImportBatch::new(
            vec![DiffAction::create(
                ResourceType::Concept,
                "C1",
                attrs(&[("id", json!("other")), ("name", json!("X"))]),
            )],
            false,
        );
        let script = ScriptBuilder::build(&batch);
        assert_eq!(script.entries()[0].external_id, "C1");
        assert!(!script.entries()[0].payload.contains_key("id"));
    }

    #[test]
    fn parse_error_reports_line() {
        let text = "{\"type\":\"Concept\",\"id\":\"A\",\"__action\":\"CREATE\"}\n\nnot json\n";
        let err = ImportScript::from_json_lines(text).unwrap_err();
        assert!(matches!(err, Error::InvalidScript { line: 3, .. }));
    }

    #[test]
    fn write_and_read_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scripts").join(ScriptBuilder::file_name(Utc::now()));
        let script = ScriptBuilder::build(&batch());

        script.write_to(&path).unwrap();
        assert_eq!(ImportScript::read_from(&path).unwrap(), script);
    }
}
