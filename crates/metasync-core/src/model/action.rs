//! Reconciliation actions and the ordered batch

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::record::{Attributes, ResourceType};

/// What the registry must do for one upstream record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActionKind {
    Create,
    Update,
    Noop,
}

impl ActionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Noop => "NOOP",
        }
    }

    /// Whether the action results in a registry submission.
    pub fn is_actionable(self) -> bool {
        !matches!(self, Self::Noop)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One reconciliation instruction for one upstream record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffAction {
    pub kind: ActionKind,
    pub resource_type: ResourceType,
    pub external_id: String,
    /// Full desired state; present for CREATE and UPDATE
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Attributes>,
    /// Attribute keys that differ; non-empty only for UPDATE
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub changed_keys: BTreeSet<String>,
}

impl DiffAction {
    pub fn create(
        resource_type: ResourceType,
        external_id: impl Into<String>,
        payload: Attributes,
    ) -> Self {
        Self {
            kind: ActionKind::Create,
            resource_type,
            external_id: external_id.into(),
            payload: Some(payload),
            changed_keys: BTreeSet::new(),
        }
    }

    pub fn update(
        resource_type: ResourceType,
        external_id: impl Into<String>,
        payload: Attributes,
        changed_keys: BTreeSet<String>,
    ) -> Self {
        Self {
            kind: ActionKind::Update,
            resource_type,
            external_id: external_id.into(),
            payload: Some(payload),
            changed_keys,
        }
    }

    pub fn noop(resource_type: ResourceType, external_id: impl Into<String>) -> Self {
        Self {
            kind: ActionKind::Noop,
            resource_type,
            external_id: external_id.into(),
            payload: None,
            changed_keys: BTreeSet::new(),
        }
    }

    fn sort_key(&self) -> (usize, &str) {
        (self.resource_type.precedence(), self.external_id.as_str())
    }
}

/// Per-kind action counts of a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionCounts {
    pub create: usize,
    pub update: usize,
    pub noop: usize,
}

/// Dependency-ordered sequence of actions produced by one diff.
///
/// Parents precede dependents: actions are ordered by resource type
/// precedence, then external id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportBatch {
    actions: Vec<DiffAction>,
    /// Upstream matched the previous export attribute for attribute
    #[serde(default)]
    upstream_unchanged: bool,
}

impl ImportBatch {
    pub fn new(mut actions: Vec<DiffAction>, upstream_unchanged: bool) -> Self {
        actions.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        Self {
            actions,
            upstream_unchanged,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Every action, NOOPs included.
    pub fn actions(&self) -> &[DiffAction] {
        &self.actions
    }

    /// Actions that result in a registry submission, in batch order.
    pub fn actionable(&self) -> impl Iterator<Item = &DiffAction> {
        self.actions.iter().filter(|a| a.kind.is_actionable())
    }

    pub fn actionable_len(&self) -> usize {
        self.actionable().count()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn upstream_unchanged(&self) -> bool {
        self.upstream_unchanged
    }

    /// Nothing to do: upstream is unchanged and the registry already matches.
    pub fn is_short_circuit_eligible(&self) -> bool {
        self.upstream_unchanged && self.actionable_len() == 0
    }

    pub fn counts(&self) -> ActionCounts {
        let mut counts = ActionCounts::default();
        for action in &self.actions {
            match action.kind {
                ActionKind::Create => counts.create += 1,
                ActionKind::Update => counts.update += 1,
                ActionKind::Noop => counts.noop += 1,
            }
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_orders_parents_before_dependents() {
        let batch = ImportBatch::new(
            vec![
                DiffAction::noop(ResourceType::Mapping, "a"),
                DiffAction::create(ResourceType::Concept, "b", Attributes::new()),
                DiffAction::create(ResourceType::Concept, "a", Attributes::new()),
                DiffAction::create(ResourceType::Organization, "z", Attributes::new()),
            ],
            false,
        );

        let order: Vec<_> = batch
            .actions()
            .iter()
            .map(|a| (a.resource_type, a.external_id.as_str()))
            .collect();
        assert_eq!(
            order,
            [
                (ResourceType::Organization, "z"),
                (ResourceType::Concept, "a"),
                (ResourceType::Concept, "b"),
                (ResourceType::Mapping, "a"),
            ]
        );
    }

    #[test]
    fn actionable_view_drops_noops() {
        let batch = ImportBatch::new(
            vec![
                DiffAction::noop(ResourceType::Concept, "a"),
                DiffAction::create(ResourceType::Concept, "b", Attributes::new()),
            ],
            false,
        );
        assert_eq!(batch.actionable_len(), 1);
        assert_eq!(
            batch.counts(),
            ActionCounts {
                create: 1,
                update: 0,
                noop: 1
            }
        );
    }

    #[test]
    fn short_circuit_needs_unchanged_upstream_and_no_work() {
        let noops = vec![DiffAction::noop(ResourceType::Concept, "a")];
        assert!(ImportBatch::new(noops.clone(), true).is_short_circuit_eligible());
        assert!(!ImportBatch::new(noops, false).is_short_circuit_eligible());

        let work = vec![DiffAction::create(ResourceType::Concept, "a", Attributes::new())];
        assert!(!ImportBatch::new(work, true).is_short_circuit_eligible());
    }

    #[test]
    fn action_kind_serializes_uppercase() {
        assert_eq!(
            serde_json::to_string(&ActionKind::Update).unwrap(),
            "\"UPDATE\""
        );
    }
}
