//! Per-entry results and the run summary

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::action::{ActionKind, ImportBatch};
use super::record::ResourceType;
use crate::config::SyncMode;
use crate::sync::SyncState;

/// Outcome of one actionable entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ImportOutcome {
    Succeeded,
    Failed,
    Skipped,
}

impl ImportOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
            Self::Skipped => "SKIPPED",
        }
    }
}

impl std::fmt::Display for ImportOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportResult {
    pub external_id: String,
    pub resource_type: ResourceType,
    pub action: ActionKind,
    pub outcome: ImportOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Overall status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Completed,
    CompletedWithErrors,
    Aborted,
}

impl RunStatus {
    /// Process exit code for the status.
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Completed => 0,
            Self::CompletedWithErrors => 1,
            Self::Aborted => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "COMPLETED",
            Self::CompletedWithErrors => "COMPLETED_WITH_ERRORS",
            Self::Aborted => "ABORTED",
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeCounts {
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl OutcomeCounts {
    pub fn tally(results: &[ImportResult]) -> Self {
        let mut counts = Self::default();
        for result in results {
            match result.outcome {
                ImportOutcome::Succeeded => counts.succeeded += 1,
                ImportOutcome::Failed => counts.failed += 1,
                ImportOutcome::Skipped => counts.skipped += 1,
            }
        }
        counts
    }
}

/// Identity and timing of one orchestrated run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunInfo {
    pub run_id: String,
    pub pair: String,
    pub mode: SyncMode,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Everything a caller learns about a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub status: RunStatus,
    pub counts: OutcomeCounts,
    pub batch: ImportBatch,
    #[serde(default)]
    pub results: Vec<ImportResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abort_reason: Option<String>,
    #[serde(default)]
    pub short_circuited: bool,
    /// Import script written in build-import-script mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script_path: Option<PathBuf>,
    /// States visited, in order
    #[serde(default)]
    pub states: Vec<SyncState>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run: Option<RunInfo>,
}

impl RunSummary {
    /// Summary from executed results; status follows from the outcomes.
    pub fn from_results(batch: ImportBatch, results: Vec<ImportResult>) -> Self {
        let counts = OutcomeCounts::tally(&results);
        let status = if counts.failed > 0 {
            RunStatus::CompletedWithErrors
        } else {
            RunStatus::Completed
        };
        Self {
            status,
            counts,
            batch,
            results,
            abort_reason: None,
            short_circuited: false,
            script_path: None,
            states: Vec::new(),
            warnings: Vec::new(),
            run: None,
        }
    }

    /// A batch that was computed but deliberately not submitted.
    pub fn not_executed(batch: ImportBatch) -> Self {
        Self::from_results(batch, Vec::new())
    }

    /// A run that stopped before or during execution.
    pub fn aborted(batch: ImportBatch, results: Vec<ImportResult>, reason: impl Into<String>) -> Self {
        let mut summary = Self::from_results(batch, results);
        summary.status = RunStatus::Aborted;
        summary.abort_reason = Some(reason.into());
        summary
    }

    pub fn exit_code(&self) -> i32 {
        self.status.exit_code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(id: &str, outcome: ImportOutcome) -> ImportResult {
        ImportResult {
            external_id: id.to_string(),
            resource_type: ResourceType::Concept,
            action: ActionKind::Create,
            outcome,
            detail: None,
        }
    }

    #[test]
    fn status_follows_failures() {
        let ok = RunSummary::from_results(
            ImportBatch::empty(),
            vec![result("a", ImportOutcome::Succeeded)],
        );
        assert_eq!(ok.status, RunStatus::Completed);

        let failed = RunSummary::from_results(
            ImportBatch::empty(),
            vec![
                result("a", ImportOutcome::Succeeded),
                result("b", ImportOutcome::Failed),
            ],
        );
        assert_eq!(failed.status, RunStatus::CompletedWithErrors);
        assert_eq!(failed.counts.failed, 1);
    }

    #[test]
    fn aborted_keeps_partial_results() {
        let summary = RunSummary::aborted(
            ImportBatch::empty(),
            vec![
                result("a", ImportOutcome::Failed),
                result("b", ImportOutcome::Skipped),
            ],
            "registry unreachable",
        );
        assert_eq!(summary.status, RunStatus::Aborted);
        assert_eq!(summary.exit_code(), 2);
        assert_eq!(summary.counts.skipped, 1);
    }

    #[test]
    fn status_serializes_screaming_snake() {
        assert_eq!(
            serde_json::to_string(&RunStatus::CompletedWithErrors).unwrap(),
            "\"COMPLETED_WITH_ERRORS\""
        );
    }
}
