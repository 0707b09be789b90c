//! Import executor
//!
//! Replays the actionable entries of a batch against the registry one at a
//! time, in batch order.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::SubmitError;
use crate::model::{ImportBatch, ImportOutcome, ImportResult, RunSummary};
use crate::script::{ImportEntry, ScriptBuilder};

/// Applies single import entries to the registry.
#[async_trait]
pub trait RegistryImporter: Send + Sync {
    /// Submit one entry.
    ///
    /// [`SubmitError::Rejected`] fails only this entry;
    /// [`SubmitError::Transport`] aborts the rest of the batch.
    async fn submit(&self, entry: &ImportEntry) -> Result<(), SubmitError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutorOptions {
    /// Minimum pause between consecutive submissions
    pub delay: Duration,
    /// Maximum number of submissions; 0 means unlimited
    pub limit: usize,
}

impl Default for ExecutorOptions {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(1),
            limit: 0,
        }
    }
}

pub struct ImportExecutor {
    importer: Arc<dyn RegistryImporter>,
    options: ExecutorOptions,
}

impl ImportExecutor {
    pub fn new(importer: Arc<dyn RegistryImporter>, options: ExecutorOptions) -> Self {
        Self { importer, options }
    }

    pub fn options(&self) -> ExecutorOptions {
        self.options
    }

    /// Execute the batch and summarize every actionable entry.
    pub async fn execute(&self, batch: ImportBatch) -> RunSummary {
        let script = ScriptBuilder::build(&batch);
        let mut results = Vec::with_capacity(script.len());
        let mut submitted = 0usize;
        let mut abort_reason: Option<String> = None;

        for entry in script.entries() {
            let skip = if abort_reason.is_some() {
                Some("not attempted: registry became unreachable")
            } else if self.options.limit > 0 && submitted >= self.options.limit {
                Some("not attempted: import limit reached")
            } else {
                None
            };
            if let Some(detail) = skip {
                results.push(result_for(entry, ImportOutcome::Skipped, Some(detail.to_string())));
                continue;
            }

            if submitted > 0 && !self.options.delay.is_zero() {
                tokio::time::sleep(self.options.delay).await;
            }
            submitted += 1;

            let (outcome, detail) = match self.importer.submit(entry).await {
                Ok(()) => (ImportOutcome::Succeeded, None),
                Err(SubmitError::Rejected(err)) => {
                    tracing::warn!(external_id = %entry.external_id, error = %err, "Registry rejected entry");
                    (ImportOutcome::Failed, Some(err.to_string()))
                }
                Err(SubmitError::Transport(err)) => {
                    tracing::error!(external_id = %entry.external_id, error = %err, "Aborting batch");
                    abort_reason = Some(err.to_string());
                    (ImportOutcome::Failed, Some(err.to_string()))
                }
            };
            tracing::debug!(
                external_id = %entry.external_id,
                action = %entry.action,
                outcome = %outcome,
                "Processed entry"
            );
            results.push(result_for(entry, outcome, detail));
        }

        match abort_reason {
            Some(reason) => RunSummary::aborted(batch, results, reason),
            None => RunSummary::from_results(batch, results),
        }
    }
}

fn result_for(entry: &ImportEntry, outcome: ImportOutcome, detail: Option<String>) -> ImportResult {
    ImportResult {
        external_id: entry.external_id.clone(),
        resource_type: entry.resource_type,
        action: entry.action,
        outcome,
        detail,
    }
}
