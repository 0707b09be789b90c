//! Sync orchestrator
//!
//! Drives one run through the state machine: fetch both sides, diff, then
//! either execute the batch or write it as an import script.

use std::sync::Arc;

use chrono::Utc;
use tracing::Instrument;
use uuid::Uuid;

use metasync_fs::{RunLock, StateLayout};

use super::state::{StateMachine, SyncState};
use crate::cache::PreviousExportCache;
use crate::config::{RunConfig, SyncMode};
use crate::diff::diff;
use crate::error::FetchError;
use crate::executor::{ImportExecutor, RegistryImporter};
use crate::fetch::SnapshotFetcher;
use crate::model::{ImportBatch, RunInfo, RunStatus, RunSummary, Snapshot};
use crate::script::ScriptBuilder;
use crate::{Error, Result};

pub struct SyncOrchestrator {
    config: RunConfig,
    layout: StateLayout,
    upstream: Arc<dyn SnapshotFetcher>,
    registry: Arc<dyn SnapshotFetcher>,
    importer: Arc<dyn RegistryImporter>,
}

impl SyncOrchestrator {
    pub fn new(
        config: RunConfig,
        layout: StateLayout,
        upstream: Arc<dyn SnapshotFetcher>,
        registry: Arc<dyn SnapshotFetcher>,
        importer: Arc<dyn RegistryImporter>,
    ) -> Self {
        Self {
            config,
            layout,
            upstream,
            registry,
            importer,
        }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Run one reconciliation pass.
    ///
    /// Every run that acquires the pair lock yields a summary, aborted or
    /// not. `Err` is reserved for failures before the run starts: lock
    /// contention, an unusable state directory, or an illegal state change.
    pub async fn run(&self) -> Result<RunSummary> {
        let pair = self.config.pair();
        let lock_path = self.layout.run_lock(pair)?;
        let _lock = match RunLock::try_acquire(&lock_path) {
            Ok(lock) => lock,
            Err(metasync_fs::Error::LockHeld { .. }) => {
                tracing::warn!(pair, "Another import holds the run lock");
                return Err(Error::RunInProgress {
                    pair: pair.to_string(),
                });
            }
            Err(err) => return Err(err.into()),
        };

        let run_id = Uuid::new_v4().to_string();
        let started_at = Utc::now();
        let span =
            tracing::info_span!("sync_run", run_id = %run_id, pair, mode = %self.config.mode());

        async {
            let mut machine = StateMachine::new();
            let mut summary = self.drive(&mut machine).await?;

            summary.states = machine.into_trail();
            summary.run = Some(RunInfo {
                run_id: run_id.clone(),
                pair: pair.to_string(),
                mode: self.config.mode(),
                started_at,
                finished_at: Utc::now(),
            });

            tracing::info!(
                status = %summary.status,
                succeeded = summary.counts.succeeded,
                failed = summary.counts.failed,
                skipped = summary.counts.skipped,
                short_circuited = summary.short_circuited,
                "Run finished"
            );
            Ok(summary)
        }
        .instrument(span)
        .await
    }

    async fn drive(&self, machine: &mut StateMachine) -> Result<RunSummary> {
        let options = self.config.options();

        machine.advance(SyncState::Fetching)?;
        let upstream = match self
            .upstream
            .fetch(self.config.upstream(), options.upstream_offline)
            .await
        {
            Ok(snapshot) => snapshot,
            Err(err) => return abort(machine, fetch_failed(err)),
        };
        let registry = match self
            .registry
            .fetch(self.config.registry(), options.registry_offline)
            .await
        {
            Ok(snapshot) => snapshot,
            Err(err) => return abort(machine, fetch_failed(err)),
        };
        tracing::info!(
            upstream = upstream.len(),
            registry = registry.len(),
            "Fetched snapshots"
        );

        machine.advance(SyncState::Diffing)?;
        let cache = PreviousExportCache::for_pair(&self.layout, self.config.pair())?;
        let mut warnings = Vec::new();
        let previous = if options.compare_to_previous {
            cache.try_load().unwrap_or_else(|err| {
                tracing::warn!(error = %err, "Treating previous export as absent");
                warnings.push(err.to_string());
                None
            })
        } else {
            None
        };
        let batch = diff(
            &upstream,
            &registry,
            previous.as_ref(),
            options.compare_to_previous,
        );

        let mut summary = if batch.is_short_circuit_eligible() {
            tracing::info!(
                "Upstream unchanged since previous export and registry up to date, skipping import"
            );
            let mut summary = RunSummary::not_executed(batch);
            summary.short_circuited = true;
            summary
        } else {
            match self.config.mode() {
                SyncMode::FullImport => {
                    machine.advance(SyncState::Executing)?;
                    ImportExecutor::new(self.importer.clone(), self.config.executor_options())
                        .execute(batch)
                        .await
                }
                SyncMode::BuildImportScript => {
                    machine.advance(SyncState::BuildingScript)?;
                    self.build_script(batch)?
                }
            }
        };
        summary.warnings.append(&mut warnings);

        if summary.status == RunStatus::Aborted {
            return abort(machine, summary);
        }

        machine.advance(SyncState::Done)?;
        if !summary.short_circuited {
            self.replace_cache(&cache, &upstream, &mut summary);
        }
        Ok(summary)
    }

    fn build_script(&self, batch: ImportBatch) -> Result<RunSummary> {
        let script = ScriptBuilder::build(&batch);
        let path = self
            .layout
            .scripts_dir(self.config.pair())?
            .join(ScriptBuilder::file_name(Utc::now()));

        Ok(match script.write_to(&path) {
            Ok(()) => {
                let mut summary = RunSummary::not_executed(batch);
                summary.script_path = Some(path);
                summary
            }
            Err(err) => RunSummary::aborted(
                batch,
                Vec::new(),
                format!("failed to write import script: {err}"),
            ),
        })
    }

    fn replace_cache(
        &self,
        cache: &PreviousExportCache,
        upstream: &Snapshot,
        summary: &mut RunSummary,
    ) {
        if let Err(err) = cache.save(upstream) {
            tracing::warn!(error = %err, "Failed to update previous export");
            summary
                .warnings
                .push(format!("previous export not updated: {err}"));
        }
    }
}

fn fetch_failed(err: FetchError) -> RunSummary {
    RunSummary::aborted(ImportBatch::empty(), Vec::new(), err.to_string())
}

fn abort(machine: &mut StateMachine, summary: RunSummary) -> Result<RunSummary> {
    tracing::error!(
        reason = summary.abort_reason.as_deref().unwrap_or_default(),
        "Run aborted"
    );
    machine.advance(SyncState::Aborted)?;
    Ok(summary)
}
