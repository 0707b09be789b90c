//! End-to-end reconciliation against a mock upstream and registry
//!
//! Exercises the full stack: HTTP fetch -> capture -> normalize -> diff ->
//! execute or script -> previous-export cache.

use std::sync::Arc;
use std::time::Duration;

use metasync_core::{
    ActionKind, ImportOutcome, ImportScript, PreviousExportCache, RunConfig, RunOptions,
    RunStatus, RunSummary, SyncMode, SyncOrchestrator,
};
use metasync_remote::client::http_client;
use metasync_remote::{CaptureStore, HttpRegistryImporter, HttpSnapshotFetcher};
use metasync_test_utils::fixtures::profile;
use metasync_test_utils::state::TestState;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PAIR: &str = "pepfar";
const UPSTREAM_PATH: &str = "/api/metadata.json";
const REGISTRY_PATH: &str = "/orgs/PEPFAR/sources/DATIM/export";
const CONCEPTS: &str = "/orgs/PEPFAR/sources/DATIM/concepts/";

fn upstream_export() -> serde_json::Value {
    json!({
        "organisationUnits": [{"id": "OU1", "name": "Kenya"}],
        "indicators": [
            {"id": "IND1", "name": "TX_CURR", "lastUpdated": "2026-01-02T00:00:00.000"},
            {"id": "IND2", "name": "TX_NEW", "lastUpdated": "2026-01-02T00:00:00.000"}
        ]
    })
}

/// Registry export with OU1 in sync and IND1 drifted; IND2 missing.
fn drifted_registry() -> String {
    [
        json!({"type": "Organization", "id": "OU1", "name": "Kenya"}),
        json!({"type": "Concept", "id": "IND1", "name": "TX_CURR_OLD", "concept_class": "Indicator"}),
    ]
    .iter()
    .map(|entry| format!("{entry}\n"))
    .collect()
}

fn matching_registry() -> String {
    [
        json!({"type": "Organization", "id": "OU1", "name": "Kenya"}),
        json!({"type": "Concept", "id": "IND1", "name": "TX_CURR", "concept_class": "Indicator"}),
        json!({"type": "Concept", "id": "IND2", "name": "TX_NEW", "concept_class": "Indicator"}),
    ]
    .iter()
    .map(|entry| format!("{entry}\n"))
    .collect()
}

async fn serve_exports(server: &MockServer, registry: String) {
    Mock::given(method("GET"))
        .and(path(UPSTREAM_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(upstream_export()))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(REGISTRY_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(registry))
        .mount(server)
        .await;
}

fn options(mode: SyncMode) -> RunOptions {
    RunOptions {
        mode,
        import_delay: Duration::ZERO,
        ..RunOptions::default()
    }
}

async fn run(state: &TestState, base_url: &str, options: RunOptions) -> RunSummary {
    let config = RunConfig::new(profile(PAIR, base_url), options).unwrap();
    let layout = state.layout();
    let client = http_client().unwrap();
    let fetcher = Arc::new(HttpSnapshotFetcher::new(
        client.clone(),
        CaptureStore::new(layout.clone()),
    ));
    let importer = Arc::new(HttpRegistryImporter::new(
        client,
        config.registry(),
        config.target().clone(),
    ));

    SyncOrchestrator::new(config, layout, fetcher.clone(), fetcher, importer)
        .run()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_full_import_repairs_drift_and_creates_missing() {
    let server = MockServer::start().await;
    serve_exports(&server, drifted_registry()).await;
    Mock::given(method("POST"))
        .and(path(CONCEPTS))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(format!("{CONCEPTS}IND1/")))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let state = TestState::new();
    let summary = run(&state, &server.uri(), options(SyncMode::FullImport)).await;

    assert_eq!(summary.status, RunStatus::Completed);
    assert_eq!(summary.exit_code(), 0);
    let counts = summary.batch.counts();
    assert_eq!((counts.create, counts.update, counts.noop), (1, 1, 1));
    assert_eq!(summary.counts.succeeded, 2);

    state.assert_file_exists("pairs/pepfar/previous-export.json");
    let captures = CaptureStore::new(state.layout());
    let pair = profile(PAIR, &server.uri());
    for source in [&pair.upstream, &pair.registry] {
        let latest = captures.latest(source).unwrap();
        assert!(latest.is_some(), "no capture for {}", source.system);
    }
}

#[tokio::test]
async fn test_rejection_is_isolated() {
    let server = MockServer::start().await;
    serve_exports(&server, drifted_registry()).await;
    Mock::given(method("POST"))
        .and(path(CONCEPTS))
        .respond_with(ResponseTemplate::new(400).set_body_string("concept_class is required"))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let state = TestState::new();
    let summary = run(&state, &server.uri(), options(SyncMode::FullImport)).await;

    assert_eq!(summary.status, RunStatus::CompletedWithErrors);
    assert_eq!(summary.exit_code(), 1);
    let failed: Vec<_> = summary
        .results
        .iter()
        .filter(|r| r.outcome == ImportOutcome::Failed)
        .collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].external_id, "IND2");
    assert!(
        failed[0]
            .detail
            .as_deref()
            .unwrap_or_default()
            .contains("concept_class is required")
    );
}

#[tokio::test]
async fn test_gateway_failure_aborts_without_cache() {
    let server = MockServer::start().await;
    serve_exports(&server, drifted_registry()).await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let state = TestState::new();
    let summary = run(&state, &server.uri(), options(SyncMode::FullImport)).await;

    assert_eq!(summary.status, RunStatus::Aborted);
    assert_eq!(summary.exit_code(), 2);
    // IND1 (update) sorts before IND2 (create) and fails first
    assert_eq!(summary.counts.failed, 1);
    assert_eq!(summary.counts.skipped, 1);
    state.assert_file_not_exists("pairs/pepfar/previous-export.json");
}

#[tokio::test]
async fn test_unchanged_upstream_short_circuits_second_run() {
    let server = MockServer::start().await;
    serve_exports(&server, matching_registry()).await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let state = TestState::new();
    let compare = RunOptions {
        compare_to_previous: true,
        ..options(SyncMode::FullImport)
    };

    let first = run(&state, &server.uri(), compare.clone()).await;
    assert!(!first.short_circuited);
    assert_eq!(first.batch.actionable_len(), 0);

    let second = run(&state, &server.uri(), compare).await;
    assert!(second.short_circuited);
    assert_eq!(second.status, RunStatus::Completed);
}

#[tokio::test]
async fn test_build_mode_writes_script_without_submitting() {
    let server = MockServer::start().await;
    serve_exports(&server, drifted_registry()).await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let state = TestState::new();
    let summary = run(&state, &server.uri(), options(SyncMode::BuildImportScript)).await;

    let script_path = summary.script_path.clone().unwrap();
    let script = ImportScript::read_from(&script_path).unwrap();
    let entries: Vec<_> = script
        .entries()
        .iter()
        .map(|e| (e.external_id.as_str(), e.action))
        .collect();
    assert_eq!(
        entries,
        vec![("IND1", ActionKind::Update), ("IND2", ActionKind::Create)]
    );
    assert_eq!(summary.exit_code(), 0);
}

#[tokio::test]
async fn test_offline_replay_matches_live_run() {
    let state = TestState::new();
    let live = {
        let server = MockServer::start().await;
        serve_exports(&server, drifted_registry()).await;
        run(&state, &server.uri(), options(SyncMode::BuildImportScript)).await
    };

    // the server is gone; only the captures remain
    let offline = run(
        &state,
        "http://127.0.0.1:9",
        RunOptions {
            upstream_offline: true,
            registry_offline: true,
            ..options(SyncMode::BuildImportScript)
        },
    )
    .await;

    assert_eq!(offline.status, RunStatus::Completed);
    assert_eq!(offline.batch, live.batch);

    let cached = PreviousExportCache::for_pair(&state.layout(), PAIR)
        .unwrap()
        .load()
        .unwrap();
    assert_eq!(cached.len(), 3);
}
