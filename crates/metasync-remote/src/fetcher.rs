//! HTTP snapshot fetcher with offline replay

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;

use metasync_core::fetch::snapshot_from_raw;
use metasync_core::{FetchError, Snapshot, SnapshotFetcher, SourceDescriptor};
use metasync_fs::io;

use crate::capture::CaptureStore;
use crate::client::{authorize, error_body};

/// Fetches exports over HTTP and captures them for offline runs.
#[derive(Debug, Clone)]
pub struct HttpSnapshotFetcher {
    client: Client,
    captures: CaptureStore,
}

impl HttpSnapshotFetcher {
    pub fn new(client: Client, captures: CaptureStore) -> Self {
        Self { client, captures }
    }

    async fn fetch_live(&self, source: &SourceDescriptor) -> Result<Snapshot, FetchError> {
        let url = source.export_url();
        tracing::info!(system = %source.system, %url, "Fetching export");

        let request =
            authorize(self.client.get(&url), &source.credential).timeout(source.timeout());
        let response = request.send().await.map_err(|e| FetchError::Transport {
            system: source.system.clone(),
            message: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                system: source.system.clone(),
                status: status.as_u16(),
                body: error_body(response).await,
            });
        }

        let raw = response.bytes().await.map_err(|e| FetchError::Transport {
            system: source.system.clone(),
            message: e.to_string(),
        })?;
        let fetched_at = Utc::now();

        if let Err(err) = self.captures.save(source, fetched_at, &raw) {
            tracing::warn!(system = %source.system, error = %err, "Failed to store raw capture");
        }

        snapshot_from_raw(source, fetched_at, &raw)
    }

    fn fetch_offline(&self, source: &SourceDescriptor) -> Result<Snapshot, FetchError> {
        let capture_error = |message: String| FetchError::Capture {
            system: source.system.clone(),
            message,
        };

        let latest = self
            .captures
            .latest(source)
            .map_err(|e| capture_error(e.to_string()))?;
        let Some(path) = latest else {
            let dir = self
                .captures
                .dir(source)
                .map_err(|e| capture_error(e.to_string()))?;
            return Err(FetchError::CaptureMissing {
                system: source.system.clone(),
                path: dir,
            });
        };

        tracing::info!(system = %source.system, path = %path.display(), "Replaying offline capture");
        let raw = io::read_bytes(&path).map_err(|e| capture_error(e.to_string()))?;
        let fetched_at = CaptureStore::captured_at(&path).unwrap_or_else(Utc::now);
        snapshot_from_raw(source, fetched_at, &raw)
    }
}

#[async_trait]
impl SnapshotFetcher for HttpSnapshotFetcher {
    async fn fetch(&self, source: &SourceDescriptor, offline: bool) -> Result<Snapshot, FetchError> {
        let snapshot = if offline {
            self.fetch_offline(source)?
        } else {
            self.fetch_live(source).await?
        };
        let digest = snapshot.digest();
        tracing::debug!(
            system = %source.system,
            records = snapshot.len(),
            digest = metasync_fs::checksum::short(&digest),
            "Normalized export"
        );
        Ok(snapshot)
    }
}
