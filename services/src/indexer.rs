//! Fire-and-forget notifications to the external search-index service.
//!
//! Writes that change base text or annotations enqueue a job here; a single
//! background worker posts it with a short timeout. Failures are logged and
//! dropped; indexing never participates in the request transaction or the
//! response.

use std::time::Duration;

use serde_json::json;
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::{debug, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug)]
enum IndexJob {
    ManifestationChanged { manifestation_id: String },
    SegmentsDeleted { segment_ids: Vec<String> },
}

/// Handle to the background indexing worker.
///
/// Cloning is cheap; all clones feed the same worker task. Dropping every
/// clone closes the channel and lets the worker exit.
#[derive(Clone)]
pub struct SearchIndexer {
    tx: UnboundedSender<IndexJob>,
}

impl SearchIndexer {
    /// Spawns the worker task posting to `base_url` (`{base_url}/jobs/create`
    /// and `{base_url}/jobs/delete`).
    pub fn spawn(base_url: String) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            let client = reqwest::Client::new();
            while let Some(job) = rx.recv().await {
                let (path, payload) = match &job {
                    IndexJob::ManifestationChanged { manifestation_id } => {
                        ("jobs/create", json!({ "manifestation_id": manifestation_id }))
                    }
                    IndexJob::SegmentsDeleted { segment_ids } => {
                        ("jobs/delete", json!({ "segment_ids": segment_ids }))
                    }
                };
                let url = format!("{}/{}", base_url.trim_end_matches('/'), path);
                match client
                    .post(&url)
                    .json(&payload)
                    .timeout(REQUEST_TIMEOUT)
                    .send()
                    .await
                {
                    Ok(response) => {
                        debug!(%url, status = %response.status(), "search indexer notified");
                    }
                    Err(err) => warn!(%url, "search indexer call failed: {err}"),
                }
            }
        });
        Self { tx }
    }

    /// Queues an index refresh for a manifestation whose content or
    /// annotations changed.
    pub fn notify_manifestation_changed(&self, manifestation_id: &str) {
        self.enqueue(IndexJob::ManifestationChanged {
            manifestation_id: manifestation_id.to_owned(),
        });
    }

    /// Queues removal of stale search segments after an update replaced them.
    pub fn notify_segments_deleted(&self, segment_ids: Vec<String>) {
        if segment_ids.is_empty() {
            return;
        }
        self.enqueue(IndexJob::SegmentsDeleted { segment_ids });
    }

    fn enqueue(&self, job: IndexJob) {
        if self.tx.send(job).is_err() {
            warn!("search indexer worker is gone; dropping job");
        }
    }
}
