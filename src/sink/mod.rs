use std::time::{SystemTime, UNIX_EPOCH};

use futures::future::BoxFuture;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use crate::system::SystemUsageSnapshot;

mod api;
mod file;

pub use api::ApiSink;
pub use file::FileLogSink;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sink I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode snapshot: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} answered {status}")]
    Status { url: String, status: u16 },

    #[error("{0}")]
    Rejected(String),
}

/// Wire form of a snapshot shared by the sinks: the five figures plus the
/// time it was handed over.
#[derive(Debug, Serialize)]
pub struct SnapshotRecord<'a> {
    pub timestamp_unix_s: u64,
    #[serde(flatten)]
    pub snapshot: &'a SystemUsageSnapshot,
}

impl<'a> SnapshotRecord<'a> {
    pub fn now(snapshot: &'a SystemUsageSnapshot) -> Self {
        let timestamp_unix_s = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        SnapshotRecord {
            timestamp_unix_s,
            snapshot,
        }
    }
}

/// A consumer of snapshots. Each sink is independent of the others.
pub trait SnapshotSink: Send + Sync {
    fn name(&self) -> &str;

    fn consume<'a>(&'a self, snapshot: &'a SystemUsageSnapshot) -> BoxFuture<'a, Result<(), SinkError>>;
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSummary {
    pub delivered: usize,
    pub failed: usize,
}

/// Hand `snapshot` to every sink in order. A failing sink is logged and
/// skipped.
pub async fn dispatch(sinks: &[Box<dyn SnapshotSink>], snapshot: &SystemUsageSnapshot) -> DispatchSummary {
    let mut summary = DispatchSummary::default();
    for sink in sinks {
        match sink.consume(snapshot).await {
            Ok(()) => summary.delivered += 1,
            Err(err) => {
                warn!(sink = sink.name(), error = %err, "sink failed to consume snapshot");
                summary.failed += 1;
            }
        }
    }
    summary
}
