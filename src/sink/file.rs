use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use futures::future::BoxFuture;

use super::{SinkError, SnapshotRecord, SnapshotSink};
use crate::system::SystemUsageSnapshot;

/// Appends one JSON line per snapshot.
#[derive(Debug, Clone)]
pub struct FileLogSink {
    path: PathBuf,
}

impl FileLogSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileLogSink { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, snapshot: &SystemUsageSnapshot) -> Result<(), SinkError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let line = serde_json::to_string(&SnapshotRecord::now(snapshot))?;

        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        writeln!(file, "{line}")?;
        Ok(())
    }
}

impl SnapshotSink for FileLogSink {
    fn name(&self) -> &str {
        "file-log"
    }

    fn consume<'a>(&'a self, snapshot: &'a SystemUsageSnapshot) -> BoxFuture<'a, Result<(), SinkError>> {
        Box::pin(async move { self.append(snapshot) })
    }
}
