use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

pub type MetricResult = Result<f64, MetricError>;

/// Why a single metric could not be measured.
///
/// Every variant degrades only the metric it was raised for; the sampler
/// substitutes zero and keeps going.
#[derive(Debug, Clone, Error)]
pub enum MetricError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: Arc<std::io::Error>,
    },

    #[error("malformed {what}: {detail}")]
    Malformed { what: &'static str, detail: String },

    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: Arc<std::io::Error>,
    },

    #[error("`{program}` did not finish within {timeout:?}")]
    Timeout { program: String, timeout: Duration },

    #[error("`{program}` exited with {status}")]
    ExitStatus { program: String, status: String },

    #[error("performance counter call {call} failed with status {status:#010x}")]
    Counter { call: &'static str, status: u32 },

    #[error("no mounted volume matches {0}")]
    VolumeNotFound(String),

    #[error("sampling cancelled")]
    Cancelled,

    #[error("no metrics provider for this platform")]
    Unsupported,
}

impl MetricError {
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MetricError::Read {
            path: path.into(),
            source: Arc::new(source),
        }
    }

    pub fn malformed(what: &'static str, detail: impl Into<String>) -> Self {
        MetricError::Malformed {
            what,
            detail: detail.into(),
        }
    }
}
