use std::time::Duration;

use futures::future::BoxFuture;

use super::{SinkError, SnapshotRecord, SnapshotSink};
use crate::system::SystemUsageSnapshot;

pub const DEFAULT_API_TIMEOUT: Duration = Duration::from_secs(5);

/// POSTs each snapshot as a JSON object to a fixed endpoint.
#[derive(Debug, Clone)]
pub struct ApiSink {
    url: String,
    client: reqwest::Client,
}

impl ApiSink {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, SinkError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(ApiSink {
            url: url.into(),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn post(&self, snapshot: &SystemUsageSnapshot) -> Result<(), SinkError> {
        let response = self
            .client
            .post(&self.url)
            .json(&SnapshotRecord::now(snapshot))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SinkError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}

impl SnapshotSink for ApiSink {
    fn name(&self) -> &str {
        "api"
    }

    fn consume<'a>(&'a self, snapshot: &'a SystemUsageSnapshot) -> BoxFuture<'a, Result<(), SinkError>> {
        Box::pin(self.post(snapshot))
    }
}
