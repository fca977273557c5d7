use std::panic::AssertUnwindSafe;
use std::time::Instant;

use futures::FutureExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use super::error::MetricError;
use super::platform::{MetricsProvider, ProviderOptions};
use super::snapshot::{SampleReport, SystemUsageSnapshot};

/// Produces one [`SystemUsageSnapshot`] per call.
///
/// Holds the provider chosen at construction. `sample` takes `&mut self`, so
/// a provider's counter state is never shared between overlapping cycles.
pub struct Sampler {
    provider: MetricsProvider,
    cancel: CancellationToken,
}

impl Default for Sampler {
    fn default() -> Self {
        Self::new()
    }
}

impl Sampler {
    pub fn new() -> Self {
        Self::with_provider(MetricsProvider::detect(ProviderOptions::default()))
    }

    pub fn with_provider(provider: MetricsProvider) -> Self {
        Sampler {
            provider,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    pub async fn sample(&mut self) -> SystemUsageSnapshot {
        self.sample_report().await.into_snapshot()
    }

    /// Per-metric results of one cycle. A panic inside the provider is
    /// contained and reported as a failure of every metric.
    pub async fn sample_report(&mut self) -> SampleReport {
        let started = Instant::now();
        let provider = self.provider.name();
        let outcome = AssertUnwindSafe(self.provider.collect(&self.cancel))
            .catch_unwind()
            .await;

        match outcome {
            Ok(report) => {
                debug!(
                    provider,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    degraded = ?report.degraded(),
                    "sampling cycle finished"
                );
                report
            }
            Err(panic) => {
                let reason = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                error!(provider, reason = %reason, "metrics provider panicked; reporting zeros");
                SampleReport::uniform(MetricError::malformed("provider state", reason))
            }
        }
    }
}
