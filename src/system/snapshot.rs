use serde::Serialize;
use tracing::{debug, warn};

use super::error::{MetricError, MetricResult};

/// One sampling cycle's view of the host. Every field is zero when its
/// underlying read failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SystemUsageSnapshot {
    pub cpu_usage_percent: f64,
    pub ram_used_mb: f64,
    pub total_ram_mb: f64,
    pub disk_used_mb: f64,
    pub total_disk_mb: f64,
}

/// Per-metric outcome of one cycle, before failures are flattened to zero.
#[derive(Debug, Clone)]
pub struct SampleReport {
    pub cpu_usage_percent: MetricResult,
    pub ram_used_mb: MetricResult,
    pub total_ram_mb: MetricResult,
    pub disk_used_mb: MetricResult,
    pub total_disk_mb: MetricResult,
}

impl SampleReport {
    pub fn uniform(err: MetricError) -> Self {
        SampleReport {
            cpu_usage_percent: Err(err.clone()),
            ram_used_mb: Err(err.clone()),
            total_ram_mb: Err(err.clone()),
            disk_used_mb: Err(err.clone()),
            total_disk_mb: Err(err),
        }
    }

    fn metrics(&self) -> [(&'static str, &MetricResult); 5] {
        [
            ("cpu_usage_percent", &self.cpu_usage_percent),
            ("ram_used_mb", &self.ram_used_mb),
            ("total_ram_mb", &self.total_ram_mb),
            ("disk_used_mb", &self.disk_used_mb),
            ("total_disk_mb", &self.total_disk_mb),
        ]
    }

    /// Names of the metrics that failed this cycle.
    pub fn degraded(&self) -> Vec<&'static str> {
        self.metrics()
            .into_iter()
            .filter(|(_, result)| result.is_err())
            .map(|(name, _)| name)
            .collect()
    }

    pub fn into_snapshot(self) -> SystemUsageSnapshot {
        for (name, result) in self.metrics() {
            match result {
                Err(MetricError::Cancelled) => debug!(metric = name, "metric skipped, cancelled"),
                Err(err) => warn!(metric = name, error = %err, "metric degraded to zero"),
                Ok(_) => {}
            }
        }

        let cpu = self.cpu_usage_percent.unwrap_or(0.0);
        let cpu_usage_percent = if cpu.is_finite() {
            cpu.clamp(0.0, 100.0)
        } else {
            0.0
        };

        let total_disk_mb = self.total_disk_mb.unwrap_or(0.0);
        let mut disk_used_mb = self.disk_used_mb.unwrap_or(0.0);
        // Used and total come from different sources on Linux.
        if total_disk_mb > 0.0 && disk_used_mb > total_disk_mb {
            disk_used_mb = total_disk_mb;
        }

        SystemUsageSnapshot {
            cpu_usage_percent,
            ram_used_mb: self.ram_used_mb.unwrap_or(0.0),
            total_ram_mb: self.total_ram_mb.unwrap_or(0.0),
            disk_used_mb,
            total_disk_mb,
        }
    }
}
