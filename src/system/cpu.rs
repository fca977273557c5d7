use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::error::MetricError;

const AGGREGATE_PREFIX: &str = "cpu ";
const MIN_FIELDS: usize = 5;

/// Idle and total jiffies from the aggregate `cpu ` line of `/proc/stat`.
///
/// Both counters only grow; a single sample means nothing on its own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuTimeSample {
    pub idle_ticks: u64,
    pub total_ticks: u64,
}

impl CpuTimeSample {
    /// Parse the first aggregate line of `/proc/stat` contents.
    ///
    /// Non-numeric fields count as zero. A missing line or fewer than five
    /// fields yields the zero sample.
    pub fn parse(stat: &str) -> Self {
        let Some(line) = stat.lines().find(|l| l.starts_with(AGGREGATE_PREFIX)) else {
            debug!("no aggregate cpu line in /proc/stat contents");
            return Self::default();
        };

        let fields: Vec<u64> = line
            .split_whitespace()
            .skip(1)
            .map(|f| f.parse().unwrap_or(0))
            .collect();

        if fields.len() < MIN_FIELDS {
            debug!(fields = fields.len(), "aggregate cpu line too short");
            return Self::default();
        }

        // user nice system idle iowait irq softirq steal ...
        CpuTimeSample {
            idle_ticks: fields[3].saturating_add(fields[4]),
            total_ticks: fields.iter().fold(0u64, |acc, v| acc.saturating_add(*v)),
        }
    }
}

/// Busy percentage between two samples, in `0.0..=100.0`.
pub fn utilization_between(first: CpuTimeSample, second: CpuTimeSample) -> f64 {
    let idle_delta = second.idle_ticks.saturating_sub(first.idle_ticks);
    let total_delta = second.total_ticks.saturating_sub(first.total_ticks);
    if total_delta == 0 {
        return 0.0;
    }
    let busy = 100.0 * (1.0 - idle_delta as f64 / total_delta as f64);
    busy.clamp(0.0, 100.0)
}

/// Progress of a two-point measurement of a cumulative counter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CpuPhase<R> {
    Primed,
    Sampling(R),
    Done(f64),
}

impl<R> CpuPhase<R> {
    pub fn advance(self, reading: R, compute: impl FnOnce(R, R) -> f64) -> Self {
        match self {
            CpuPhase::Primed => CpuPhase::Sampling(reading),
            CpuPhase::Sampling(first) => CpuPhase::Done(compute(first, reading)),
            done @ CpuPhase::Done(_) => done,
        }
    }
}

/// Take a reading, wait `settle`, take another and combine them.
///
/// Cancellation is honored only while waiting.
pub async fn measure_two_point<R>(
    mut read: impl FnMut() -> Result<R, MetricError>,
    settle: Duration,
    cancel: &CancellationToken,
    compute: impl Fn(R, R) -> f64,
) -> Result<f64, MetricError> {
    let mut phase = CpuPhase::Primed;
    loop {
        phase = match phase {
            CpuPhase::Primed => phase.advance(read()?, &compute),
            CpuPhase::Sampling(_) => {
                settle_or_cancel(settle, cancel).await?;
                phase.advance(read()?, &compute)
            }
            CpuPhase::Done(value) => return Ok(value),
        };
    }
}

pub async fn settle_or_cancel(
    settle: Duration,
    cancel: &CancellationToken,
) -> Result<(), MetricError> {
    tokio::select! {
        _ = tokio::time::sleep(settle) => Ok(()),
        _ = cancel.cancelled() => Err(MetricError::Cancelled),
    }
}
