use std::io::Write;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::format::{format_megabytes, snapshot_line};
use crate::sink::{SnapshotSink, dispatch};
use crate::system::Sampler;

#[derive(Debug, Clone, Copy)]
pub struct MonitorOptions {
    pub interval: Duration,
    pub once: bool,
    pub quiet: bool,
}

/// Sample, report, dispatch, wait; until cancelled (or after one cycle when
/// `once` is set). Returns the number of completed cycles.
pub async fn run(
    sampler: &mut Sampler,
    sinks: &[Box<dyn SnapshotSink>],
    options: MonitorOptions,
    cancel: &CancellationToken,
    out: &mut impl Write,
) -> usize {
    let mut cycles = 0;

    loop {
        let snapshot = sampler.sample().await;
        if cancel.is_cancelled() {
            break;
        }

        if cycles == 0 {
            info!(
                provider = sampler.provider_name(),
                total_ram = %format_megabytes(snapshot.total_ram_mb),
                total_disk = %format_megabytes(snapshot.total_disk_mb),
                "first sample taken"
            );
        }

        if !options.quiet
            && let Err(err) = writeln!(out, "{}", snapshot_line(&snapshot))
        {
            warn!(error = %err, "failed to write console report");
        }

        dispatch(sinks, &snapshot).await;
        cycles += 1;

        if options.once {
            break;
        }

        tokio::select! {
            _ = tokio::time::sleep(options.interval) => {}
            _ = cancel.cancelled() => break,
        }
    }

    cycles
}
