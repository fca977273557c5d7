use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::system::command::{CommandRunner, TokioCommandRunner};
use crate::system::cpu::{CpuTimeSample, measure_two_point, utilization_between};
use crate::system::error::{MetricError, MetricResult};
use crate::system::snapshot::SampleReport;

pub const CPU_SETTLE: Duration = Duration::from_millis(1500);

const PROC_STAT: &str = "/proc/stat";
const PROC_MEMINFO: &str = "/proc/meminfo";
const ROOT_MOUNT: &str = "/";
const DF_PROGRAM: &str = "df";
const DF_ARGS: [&str; 2] = ["-m", "/"];
#[cfg(unix)]
const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Reads metrics from procfs, statvfs on the root mount and `df`.
pub struct LinuxProvider {
    stat_path: PathBuf,
    meminfo_path: PathBuf,
    root_mount: PathBuf,
    settle: Duration,
    runner: Box<dyn CommandRunner>,
}

impl Default for LinuxProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl LinuxProvider {
    pub fn new() -> Self {
        LinuxProvider {
            stat_path: PathBuf::from(PROC_STAT),
            meminfo_path: PathBuf::from(PROC_MEMINFO),
            root_mount: PathBuf::from(ROOT_MOUNT),
            settle: CPU_SETTLE,
            runner: Box::new(TokioCommandRunner::default()),
        }
    }

    pub fn with_stat_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.stat_path = path.into();
        self
    }

    pub fn with_meminfo_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.meminfo_path = path.into();
        self
    }

    pub fn with_root_mount(mut self, path: impl Into<PathBuf>) -> Self {
        self.root_mount = path.into();
        self
    }

    pub fn with_settle_delay(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    pub fn with_command_runner(mut self, runner: Box<dyn CommandRunner>) -> Self {
        self.runner = runner;
        self
    }

    pub async fn collect(&mut self, cancel: &CancellationToken) -> SampleReport {
        let cpu_usage_percent = self.cpu_usage(cancel).await;
        let (ram_used_mb, total_ram_mb) = self.memory();
        let disk_used_mb = self.disk_used();
        let total_disk_mb = self.disk_total().await;

        SampleReport {
            cpu_usage_percent,
            ram_used_mb,
            total_ram_mb,
            disk_used_mb,
            total_disk_mb,
        }
    }

    async fn cpu_usage(&self, cancel: &CancellationToken) -> MetricResult {
        let path = self.stat_path.as_path();
        measure_two_point(|| read_cpu_sample(path), self.settle, cancel, utilization_between).await
    }

    fn memory(&self) -> (MetricResult, MetricResult) {
        match read_file(&self.meminfo_path) {
            Ok(contents) => (used_memory_mb(&contents), total_memory_mb(&contents)),
            Err(err) => (Err(err.clone()), Err(err)),
        }
    }

    fn disk_used(&self) -> MetricResult {
        filesystem_used_mb(&self.root_mount)
    }

    async fn disk_total(&self) -> MetricResult {
        let output = self.runner.run(DF_PROGRAM, &DF_ARGS).await?;
        parse_df_total_mb(&output)
    }
}

fn read_file(path: &Path) -> Result<String, MetricError> {
    std::fs::read_to_string(path).map_err(|e| MetricError::read(path, e))
}

fn read_cpu_sample(path: &Path) -> Result<CpuTimeSample, MetricError> {
    read_file(path).map(|stat| CpuTimeSample::parse(&stat))
}

/// Used space of the filesystem holding `mount`, straight from statvfs.
#[cfg(unix)]
pub fn filesystem_used_mb(mount: &Path) -> MetricResult {
    let stat = nix::sys::statvfs::statvfs(mount)
        .map_err(|errno| MetricError::read(mount, std::io::Error::from(errno)))?;
    let blocks = u64::from(stat.blocks());
    let available = u64::from(stat.blocks_available());
    let fragment = u64::from(stat.fragment_size());
    Ok(blocks.saturating_sub(available).saturating_mul(fragment) as f64 / BYTES_PER_MB)
}

#[cfg(not(unix))]
pub fn filesystem_used_mb(_mount: &Path) -> MetricResult {
    Err(MetricError::Unsupported)
}

/// Value of a `Key:   value kB` line. A missing key reads as zero.
pub fn meminfo_kb(meminfo: &str, key: &str) -> MetricResult {
    let mut value = 0.0;
    for line in meminfo.lines() {
        let Some(rest) = line.strip_prefix(key).and_then(|r| r.strip_prefix(':')) else {
            continue;
        };
        let token = rest.split_whitespace().next().unwrap_or_default();
        value = token
            .parse()
            .map_err(|_| MetricError::malformed("meminfo", format!("{key} has value {token:?}")))?;
    }
    Ok(value)
}

/// MemTotal − MemAvailable in MB; negative when MemTotal is absent.
pub fn used_memory_mb(meminfo: &str) -> MetricResult {
    let total = meminfo_kb(meminfo, "MemTotal")?;
    let available = meminfo_kb(meminfo, "MemAvailable")?;
    Ok((total - available) / 1024.0)
}

pub fn total_memory_mb(meminfo: &str) -> MetricResult {
    Ok(meminfo_kb(meminfo, "MemTotal")? / 1024.0)
}

/// Second field of the second line of `df -m` output.
pub fn parse_df_total_mb(output: &str) -> MetricResult {
    let line = output
        .lines()
        .nth(1)
        .ok_or_else(|| MetricError::malformed("df output", "missing data line"))?;
    let field = line
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| MetricError::malformed("df output", format!("short line {line:?}")))?;
    field
        .parse()
        .map_err(|_| MetricError::malformed("df output", format!("size field {field:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MEMINFO: &str = "MemTotal:       16000000 kB\n\
                           MemFree:         1000000 kB\n\
                           MemAvailable:    8000000 kB\n\
                           Buffers:          200000 kB\n";

    const DF: &str = "Filesystem     1M-blocks  Used Available Use% Mounted on\n\
                      /dev/sda2         467464 201234    242390  46% /\n";

    #[test]
    fn memory_figures_in_megabytes() {
        assert_eq!(used_memory_mb(MEMINFO).unwrap(), (16_000_000.0 - 8_000_000.0) / 1024.0);
        assert_eq!(total_memory_mb(MEMINFO).unwrap(), 16_000_000.0 / 1024.0);
    }

    #[test]
    fn missing_mem_total_gives_negative_used() {
        let meminfo = "MemFree: 10 kB\nMemAvailable:    8000000 kB\n";
        assert_eq!(total_memory_mb(meminfo).unwrap(), 0.0);
        assert_eq!(used_memory_mb(meminfo).unwrap(), -8_000_000.0 / 1024.0);
    }

    #[test]
    fn key_prefix_does_not_match_longer_keys() {
        let meminfo = "MemTotalish: 5 kB\nMemTotal: 2048 kB\n";
        assert_eq!(meminfo_kb(meminfo, "MemTotal").unwrap(), 2048.0);
    }

    #[test]
    fn non_numeric_value_is_malformed() {
        let meminfo = "MemTotal: lots kB\n";
        assert!(matches!(
            total_memory_mb(meminfo),
            Err(MetricError::Malformed { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn used_space_comes_from_the_mount_itself() {
        let dir = std::env::temp_dir();
        let used = filesystem_used_mb(&dir).unwrap();
        assert!(used >= 0.0);
    }

    #[cfg(unix)]
    #[test]
    fn missing_mount_is_a_read_error() {
        let result = filesystem_used_mb(Path::new("/hostpulse/not/a/mount/point"));
        assert!(matches!(result, Err(MetricError::Read { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn root_mount_override_is_queried_directly() {
        let mut provider = LinuxProvider::new()
            .with_stat_path("/hostpulse/missing/stat")
            .with_meminfo_path("/hostpulse/missing/meminfo")
            .with_root_mount(std::env::temp_dir())
            .with_command_runner(Box::new(TokioCommandRunner::new(Duration::from_millis(1))));
        let report = provider.collect(&CancellationToken::new()).await;
        assert!(report.disk_used_mb.is_ok(), "{:?}", report.disk_used_mb);
    }

    #[test]
    fn df_total_from_second_line() {
        assert_eq!(parse_df_total_mb(DF).unwrap(), 467_464.0);
    }

    #[test]
    fn df_without_data_line_is_malformed() {
        let header_only = "Filesystem     1M-blocks  Used Available Use% Mounted on\n";
        assert!(parse_df_total_mb(header_only).is_err());
        assert!(parse_df_total_mb("").is_err());
        assert!(parse_df_total_mb("header\n/dev/sda2\n").is_err());
        assert!(parse_df_total_mb("header\n/dev/sda2 many\n").is_err());
    }
}
