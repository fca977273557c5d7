use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::command::{DEFAULT_COMMAND_TIMEOUT, TokioCommandRunner};
use super::error::MetricError;
use super::snapshot::SampleReport;

pub mod linux;
#[cfg(target_os = "windows")]
pub mod windows;

pub use linux::LinuxProvider;
#[cfg(target_os = "windows")]
pub use windows::WindowsProvider;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlatformKind {
    Windows,
    Linux,
    Other,
}

impl PlatformKind {
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            PlatformKind::Windows
        } else if cfg!(target_os = "linux") {
            PlatformKind::Linux
        } else {
            PlatformKind::Other
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ProviderOptions {
    pub command_timeout: Duration,
}

impl Default for ProviderOptions {
    fn default() -> Self {
        ProviderOptions {
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }
}

/// The metric strategy for this process, chosen once.
pub enum MetricsProvider {
    #[cfg(target_os = "windows")]
    Windows(WindowsProvider),
    Linux(LinuxProvider),
    Unsupported,
}

impl MetricsProvider {
    pub fn detect(options: ProviderOptions) -> Self {
        Self::for_platform(PlatformKind::current(), options)
    }

    pub fn for_platform(kind: PlatformKind, options: ProviderOptions) -> Self {
        match kind {
            PlatformKind::Windows => windows_provider(),
            PlatformKind::Linux => MetricsProvider::Linux(
                LinuxProvider::new()
                    .with_command_runner(Box::new(TokioCommandRunner::new(options.command_timeout))),
            ),
            PlatformKind::Other => MetricsProvider::Unsupported,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            #[cfg(target_os = "windows")]
            MetricsProvider::Windows(_) => "windows",
            MetricsProvider::Linux(_) => "linux",
            MetricsProvider::Unsupported => "unsupported",
        }
    }

    pub async fn collect(&mut self, cancel: &CancellationToken) -> SampleReport {
        match self {
            #[cfg(target_os = "windows")]
            MetricsProvider::Windows(provider) => provider.collect(cancel).await,
            MetricsProvider::Linux(provider) => provider.collect(cancel).await,
            MetricsProvider::Unsupported => SampleReport::uniform(MetricError::Unsupported),
        }
    }
}

#[cfg(target_os = "windows")]
fn windows_provider() -> MetricsProvider {
    MetricsProvider::Windows(WindowsProvider::new())
}

#[cfg(not(target_os = "windows"))]
fn windows_provider() -> MetricsProvider {
    MetricsProvider::Unsupported
}
