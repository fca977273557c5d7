use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::warn;
use windows_sys::Win32::System::Performance::{
    PDH_FMT_COUNTERVALUE, PDH_FMT_DOUBLE, PDH_HCOUNTER, PDH_HQUERY, PdhAddEnglishCounterW,
    PdhCloseQuery, PdhCollectQueryData, PdhGetFormattedCounterValue, PdhOpenQueryW,
};
use windows_sys::Win32::System::SystemInformation::{GlobalMemoryStatusEx, MEMORYSTATUSEX};

use crate::system::cpu::measure_two_point;
use crate::system::error::{MetricError, MetricResult};
use crate::system::snapshot::SampleReport;
use crate::system::volume::{mounted_volumes, primary_fixed_volume};

pub const CPU_SETTLE: Duration = Duration::from_millis(1000);

const CPU_COUNTER: &str = r"\Processor(_Total)\% Processor Time";
const AVAILABLE_MB_COUNTER: &str = r"\Memory\Available MBytes";
const ERROR_SUCCESS: u32 = 0;

fn wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

fn check(call: &'static str, status: u32) -> Result<(), MetricError> {
    if status == ERROR_SUCCESS {
        Ok(())
    } else {
        Err(MetricError::Counter { call, status })
    }
}

/// PDH query holding the processor and available-memory counters.
/// Closed on drop.
struct CounterQuery {
    query: PDH_HQUERY,
    cpu: PDH_HCOUNTER,
    available_mb: PDH_HCOUNTER,
}

// PDH handles are plain process-wide handles, not tied to the opening thread.
unsafe impl Send for CounterQuery {}

impl CounterQuery {
    fn open() -> Result<Self, MetricError> {
        let mut query: PDH_HQUERY = unsafe { std::mem::zeroed() };
        check("PdhOpenQueryW", unsafe {
            PdhOpenQueryW(std::ptr::null(), 0, &mut query)
        })?;

        let mut counters = CounterQuery {
            query,
            cpu: unsafe { std::mem::zeroed() },
            available_mb: unsafe { std::mem::zeroed() },
        };
        counters.cpu = counters.add(CPU_COUNTER)?;
        counters.available_mb = counters.add(AVAILABLE_MB_COUNTER)?;

        // The first collection only establishes the baseline.
        counters.collect()?;
        Ok(counters)
    }

    fn add(&self, path: &str) -> Result<PDH_HCOUNTER, MetricError> {
        let path = wide(path);
        let mut counter: PDH_HCOUNTER = unsafe { std::mem::zeroed() };
        check("PdhAddEnglishCounterW", unsafe {
            PdhAddEnglishCounterW(self.query, path.as_ptr(), 0, &mut counter)
        })?;
        Ok(counter)
    }

    fn collect(&mut self) -> Result<(), MetricError> {
        check("PdhCollectQueryData", unsafe { PdhCollectQueryData(self.query) })
    }

    fn value(&self, counter: PDH_HCOUNTER) -> MetricResult {
        let mut value: PDH_FMT_COUNTERVALUE = unsafe { std::mem::zeroed() };
        check("PdhGetFormattedCounterValue", unsafe {
            PdhGetFormattedCounterValue(counter, PDH_FMT_DOUBLE, std::ptr::null_mut(), &mut value)
        })?;
        check("PdhGetFormattedCounterValue", value.CStatus)?;
        Ok(unsafe { value.Anonymous.doubleValue })
    }

    fn read_cpu(&mut self) -> MetricResult {
        self.collect()?;
        self.value(self.cpu)
    }

    fn read_available_mb(&mut self) -> MetricResult {
        self.collect()?;
        self.value(self.available_mb)
    }
}

impl Drop for CounterQuery {
    fn drop(&mut self) {
        unsafe {
            PdhCloseQuery(self.query);
        }
    }
}

/// Reads metrics from PDH counters, the memory-status query and the
/// volume list.
pub struct WindowsProvider {
    counters: Result<CounterQuery, MetricError>,
    settle: Duration,
}

impl Default for WindowsProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowsProvider {
    pub fn new() -> Self {
        let counters = CounterQuery::open();
        if let Err(err) = &counters {
            warn!(error = %err, "performance counters unavailable; cpu and ram used will read zero");
        }
        WindowsProvider {
            counters,
            settle: CPU_SETTLE,
        }
    }

    pub fn with_settle_delay(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    pub async fn collect(&mut self, cancel: &CancellationToken) -> SampleReport {
        let cpu_usage_percent = self.cpu_usage(cancel).await;
        let total_ram_mb = total_memory_mb();
        let ram_used_mb = self.used_memory_mb(&total_ram_mb);

        let volumes = mounted_volumes();
        let (disk_used_mb, total_disk_mb) = match primary_fixed_volume(&volumes) {
            Ok(volume) => (Ok(volume.used_mb()), Ok(volume.total_mb())),
            Err(err) => (Err(err.clone()), Err(err)),
        };

        SampleReport {
            cpu_usage_percent,
            ram_used_mb,
            total_ram_mb,
            disk_used_mb,
            total_disk_mb,
        }
    }

    async fn cpu_usage(&mut self, cancel: &CancellationToken) -> MetricResult {
        let counters = self.counters.as_mut().map_err(|e| e.clone())?;
        // Only the reading taken after the settling delay is reported.
        measure_two_point(|| counters.read_cpu(), self.settle, cancel, |_, second| second).await
    }

    fn used_memory_mb(&mut self, total: &MetricResult) -> MetricResult {
        let total = total.clone()?;
        let counters = self.counters.as_mut().map_err(|e| e.clone())?;
        Ok(total - counters.read_available_mb()?)
    }
}

/// Total visible physical memory in MB.
fn total_memory_mb() -> MetricResult {
    let mut status: MEMORYSTATUSEX = unsafe { std::mem::zeroed() };
    status.dwLength = std::mem::size_of::<MEMORYSTATUSEX>() as u32;
    if unsafe { GlobalMemoryStatusEx(&mut status) } == 0 {
        return Err(MetricError::read(
            "GlobalMemoryStatusEx",
            std::io::Error::last_os_error(),
        ));
    }
    let total_kb = status.ullTotalPhys as f64 / 1024.0;
    Ok(total_kb / 1024.0)
}
