use std::path::PathBuf;

use sysinfo::Disks;

use super::error::MetricError;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

#[derive(Debug, Clone, PartialEq)]
pub struct VolumeInfo {
    pub mount_point: PathBuf,
    pub total_bytes: u64,
    pub available_bytes: u64,
    pub removable: bool,
}

impl VolumeInfo {
    /// A volume reporting no capacity is treated as not ready.
    pub fn is_ready(&self) -> bool {
        self.total_bytes > 0
    }

    pub fn used_mb(&self) -> f64 {
        self.total_bytes.saturating_sub(self.available_bytes) as f64 / BYTES_PER_MB
    }

    pub fn total_mb(&self) -> f64 {
        self.total_bytes as f64 / BYTES_PER_MB
    }
}

/// Snapshot of the currently mounted volumes.
pub fn mounted_volumes() -> Vec<VolumeInfo> {
    Disks::new_with_refreshed_list()
        .list()
        .iter()
        .map(|disk| VolumeInfo {
            mount_point: disk.mount_point().to_path_buf(),
            total_bytes: disk.total_space(),
            available_bytes: disk.available_space(),
            removable: disk.is_removable(),
        })
        .collect()
}

/// First ready, non-removable volume in enumeration order.
pub fn primary_fixed_volume(volumes: &[VolumeInfo]) -> Result<&VolumeInfo, MetricError> {
    volumes
        .iter()
        .find(|v| v.is_ready() && !v.removable)
        .ok_or_else(|| MetricError::VolumeNotFound("a ready fixed volume".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn volume(mount: &str, total_mb: u64, free_mb: u64, removable: bool) -> VolumeInfo {
        VolumeInfo {
            mount_point: PathBuf::from(mount),
            total_bytes: total_mb * 1024 * 1024,
            available_bytes: free_mb * 1024 * 1024,
            removable,
        }
    }

    #[test]
    fn picks_first_ready_fixed_volume() {
        let volumes = vec![
            volume("E:\\", 32_000, 1_000, true),
            volume("D:\\", 0, 0, false),
            volume("C:\\", 500_000, 200_000, false),
            volume("F:\\", 900_000, 100, false),
        ];
        let chosen = primary_fixed_volume(&volumes).unwrap();
        assert_eq!(chosen.mount_point, PathBuf::from("C:\\"));
        assert_eq!(chosen.used_mb(), 300_000.0);
        assert_eq!(chosen.total_mb(), 500_000.0);
    }

    #[test]
    fn no_fixed_volume_is_an_error() {
        let volumes = vec![volume("/media/usb", 16_000, 8_000, true)];
        assert!(matches!(
            primary_fixed_volume(&volumes),
            Err(MetricError::VolumeNotFound(_))
        ));
    }

    #[test]
    fn available_above_total_is_zero_used() {
        let v = volume("/", 10, 20, false);
        assert_eq!(v.used_mb(), 0.0);
    }
}
