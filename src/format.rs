use crate::system::SystemUsageSnapshot;

/// One-line console report for a snapshot.
pub fn snapshot_line(snapshot: &SystemUsageSnapshot) -> String {
    format!(
        "CPU: {:.2}% | RAM: {:.2}/{:.2} MB | Disk: {:.2}/{:.2} MB",
        snapshot.cpu_usage_percent,
        snapshot.ram_used_mb,
        snapshot.total_ram_mb,
        snapshot.disk_used_mb,
        snapshot.total_disk_mb,
    )
}

pub fn format_megabytes(mb: f64) -> String {
    const GB: f64 = 1024.0;
    const TB: f64 = 1024.0 * 1024.0;

    if mb.abs() >= TB {
        format!("{:.1} TB", mb / TB)
    } else if mb.abs() >= GB {
        format!("{:.1} GB", mb / GB)
    } else {
        format!("{:.0} MB", mb)
    }
}
