//! Human-readable unit formatting for traffic volumes and rates.
//!
//! All functions here are total: finite non-negative input always formats,
//! and negative or non-finite input clamps to zero rather than failing.

/// Megabytes at which a volume switches from MB to GB display.
const GB_THRESHOLD_MB: f64 = 1024.0;

fn clamped(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Format a byte-volume quantity given in megabytes.
///
/// Values below 1024 MB render as MB, values at or above as GB, always
/// with one decimal place:
///
/// ```
/// use tunneldash::format_traffic;
///
/// assert_eq!(format_traffic(512.3), "512.3 MB");
/// assert_eq!(format_traffic(2150.4), "2.1 GB");
/// ```
pub fn format_traffic(total_mb: f64) -> String {
    let mb = clamped(total_mb);
    if mb >= GB_THRESHOLD_MB {
        format!("{:.1} GB", mb / GB_THRESHOLD_MB)
    } else {
        format!("{:.1} MB", mb)
    }
}

/// Format a traffic rate given in megabytes per hour.
///
/// Rates at or above 1024 MB/h scale to GB/h; rates below 1 MB/h scale to
/// the per-day unit so slow trickles stay legible; everything else renders
/// as MB/h. Zero renders as "0.0 MB/h".
pub fn format_traffic_rate(mb_per_hour: f64) -> String {
    let rate = clamped(mb_per_hour);
    if rate >= GB_THRESHOLD_MB {
        format!("{:.1} GB/h", rate / GB_THRESHOLD_MB)
    } else if rate > 0.0 && rate < 1.0 {
        format!("{:.1} MB/day", rate * 24.0)
    } else {
        format!("{:.1} MB/h", rate)
    }
}

/// Format a raw byte count, auto-scaling at 1024 between B, KB, MB and GB.
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Format a percentage for the CPU/memory gauges.
pub fn format_percent(value: f64) -> String {
    format!("{:.1}%", clamped(value))
}
