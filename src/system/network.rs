use chrono::{DateTime, Local, TimeZone};

/// Latest throughput published by the monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkSpeed {
    pub measured_at: DateTime<Local>,
    pub bytes_per_second: i64,
}

impl NetworkSpeed {
    /// Placeholder before the first sample: epoch, zero bytes
    pub fn empty() -> Self {
        Self {
            measured_at: Local
                .timestamp_opt(0, 0)
                .single()
                .unwrap_or_else(Local::now),
            bytes_per_second: 0,
        }
    }

    pub fn now(bytes_per_second: i64) -> Self {
        Self {
            measured_at: Local::now(),
            bytes_per_second,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.measured_at.timestamp() == 0 && self.bytes_per_second == 0
    }
}

impl Default for NetworkSpeed {
    fn default() -> Self {
        Self::empty()
    }
}

/// Format bytes to human-readable string (KiB, MiB, GiB)
pub fn format_bytes(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = 1024 * KIB;
    const GIB: u64 = 1024 * MIB;
    const TIB: u64 = 1024 * GIB;

    if bytes >= TIB {
        format!("{:.1}T", bytes as f64 / TIB as f64)
    } else if bytes >= GIB {
        format!("{:.1}G", bytes as f64 / GIB as f64)
    } else if bytes >= MIB {
        format!("{:.0}M", bytes as f64 / MIB as f64)
    } else if bytes >= KIB {
        format!("{:.0}K", bytes as f64 / KIB as f64)
    } else {
        format!("{}B", bytes)
    }
}

/// Format a bytes-per-window sample as a rate. Negative samples (counter
/// reset) keep their sign.
pub fn format_rate(bytes_per_sec: i64) -> String {
    let sign = if bytes_per_sec < 0 { "-" } else { "" };
    let magnitude = bytes_per_sec.unsigned_abs() as f64;
    if magnitude >= 1_073_741_824.0 {
        format!("{}{:.1} G/s", sign, magnitude / 1_073_741_824.0)
    } else if magnitude >= 1_048_576.0 {
        format!("{}{:.1} M/s", sign, magnitude / 1_048_576.0)
    } else if magnitude >= 1024.0 {
        format!("{}{:.1} K/s", sign, magnitude / 1024.0)
    } else {
        format!("{}{:.0} B/s", sign, magnitude)
    }
}
