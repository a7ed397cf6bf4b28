//! Per-uid traffic counters from procfs.
//!
//! Two kernel interfaces are understood:
//!   - `/proc/uid_stat/<uid>/tcp_snd` + `tcp_rcv`, one decimal counter per file
//!   - `/proc/net/xt_qtaguid/stats`, one row per (iface, tag, uid, set):
//!
//! ```text
//! idx iface acct_tag_hex uid_tag_int cnt_set rx_bytes rx_packets tx_bytes tx_packets ...
//! 2 wlan0 0x0 10061 0 25340 61 9823 58 ...
//! ```

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{Result, SampleError};
use crate::system::counters::ByteCount;

pub const UID_STAT_ROOT: &str = "/proc/uid_stat";
pub const QTAGUID_STATS: &str = "/proc/net/xt_qtaguid/stats";

const QTAGUID_UNTAGGED: &str = "0x0";
const QTAGUID_UID_COL: usize = 3;
const QTAGUID_RX_BYTES_COL: usize = 5;
const QTAGUID_TX_BYTES_COL: usize = 7;

/// Sent/received totals of one uid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UidBytes {
    pub tx: ByteCount,
    pub rx: ByteCount,
}

/// Reads per-uid counters, preferring `uid_stat` over `xt_qtaguid`
#[derive(Debug, Clone)]
pub struct UidStatReader {
    uid_stat_root: PathBuf,
    qtaguid_stats: PathBuf,
}

impl Default for UidStatReader {
    fn default() -> Self {
        Self::with_paths(UID_STAT_ROOT, QTAGUID_STATS)
    }
}

impl UidStatReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_paths(uid_stat_root: impl Into<PathBuf>, qtaguid_stats: impl Into<PathBuf>) -> Self {
        Self {
            uid_stat_root: uid_stat_root.into(),
            qtaguid_stats: qtaguid_stats.into(),
        }
    }

    /// Whether any per-uid accounting interface exists on this host
    pub fn is_supported(&self) -> bool {
        self.uid_stat_root.is_dir() || self.qtaguid_stats.is_file()
    }

    /// Counters for `uid`; `Ok(None)` when the host has no per-uid accounting.
    pub fn read(&self, uid: u32) -> Result<Option<UidBytes>> {
        if self.uid_stat_root.is_dir() {
            return self.read_uid_stat(uid).map(Some);
        }
        if self.qtaguid_stats.is_file() {
            let content = fs::read_to_string(&self.qtaguid_stats)?;
            return parse_qtaguid_stats(&content, uid, &self.qtaguid_stats).map(Some);
        }
        Ok(None)
    }

    fn read_uid_stat(&self, uid: u32) -> Result<UidBytes> {
        let dir = self.uid_stat_root.join(uid.to_string());
        // The kernel only creates the directory once the uid moves traffic
        if !dir.is_dir() {
            return Ok(UidBytes::default());
        }
        Ok(UidBytes {
            tx: read_counter_file(&dir.join("tcp_snd"))?,
            rx: read_counter_file(&dir.join("tcp_rcv"))?,
        })
    }
}

fn read_counter_file(path: &Path) -> Result<ByteCount> {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e.into()),
    };
    parse_counter(content.trim(), path)
}

fn parse_counter(value: &str, path: &Path) -> Result<ByteCount> {
    value.parse::<ByteCount>().map_err(|_| SampleError::MalformedCounter {
        path: path.display().to_string(),
        value: value.to_string(),
    })
}

/// Sum the untagged rx/tx rows of `uid` across all interfaces and counter sets.
pub fn parse_qtaguid_stats(content: &str, uid: u32, path: &Path) -> Result<UidBytes> {
    let wanted = uid.to_string();
    let mut total = UidBytes::default();

    for line in content.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() <= QTAGUID_TX_BYTES_COL || parts[0] == "idx" {
            continue;
        }
        if parts[2] != QTAGUID_UNTAGGED || parts[QTAGUID_UID_COL] != wanted {
            continue;
        }
        let rx = parse_counter(parts[QTAGUID_RX_BYTES_COL], path)?;
        let tx = parse_counter(parts[QTAGUID_TX_BYTES_COL], path)?;
        total.rx = total.rx.saturating_add(rx);
        total.tx = total.tx.saturating_add(tx);
    }

    Ok(total)
}
