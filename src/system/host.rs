use parking_lot::Mutex;
use sysinfo::Networks;
use tracing::warn;

use crate::system::counters::{ByteCount, ByteCounterSource};
use crate::system::uid_stat::{UidBytes, UidStatReader};

/// Counter source backed by the running host.
///
/// Device-wide totals come from `sysinfo`, summed over every interface
/// (loopback excluded unless asked for). Per-uid totals come from procfs.
pub struct HostCounters {
    networks: Mutex<Networks>,
    include_loopback: bool,
    uid_stats: UidStatReader,
}

impl HostCounters {
    pub fn new() -> Self {
        Self::with_options(false, UidStatReader::new())
    }

    pub fn with_options(include_loopback: bool, uid_stats: UidStatReader) -> Self {
        Self {
            networks: Mutex::new(Networks::new_with_refreshed_list()),
            include_loopback,
            uid_stats,
        }
    }

    fn read_uid(&self, uid: u32) -> Option<UidBytes> {
        match self.uid_stats.read(uid) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(uid, error = %e, "failed to read per-uid counters");
                None
            }
        }
    }
}

impl Default for HostCounters {
    fn default() -> Self {
        Self::new()
    }
}

impl ByteCounterSource for HostCounters {
    fn total_rx_bytes(&self) -> ByteCount {
        self.totals().0
    }

    fn total_tx_bytes(&self) -> ByteCount {
        self.totals().1
    }

    fn uid_tx_bytes(&self, uid: u32) -> Option<ByteCount> {
        self.read_uid(uid).map(|b| b.tx)
    }

    fn uid_rx_bytes(&self, uid: u32) -> Option<ByteCount> {
        self.read_uid(uid).map(|b| b.rx)
    }

    fn totals(&self) -> (ByteCount, ByteCount) {
        let mut networks = self.networks.lock();
        // Refresh network data (true = drop interfaces that went away)
        networks.refresh(true);

        let mut total_rx: u64 = 0;
        let mut total_tx: u64 = 0;
        for (name, data) in networks.iter() {
            if !self.include_loopback && is_loopback(name) {
                continue;
            }
            total_rx = total_rx.wrapping_add(data.total_received());
            total_tx = total_tx.wrapping_add(data.total_transmitted());
        }
        (total_rx, total_tx)
    }

    fn uid_usage(&self, uid: u32) -> Option<(ByteCount, ByteCount)> {
        self.read_uid(uid).map(|b| (b.tx, b.rx))
    }
}

/// Loopback interface names: `lo` on Linux, `lo0`, `lo1`... on BSD/macOS,
/// "Loopback Pseudo-Interface N" on Windows.
pub fn is_loopback(name: &str) -> bool {
    name.strip_prefix("lo")
        .is_some_and(|unit| unit.chars().all(|c| c.is_ascii_digit()))
        || name.to_ascii_lowercase().contains("loopback")
}
