use std::sync::Arc;

/// Bytes moved, as reported by a host traffic counter.
pub type ByteCount = u64;

/// Read-only view of the host's traffic accounting.
///
/// Device-wide counters are always available; uid-scoped counters return
/// `None` when the host has no per-uid accounting at all.
pub trait ByteCounterSource: Send + Sync {
    /// Cumulative bytes received across all counted interfaces
    fn total_rx_bytes(&self) -> ByteCount;

    /// Cumulative bytes transmitted across all counted interfaces
    fn total_tx_bytes(&self) -> ByteCount;

    /// Cumulative bytes transmitted by `uid`
    fn uid_tx_bytes(&self, uid: u32) -> Option<ByteCount>;

    /// Cumulative bytes received by `uid`
    fn uid_rx_bytes(&self, uid: u32) -> Option<ByteCount>;

    /// `(rx, tx)` totals. Sources that can read both from one snapshot
    /// should override this.
    fn totals(&self) -> (ByteCount, ByteCount) {
        let rx = self.total_rx_bytes();
        let tx = self.total_tx_bytes();
        (rx, tx)
    }

    /// `(tx, rx)` for `uid`, or `None` if either side is unavailable.
    fn uid_usage(&self, uid: u32) -> Option<(ByteCount, ByteCount)> {
        let tx = self.uid_tx_bytes(uid)?;
        let rx = self.uid_rx_bytes(uid)?;
        Some((tx, rx))
    }
}

impl<T: ByteCounterSource + ?Sized> ByteCounterSource for Arc<T> {
    fn total_rx_bytes(&self) -> ByteCount {
        (**self).total_rx_bytes()
    }

    fn total_tx_bytes(&self) -> ByteCount {
        (**self).total_tx_bytes()
    }

    fn uid_tx_bytes(&self, uid: u32) -> Option<ByteCount> {
        (**self).uid_tx_bytes(uid)
    }

    fn uid_rx_bytes(&self, uid: u32) -> Option<ByteCount> {
        (**self).uid_rx_bytes(uid)
    }

    fn totals(&self) -> (ByteCount, ByteCount) {
        (**self).totals()
    }

    fn uid_usage(&self, uid: u32) -> Option<(ByteCount, ByteCount)> {
        (**self).uid_usage(uid)
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use std::collections::{HashMap, VecDeque};

    use parking_lot::Mutex;

    use super::{ByteCount, ByteCounterSource};

    /// Scripted counter source for tests.
    ///
    /// Each `total_rx_bytes` call advances to the next scripted `(rx, tx)`
    /// reading; `total_tx_bytes` reports the tx half of the current one.
    /// Once the script is exhausted, rx grows by `step` on every read.
    pub struct FakeCounters {
        readings: Mutex<VecDeque<(ByteCount, ByteCount)>>,
        current: Mutex<(ByteCount, ByteCount)>,
        step: ByteCount,
        uids: HashMap<u32, (ByteCount, ByteCount)>,
        per_uid_supported: bool,
    }

    impl FakeCounters {
        pub fn constant(rx: ByteCount, tx: ByteCount) -> Self {
            Self::scripted(Vec::new()).starting_at(rx, tx)
        }

        pub fn scripted(readings: Vec<(ByteCount, ByteCount)>) -> Self {
            Self {
                readings: Mutex::new(readings.into()),
                current: Mutex::new((0, 0)),
                step: 0,
                uids: HashMap::new(),
                per_uid_supported: true,
            }
        }

        pub fn stepping(step: ByteCount) -> Self {
            Self {
                step,
                ..Self::scripted(Vec::new())
            }
        }

        pub fn starting_at(self, rx: ByteCount, tx: ByteCount) -> Self {
            *self.current.lock() = (rx, tx);
            self
        }

        pub fn with_uid(mut self, uid: u32, tx: ByteCount, rx: ByteCount) -> Self {
            self.uids.insert(uid, (tx, rx));
            self
        }

        pub fn without_per_uid(mut self) -> Self {
            self.per_uid_supported = false;
            self
        }
    }

    impl ByteCounterSource for FakeCounters {
        fn total_rx_bytes(&self) -> ByteCount {
            let mut current = self.current.lock();
            match self.readings.lock().pop_front() {
                Some(next) => *current = next,
                None => current.0 += self.step,
            }
            current.0
        }

        fn total_tx_bytes(&self) -> ByteCount {
            self.current.lock().1
        }

        fn uid_tx_bytes(&self, uid: u32) -> Option<ByteCount> {
            if !self.per_uid_supported {
                return None;
            }
            Some(self.uids.get(&uid).map(|u| u.0).unwrap_or(0))
        }

        fn uid_rx_bytes(&self, uid: u32) -> Option<ByteCount> {
            if !self.per_uid_supported {
                return None;
            }
            Some(self.uids.get(&uid).map(|u| u.1).unwrap_or(0))
        }
    }
}
