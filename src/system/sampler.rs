use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::system::counters::{ByteCount, ByteCounterSource};
use crate::system::interrupt::Interrupt;

/// Default measurement window for throughput samples
pub const DEFAULT_SAMPLE_WINDOW: Duration = Duration::from_millis(1000);

/// Difference of the device-wide `rx + tx` total across one window.
///
/// `bytes` reads as "bytes per second" only because the window is about a
/// second long. It is never renormalized: a short or interrupted window and
/// a counter reset (negative `bytes`) pass through unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThroughputSample {
    pub bytes: i64,
    /// Wall-clock time between the two counter reads
    pub elapsed: Duration,
    /// The window wait was cut short
    pub interrupted: bool,
}

/// Cumulative traffic of one uid at query time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PerAppByteUsage {
    pub bytes_sent: ByteCount,
    pub bytes_received: ByteCount,
}

impl From<(ByteCount, ByteCount)> for PerAppByteUsage {
    fn from((bytes_sent, bytes_received): (ByteCount, ByteCount)) -> Self {
        Self {
            bytes_sent,
            bytes_received,
        }
    }
}

/// Stateless queries against a [`ByteCounterSource`].
pub struct NetworkByteSampler<S> {
    source: S,
    window: Duration,
    interrupt: Interrupt,
}

impl<S: ByteCounterSource> NetworkByteSampler<S> {
    pub fn new(source: S) -> Self {
        Self::with_window(source, DEFAULT_SAMPLE_WINDOW)
    }

    pub fn with_window(source: S, window: Duration) -> Self {
        Self::with_interrupt(source, window, Interrupt::new())
    }

    pub fn with_interrupt(source: S, window: Duration, interrupt: Interrupt) -> Self {
        Self {
            source,
            window,
            interrupt,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Handle that cuts the current (and any later) window wait short
    pub fn interrupt_handle(&self) -> Interrupt {
        self.interrupt.clone()
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Sum rx+tx, wait one window, sum again, return the difference.
    ///
    /// Blocks the calling thread for the window. An interrupted wait is not an
    /// error: the second read happens right away and the sample is flagged.
    pub fn measure_instantaneous_throughput(&self) -> ThroughputSample {
        let (rx, tx) = self.source.totals();
        let start_total = rx.wrapping_add(tx);
        let started = Instant::now();

        let outcome = self.interrupt.wait_for(self.window);
        if outcome.is_interrupted() {
            debug!(
                elapsed_ms = started.elapsed().as_millis() as u64,
                "throughput window interrupted, sampling early"
            );
        }

        let (rx, tx) = self.source.totals();
        let end_total = rx.wrapping_add(tx);
        let elapsed = started.elapsed();

        // Wrapping keeps a counter reset visible as a negative delta
        let bytes = end_total.wrapping_sub(start_total) as i64;
        trace!(start_total, end_total, bytes, "throughput sample");

        ThroughputSample {
            bytes,
            elapsed,
            interrupted: outcome.is_interrupted(),
        }
    }

    /// `(sent, received)` for `uid`, or `None` if the host has no per-uid
    /// accounting. Unknown uids are not validated; they usually read as zero.
    pub fn query_per_app_byte_usage(&self, uid: u32) -> Option<PerAppByteUsage> {
        let usage = self.source.uid_usage(uid).map(PerAppByteUsage::from);
        trace!(uid, ?usage, "per-app usage");
        usage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::counters::fake::FakeCounters;
    use std::thread;

    const SHORT: Duration = Duration::from_millis(5);

    #[test]
    fn test_idle_counters_give_zero() {
        let sampler = NetworkByteSampler::with_window(FakeCounters::constant(4096, 1024), SHORT);
        assert_eq!(sampler.measure_instantaneous_throughput().bytes, 0);
        assert_eq!(sampler.measure_instantaneous_throughput().bytes, 0);
    }

    #[test]
    fn test_growth_by_k_gives_k() {
        let sampler = NetworkByteSampler::with_window(FakeCounters::stepping(777), SHORT);
        let sample = sampler.measure_instantaneous_throughput();
        assert_eq!(sample.bytes, 777);
        assert!(!sample.interrupted);
    }

    #[test]
    fn test_start_1000_end_1500() {
        let source = FakeCounters::scripted(vec![(600, 400), (900, 600)]);
        let sampler = NetworkByteSampler::with_window(source, SHORT);
        assert_eq!(sampler.measure_instantaneous_throughput().bytes, 500);
    }

    #[test]
    fn test_counter_reset_goes_negative() {
        let source = FakeCounters::scripted(vec![(1000, 500), (700, 300)]);
        let sampler = NetworkByteSampler::with_window(source, SHORT);
        assert_eq!(sampler.measure_instantaneous_throughput().bytes, -500);
    }

    #[test]
    fn test_default_window_is_one_second() {
        let sampler = NetworkByteSampler::new(FakeCounters::constant(0, 0));
        assert_eq!(sampler.window(), Duration::from_millis(1000));
    }

    #[test]
    fn test_window_is_observed() {
        let sampler = NetworkByteSampler::with_window(
            FakeCounters::constant(0, 0),
            Duration::from_millis(30),
        );
        let sample = sampler.measure_instantaneous_throughput();
        assert!(sample.elapsed >= Duration::from_millis(30));
    }

    #[test]
    fn test_interrupt_before_window_still_samples() {
        let source = FakeCounters::scripted(vec![(100, 0), (150, 0)]);
        let sampler = NetworkByteSampler::with_window(source, Duration::from_secs(30));
        sampler.interrupt_handle().interrupt();

        let sample = sampler.measure_instantaneous_throughput();
        assert!(sample.interrupted);
        assert_eq!(sample.bytes, 50);
        assert!(sample.elapsed < Duration::from_secs(30));
    }

    #[test]
    fn test_interrupt_during_window() {
        let sampler = NetworkByteSampler::with_window(
            FakeCounters::stepping(10),
            Duration::from_secs(30),
        );
        let interrupt = sampler.interrupt_handle();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            interrupt.interrupt();
        });

        let sample = sampler.measure_instantaneous_throughput();
        handle.join().unwrap();

        assert!(sample.interrupted);
        assert_eq!(sample.bytes, 10);
    }

    #[test]
    fn test_per_app_usage_is_sent_then_received() {
        let sampler = NetworkByteSampler::new(FakeCounters::constant(0, 0).with_uid(42, 200, 300));
        assert_eq!(
            sampler.query_per_app_byte_usage(42),
            Some(PerAppByteUsage {
                bytes_sent: 200,
                bytes_received: 300,
            })
        );
    }

    #[test]
    fn test_per_app_usage_zero_for_idle_uid() {
        let sampler = NetworkByteSampler::new(FakeCounters::constant(0, 0).with_uid(42, 200, 300));
        assert_eq!(
            sampler.query_per_app_byte_usage(99),
            Some(PerAppByteUsage::default())
        );
    }

    #[test]
    fn test_per_app_usage_unavailable() {
        let sampler = NetworkByteSampler::new(FakeCounters::constant(0, 0).without_per_uid());
        assert_eq!(sampler.query_per_app_byte_usage(42), None);
    }
}
