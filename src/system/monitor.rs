//! Periodic sampling on worker threads.
//!
//! The speed worker measures aggregate throughput every `speed_interval`;
//! the usage worker polls one uid's counters every `usage_interval` and
//! publishes only changes. Readers get the latest values without blocking
//! on a measurement.

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU32, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::system::counters::ByteCounterSource;
use crate::system::interrupt::Interrupt;
use crate::system::network::NetworkSpeed;
use crate::system::sampler::{NetworkByteSampler, PerAppByteUsage, DEFAULT_SAMPLE_WINDOW};

pub const DEFAULT_SPEED_INTERVAL: Duration = Duration::from_millis(3000);
pub const DEFAULT_USAGE_INTERVAL: Duration = Duration::from_millis(500);

/// Bytes per second of the latest sample published by any monitor
static CURRENT_SPEED: AtomicI64 = AtomicI64::new(0);

/// Latest throughput published by any monitor in this process; 0 until the
/// first sample.
pub fn current_speed() -> i64 {
    CURRENT_SPEED.load(Ordering::Relaxed)
}

/// Published state shared with the workers
#[derive(Default)]
struct Shared {
    speed: RwLock<NetworkSpeed>,
    usage: RwLock<Option<PerAppByteUsage>>,
    uid: AtomicU32,
    uid_set: AtomicBool,
}

struct Job {
    stop: Interrupt,
    handle: JoinHandle<()>,
}

impl Job {
    fn is_active(&self) -> bool {
        !self.handle.is_finished()
    }

    fn shutdown(self) {
        self.stop.interrupt();
        if self.handle.join().is_err() {
            warn!("network monitor worker panicked");
        }
    }
}

/// Background throughput and per-uid usage monitor
pub struct NetworkSpeedMonitor<S> {
    source: Arc<S>,
    window: Duration,
    speed_interval: Duration,
    usage_interval: Duration,
    shared: Arc<Shared>,
    speed_job: Mutex<Option<Job>>,
    usage_job: Mutex<Option<Job>>,
}

impl<S: ByteCounterSource + 'static> NetworkSpeedMonitor<S> {
    pub fn new(source: S) -> Self {
        Self::with_intervals(
            source,
            DEFAULT_SAMPLE_WINDOW,
            DEFAULT_SPEED_INTERVAL,
            DEFAULT_USAGE_INTERVAL,
        )
    }

    pub fn with_intervals(
        source: S,
        window: Duration,
        speed_interval: Duration,
        usage_interval: Duration,
    ) -> Self {
        Self {
            source: Arc::new(source),
            window,
            speed_interval,
            usage_interval,
            shared: Arc::new(Shared::default()),
            speed_job: Mutex::new(None),
            usage_job: Mutex::new(None),
        }
    }

    /// Start the throughput worker. A second call while it runs is ignored.
    pub fn start(&self) {
        let mut job = self.speed_job.lock();
        if job.as_ref().is_some_and(Job::is_active) {
            warn!("network monitor job is already active, ignoring start()");
            return;
        }

        let stop = Interrupt::new();
        let sampler = NetworkByteSampler::with_interrupt(
            Arc::clone(&self.source),
            self.window,
            stop.clone(),
        );
        let shared = Arc::clone(&self.shared);
        let interval = self.speed_interval;

        info!(
            interval_ms = interval.as_millis() as u64,
            window_ms = self.window.as_millis() as u64,
            "starting network monitor"
        );
        let handle = thread::Builder::new()
            .name("netsample-speed".into())
            .spawn(move || speed_loop(sampler, shared, interval));

        match handle {
            Ok(handle) => *job = Some(Job { stop, handle }),
            Err(e) => warn!(error = %e, "failed to spawn network monitor worker"),
        }
    }

    /// Track `uid` and start the usage worker if it is not already running.
    pub fn set_app_uid(&self, uid: u32) {
        self.shared.uid.store(uid, Ordering::Relaxed);
        self.shared.uid_set.store(true, Ordering::Relaxed);
        self.start_usage_monitor();
    }

    fn start_usage_monitor(&self) {
        debug!("usage monitor start requested");
        let mut job = self.usage_job.lock();
        if job.as_ref().is_some_and(Job::is_active) {
            warn!("data usage job is already active, ignoring start");
            return;
        }

        let stop = Interrupt::new();
        let sampler = NetworkByteSampler::with_interrupt(
            Arc::clone(&self.source),
            Duration::ZERO,
            stop.clone(),
        );
        let shared = Arc::clone(&self.shared);
        let interval = self.usage_interval;

        let handle = thread::Builder::new()
            .name("netsample-usage".into())
            .spawn({
                let stop = stop.clone();
                move || usage_loop(sampler, shared, interval, stop)
            });

        match handle {
            Ok(handle) => *job = Some(Job { stop, handle }),
            Err(e) => warn!(error = %e, "failed to spawn usage monitor worker"),
        }
    }

    /// Stop both workers and wait for them to exit
    pub fn stop(&self) {
        match self.speed_job.lock().take() {
            Some(job) if job.is_active() => job.shutdown(),
            Some(job) => {
                warn!("no active monitor job is running");
                job.shutdown();
            }
            None => warn!("no active monitor job is running"),
        }
        match self.usage_job.lock().take() {
            Some(job) if job.is_active() => job.shutdown(),
            Some(job) => {
                warn!("no active data usage job is running");
                job.shutdown();
            }
            None => warn!("no active data usage job is running"),
        }
    }

    pub fn is_running(&self) -> bool {
        self.speed_job.lock().as_ref().is_some_and(Job::is_active)
    }

    pub fn is_tracking_usage(&self) -> bool {
        self.usage_job.lock().as_ref().is_some_and(Job::is_active)
    }

    /// Latest published throughput
    pub fn speed(&self) -> NetworkSpeed {
        *self.shared.speed.read()
    }

    /// Latest usage of the tracked uid; `None` before the first read or when
    /// the host has no per-uid accounting.
    pub fn usage(&self) -> Option<PerAppByteUsage> {
        *self.shared.usage.read()
    }

    pub fn uid(&self) -> Option<u32> {
        if self.shared.uid_set.load(Ordering::Relaxed) {
            Some(self.shared.uid.load(Ordering::Relaxed))
        } else {
            None
        }
    }
}

impl<S> Drop for NetworkSpeedMonitor<S> {
    fn drop(&mut self) {
        for job in [self.speed_job.get_mut().take(), self.usage_job.get_mut().take()]
            .into_iter()
            .flatten()
        {
            job.shutdown();
        }
    }
}

fn speed_loop<S: ByteCounterSource>(
    sampler: NetworkByteSampler<S>,
    shared: Arc<Shared>,
    interval: Duration,
) {
    let stop = sampler.interrupt_handle();
    loop {
        if stop.wait_for(interval).is_interrupted() {
            break;
        }
        let sample = sampler.measure_instantaneous_throughput();
        if sample.interrupted {
            // Cut short by stop(); not a full window
            break;
        }
        *shared.speed.write() = NetworkSpeed::now(sample.bytes);
        CURRENT_SPEED.store(sample.bytes, Ordering::Relaxed);
    }
    debug!("network monitor worker exited");
}

fn usage_loop<S: ByteCounterSource>(
    sampler: NetworkByteSampler<S>,
    shared: Arc<Shared>,
    interval: Duration,
    stop: Interrupt,
) {
    let mut last: Option<PerAppByteUsage> = None;
    loop {
        if stop.wait_for(interval).is_interrupted() {
            break;
        }
        let uid = shared.uid.load(Ordering::Relaxed);
        let usage = sampler.query_per_app_byte_usage(uid);
        if usage != last {
            if let Some(u) = usage {
                debug!(uid, sent = u.bytes_sent, received = u.bytes_received, "usage changed");
            }
            *shared.usage.write() = usage;
            last = usage;
        }
    }
    debug!("usage monitor worker exited");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::counters::fake::FakeCounters;
    use serial_test::serial;
    use std::time::Instant;

    const FAST: Duration = Duration::from_millis(5);

    fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if cond() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        false
    }

    fn fast_monitor(source: FakeCounters) -> NetworkSpeedMonitor<FakeCounters> {
        NetworkSpeedMonitor::with_intervals(source, FAST, FAST, FAST)
    }

    #[test]
    #[serial(current_speed)]
    fn test_publishes_throughput() {
        let monitor = fast_monitor(FakeCounters::stepping(1234));
        assert!(monitor.speed().is_empty());

        monitor.start();
        assert!(monitor.is_running());
        assert!(wait_until(|| monitor.speed().bytes_per_second == 1234));
        assert!(wait_until(|| current_speed() == 1234));
        assert!(!monitor.speed().is_empty());

        monitor.stop();
        assert!(!monitor.is_running());
    }

    #[test]
    #[serial(current_speed)]
    fn test_current_speed_is_process_wide() {
        let first = fast_monitor(FakeCounters::stepping(4321));
        first.start();
        assert!(wait_until(|| current_speed() == 4321));
        first.stop();
        drop(first);

        // Outlives the monitor that published it
        assert_eq!(current_speed(), 4321);

        let second = fast_monitor(FakeCounters::stepping(8765));
        assert!(second.speed().is_empty());
        assert_eq!(current_speed(), 4321);
        second.start();
        assert!(wait_until(|| current_speed() == 8765));
        second.stop();
    }

    #[test]
    #[serial(current_speed)]
    fn test_start_twice_keeps_one_worker() {
        let monitor = fast_monitor(FakeCounters::constant(0, 0));
        monitor.start();
        monitor.start();
        assert!(monitor.is_running());
        monitor.stop();
        assert!(!monitor.is_running());
    }

    #[test]
    fn test_stop_without_start() {
        let monitor = fast_monitor(FakeCounters::constant(0, 0));
        monitor.stop();
        assert!(!monitor.is_running());
        assert!(!monitor.is_tracking_usage());
    }

    #[test]
    fn test_tracks_uid_usage() {
        let monitor = fast_monitor(FakeCounters::constant(0, 0).with_uid(42, 200, 300));
        assert_eq!(monitor.uid(), None);

        monitor.set_app_uid(42);
        assert_eq!(monitor.uid(), Some(42));
        assert!(monitor.is_tracking_usage());
        assert!(wait_until(|| monitor.usage().is_some()));
        assert_eq!(
            monitor.usage(),
            Some(PerAppByteUsage {
                bytes_sent: 200,
                bytes_received: 300,
            })
        );

        monitor.stop();
        assert!(!monitor.is_tracking_usage());
    }

    #[test]
    fn test_switching_uid_reuses_worker() {
        let monitor = fast_monitor(
            FakeCounters::constant(0, 0)
                .with_uid(1, 10, 20)
                .with_uid(2, 30, 40),
        );
        monitor.set_app_uid(1);
        assert!(wait_until(|| monitor.usage().map(|u| u.bytes_sent) == Some(10)));

        monitor.set_app_uid(2);
        assert!(wait_until(|| monitor.usage().map(|u| u.bytes_sent) == Some(30)));
        assert_eq!(monitor.usage().map(|u| u.bytes_received), Some(40));
    }

    #[test]
    #[serial(current_speed)]
    fn test_stop_interrupts_long_window() {
        let monitor = NetworkSpeedMonitor::with_intervals(
            FakeCounters::stepping(1),
            Duration::from_secs(60),
            Duration::from_millis(1),
            DEFAULT_USAGE_INTERVAL,
        );
        monitor.start();
        thread::sleep(Duration::from_millis(20));

        let started = Instant::now();
        monitor.stop();
        assert!(started.elapsed() < Duration::from_secs(30));
        // The truncated window is never published
        assert!(monitor.speed().is_empty());
    }

    #[test]
    #[serial(current_speed)]
    fn test_drop_stops_workers() {
        let source = Arc::new(FakeCounters::constant(0, 0).with_uid(1, 1, 1));
        let monitor = NetworkSpeedMonitor::with_intervals(Arc::clone(&source), FAST, FAST, FAST);
        monitor.start();
        monitor.set_app_uid(1);
        assert!(monitor.is_running());
        assert!(monitor.is_tracking_usage());
        // The monitor holds a clone until dropped
        assert!(Arc::strong_count(&source) > 1);

        drop(monitor);
        // Workers joined and released their samplers
        assert_eq!(Arc::strong_count(&source), 1);
    }
}
