use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// How a timed wait ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Elapsed,
    Interrupted,
}

impl WaitOutcome {
    pub fn is_interrupted(self) -> bool {
        self == WaitOutcome::Interrupted
    }
}

/// Sticky cancellation flag for timed waits.
///
/// Clones share the same flag. Once raised, every current and future
/// `wait_for` returns immediately until `reset` lowers it again.
#[derive(Clone, Default)]
pub struct Interrupt {
    inner: Arc<InterruptInner>,
}

#[derive(Default)]
struct InterruptInner {
    raised: Mutex<bool>,
    cond: Condvar,
}

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the flag and wake every waiter
    pub fn interrupt(&self) {
        let mut raised = self.inner.raised.lock();
        *raised = true;
        self.inner.cond.notify_all();
    }

    pub fn reset(&self) {
        *self.inner.raised.lock() = false;
    }

    pub fn is_interrupted(&self) -> bool {
        *self.inner.raised.lock()
    }

    /// Block for `duration` or until interrupted, whichever comes first.
    /// A duration past the end of `Instant` waits for the interrupt alone.
    pub fn wait_for(&self, duration: Duration) -> WaitOutcome {
        let mut raised = self.inner.raised.lock();
        let Some(deadline) = Instant::now().checked_add(duration) else {
            while !*raised {
                self.inner.cond.wait(&mut raised);
            }
            return WaitOutcome::Interrupted;
        };
        while !*raised {
            if self.inner.cond.wait_until(&mut raised, deadline).timed_out() {
                return if *raised {
                    WaitOutcome::Interrupted
                } else {
                    WaitOutcome::Elapsed
                };
            }
        }
        WaitOutcome::Interrupted
    }
}

impl std::fmt::Debug for Interrupt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interrupt")
            .field("raised", &self.is_interrupted())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_wait_elapses() {
        let interrupt = Interrupt::new();
        let started = Instant::now();
        assert_eq!(interrupt.wait_for(Duration::from_millis(20)), WaitOutcome::Elapsed);
        assert!(started.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_raised_flag_returns_immediately() {
        let interrupt = Interrupt::new();
        interrupt.interrupt();
        let started = Instant::now();
        assert_eq!(interrupt.wait_for(Duration::from_secs(10)), WaitOutcome::Interrupted);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_interrupt_wakes_waiter() {
        let interrupt = Interrupt::new();
        let waiter = interrupt.clone();
        let handle = thread::spawn(move || waiter.wait_for(Duration::from_secs(30)));

        thread::sleep(Duration::from_millis(20));
        interrupt.interrupt();

        assert_eq!(handle.join().unwrap(), WaitOutcome::Interrupted);
    }

    #[test]
    fn test_unbounded_wait_with_raised_flag() {
        let interrupt = Interrupt::new();
        interrupt.interrupt();
        assert_eq!(interrupt.wait_for(Duration::MAX), WaitOutcome::Interrupted);
    }

    #[test]
    fn test_interrupt_wakes_unbounded_waiter() {
        let interrupt = Interrupt::new();
        let waiter = interrupt.clone();
        let handle = thread::spawn(move || waiter.wait_for(Duration::MAX));

        thread::sleep(Duration::from_millis(20));
        interrupt.interrupt();

        assert_eq!(handle.join().unwrap(), WaitOutcome::Interrupted);
    }

    #[test]
    fn test_reset_lowers_flag() {
        let interrupt = Interrupt::new();
        interrupt.interrupt();
        assert!(interrupt.is_interrupted());
        interrupt.reset();
        assert!(!interrupt.is_interrupted());
        assert_eq!(interrupt.wait_for(Duration::from_millis(1)), WaitOutcome::Elapsed);
    }
}
