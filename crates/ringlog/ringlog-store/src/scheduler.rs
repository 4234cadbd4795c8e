//! Periodic header flush. The store itself never starts a background thread;
//! an embedder's own scheduler drives `CappedStore::flush_header`. The
//! implementations here are the minimal default for a store run standalone
//! (tests, the demo binary) rather than wired into an outer profiler's timer.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

pub type PeriodicTask = Box<dyn Fn() + Send + Sync>;

pub trait TaskHandle: Send + Sync {
    fn cancel(&self);
}

pub trait Scheduler: Send + Sync {
    fn schedule_periodic(&self, interval: Duration, task: PeriodicTask) -> Box<dyn TaskHandle>;
}

struct ThreadTaskHandle {
    cancelled: Arc<AtomicBool>,
}

impl TaskHandle for ThreadTaskHandle {
    fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

/// Drives a `PeriodicTask` off a plain sleeping background thread, using a
/// `Clock` to compute each tick's deadline up front rather than always
/// sleeping a full `interval` after the task returns — so a slow task or a
/// delayed wakeup doesn't push every later tick back by the same amount.
pub struct ThreadScheduler {
    clock: Arc<dyn Clock>,
}

impl ThreadScheduler {
    pub fn new() -> Self {
        Self {
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

impl Default for ThreadScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for ThreadScheduler {
    fn schedule_periodic(&self, interval: Duration, task: PeriodicTask) -> Box<dyn TaskHandle> {
        let cancelled = Arc::new(AtomicBool::new(false));
        let thread_cancelled = cancelled.clone();
        let clock = self.clock.clone();
        std::thread::spawn(move || {
            let mut next_tick = clock.now() + interval;
            while !thread_cancelled.load(Ordering::SeqCst) {
                std::thread::sleep(next_tick.saturating_duration_since(clock.now()));
                if thread_cancelled.load(Ordering::SeqCst) {
                    break;
                }
                task();
                next_tick += interval;
            }
        });
        Box::new(ThreadTaskHandle { cancelled })
    }
}
