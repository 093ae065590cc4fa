/// Interval scheduling for continuous mode.
///
/// One thread, strictly sequential cycles: run, sleep the interval, repeat.
/// A cycle that overruns simply pushes the next start later; overlapping
/// cycles cannot happen. The interval sleep happens in short slices so a
/// stop request takes effect within a fraction of a second instead of a full
/// poll interval.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// How finely the interval sleep is sliced.
const SLEEP_SLICE: Duration = Duration::from_millis(200);

/// Cloneable handle that requests the scheduler to stop after the current
/// cycle (or mid-wait).
#[derive(Clone)]
pub struct StopHandle {
    stop: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }
}

pub struct Scheduler {
    interval: Duration,
    stop: Arc<AtomicBool>,
}

impl Scheduler {
    pub fn new(interval: Duration) -> Scheduler {
        Scheduler {
            interval,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            stop: Arc::clone(&self.stop),
        }
    }

    /// Runs `cycle` immediately, then every interval, until stopped. The
    /// cycle closure handles its own failures; this loop never sees them.
    pub fn run(&self, mut cycle: impl FnMut()) {
        while !self.stop.load(Ordering::SeqCst) {
            cycle();
            self.wait_interval();
        }
    }

    fn wait_interval(&self) {
        let deadline = Instant::now() + self.interval;
        while Instant::now() < deadline {
            if self.stop.load(Ordering::SeqCst) {
                return;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            thread::sleep(remaining.min(SLEEP_SLICE));
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
