//! Millisecond Tick Source
//!
//! All state machines read time through [`Clock`] so double-click windows,
//! rumble deadlines and guide-button candidates can be driven by tests.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use super::spinlock::SpinLock;

static EPOCH: SpinLock<Option<Instant>> = SpinLock::new(None);

/// Milliseconds since the first call in this process
pub fn ticks_ms() -> u64 {
    let epoch = {
        let mut epoch = EPOCH.lock();
        *epoch.get_or_insert_with(Instant::now)
    };
    epoch.elapsed().as_millis() as u64
}

/// `true` once `now` has reached or passed `deadline`
pub fn ticks_passed(now: u64, deadline: u64) -> bool {
    now >= deadline
}

/// Monotonic millisecond clock
pub trait Clock: Send + Sync {
    /// Current time in milliseconds
    fn now_ms(&self) -> u64;
}

/// Process-wide monotonic clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        ticks_ms()
    }
}

/// Clock advanced by hand
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    /// Create a clock starting at `start_ms`
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: AtomicU64::new(start_ms),
        }
    }

    /// Advance the clock
    pub fn advance(&self, ms: u64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }

    /// Set the absolute time
    pub fn set(&self, ms: u64) {
        self.now.store(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}
