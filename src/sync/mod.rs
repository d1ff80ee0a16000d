//! Synchronization primitives and time

pub mod spinlock;
pub mod ticks;

pub use spinlock::{SpinGuard, SpinLock};
pub use ticks::{ticks_ms, ticks_passed, Clock, ManualClock, SystemClock};
