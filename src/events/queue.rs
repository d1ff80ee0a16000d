//! Event Queue
//!
//! Multi-producer FIFO between the pump thread and the application. Pushes
//! are filtered by a per-kind enable mask held in an atomic so producers never
//! take the lock for disabled kinds.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, warn};

use super::{Event, EventKind, EventKinds};
use crate::error::{InputError, Result};

/// Maximum queued events before pushes are dropped
pub const DEFAULT_QUEUE_CAPACITY: usize = 65535;

/// Thread-safe canonical event FIFO
#[derive(Debug)]
pub struct EventQueue {
    events: Mutex<VecDeque<Event>>,
    available: Condvar,
    disabled: AtomicU32,
    capacity: usize,
    dropped: AtomicU64,
}

impl EventQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            events: Mutex::new(VecDeque::new()),
            available: Condvar::new(),
            disabled: AtomicU32::new(0),
            capacity: capacity.max(1),
            dropped: AtomicU64::new(0),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn disabled_kinds(&self) -> EventKinds {
        EventKinds::from_bits_truncate(self.disabled.load(Ordering::Acquire))
    }

    /// Whether pushes of `kind` are accepted
    pub fn is_enabled(&self, kind: EventKind) -> bool {
        !self.disabled_kinds().contains(kind)
    }

    /// Enable or disable a kind; disabling also discards queued events of it
    pub fn set_enabled(&self, kind: EventKind, enabled: bool) {
        let bit = EventKinds::from(kind).bits();
        if enabled {
            self.disabled.fetch_and(!bit, Ordering::AcqRel);
        } else {
            self.disabled.fetch_or(bit, Ordering::AcqRel);
            self.flush(kind.into());
        }
        debug!(?kind, enabled, "Event kind filter changed");
    }

    /// Append an event
    ///
    /// # Errors
    ///
    /// Returns [`InputError::EventQueueFull`] when the queue is at capacity.
    /// A disabled kind is not an error: `Ok(false)` is returned.
    pub fn try_push(&self, event: Event) -> Result<bool> {
        if !self.is_enabled(event.kind()) {
            return Ok(false);
        }
        let mut events = self.events.lock();
        if events.len() >= self.capacity {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return Err(InputError::EventQueueFull(self.capacity));
        }
        events.push_back(event);
        drop(events);
        self.available.notify_one();
        Ok(true)
    }

    /// Append an event, returning `true` only when it was queued
    pub fn push(&self, event: Event) -> bool {
        let kind = event.kind();
        match self.try_push(event) {
            Ok(queued) => queued,
            Err(e) => {
                warn!(?kind, "Dropping event: {}", e);
                false
            }
        }
    }

    /// Pop the oldest event
    pub fn poll(&self) -> Option<Event> {
        self.events.lock().pop_front()
    }

    /// Pop the oldest event, waiting up to `timeout` for one to arrive
    pub fn wait_timeout(&self, timeout: Duration) -> Option<Event> {
        // Unrepresentable deadlines wait without one
        let deadline = Instant::now().checked_add(timeout);
        let mut events = self.events.lock();
        loop {
            if let Some(event) = events.pop_front() {
                return Some(event);
            }
            match deadline {
                Some(deadline) => {
                    if self.available.wait_until(&mut events, deadline).timed_out() {
                        return events.pop_front();
                    }
                }
                None => self.available.wait(&mut events),
            }
        }
    }

    /// Take every queued event
    pub fn drain(&self) -> Vec<Event> {
        self.events.lock().drain(..).collect()
    }

    /// Discard queued events of the given kinds
    pub fn flush(&self, kinds: EventKinds) {
        self.events.lock().retain(|event| !kinds.contains(event.kind()));
    }

    /// Whether any queued event is of the given kinds
    pub fn has(&self, kinds: EventKinds) -> bool {
        self.events
            .lock()
            .iter()
            .any(|event| kinds.contains(event.kind()))
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Events refused because the queue was full
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}
