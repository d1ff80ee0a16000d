//! Platform Event Pump
//!
//! Native notifications, already stripped of OS structures, travel from the
//! platform thread to the pipeline thread over a crossbeam channel. The
//! pipeline side blocks with a timeout and is woken early by
//! [`PumpHandle::cancel`].
//!
//! # Flow
//!
//! ```text
//! platform thread ──PumpHandle::send──> channel ──NativeEventPump::wait_timeout──> InputContext::handle_native
//!                  └─PumpHandle::cancel──> Wake ─┘
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};
use serde::{Deserialize, Serialize};

use crate::error::{InputError, Result};
use crate::events::{FingerId, FingerPhase, TouchId, WindowId};

pub mod headless;

pub use headless::HeadlessBackend;

fn default_pressure() -> f32 {
    1.0
}

/// Native notification, already decoded from the platform's own structures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NativeEvent {
    /// X server key event (keycode includes the server's offset)
    X11Key { keycode: u32, pressed: bool },

    /// Linux console / evdev key event
    ConsoleKey { code: u32, pressed: bool },

    /// Browser keydown/keyup with DOM `keyCode` and `location`
    BrowserKey {
        key_code: u32,
        #[serde(default)]
        location: u32,
        pressed: bool,
    },

    /// Absolute pointer position inside `window`
    PointerMotion {
        window: Option<WindowId>,
        x: i32,
        y: i32,
    },

    /// Raw relative pointer displacement
    PointerDelta { dx: i32, dy: i32 },

    PointerButton {
        window: Option<WindowId>,
        button: u8,
        pressed: bool,
        /// Click count reported by the platform, if any
        #[serde(default)]
        clicks: Option<u8>,
    },

    Wheel {
        window: Option<WindowId>,
        x: f32,
        y: f32,
        #[serde(default)]
        flipped: bool,
    },

    /// Committed text
    Text { text: String },

    /// IME composition in progress
    Composition { text: String, start: i32, length: i32 },

    KeyboardFocus { window: Option<WindowId> },

    PointerFocus { window: Option<WindowId> },

    WindowDestroyed { window: WindowId },

    /// Touch contact, coordinates normalised to the window
    Touch {
        touch_id: TouchId,
        finger_id: FingerId,
        window: Option<WindowId>,
        phase: FingerPhase,
        x: f32,
        y: f32,
        #[serde(default = "default_pressure")]
        pressure: f32,
    },

    Quit,
}

enum PumpMessage {
    Event(NativeEvent),
    Wake,
}

/// Outcome of a blocking wait
#[derive(Debug, Clone, PartialEq)]
pub enum PumpWait {
    Event(NativeEvent),
    Timeout,
    Cancelled,
}

/// Producer side of the pump; cloneable across platform threads
#[derive(Clone)]
pub struct PumpHandle {
    tx: Sender<PumpMessage>,
    cancelled: Arc<AtomicBool>,
}

impl PumpHandle {
    /// Queue a native event
    ///
    /// # Errors
    ///
    /// [`InputError::Backend`] when the pump has been dropped.
    pub fn send(&self, event: NativeEvent) -> Result<()> {
        self.tx
            .send(PumpMessage::Event(event))
            .map_err(|_| InputError::Backend("event pump closed".to_string()))
    }

    /// Request cancellation and wake any blocked wait
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        let _ = self.tx.try_send(PumpMessage::Wake);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for PumpHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PumpHandle")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Consumer side of the pump
pub struct NativeEventPump {
    rx: Receiver<PumpMessage>,
    handle: PumpHandle,
}

impl NativeEventPump {
    /// Unbounded pump
    pub fn new() -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self::from_parts(tx, rx)
    }

    /// Pump whose producers block once `capacity` events are pending
    pub fn bounded(capacity: usize) -> Self {
        let (tx, rx) = crossbeam_channel::bounded(capacity.max(1));
        Self::from_parts(tx, rx)
    }

    fn from_parts(tx: Sender<PumpMessage>, rx: Receiver<PumpMessage>) -> Self {
        Self {
            rx,
            handle: PumpHandle {
                tx,
                cancelled: Arc::new(AtomicBool::new(false)),
            },
        }
    }

    /// New producer handle
    pub fn handle(&self) -> PumpHandle {
        self.handle.clone()
    }

    /// Next pending event without blocking
    pub fn poll(&self) -> Option<NativeEvent> {
        loop {
            match self.rx.try_recv() {
                Ok(PumpMessage::Event(event)) => return Some(event),
                Ok(PumpMessage::Wake) => continue,
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return None,
            }
        }
    }

    /// Block until an event arrives, `timeout` passes or the pump is cancelled
    ///
    /// Cancellation is sticky until [`reset_cancel`](Self::reset_cancel).
    pub fn wait_timeout(&self, timeout: Duration) -> PumpWait {
        if self.handle.is_cancelled() {
            return PumpWait::Cancelled;
        }
        let deadline = std::time::Instant::now() + timeout;
        loop {
            match self.rx.recv_deadline(deadline) {
                Ok(PumpMessage::Event(event)) => return PumpWait::Event(event),
                Ok(PumpMessage::Wake) => {
                    if self.handle.is_cancelled() {
                        return PumpWait::Cancelled;
                    }
                }
                // The pump owns a sender, so the channel never disconnects
                Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => {
                    return PumpWait::Timeout
                }
            }
        }
    }

    pub fn reset_cancel(&self) {
        self.handle.cancelled.store(false, Ordering::SeqCst);
    }

    /// Events currently pending
    pub fn pending(&self) -> usize {
        self.rx.len()
    }
}

impl Default for NativeEventPump {
    fn default() -> Self {
        Self::new()
    }
}
