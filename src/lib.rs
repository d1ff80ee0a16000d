//! # lamco-input-core
//!
//! Canonical input pipeline: platform notifications in, canonical events out.
//!
//! # Architecture
//!
//! ```text
//! platform thread
//!   └─> NativeEventPump (crossbeam channel, cancellable wait)
//!         └─> InputContext
//!               ├─> scancode tables ─> Keyboard (keys, modifiers, text, IME)
//!               ├─> Mouse (focus, motion, buttons, clicks, wheel, relative mode, cursors)
//!               ├─> TouchRegistry (devices, fingers, pointer emulation)
//!               ├─> JoystickSubsystem
//!               │     ├─> LowLevelReport parsing
//!               │     ├─> CorrelationEngine (shadow slots, guide, triggers, rumble)
//!               │     └─> HotplugMonitor (tokio task)
//!               └─> HapticRegistry (effects, software deadlines)
//!                     └─> EventQueue ─> application
//! ```
//!
//! Everything platform-owned is reached through [`backend::VideoBackend`]
//! and the collaborator traits in [`joystick`] and [`haptic`]. There is no
//! global state apart from the log sink in [`logging`].

#![warn(clippy::all)]

/// Crate error type and classification
pub mod error;

/// Spinlock and monotonic ticks
pub mod sync;

/// Priority-filtered log sink
pub mod logging;

/// Canonical scancodes, keycodes and native translation tables
pub mod scancode;

/// Canonical events and the event queue
pub mod events;

/// Video backend capability trait
pub mod backend;

/// Configuration
pub mod config;

/// Mouse state machine
pub mod mouse;

/// Keyboard state machine
pub mod keyboard;

/// Touch devices and fingers
pub mod touch;

/// Joysticks, cross-source correlation and hot-plug
pub mod joystick;

/// Haptic devices and effects
pub mod haptic;

/// Native event model, event pump and the headless backend
pub mod platform;

/// Root context
pub mod context;

pub use backend::{Capabilities, Capability, Dispatch, VideoBackend};
pub use config::Config;
pub use context::InputContext;
pub use error::{ErrorClass, InputError, Result};
pub use events::{Event, EventData, EventKind, EventQueue};
pub use platform::{NativeEvent, NativeEventPump, PumpHandle, PumpWait};
