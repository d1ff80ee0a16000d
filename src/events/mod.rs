//! Canonical Events
//!
//! Every state machine reports what happened as an [`Event`]: a millisecond
//! timestamp plus an [`EventData`] payload. Consumers filter by
//! [`EventKind`], which is also the unit the queue enables and disables.

use enumflags2::{bitflags, BitFlags};
use serde::{Deserialize, Serialize};

use crate::scancode::{KeyMods, Keycode, Scancode};

pub mod queue;

pub use queue::{EventQueue, DEFAULT_QUEUE_CAPACITY};

/// Opaque window handle supplied by the video backend
pub type WindowId = u32;
/// Mouse instance id
pub type MouseId = u32;
/// Touch device id
pub type TouchId = i64;
/// Finger id, unique within a touch device while the contact is active
pub type FingerId = i64;
/// Joystick instance id
pub type JoystickId = u32;

/// Mouse id reported for pointer events synthesised from touch
pub const TOUCH_MOUSE_ID: MouseId = u32::MAX;
/// Touch device id reported for touch events synthesised from the mouse
pub const MOUSE_TOUCH_ID: TouchId = -1;

/// Event kind, used for filtering
#[bitflags]
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Quit = 1 << 0,
    Window = 1 << 1,
    KeyDown = 1 << 2,
    KeyUp = 1 << 3,
    TextEditing = 1 << 4,
    TextInput = 1 << 5,
    MouseMotion = 1 << 6,
    MouseButtonDown = 1 << 7,
    MouseButtonUp = 1 << 8,
    MouseWheel = 1 << 9,
    JoyAxis = 1 << 10,
    JoyButtonDown = 1 << 11,
    JoyButtonUp = 1 << 12,
    JoyHat = 1 << 13,
    JoyDeviceAdded = 1 << 14,
    JoyDeviceRemoved = 1 << 15,
    FingerDown = 1 << 16,
    FingerUp = 1 << 17,
    FingerMotion = 1 << 18,
}

/// Set of event kinds
pub type EventKinds = BitFlags<EventKind>;

/// Window notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowEvent {
    /// Pointer entered the window
    Enter,
    /// Pointer left the window
    Leave,
    /// Window gained keyboard focus
    FocusGained,
    /// Window lost keyboard focus
    FocusLost,
}

/// Scroll direction convention reported by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WheelDirection {
    #[default]
    Normal,
    Flipped,
}

/// Finger contact transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FingerPhase {
    Down,
    Up,
    Motion,
}

/// Event payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventData {
    Quit,
    Window {
        window: WindowId,
        event: WindowEvent,
    },
    Key {
        window: Option<WindowId>,
        pressed: bool,
        repeat: bool,
        scancode: Scancode,
        keycode: Keycode,
        modifiers: KeyMods,
    },
    TextEditing {
        window: Option<WindowId>,
        text: String,
        start: i32,
        length: i32,
    },
    TextInput {
        window: Option<WindowId>,
        text: String,
    },
    MouseMotion {
        window: Option<WindowId>,
        which: MouseId,
        state: u32,
        x: i32,
        y: i32,
        xrel: i32,
        yrel: i32,
    },
    MouseButton {
        window: Option<WindowId>,
        which: MouseId,
        button: u8,
        pressed: bool,
        clicks: u8,
        x: i32,
        y: i32,
    },
    MouseWheel {
        window: Option<WindowId>,
        which: MouseId,
        x: i32,
        y: i32,
        precise_x: f32,
        precise_y: f32,
        direction: WheelDirection,
    },
    JoyAxis {
        which: JoystickId,
        axis: u8,
        value: i16,
    },
    JoyButton {
        which: JoystickId,
        button: u8,
        pressed: bool,
    },
    JoyHat {
        which: JoystickId,
        hat: u8,
        value: u8,
    },
    JoyDeviceAdded {
        which: JoystickId,
    },
    JoyDeviceRemoved {
        which: JoystickId,
    },
    Finger {
        phase: FingerPhase,
        touch_id: TouchId,
        finger_id: FingerId,
        window: Option<WindowId>,
        x: f32,
        y: f32,
        dx: f32,
        dy: f32,
        pressure: f32,
    },
}

impl EventData {
    pub fn kind(&self) -> EventKind {
        match self {
            EventData::Quit => EventKind::Quit,
            EventData::Window { .. } => EventKind::Window,
            EventData::Key { pressed: true, .. } => EventKind::KeyDown,
            EventData::Key { pressed: false, .. } => EventKind::KeyUp,
            EventData::TextEditing { .. } => EventKind::TextEditing,
            EventData::TextInput { .. } => EventKind::TextInput,
            EventData::MouseMotion { .. } => EventKind::MouseMotion,
            EventData::MouseButton { pressed: true, .. } => EventKind::MouseButtonDown,
            EventData::MouseButton { pressed: false, .. } => EventKind::MouseButtonUp,
            EventData::MouseWheel { .. } => EventKind::MouseWheel,
            EventData::JoyAxis { .. } => EventKind::JoyAxis,
            EventData::JoyButton { pressed: true, .. } => EventKind::JoyButtonDown,
            EventData::JoyButton { pressed: false, .. } => EventKind::JoyButtonUp,
            EventData::JoyHat { .. } => EventKind::JoyHat,
            EventData::JoyDeviceAdded { .. } => EventKind::JoyDeviceAdded,
            EventData::JoyDeviceRemoved { .. } => EventKind::JoyDeviceRemoved,
            EventData::Finger { phase, .. } => match phase {
                FingerPhase::Down => EventKind::FingerDown,
                FingerPhase::Up => EventKind::FingerUp,
                FingerPhase::Motion => EventKind::FingerMotion,
            },
        }
    }
}

/// Timestamped canonical event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Milliseconds on the context clock
    pub timestamp: u64,
    #[serde(flatten)]
    pub data: EventData,
}

impl Event {
    pub fn new(timestamp: u64, data: EventData) -> Self {
        Self { timestamp, data }
    }

    pub fn kind(&self) -> EventKind {
        self.data.kind()
    }
}

/// Parse an event kind name as written in configuration
pub fn parse_event_kind(name: &str) -> Option<EventKind> {
    serde_json::from_value(serde_json::Value::String(name.to_string())).ok()
}
