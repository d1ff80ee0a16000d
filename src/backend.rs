//! Video Backend Capabilities
//!
//! The state machines never talk to a windowing system directly. Everything
//! platform-owned (window geometry, pointer warping, native relative mode,
//! hardware cursors, IME, OS key state) is reached through [`VideoBackend`].
//! Operations a backend does not implement report [`InputError::Unsupported`]
//! and must have no side effects.

use enumflags2::{bitflags, BitFlags};
use serde::{Deserialize, Serialize};

use crate::error::{InputError, Result};
use crate::events::{Event, EventData, EventQueue, WindowId};
use crate::scancode::{KeyMods, Scancode};

/// Optional backend feature
#[bitflags]
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Warp = 1 << 0,
    RelativeMode = 1 << 1,
    Capture = 1 << 2,
    CreateCursor = 1 << 3,
    CreateSystemCursor = 1 << 4,
    ShowCursor = 1 << 5,
    GlobalMouseState = 1 << 6,
    TextInput = 1 << 7,
    KeyLockState = 1 << 8,
    PressedKeys = 1 << 9,
}

pub type Capabilities = BitFlags<Capability>;

/// Backend-owned hardware cursor
pub type CursorHandle = u64;

/// Built-in cursor shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemCursor {
    Arrow,
    IBeam,
    Wait,
    Crosshair,
    WaitArrow,
    SizeNwse,
    SizeNesw,
    SizeWe,
    SizeNs,
    SizeAll,
    No,
    Hand,
}

/// ARGB8888 cursor image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u32>,
}

impl CursorImage {
    /// Validate that the pixel buffer covers the dimensions
    pub fn new(width: u32, height: u32, pixels: Vec<u32>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(InputError::invalid("cursor image must not be empty"));
        }
        if pixels.len() != width as usize * height as usize {
            return Err(InputError::invalid(format!(
                "cursor image {}x{} needs {} pixels, got {}",
                width,
                height,
                width as usize * height as usize,
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height
    }
}

/// Screen rectangle hint for IME candidate windows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

/// Windowing-system services consumed by the input state machines
#[allow(unused_variables)]
pub trait VideoBackend: Send {
    /// Features this backend implements
    fn capabilities(&self) -> Capabilities;

    /// Client-area size of a window, `None` if unknown
    fn window_size(&self, window: WindowId) -> Option<(i32, i32)>;

    /// Whether the window holds an input grab
    fn window_grabbed(&self, window: WindowId) -> bool {
        false
    }

    fn warp_mouse(&mut self, window: WindowId, x: i32, y: i32) -> Result<()> {
        Err(InputError::Unsupported("warp"))
    }

    fn set_relative_mode(&mut self, enabled: bool) -> Result<()> {
        Err(InputError::Unsupported("relative mouse mode"))
    }

    /// Capture the pointer to `window`, or release with `None`
    fn capture_mouse(&mut self, window: Option<WindowId>) -> Result<()> {
        Err(InputError::Unsupported("mouse capture"))
    }

    fn create_cursor(&mut self, image: &CursorImage, hot_x: i32, hot_y: i32) -> Result<CursorHandle> {
        Err(InputError::Unsupported("color cursors"))
    }

    fn create_system_cursor(&mut self, cursor: SystemCursor) -> Result<CursorHandle> {
        Err(InputError::Unsupported("system cursors"))
    }

    /// Display a cursor, or hide it with `None`
    fn show_cursor(&mut self, cursor: Option<CursorHandle>) -> Result<()> {
        Err(InputError::Unsupported("cursor display"))
    }

    fn free_cursor(&mut self, cursor: CursorHandle) {}

    /// Desktop-relative pointer position and button mask
    fn global_mouse_state(&self) -> Result<(i32, i32, u32)> {
        Err(InputError::Unsupported("global mouse state"))
    }

    fn start_text_input(&mut self) {}

    fn stop_text_input(&mut self) {}

    fn set_text_input_rect(&mut self, rect: Rect) {}

    /// Caps/Num/Scroll lock state as the OS sees it
    fn key_lock_state(&self) -> Option<KeyMods> {
        None
    }

    /// Keys the OS considers held right now
    fn pressed_scancodes(&self) -> Option<Vec<Scancode>> {
        None
    }
}

/// Per-call routing handed to the state machines: where to push events,
/// which backend to call, and the timestamp to stamp on everything.
pub struct Dispatch<'a> {
    pub backend: &'a mut dyn VideoBackend,
    pub queue: &'a EventQueue,
    pub timestamp: u64,
}

impl<'a> Dispatch<'a> {
    pub fn new(backend: &'a mut dyn VideoBackend, queue: &'a EventQueue, timestamp: u64) -> Self {
        Self {
            backend,
            queue,
            timestamp,
        }
    }

    /// Queue an event, returning `true` if it was accepted
    pub fn push(&self, data: EventData) -> bool {
        self.queue.push(Event::new(self.timestamp, data))
    }

    pub fn has(&self, capability: Capability) -> bool {
        self.backend.capabilities().contains(capability)
    }

    /// Reborrow for a nested call
    pub fn reborrow(&mut self) -> Dispatch<'_> {
        Dispatch {
            backend: &mut *self.backend,
            queue: self.queue,
            timestamp: self.timestamp,
        }
    }
}
