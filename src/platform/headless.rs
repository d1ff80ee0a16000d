//! Headless video backend
//!
//! In-memory windows and a recorded log of every pointer side effect. Used by
//! the replay tool and by tests; capabilities can be narrowed to exercise
//! fallbacks.

use std::collections::{HashMap, HashSet};

use crate::backend::{Capabilities, Capability, CursorHandle, CursorImage, Rect, SystemCursor, VideoBackend};
use crate::error::{InputError, Result};
use crate::events::WindowId;
use crate::scancode::{KeyMods, Scancode};

#[derive(Debug, Clone)]
pub struct HeadlessBackend {
    capabilities: Capabilities,
    windows: HashMap<WindowId, (i32, i32)>,
    grabbed: HashSet<WindowId>,
    warps: Vec<(WindowId, i32, i32)>,
    relative_mode: bool,
    fail_relative_mode: bool,
    captured: Option<WindowId>,
    next_cursor: CursorHandle,
    live_cursors: HashSet<CursorHandle>,
    shown_cursor: Option<CursorHandle>,
    text_input: bool,
    text_input_rect: Option<Rect>,
    lock_state: Option<KeyMods>,
    pressed: Option<Vec<Scancode>>,
    global: (i32, i32, u32),
}

impl HeadlessBackend {
    /// Backend implementing every capability
    pub fn new() -> Self {
        Self::with_capabilities(Capabilities::all())
    }

    pub fn with_capabilities(capabilities: Capabilities) -> Self {
        Self {
            capabilities,
            windows: HashMap::new(),
            grabbed: HashSet::new(),
            warps: Vec::new(),
            relative_mode: false,
            fail_relative_mode: false,
            captured: None,
            next_cursor: 1,
            live_cursors: HashSet::new(),
            shown_cursor: None,
            text_input: false,
            text_input_rect: None,
            lock_state: None,
            pressed: None,
            global: (0, 0, 0),
        }
    }

    /// Builder: add a window
    pub fn with_window(mut self, window: WindowId, width: i32, height: i32) -> Self {
        self.add_window(window, width, height);
        self
    }

    pub fn add_window(&mut self, window: WindowId, width: i32, height: i32) {
        self.windows.insert(window, (width, height));
    }

    pub fn remove_window(&mut self, window: WindowId) {
        self.windows.remove(&window);
        self.grabbed.remove(&window);
    }

    pub fn set_grabbed(&mut self, window: WindowId, grabbed: bool) {
        if grabbed {
            self.grabbed.insert(window);
        } else {
            self.grabbed.remove(&window);
        }
    }

    /// Make native relative mode report failure
    pub fn set_fail_relative_mode(&mut self, fail: bool) {
        self.fail_relative_mode = fail;
    }

    pub fn set_lock_state(&mut self, state: Option<KeyMods>) {
        self.lock_state = state;
    }

    pub fn set_pressed_scancodes(&mut self, pressed: Option<Vec<Scancode>>) {
        self.pressed = pressed;
    }

    pub fn set_global_mouse_state(&mut self, x: i32, y: i32, buttons: u32) {
        self.global = (x, y, buttons);
    }

    /// Warps performed so far
    pub fn warps(&self) -> &[(WindowId, i32, i32)] {
        &self.warps
    }

    pub fn last_warp(&self) -> Option<(WindowId, i32, i32)> {
        self.warps.last().copied()
    }

    pub fn relative_mode_active(&self) -> bool {
        self.relative_mode
    }

    pub fn captured(&self) -> Option<WindowId> {
        self.captured
    }

    pub fn shown_cursor(&self) -> Option<CursorHandle> {
        self.shown_cursor
    }

    pub fn live_cursor_count(&self) -> usize {
        self.live_cursors.len()
    }

    pub fn text_input_active(&self) -> bool {
        self.text_input
    }

    pub fn text_input_rect(&self) -> Option<Rect> {
        self.text_input_rect
    }

    fn require(&self, capability: Capability, what: &'static str) -> Result<()> {
        if self.capabilities.contains(capability) {
            Ok(())
        } else {
            Err(InputError::Unsupported(what))
        }
    }

    fn new_cursor(&mut self) -> CursorHandle {
        let handle = self.next_cursor;
        self.next_cursor += 1;
        self.live_cursors.insert(handle);
        handle
    }
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoBackend for HeadlessBackend {
    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn window_size(&self, window: WindowId) -> Option<(i32, i32)> {
        self.windows.get(&window).copied()
    }

    fn window_grabbed(&self, window: WindowId) -> bool {
        self.grabbed.contains(&window)
    }

    fn warp_mouse(&mut self, window: WindowId, x: i32, y: i32) -> Result<()> {
        self.require(Capability::Warp, "warp")?;
        self.warps.push((window, x, y));
        Ok(())
    }

    fn set_relative_mode(&mut self, enabled: bool) -> Result<()> {
        self.require(Capability::RelativeMode, "relative mouse mode")?;
        if enabled && self.fail_relative_mode {
            return Err(InputError::Backend("relative mode rejected".to_string()));
        }
        self.relative_mode = enabled;
        Ok(())
    }

    fn capture_mouse(&mut self, window: Option<WindowId>) -> Result<()> {
        self.require(Capability::Capture, "mouse capture")?;
        self.captured = window;
        Ok(())
    }

    fn create_cursor(&mut self, _image: &CursorImage, _hot_x: i32, _hot_y: i32) -> Result<CursorHandle> {
        self.require(Capability::CreateCursor, "color cursors")?;
        Ok(self.new_cursor())
    }

    fn create_system_cursor(&mut self, _cursor: SystemCursor) -> Result<CursorHandle> {
        self.require(Capability::CreateSystemCursor, "system cursors")?;
        Ok(self.new_cursor())
    }

    fn show_cursor(&mut self, cursor: Option<CursorHandle>) -> Result<()> {
        self.require(Capability::ShowCursor, "cursor display")?;
        self.shown_cursor = cursor;
        Ok(())
    }

    fn free_cursor(&mut self, cursor: CursorHandle) {
        self.live_cursors.remove(&cursor);
        if self.shown_cursor == Some(cursor) {
            self.shown_cursor = None;
        }
    }

    fn global_mouse_state(&self) -> Result<(i32, i32, u32)> {
        self.require(Capability::GlobalMouseState, "global mouse state")?;
        Ok(self.global)
    }

    fn start_text_input(&mut self) {
        self.text_input = true;
    }

    fn stop_text_input(&mut self) {
        self.text_input = false;
    }

    fn set_text_input_rect(&mut self, rect: Rect) {
        self.text_input_rect = Some(rect);
    }

    fn key_lock_state(&self) -> Option<KeyMods> {
        if self.capabilities.contains(Capability::KeyLockState) {
            self.lock_state
        } else {
            None
        }
    }

    fn pressed_scancodes(&self) -> Option<Vec<Scancode>> {
        if self.capabilities.contains(Capability::PressedKeys) {
            self.pressed.clone()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_windows_and_grab() {
        let mut backend = HeadlessBackend::new().with_window(1, 800, 600);
        assert_eq!(backend.window_size(1), Some((800, 600)));
        assert_eq!(backend.window_size(2), None);

        backend.set_grabbed(1, true);
        assert!(backend.window_grabbed(1));
        backend.remove_window(1);
        assert!(!backend.window_grabbed(1));
    }

    #[test]
    fn test_narrowed_capabilities() {
        let mut backend = HeadlessBackend::with_capabilities(Capability::ShowCursor.into());
        assert!(backend.warp_mouse(1, 0, 0).unwrap_err().is_unsupported());
        assert!(backend.capture_mouse(Some(1)).unwrap_err().is_unsupported());
        assert!(backend.show_cursor(Some(3)).is_ok());
        assert_eq!(backend.shown_cursor(), Some(3));
        assert!(backend.warps().is_empty());
    }

    #[test]
    fn test_cursor_lifecycle() {
        let mut backend = HeadlessBackend::new();
        let handle = backend.create_system_cursor(SystemCursor::Hand).unwrap();
        backend.show_cursor(Some(handle)).unwrap();
        assert_eq!(backend.live_cursor_count(), 1);

        backend.free_cursor(handle);
        assert_eq!(backend.live_cursor_count(), 0);
        assert_eq!(backend.shown_cursor(), None);
    }
}
