//! Mouse State Machine
//!
//! Canonical pointer model: position, button mask, multi-click detection,
//! relative motion scaling, focus tracking and the cursor arena.
//!
//! # Motion Pipeline
//!
//! ```text
//! send_motion(window, id, relative, x, y)
//!   ├─> drop touch-synthesised motion when touch_mouse_events is off
//!   ├─> absolute + window: resolve focus (Leave / Enter)
//!   ├─> warp emulation: rebase at centre, otherwise warp back to centre
//!   ├─> relative: scale through per-axis accumulators
//!   ├─> first sample after focus change reports zero delta
//!   ├─> clamp to window unless it holds capture
//!   └─> push MouseMotion
//! ```

use tracing::{debug, warn};

use crate::backend::{Capability, CursorImage, Dispatch, SystemCursor};
use crate::config::MouseConfig;
use crate::error::{InputError, Result};
use crate::events::{EventData, EventKind, MouseId, WheelDirection, WindowEvent, WindowId, TOUCH_MOUSE_ID};

pub mod click;
pub mod cursor;
pub mod scale;

pub use click::{ClickState, ClickTable};
pub use cursor::{monochrome_to_argb, Cursor, CursorArena, CursorId, CursorSource};
pub use scale::Accumulator;

pub const BUTTON_LEFT: u8 = 1;
pub const BUTTON_MIDDLE: u8 = 2;
pub const BUTTON_RIGHT: u8 = 3;
pub const BUTTON_X1: u8 = 4;
pub const BUTTON_X2: u8 = 5;

/// Bit for `button` in the button mask
pub const fn button_mask(button: u8) -> u32 {
    if button == 0 || button > 32 {
        0
    } else {
        1 << (button - 1)
    }
}

/// Snapshot of the pointer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MouseState {
    pub buttons: u32,
    pub x: i32,
    pub y: i32,
}

/// Canonical mouse
#[derive(Debug)]
pub struct Mouse {
    config: MouseConfig,
    mouse_id: MouseId,
    focus: Option<WindowId>,
    x: i32,
    y: i32,
    xdelta: i32,
    ydelta: i32,
    last_x: i32,
    last_y: i32,
    has_position: bool,
    buttonstate: u32,
    clicks: ClickTable,
    relative_mode: bool,
    relative_mode_warp: bool,
    saved_position: (i32, i32),
    scale_x: Accumulator,
    scale_y: Accumulator,
    wheel_x: Accumulator,
    wheel_y: Accumulator,
    cursors: CursorArena,
    cursor_shown: bool,
    capture: Option<WindowId>,
}

impl Mouse {
    /// Create the mouse; the default cursor handle comes from the backend
    /// when it offers system cursors, otherwise handle 0 names its built-in
    /// pointer.
    pub fn new(config: MouseConfig, d: &mut Dispatch<'_>) -> Self {
        let default_handle = if d.has(Capability::CreateSystemCursor) {
            d.backend
                .create_system_cursor(SystemCursor::Arrow)
                .unwrap_or_else(|e| {
                    warn!("Default cursor unavailable: {}", e);
                    0
                })
        } else {
            0
        };

        Self {
            config,
            mouse_id: 0,
            focus: None,
            x: 0,
            y: 0,
            xdelta: 0,
            ydelta: 0,
            last_x: 0,
            last_y: 0,
            has_position: false,
            buttonstate: 0,
            clicks: ClickTable::default(),
            relative_mode: false,
            relative_mode_warp: false,
            saved_position: (0, 0),
            scale_x: Accumulator::new(),
            scale_y: Accumulator::new(),
            wheel_x: Accumulator::new(),
            wheel_y: Accumulator::new(),
            cursors: CursorArena::new(default_handle),
            cursor_shown: true,
            capture: None,
        }
    }

    pub fn config(&self) -> &MouseConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut MouseConfig {
        &mut self.config
    }

    pub fn focus(&self) -> Option<WindowId> {
        self.focus
    }

    pub fn is_relative_mode(&self) -> bool {
        self.relative_mode
    }

    pub fn is_relative_mode_warp(&self) -> bool {
        self.relative_mode_warp
    }

    pub fn capture_window(&self) -> Option<WindowId> {
        self.capture
    }

    /// Buttons and position
    pub fn state(&self) -> MouseState {
        MouseState {
            buttons: self.buttonstate,
            x: self.x,
            y: self.y,
        }
    }

    /// Buttons and motion accumulated since the previous call
    pub fn relative_state(&mut self) -> MouseState {
        let state = MouseState {
            buttons: self.buttonstate,
            x: self.xdelta,
            y: self.ydelta,
        };
        self.xdelta = 0;
        self.ydelta = 0;
        state
    }

    /// Desktop-relative state from the backend
    pub fn global_state(&self, d: &Dispatch<'_>) -> Result<MouseState> {
        let (x, y, buttons) = d.backend.global_mouse_state()?;
        Ok(MouseState { buttons, x, y })
    }

    pub fn click_state(&self, button: u8) -> Option<&ClickState> {
        self.clicks.get(button)
    }

    /// Move focus, emitting Leave for the old window and Enter for the new
    pub fn set_focus(&mut self, window: Option<WindowId>, d: &mut Dispatch<'_>) {
        if self.focus == window {
            return;
        }
        if let Some(old) = self.focus {
            d.push(EventData::Window {
                window: old,
                event: WindowEvent::Leave,
            });
        }
        self.focus = window;
        self.has_position = false;
        if let Some(new) = window {
            d.push(EventData::Window {
                window: new,
                event: WindowEvent::Enter,
            });
        }
        debug!(?window, "Mouse focus changed");
        self.refresh_cursor(d);
    }

    /// Forget a window that no longer exists
    pub fn window_destroyed(&mut self, window: WindowId, d: &mut Dispatch<'_>) {
        if self.capture == Some(window) {
            self.capture = None;
        }
        if self.focus == Some(window) {
            self.focus = None;
            self.has_position = false;
            self.refresh_cursor(d);
        }
    }

    fn in_window(&self, window: WindowId, x: i32, y: i32, buttons: u32, d: &Dispatch<'_>) -> bool {
        if self.capture == Some(window) || buttons != 0 || d.backend.window_grabbed(window) {
            return true;
        }
        match d.backend.window_size(window) {
            Some((w, h)) => x >= 0 && y >= 0 && x < w && y < h,
            None => true,
        }
    }

    /// Enter/leave synthesis
    ///
    /// Returns whether the pointer is inside `window` and whether a
    /// synthesized motion was queued.
    fn update_focus(
        &mut self,
        window: WindowId,
        x: i32,
        y: i32,
        buttons: u32,
        send_motion: bool,
        d: &mut Dispatch<'_>,
    ) -> (bool, bool) {
        let mut posted = false;
        if !self.in_window(window, x, y, buttons, d) {
            if self.focus == Some(window) {
                if send_motion {
                    posted = self.private_motion(Some(window), self.mouse_id, false, x, y, d);
                }
                self.set_focus(None, d);
            }
            return (false, posted);
        }
        if self.focus != Some(window) {
            self.set_focus(Some(window), d);
            if send_motion {
                posted = self.private_motion(Some(window), self.mouse_id, false, x, y, d);
            }
        }
        (true, posted)
    }

    /// Report pointer motion; `true` only when an event was queued
    pub fn send_motion(
        &mut self,
        window: Option<WindowId>,
        mouse_id: MouseId,
        relative: bool,
        x: i32,
        y: i32,
        d: &mut Dispatch<'_>,
    ) -> bool {
        if mouse_id == TOUCH_MOUSE_ID && !self.config.touch_mouse_events {
            return false;
        }
        let mut posted = false;
        if let (Some(w), false) = (window, relative) {
            let send = mouse_id != TOUCH_MOUSE_ID;
            let (inside, focus_posted) = self.update_focus(w, x, y, self.buttonstate, send, d);
            if !inside {
                return focus_posted;
            }
            posted = focus_posted;
        }
        self.private_motion(window, mouse_id, relative, x, y, d) || posted
    }

    fn private_motion(
        &mut self,
        window: Option<WindowId>,
        mouse_id: MouseId,
        relative: bool,
        mut x: i32,
        mut y: i32,
        d: &mut Dispatch<'_>,
    ) -> bool {
        if mouse_id == TOUCH_MOUSE_ID && !self.config.touch_mouse_events {
            return false;
        }

        if self.relative_mode_warp {
            if let Some(w) = window {
                let (cx, cy) = d.backend.window_size(w).map_or((0, 0), |(w, h)| (w / 2, h / 2));
                if x == cx && y == cy {
                    self.last_x = cx;
                    self.last_y = cy;
                    return false;
                }
                if let Err(e) = d.backend.warp_mouse(w, cx, cy) {
                    debug!("Warp to centre failed: {}", e);
                }
            }
        }

        let (xrel, yrel);
        if relative {
            let scale = if self.relative_mode {
                self.config.relative_speed_scale
            } else {
                self.config.normal_speed_scale
            };
            xrel = self.scale_x.scale(scale, x);
            yrel = self.scale_y.scale(scale, y);
            x = self.last_x + xrel;
            y = self.last_y + yrel;
        } else {
            xrel = x - self.last_x;
            yrel = y - self.last_y;
        }

        let (xrel, yrel) = if !self.has_position {
            self.has_position = true;
            (0, 0)
        } else if xrel == 0 && yrel == 0 {
            return false;
        } else if mouse_id == TOUCH_MOUSE_ID && self.buttonstate == 0 {
            // First touch positions the pointer without a jump
            (0, 0)
        } else {
            (xrel, yrel)
        };

        if self.relative_mode {
            self.x += xrel;
            self.y += yrel;
        } else {
            self.x = x;
            self.y = y;
        }

        if let Some(w) = window {
            if self.capture != Some(w) {
                if let Some((width, height)) = d.backend.window_size(w) {
                    self.x = self.x.clamp(0, (width - 1).max(0));
                    self.y = self.y.clamp(0, (height - 1).max(0));
                }
            }
        }

        self.xdelta += xrel;
        self.ydelta += yrel;

        let posted = d.push(EventData::MouseMotion {
            window: self.focus,
            which: mouse_id,
            state: self.buttonstate,
            x: self.x,
            y: self.y,
            xrel,
            yrel,
        });

        if relative {
            self.last_x = self.x;
            self.last_y = self.y;
        } else {
            // Unclamped, so motion outside the window still yields deltas
            self.last_x = x;
            self.last_y = y;
        }
        posted
    }

    /// Report a button transition with automatic click counting
    pub fn send_button(
        &mut self,
        window: Option<WindowId>,
        mouse_id: MouseId,
        pressed: bool,
        button: u8,
        d: &mut Dispatch<'_>,
    ) -> Result<bool> {
        self.send_button_clicks(window, mouse_id, pressed, button, -1, d)
    }

    /// Report a button transition; a negative `clicks` auto-detects the count
    ///
    /// # Errors
    ///
    /// [`InputError::OutOfMemory`] if click tracking cannot grow. The button
    /// mask is left unchanged in that case.
    pub fn send_button_clicks(
        &mut self,
        window: Option<WindowId>,
        mouse_id: MouseId,
        pressed: bool,
        button: u8,
        clicks: i32,
        d: &mut Dispatch<'_>,
    ) -> Result<bool> {
        if mouse_id == TOUCH_MOUSE_ID && !self.config.touch_mouse_events {
            return Ok(false);
        }
        let mask = button_mask(button);
        if mask == 0 {
            return Err(InputError::invalid(format!("invalid mouse button {}", button)));
        }

        let buttonstate = if pressed {
            self.buttonstate | mask
        } else {
            self.buttonstate & !mask
        };

        // Presses take focus so drags that leave the window stay tracked
        if let (Some(w), true) = (window, pressed) {
            self.update_focus(w, self.x, self.y, buttonstate, true, d);
        }

        if buttonstate == self.buttonstate {
            return Ok(false);
        }

        let clicks = if clicks < 0 {
            let (x, y) = (self.x, self.y);
            let time = self.config.double_click_time_ms;
            let radius = self.config.double_click_radius;
            let state = self.clicks.get_mut(button)?;
            if pressed {
                state.press(d.timestamp, x, y, time, radius);
            }
            state.click_count
        } else {
            clicks.min(255) as u8
        };
        self.buttonstate = buttonstate;

        let posted = d.push(EventData::MouseButton {
            window: self.focus,
            which: mouse_id,
            button,
            pressed,
            clicks,
            x: self.x,
            y: self.y,
        });

        // Releases re-evaluate focus so a drag ending outside loses it
        if let (Some(w), false) = (window, pressed) {
            self.update_focus(w, self.x, self.y, buttonstate, true, d);
        }
        Ok(posted)
    }

    /// Report wheel motion; fractional amounts accumulate across calls
    pub fn send_wheel(
        &mut self,
        window: Option<WindowId>,
        mouse_id: MouseId,
        x: f32,
        y: f32,
        direction: WheelDirection,
        d: &mut Dispatch<'_>,
    ) -> bool {
        if mouse_id == TOUCH_MOUSE_ID && !self.config.touch_mouse_events {
            return false;
        }
        if let Some(w) = window {
            if self.focus != Some(w) {
                self.set_focus(Some(w), d);
            }
        }
        if x == 0.0 && y == 0.0 {
            return false;
        }

        let integral_x = self.wheel_x.accumulate_directional(x);
        let integral_y = self.wheel_y.accumulate_directional(y);
        if integral_x == 0 && integral_y == 0 {
            return false;
        }

        d.push(EventData::MouseWheel {
            window: self.focus,
            which: mouse_id,
            x: integral_x,
            y: integral_y,
            precise_x: x,
            precise_y: y,
            direction,
        })
    }

    /// Move the pointer inside a window
    ///
    /// Uses the backend warp when it has one and native relative mode is not
    /// active; otherwise synthesises absolute motion.
    pub fn warp_in_window(&mut self, window: Option<WindowId>, x: i32, y: i32, d: &mut Dispatch<'_>) {
        let Some(window) = window.or(self.focus) else {
            return;
        };
        if d.has(Capability::Warp) && (!self.relative_mode || self.relative_mode_warp) {
            if let Err(e) = d.backend.warp_mouse(window, x, y) {
                warn!("Warp failed: {}", e);
            }
        } else {
            self.private_motion(Some(window), self.mouse_id, false, x, y, d);
        }
    }

    /// Enter or leave relative mode
    ///
    /// `keyboard_focus` is the window that receives the pointer on enable.
    ///
    /// # Errors
    ///
    /// [`InputError::Unsupported`] when neither native relative mode nor
    /// warping is available.
    pub fn set_relative_mode(
        &mut self,
        enabled: bool,
        keyboard_focus: Option<WindowId>,
        d: &mut Dispatch<'_>,
    ) -> Result<()> {
        if enabled == self.relative_mode {
            return Ok(());
        }

        let native = d.has(Capability::RelativeMode);
        let can_warp = d.has(Capability::Warp);

        if enabled {
            let mut warp = !native || self.config.relative_mode_warp;
            if warp && !can_warp {
                return Err(InputError::Unsupported("relative mouse mode"));
            }
            if !warp {
                if let Err(e) = d.backend.set_relative_mode(true) {
                    if !can_warp {
                        return Err(e);
                    }
                    warn!("Native relative mode failed, warping instead: {}", e);
                    warp = true;
                }
            }

            self.saved_position = (self.x, self.y);
            if let Some(w) = keyboard_focus {
                // Centre first so a click cannot land on a background window
                self.set_focus(Some(w), d);
                if let Some((width, height)) = d.backend.window_size(w) {
                    self.warp_in_window(Some(w), width / 2, height / 2, d);
                }
            }
            self.relative_mode_warp = warp;
        } else {
            if !self.relative_mode_warp {
                if let Err(e) = d.backend.set_relative_mode(false) {
                    debug!("Leaving native relative mode failed: {}", e);
                }
            }
            self.relative_mode_warp = false;
        }

        self.relative_mode = enabled;
        self.scale_x.reset();
        self.scale_y.reset();

        if !enabled {
            if let Some(w) = self.focus {
                let (x, y) = self.saved_position;
                self.warp_in_window(Some(w), x, y, d);
                self.x = x;
                self.y = y;
            }
        }

        d.queue.flush(EventKind::MouseMotion.into());
        debug!(enabled, warp = self.relative_mode_warp, "Relative mouse mode changed");
        self.refresh_cursor(d);
        Ok(())
    }

    /// Capture the pointer to the keyboard-focus window
    ///
    /// # Errors
    ///
    /// [`InputError::Unsupported`] without backend capture;
    /// [`InputError::InvalidArgument`] when enabling with no focused window.
    pub fn capture(
        &mut self,
        enabled: bool,
        keyboard_focus: Option<WindowId>,
        d: &mut Dispatch<'_>,
    ) -> Result<()> {
        if !d.has(Capability::Capture) {
            return Err(InputError::Unsupported("mouse capture"));
        }
        if enabled == self.capture.is_some() {
            return Ok(());
        }
        if enabled {
            let window = keyboard_focus.ok_or_else(|| InputError::invalid("no window has focus"))?;
            d.backend.capture_mouse(Some(window))?;
            self.capture = Some(window);
        } else {
            d.backend.capture_mouse(None)?;
            self.capture = None;
        }
        Ok(())
    }

    /// Create a 1-bit cursor
    #[allow(clippy::too_many_arguments)]
    pub fn create_cursor(
        &mut self,
        data: &[u8],
        mask: &[u8],
        width: u32,
        height: u32,
        hot_x: i32,
        hot_y: i32,
        d: &mut Dispatch<'_>,
    ) -> Result<CursorId> {
        let image = monochrome_to_argb(data, mask, width, height)?;
        self.create_color_cursor(&image, hot_x, hot_y, d)
    }

    /// Create a cursor from an ARGB image
    pub fn create_color_cursor(
        &mut self,
        image: &CursorImage,
        hot_x: i32,
        hot_y: i32,
        d: &mut Dispatch<'_>,
    ) -> Result<CursorId> {
        if !image.contains(hot_x, hot_y) {
            return Err(InputError::invalid(format!(
                "cursor hot spot ({}, {}) outside {}x{} image",
                hot_x, hot_y, image.width, image.height
            )));
        }
        let handle = d.backend.create_cursor(image, hot_x, hot_y)?;
        let cursor = Cursor {
            handle,
            source: CursorSource::Color {
                width: image.width,
                height: image.height,
            },
            hot_x,
            hot_y,
        };
        self.cursors.insert(cursor).map_err(|e| {
            d.backend.free_cursor(handle);
            e
        })
    }

    pub fn create_system_cursor(&mut self, id: SystemCursor, d: &mut Dispatch<'_>) -> Result<CursorId> {
        let handle = d.backend.create_system_cursor(id)?;
        self.cursors
            .insert(Cursor {
                handle,
                source: CursorSource::System(id),
                hot_x: 0,
                hot_y: 0,
            })
            .map_err(|e| {
                d.backend.free_cursor(handle);
                e
            })
    }

    /// Select a cursor, or with `None` just redraw the appropriate one
    ///
    /// # Errors
    ///
    /// [`InputError::InvalidArgument`] for a cursor this mouse does not own.
    pub fn set_cursor(&mut self, cursor: Option<CursorId>, d: &mut Dispatch<'_>) -> Result<()> {
        if let Some(id) = cursor {
            self.cursors.set_current(id)?;
        }
        self.refresh_cursor(d);
        Ok(())
    }

    fn refresh_cursor(&mut self, d: &mut Dispatch<'_>) {
        if !d.has(Capability::ShowCursor) {
            return;
        }
        let id = if self.focus.is_some() {
            self.cursors.current_id()
        } else {
            self.cursors.default_id()
        };
        let handle = self.cursors.get(id).map(|c| c.handle);
        let shown = if self.cursor_shown && !self.relative_mode {
            handle
        } else {
            None
        };
        if let Err(e) = d.backend.show_cursor(shown) {
            debug!("Cursor update failed: {}", e);
        }
    }

    pub fn cursor(&self) -> CursorId {
        self.cursors.current_id()
    }

    pub fn default_cursor(&self) -> CursorId {
        self.cursors.default_id()
    }

    pub fn cursor_info(&self, id: CursorId) -> Option<&Cursor> {
        self.cursors.get(id)
    }

    /// Make `id` the default cursor
    pub fn set_default_cursor(&mut self, id: CursorId, d: &mut Dispatch<'_>) -> Result<()> {
        self.cursors.set_default(id)?;
        self.refresh_cursor(d);
        Ok(())
    }

    /// Free a cursor; the current cursor falls back to the default first
    ///
    /// Freeing the default cursor is a no-op.
    pub fn free_cursor(&mut self, id: CursorId, d: &mut Dispatch<'_>) -> Result<()> {
        if id == self.cursors.default_id() {
            return Ok(());
        }
        let was_current = self.cursors.current_id() == id;
        let cursor = self.cursors.remove(id).ok_or_else(|| {
            InputError::invalid(format!("cursor {} is not owned by this mouse", id.0))
        })?;
        if was_current {
            self.refresh_cursor(d);
        }
        d.backend.free_cursor(cursor.handle);
        Ok(())
    }

    /// Show, hide or query the cursor; returns the visibility before the call
    pub fn show_cursor(&mut self, toggle: Option<bool>, d: &mut Dispatch<'_>) -> bool {
        let shown = self.cursor_shown;
        if let Some(show) = toggle {
            self.cursor_shown = show;
            if show != shown {
                self.refresh_cursor(d);
            }
        }
        shown
    }

    /// Release every backend cursor
    pub fn shutdown(&mut self, d: &mut Dispatch<'_>) {
        if self.capture.take().is_some() {
            let _ = d.backend.capture_mouse(None);
        }
        if self.relative_mode && !self.relative_mode_warp {
            let _ = d.backend.set_relative_mode(false);
        }
        for handle in self.cursors.handles().filter(|&h| h != 0) {
            d.backend.free_cursor(handle);
        }
    }
}
