//! Input Context
//!
//! Root object owning every state machine. Native events enter through
//! [`InputContext::handle_native`]; canonical events leave through the
//! [`EventQueue`].
//!
//! # Routing
//!
//! ```text
//! NativeEvent ──> scancode tables ──> Keyboard
//!             ──> Mouse ──(mouse_touch_events)──> TouchRegistry
//!             ──> TouchRegistry ──(touch_mouse_events)──> Mouse
//! tick() ──> JoystickSubsystem (hot-plug, reports, correlation, rumble)
//!        ──> HapticRegistry (software effect deadlines)
//! ```

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::backend::{CursorImage, Dispatch, Rect, SystemCursor, VideoBackend};
use crate::config::Config;
use crate::error::Result;
use crate::events::{
    Event, EventData, EventKind, EventKinds, EventQueue, FingerPhase, JoystickId, TouchId, WheelDirection, WindowId,
    MOUSE_TOUCH_ID, TOUCH_MOUSE_ID,
};
use crate::haptic::HapticRegistry;
use crate::joystick::{DeviceInfo, JoystickSubsystem, LowLevelSource};
use crate::keyboard::Keyboard;
use crate::logging::{self, LogCategory};
use crate::mouse::{CursorId, Mouse, MouseState, BUTTON_LEFT};
use crate::platform::{NativeEvent, NativeEventPump, PumpWait};
use crate::scancode::{browser_scancode, KeyLocation, ScancodeTable};
use crate::sync::{Clock, SystemClock};
use crate::touch::{denormalize, PointerEmulation, TouchDeviceType, TouchRegistry};

/// Mouse id reported for real pointer input
const NATIVE_MOUSE_ID: u32 = 0;

macro_rules! dispatch {
    ($ctx:ident) => {
        Dispatch::new($ctx.backend.as_mut(), &$ctx.queue, $ctx.clock.now_ms())
    };
}

pub struct InputContext {
    config: Config,
    backend: Box<dyn VideoBackend>,
    queue: Arc<EventQueue>,
    clock: Arc<dyn Clock>,
    x11_keys: ScancodeTable,
    mouse: Mouse,
    keyboard: Keyboard,
    touch: TouchRegistry,
    joysticks: JoystickSubsystem,
    haptics: HapticRegistry,
    mouse_touch_down: bool,
    last_error: Option<String>,
}

impl InputContext {
    /// Create a context on the system clock
    pub fn create(config: Config, backend: Box<dyn VideoBackend>) -> Self {
        Self::with_clock(config, backend, Arc::new(SystemClock))
    }

    pub fn with_clock(config: Config, mut backend: Box<dyn VideoBackend>, clock: Arc<dyn Clock>) -> Self {
        let queue = Arc::new(EventQueue::new(config.events.capacity));
        for kind in &config.events.disabled {
            queue.set_enabled(*kind, false);
        }

        let mouse = {
            let mut d = Dispatch::new(backend.as_mut(), &queue, clock.now_ms());
            Mouse::new(config.mouse.clone(), &mut d)
        };

        info!(
            capacity = config.events.capacity,
            disabled = config.events.disabled.len(),
            "Input context created"
        );

        Self {
            x11_keys: ScancodeTable::x11(config.keyboard.x11_keycodes),
            keyboard: Keyboard::new(config.keyboard.clone()),
            touch: TouchRegistry::new(config.mouse.touch_mouse_events),
            joysticks: JoystickSubsystem::new(config.joystick.clone()),
            haptics: HapticRegistry::new(),
            config,
            backend,
            queue,
            clock,
            mouse,
            mouse_touch_down: false,
            last_error: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    pub fn queue(&self) -> &EventQueue {
        &self.queue
    }

    /// Shared queue for producers on other threads
    pub fn queue_handle(&self) -> Arc<EventQueue> {
        self.queue.clone()
    }

    pub fn backend(&self) -> &dyn VideoBackend {
        self.backend.as_ref()
    }

    pub fn mouse(&self) -> &Mouse {
        &self.mouse
    }

    pub fn keyboard(&self) -> &Keyboard {
        &self.keyboard
    }

    pub fn touch(&self) -> &TouchRegistry {
        &self.touch
    }

    pub fn joysticks(&self) -> &JoystickSubsystem {
        &self.joysticks
    }

    /// Attach shadow providers, openers or a hot-plug monitor
    pub fn joysticks_mut(&mut self) -> &mut JoystickSubsystem {
        &mut self.joysticks
    }

    pub fn haptics(&self) -> &HapticRegistry {
        &self.haptics
    }

    pub fn haptics_mut(&mut self) -> &mut HapticRegistry {
        &mut self.haptics
    }

    /// Message of the most recent failed operation
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    fn record<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            logging::global().debug(
                LogCategory::INPUT,
                format_args!("Input operation failed ({:?}): {}", e.class(), e),
            );
            self.last_error = Some(e.to_string());
        }
        result
    }

    pub fn poll_event(&self) -> Option<Event> {
        self.queue.poll()
    }

    pub fn wait_event_timeout(&self, timeout: Duration) -> Option<Event> {
        self.queue.wait_timeout(timeout)
    }

    pub fn drain_events(&self) -> Vec<Event> {
        self.queue.drain()
    }

    pub fn flush_events(&self, kinds: EventKinds) {
        self.queue.flush(kinds);
    }

    pub fn set_event_enabled(&self, kind: EventKind, enabled: bool) {
        self.queue.set_enabled(kind, enabled);
    }

    /// Route one native notification into the state machines
    pub fn handle_native(&mut self, event: NativeEvent) -> Result<()> {
        let result = self.route(event);
        self.record(result)
    }

    fn route(&mut self, event: NativeEvent) -> Result<()> {
        let mirror_mouse = self.mouse.config().mouse_touch_events;
        let mut d = dispatch!(self);

        match event {
            NativeEvent::X11Key { keycode, pressed } => match self.x11_keys.translate(keycode) {
                Ok(scancode) => {
                    self.keyboard.send_key(pressed, scancode, &mut d);
                }
                Err(e) => debug!("Dropping key: {}", e),
            },
            NativeEvent::ConsoleKey { code, pressed } => match ScancodeTable::LINUX.translate(code) {
                Ok(scancode) => {
                    self.keyboard.send_key(pressed, scancode, &mut d);
                }
                Err(e) => debug!("Dropping key: {}", e),
            },
            NativeEvent::BrowserKey {
                key_code,
                location,
                pressed,
            } => {
                let scancode = browser_scancode(key_code, KeyLocation::from_dom(location));
                self.keyboard.send_key(pressed, scancode, &mut d);
            }
            NativeEvent::PointerMotion { window, x, y } => {
                self.mouse.send_motion(window, NATIVE_MOUSE_ID, false, x, y, &mut d);
                if mirror_mouse && self.mouse_touch_down {
                    mirror_to_touch(&mut self.touch, self.mouse.state(), window, None, &mut d)?;
                }
            }
            NativeEvent::PointerDelta { dx, dy } => {
                let focus = self.mouse.focus();
                self.mouse.send_motion(focus, NATIVE_MOUSE_ID, true, dx, dy, &mut d);
                if mirror_mouse && self.mouse_touch_down {
                    mirror_to_touch(&mut self.touch, self.mouse.state(), focus, None, &mut d)?;
                }
            }
            NativeEvent::PointerButton {
                window,
                button,
                pressed,
                clicks,
            } => {
                let clicks = clicks.map_or(-1, i32::from);
                self.mouse
                    .send_button_clicks(window, NATIVE_MOUSE_ID, pressed, button, clicks, &mut d)?;
                if mirror_mouse && button == BUTTON_LEFT && self.mouse_touch_down != pressed {
                    self.mouse_touch_down = pressed;
                    let window = window.or(self.mouse.focus());
                    mirror_to_touch(&mut self.touch, self.mouse.state(), window, Some(pressed), &mut d)?;
                }
            }
            NativeEvent::Wheel { window, x, y, flipped } => {
                let direction = if flipped {
                    WheelDirection::Flipped
                } else {
                    WheelDirection::Normal
                };
                self.mouse.send_wheel(window, NATIVE_MOUSE_ID, x, y, direction, &mut d);
            }
            NativeEvent::Text { text } => {
                self.keyboard.send_text(&text, &mut d);
            }
            NativeEvent::Composition { text, start, length } => {
                self.keyboard.send_editing(&text, start, length, &mut d);
            }
            NativeEvent::KeyboardFocus { window } => {
                let regained = window.is_some() && self.keyboard.focus().is_none();
                self.keyboard.set_focus(window, &mut d);
                if regained {
                    self.keyboard.reconcile(&mut d);
                }
            }
            NativeEvent::PointerFocus { window } => {
                self.mouse.set_focus(window, &mut d);
            }
            NativeEvent::WindowDestroyed { window } => {
                self.mouse.window_destroyed(window, &mut d);
                if self.keyboard.focus() == Some(window) {
                    self.keyboard.set_focus(None, &mut d);
                }
            }
            NativeEvent::Touch {
                touch_id,
                finger_id,
                window,
                phase,
                x,
                y,
                pressure,
            } => {
                let outcome = match phase {
                    FingerPhase::Down | FingerPhase::Up => self.touch.send_touch(
                        touch_id,
                        finger_id,
                        window,
                        phase == FingerPhase::Down,
                        x,
                        y,
                        pressure,
                        &mut d,
                    )?,
                    FingerPhase::Motion => {
                        self.touch
                            .send_touch_motion(touch_id, finger_id, window, x, y, pressure, &mut d)?
                    }
                };
                emulate_pointer(&mut self.mouse, outcome.emulation, &mut d)?;
            }
            NativeEvent::Quit => {
                d.push(EventData::Quit);
            }
        }
        Ok(())
    }

    /// Handle everything queued on the pump, then tick
    pub fn pump_events(&mut self, pump: &NativeEventPump) -> usize {
        let mut handled = 0;
        while let Some(event) = pump.poll() {
            // Recorded in last_error
            let _ = self.handle_native(event);
            handled += 1;
        }
        self.tick();
        handled
    }

    /// Block for one native event, then pump whatever else is queued
    pub fn wait_and_pump(&mut self, pump: &NativeEventPump, timeout: Duration) -> PumpWait {
        let wait = pump.wait_timeout(timeout);
        if let PumpWait::Event(event) = &wait {
            let _ = self.handle_native(event.clone());
            self.pump_events(pump);
        }
        wait
    }

    /// Periodic work: joystick polling and correlation, effect deadlines
    pub fn tick(&mut self) {
        let now = self.clock.now_ms();
        let d = Dispatch::new(self.backend.as_mut(), &self.queue, now);
        self.joysticks.update(now, &d);
        self.haptics.tick(now);
    }

    pub fn mouse_state(&self) -> MouseState {
        self.mouse.state()
    }

    /// Position plus deltas accumulated since the previous call
    pub fn relative_mouse_state(&mut self) -> MouseState {
        self.mouse.relative_state()
    }

    pub fn global_mouse_state(&mut self) -> Result<MouseState> {
        let result = {
            let d = dispatch!(self);
            self.mouse.global_state(&d)
        };
        self.record(result)
    }

    pub fn set_relative_mouse_mode(&mut self, enabled: bool) -> Result<()> {
        let result = {
            let mut d = dispatch!(self);
            self.mouse.set_relative_mode(enabled, self.keyboard.focus(), &mut d)
        };
        self.record(result)
    }

    pub fn capture_mouse(&mut self, enabled: bool) -> Result<()> {
        let result = {
            let mut d = dispatch!(self);
            self.mouse.capture(enabled, self.keyboard.focus(), &mut d)
        };
        self.record(result)
    }

    pub fn warp_mouse_in_window(&mut self, window: Option<WindowId>, x: i32, y: i32) {
        let mut d = dispatch!(self);
        self.mouse.warp_in_window(window, x, y, &mut d);
    }

    #[allow(clippy::too_many_arguments)]
    pub fn create_cursor(
        &mut self,
        data: &[u8],
        mask: &[u8],
        width: u32,
        height: u32,
        hot_x: i32,
        hot_y: i32,
    ) -> Result<CursorId> {
        let result = {
            let mut d = dispatch!(self);
            self.mouse.create_cursor(data, mask, width, height, hot_x, hot_y, &mut d)
        };
        self.record(result)
    }

    pub fn create_color_cursor(&mut self, image: &CursorImage, hot_x: i32, hot_y: i32) -> Result<CursorId> {
        let result = {
            let mut d = dispatch!(self);
            self.mouse.create_color_cursor(image, hot_x, hot_y, &mut d)
        };
        self.record(result)
    }

    pub fn create_system_cursor(&mut self, id: SystemCursor) -> Result<CursorId> {
        let result = {
            let mut d = dispatch!(self);
            self.mouse.create_system_cursor(id, &mut d)
        };
        self.record(result)
    }

    pub fn set_cursor(&mut self, cursor: Option<CursorId>) -> Result<()> {
        let result = {
            let mut d = dispatch!(self);
            self.mouse.set_cursor(cursor, &mut d)
        };
        self.record(result)
    }

    pub fn free_cursor(&mut self, cursor: CursorId) -> Result<()> {
        let result = {
            let mut d = dispatch!(self);
            self.mouse.free_cursor(cursor, &mut d)
        };
        self.record(result)
    }

    /// Show, hide or (with `None`) query the cursor; returns the prior state
    pub fn show_cursor(&mut self, toggle: Option<bool>) -> bool {
        let mut d = dispatch!(self);
        self.mouse.show_cursor(toggle, &mut d)
    }

    pub fn start_text_input(&mut self) {
        let mut d = dispatch!(self);
        self.keyboard.start_text_input(&mut d);
    }

    pub fn stop_text_input(&mut self) {
        let mut d = dispatch!(self);
        self.keyboard.stop_text_input(&mut d);
    }

    pub fn set_text_input_rect(&mut self, rect: Rect) {
        let mut d = dispatch!(self);
        self.keyboard.set_text_input_rect(rect, &mut d);
    }

    /// Release every held key
    pub fn reset_keyboard(&mut self) {
        let mut d = dispatch!(self);
        self.keyboard.reset(&mut d);
    }

    pub fn reconcile_keyboard(&mut self) {
        let mut d = dispatch!(self);
        self.keyboard.reconcile(&mut d);
    }

    pub fn add_touch(&mut self, id: TouchId, device_type: TouchDeviceType, name: &str) -> Result<usize> {
        let result = self.touch.add_touch(id, device_type, name);
        self.record(result)
    }

    pub fn del_touch(&mut self, id: TouchId) {
        self.touch.del_touch(id);
    }

    pub fn open_joystick(&mut self, info: &DeviceInfo, source: Box<dyn LowLevelSource>) -> JoystickId {
        let d = dispatch!(self);
        self.joysticks.open(info, source, &d)
    }

    pub fn close_joystick(&mut self, id: JoystickId) -> Result<()> {
        let result = {
            let d = dispatch!(self);
            self.joysticks.close(id, &d)
        };
        self.record(result)
    }

    /// Rumble through the joystick's correlated slot; 0 ms runs until replaced
    pub fn rumble_joystick(&mut self, id: JoystickId, low: u16, high: u16, duration_ms: u64) -> Result<()> {
        let now = self.clock.now_ms();
        let result = self.joysticks.rumble(id, low, high, duration_ms, now);
        self.record(result)
    }

    /// Release devices, cursors and modes held through the backend
    pub fn shutdown(&mut self) {
        let mut d = dispatch!(self);
        self.joysticks.shutdown(&d);
        self.haptics.shutdown();
        self.keyboard.stop_text_input(&mut d);
        self.mouse.shutdown(&mut d);
        self.touch.clear();
        info!("Input context shut down");
    }
}

impl std::fmt::Debug for InputContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputContext")
            .field("queue", &self.queue.len())
            .field("mouse", &self.mouse)
            .field("keyboard_focus", &self.keyboard.focus())
            .field("joysticks", &self.joysticks)
            .field("haptics", &self.haptics)
            .field("last_error", &self.last_error)
            .finish()
    }
}

/// Replay touch-synthesised pointer actions on the mouse
fn emulate_pointer(mouse: &mut Mouse, actions: Vec<PointerEmulation>, d: &mut Dispatch<'_>) -> Result<()> {
    for action in actions {
        let (PointerEmulation::Press { window, x, y }
        | PointerEmulation::Release { window, x, y }
        | PointerEmulation::Motion { window, x, y }) = action;
        let Some((w, h)) = d.backend.window_size(window) else {
            debug!(window, "No size for touch emulation");
            continue;
        };
        let (px, py) = (denormalize(x, w), denormalize(y, h));
        match action {
            PointerEmulation::Motion { .. } => {
                mouse.send_motion(Some(window), TOUCH_MOUSE_ID, false, px, py, d);
            }
            PointerEmulation::Press { .. } => {
                mouse.send_button(Some(window), TOUCH_MOUSE_ID, true, BUTTON_LEFT, d)?;
            }
            PointerEmulation::Release { .. } => {
                mouse.send_button(Some(window), TOUCH_MOUSE_ID, false, BUTTON_LEFT, d)?;
            }
        }
    }
    Ok(())
}

/// Mirror the left button and its drags onto the mouse-touch device
fn mirror_to_touch(
    touch: &mut TouchRegistry,
    state: MouseState,
    window: Option<WindowId>,
    down: Option<bool>,
    d: &mut Dispatch<'_>,
) -> Result<()> {
    let Some(window) = window else {
        return Ok(());
    };
    let Some((w, h)) = d.backend.window_size(window).filter(|&(w, h)| w > 0 && h > 0) else {
        return Ok(());
    };
    let x = state.x as f32 / w as f32;
    let y = state.y as f32 / h as f32;
    match down {
        Some(down) => touch.send_touch(MOUSE_TOUCH_ID, 0, Some(window), down, x, y, 1.0, d)?,
        None => touch.send_touch_motion(MOUSE_TOUCH_ID, 0, Some(window), x, y, 1.0, d)?,
    };
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Capabilities, Capability};
    use crate::error::InputError;
    use crate::platform::HeadlessBackend;
    use crate::scancode::Scancode;
    use crate::sync::ManualClock;

    const WIN: WindowId = 1;

    fn context_with(config: Config, backend: HeadlessBackend) -> (InputContext, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(1000));
        let ctx = InputContext::with_clock(config, Box::new(backend), clock.clone());
        (ctx, clock)
    }

    fn context() -> (InputContext, Arc<ManualClock>) {
        context_with(Config::default(), HeadlessBackend::new().with_window(WIN, 640, 480))
    }

    fn kinds(ctx: &InputContext) -> Vec<EventKind> {
        ctx.drain_events().iter().map(Event::kind).collect()
    }

    #[test]
    fn test_x11_key_reaches_keyboard() {
        let (mut ctx, _) = context();
        ctx.handle_native(NativeEvent::KeyboardFocus { window: Some(WIN) }).unwrap();
        ctx.handle_native(NativeEvent::X11Key {
            keycode: 38,
            pressed: true,
        })
        .unwrap();
        assert!(ctx.keyboard().is_pressed(Scancode::A));

        let events = ctx.drain_events();
        let key = events.iter().find(|e| e.kind() == EventKind::KeyDown).unwrap();
        assert_eq!(key.timestamp, 1000);
        assert!(matches!(
            key.data,
            EventData::Key {
                window: Some(WIN),
                scancode: Scancode::A,
                repeat: false,
                ..
            }
        ));
    }

    #[test]
    fn test_browser_key_resolves_location() {
        let (mut ctx, _) = context();
        ctx.handle_native(NativeEvent::BrowserKey {
            key_code: 16,
            location: 2,
            pressed: true,
        })
        .unwrap();
        assert!(ctx.keyboard().is_pressed(Scancode::RSHIFT));
        assert!(!ctx.keyboard().is_pressed(Scancode::LSHIFT));
    }

    #[test]
    fn test_unknown_native_key_dropped_quietly() {
        let (mut ctx, _) = context();
        ctx.handle_native(NativeEvent::X11Key {
            keycode: 3,
            pressed: true,
        })
        .unwrap();
        assert!(ctx.queue().is_empty());
        assert!(ctx.last_error().is_none());
    }

    #[test]
    fn test_touch_drives_emulated_mouse() {
        let (mut ctx, _) = context();
        ctx.handle_native(NativeEvent::Touch {
            touch_id: 7,
            finger_id: 1,
            window: Some(WIN),
            phase: FingerPhase::Down,
            x: 0.5,
            y: 0.25,
            pressure: 1.0,
        })
        .unwrap();

        let events = ctx.drain_events();
        assert!(events.iter().any(|e| e.kind() == EventKind::FingerDown));
        let press = events
            .iter()
            .find_map(|e| match e.data {
                EventData::MouseButton {
                    which, button, pressed, ..
                } => Some((which, button, pressed)),
                _ => None,
            })
            .unwrap();
        assert_eq!(press, (TOUCH_MOUSE_ID, BUTTON_LEFT, true));
        assert_eq!((ctx.mouse_state().x, ctx.mouse_state().y), (320, 120));
    }

    #[test]
    fn test_touch_emulation_disabled() {
        let mut config = Config::default();
        config.mouse.touch_mouse_events = false;
        let (mut ctx, _) = context_with(config, HeadlessBackend::new().with_window(WIN, 640, 480));
        ctx.handle_native(NativeEvent::Touch {
            touch_id: 7,
            finger_id: 1,
            window: Some(WIN),
            phase: FingerPhase::Down,
            x: 0.5,
            y: 0.5,
            pressure: 1.0,
        })
        .unwrap();
        assert_eq!(kinds(&ctx), vec![EventKind::FingerDown]);
    }

    #[test]
    fn test_mouse_mirrored_as_touch() {
        let mut config = Config::default();
        config.mouse.mouse_touch_events = true;
        let (mut ctx, _) = context_with(config, HeadlessBackend::new().with_window(WIN, 100, 100));

        ctx.handle_native(NativeEvent::PointerMotion {
            window: Some(WIN),
            x: 10,
            y: 10,
        })
        .unwrap();
        ctx.handle_native(NativeEvent::PointerButton {
            window: Some(WIN),
            button: BUTTON_LEFT,
            pressed: true,
            clicks: None,
        })
        .unwrap();
        ctx.handle_native(NativeEvent::PointerMotion {
            window: Some(WIN),
            x: 20,
            y: 10,
        })
        .unwrap();
        ctx.handle_native(NativeEvent::PointerButton {
            window: Some(WIN),
            button: BUTTON_LEFT,
            pressed: false,
            clicks: None,
        })
        .unwrap();

        let fingers: Vec<_> = ctx
            .drain_events()
            .into_iter()
            .filter_map(|e| match e.data {
                EventData::Finger { phase, touch_id, x, .. } => Some((phase, touch_id, x)),
                _ => None,
            })
            .collect();
        assert_eq!(
            fingers,
            vec![
                (FingerPhase::Down, MOUSE_TOUCH_ID, 0.1),
                (FingerPhase::Motion, MOUSE_TOUCH_ID, 0.2),
                (FingerPhase::Up, MOUSE_TOUCH_ID, 0.2),
            ]
        );
        // The mirrored device never feeds back into the mouse
        assert_eq!(ctx.mouse().state().buttons, 0);
    }

    #[test]
    fn test_errors_recorded() {
        let backend = HeadlessBackend::with_capabilities(Capabilities::empty()).with_window(WIN, 10, 10);
        let (mut ctx, _) = context_with(Config::default(), backend);

        let err = ctx.capture_mouse(true).unwrap_err();
        assert!(err.is_unsupported());
        assert!(ctx.last_error().is_some_and(|e| e.contains("capture")));
        ctx.clear_error();
        assert!(ctx.last_error().is_none());

        let err = ctx
            .handle_native(NativeEvent::Touch {
                touch_id: 9,
                finger_id: 0,
                window: None,
                phase: FingerPhase::Motion,
                x: 0.0,
                y: 0.0,
                pressure: 1.0,
            })
            .unwrap_err();
        assert!(matches!(err, InputError::UnknownTouchDevice(9)));
        assert!(ctx.last_error().is_some());
    }

    #[test]
    fn test_disabled_kinds_from_config() {
        let mut config = Config::default();
        config.events.disabled = vec![EventKind::MouseMotion];
        let (mut ctx, _) = context_with(config, HeadlessBackend::new().with_window(WIN, 640, 480));
        ctx.handle_native(NativeEvent::PointerMotion {
            window: Some(WIN),
            x: 5,
            y: 5,
        })
        .unwrap();
        ctx.handle_native(NativeEvent::Quit).unwrap();
        assert_eq!(kinds(&ctx), vec![EventKind::Window, EventKind::Quit]);
        assert_eq!(ctx.mouse_state().x, 5);
    }

    #[test]
    fn test_focus_regain_reconciles_keys() {
        let mut backend = HeadlessBackend::new().with_window(WIN, 10, 10);
        backend.set_pressed_scancodes(Some(vec![Scancode::LSHIFT]));
        let (mut ctx, _) = context_with(Config::default(), backend);

        ctx.handle_native(NativeEvent::KeyboardFocus { window: Some(WIN) }).unwrap();
        assert!(ctx.keyboard().is_pressed(Scancode::LSHIFT));

        ctx.handle_native(NativeEvent::WindowDestroyed { window: WIN }).unwrap();
        assert_eq!(ctx.keyboard().focus(), None);
        assert!(!ctx.keyboard().is_pressed(Scancode::LSHIFT));
    }

    #[test]
    fn test_relative_mode_uses_keyboard_focus() {
        let backend = HeadlessBackend::with_capabilities(Capability::RelativeMode | Capability::Warp)
            .with_window(WIN, 200, 100);
        let (mut ctx, _) = context_with(Config::default(), backend);
        ctx.handle_native(NativeEvent::KeyboardFocus { window: Some(WIN) }).unwrap();
        ctx.set_relative_mouse_mode(true).unwrap();
        assert!(ctx.mouse().is_relative_mode());
        assert_eq!(ctx.mouse().focus(), Some(WIN));

        // The first sample after focus only establishes the position
        ctx.handle_native(NativeEvent::PointerDelta { dx: 9, dy: 9 }).unwrap();
        ctx.handle_native(NativeEvent::PointerDelta { dx: 3, dy: -2 }).unwrap();
        let state = ctx.relative_mouse_state();
        assert_eq!((state.x, state.y), (3, -2));
    }

    #[test]
    fn test_pump_events_drains_channel() {
        let (mut ctx, clock) = context();
        let pump = NativeEventPump::new();
        let handle = pump.handle();
        handle
            .send(NativeEvent::Text {
                text: "hi".to_string(),
            })
            .unwrap();
        handle.send(NativeEvent::Quit).unwrap();
        clock.advance(5);

        assert_eq!(ctx.pump_events(&pump), 2);
        let events = ctx.drain_events();
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.timestamp == 1005));
    }

    #[test]
    fn test_wait_and_pump_cancel() {
        let (mut ctx, _) = context();
        let pump = NativeEventPump::new();
        pump.handle().cancel();
        assert!(matches!(
            ctx.wait_and_pump(&pump, Duration::from_secs(5)),
            PumpWait::Cancelled
        ));
    }
}
