//! Keyboard State Machine
//!
//! Tracks pressed keys by canonical scancode, the active keymap, modifier and
//! lock state, and keyboard focus. Text and IME composition events are routed
//! through here so they carry the focused window.
//!
//! Focus regain is the one place the canonical state is checked against the
//! OS: [`Keyboard::reconcile`] replays presses and releases that were missed
//! while another application held focus.

use tracing::debug;

use crate::backend::{Dispatch, Rect};
use crate::config::KeyboardConfig;
use crate::events::{EventData, WindowEvent, WindowId};
use crate::scancode::{KeyMod, KeyMods, Keycode, Keymap, Scancode, NUM_SCANCODES};

/// Largest text payload per event, in bytes
pub const MAX_TEXT_CHUNK: usize = 31;

/// Split `text` into chunks of at most `max` bytes on character boundaries
pub fn utf8_chunks(text: &str, max: usize) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut end = 0;
    for (index, c) in text.char_indices() {
        let next = index + c.len_utf8();
        if next - start > max && end > start {
            chunks.push(&text[start..end]);
            start = end;
        }
        end = next;
    }
    if end > start {
        chunks.push(&text[start..end]);
    }
    chunks
}

/// Canonical keyboard
#[derive(Debug)]
pub struct Keyboard {
    config: KeyboardConfig,
    focus: Option<WindowId>,
    modstate: KeyMods,
    keystate: Box<[bool; NUM_SCANCODES]>,
    keymap: Keymap,
    text_input: bool,
}

impl Keyboard {
    pub fn new(config: KeyboardConfig) -> Self {
        Self {
            config,
            focus: None,
            modstate: KeyMods::empty(),
            keystate: Box::new([false; NUM_SCANCODES]),
            keymap: Keymap::new(),
            text_input: false,
        }
    }

    pub fn config(&self) -> &KeyboardConfig {
        &self.config
    }

    pub fn focus(&self) -> Option<WindowId> {
        self.focus
    }

    pub fn modifiers(&self) -> KeyMods {
        self.modstate
    }

    pub fn set_modifiers(&mut self, modifiers: KeyMods) {
        self.modstate = modifiers;
    }

    pub fn is_pressed(&self, scancode: Scancode) -> bool {
        self.keystate.get(scancode.index()).copied().unwrap_or(false)
    }

    /// Every key currently held
    pub fn pressed_keys(&self) -> Vec<Scancode> {
        self.keystate
            .iter()
            .enumerate()
            .filter(|(_, down)| **down)
            .map(|(index, _)| Scancode(index as u16))
            .collect()
    }

    pub fn keymap(&self) -> &Keymap {
        &self.keymap
    }

    /// Override keycodes for a run of scancodes starting at `start`
    pub fn set_keymap(&mut self, start: Scancode, keys: &[Keycode]) {
        self.keymap.set_keys(start, keys);
    }

    pub fn key_from_scancode(&self, scancode: Scancode) -> Keycode {
        self.keymap.keycode(scancode)
    }

    pub fn scancode_from_key(&self, key: Keycode) -> Scancode {
        self.keymap.scancode(key)
    }

    /// Move keyboard focus
    ///
    /// Losing focus entirely releases every held key first, so the old window
    /// sees key-ups before FocusLost.
    pub fn set_focus(&mut self, window: Option<WindowId>, d: &mut Dispatch<'_>) {
        if self.focus == window {
            return;
        }

        if let Some(old) = self.focus {
            if window.is_none() {
                self.reset(d);
            }
            d.push(EventData::Window {
                window: old,
                event: WindowEvent::FocusLost,
            });
        }

        self.focus = window;
        debug!(?window, "Keyboard focus changed");

        if let Some(new) = window {
            d.push(EventData::Window {
                window: new,
                event: WindowEvent::FocusGained,
            });
            if self.text_input {
                d.backend.start_text_input();
            }
        }
    }

    /// Report a key transition; `true` only when an event was queued
    ///
    /// Releases of keys that are not held and presses of unknown scancodes are
    /// dropped. A press of a held key is an auto-repeat.
    pub fn send_key(&mut self, pressed: bool, scancode: Scancode, d: &mut Dispatch<'_>) -> bool {
        if !scancode.is_valid() {
            debug!(scancode = scancode.0, "Dropping unknown scancode");
            return false;
        }

        let held = self.keystate[scancode.index()];
        let repeat = pressed && held;
        if !pressed && !held {
            return false;
        }
        if repeat && !self.config.key_repeat {
            return false;
        }

        if let Some(modifier) = KeyMod::held_by(scancode) {
            if pressed {
                self.modstate.insert(modifier);
            } else {
                self.modstate.remove(modifier);
            }
        }
        if let (Some(lock), true, false) = (KeyMod::toggled_by(scancode), pressed, repeat) {
            self.modstate.toggle(lock);
        }

        self.keystate[scancode.index()] = pressed;

        d.push(EventData::Key {
            window: self.focus,
            pressed,
            repeat,
            scancode,
            keycode: self.keymap.keycode(scancode),
            modifiers: self.modstate,
        })
    }

    /// Release every held key
    pub fn reset(&mut self, d: &mut Dispatch<'_>) {
        for scancode in self.pressed_keys() {
            self.send_key(false, scancode, d);
        }
    }

    /// Bring key and lock state in line with what the OS reports
    ///
    /// Differences against the OS pressed-key snapshot become canonical
    /// presses and releases; lock bits are then taken from the OS verbatim.
    pub fn reconcile(&mut self, d: &mut Dispatch<'_>) {
        if let Some(os_pressed) = d.backend.pressed_scancodes() {
            let mut os_state = [false; NUM_SCANCODES];
            for scancode in os_pressed.into_iter().filter(|s| s.is_valid()) {
                os_state[scancode.index()] = true;
            }
            for (index, &os_down) in os_state.iter().enumerate() {
                if os_down != self.keystate[index] {
                    debug!(scancode = index, pressed = os_down, "Reconciling key state");
                    self.send_key(os_down, Scancode(index as u16), d);
                }
            }
        }

        if let Some(locks) = d.backend.key_lock_state() {
            for lock in [KeyMod::Caps, KeyMod::Num, KeyMod::Scroll] {
                self.modstate.set(lock, locks.contains(lock));
            }
        }
    }

    /// Report committed text; control characters are dropped
    pub fn send_text(&mut self, text: &str, d: &mut Dispatch<'_>) -> bool {
        let printable: String = text.chars().filter(|c| !c.is_control()).collect();
        if printable.is_empty() {
            return false;
        }
        let mut posted = false;
        for chunk in utf8_chunks(&printable, MAX_TEXT_CHUNK) {
            posted |= d.push(EventData::TextInput {
                window: self.focus,
                text: chunk.to_string(),
            });
        }
        posted
    }

    /// Report an in-progress IME composition
    pub fn send_editing(&mut self, text: &str, start: i32, length: i32, d: &mut Dispatch<'_>) -> bool {
        let text = utf8_chunks(text, MAX_TEXT_CHUNK)
            .first()
            .map_or_else(String::new, |chunk| chunk.to_string());
        d.push(EventData::TextEditing {
            window: self.focus,
            text,
            start,
            length,
        })
    }

    pub fn start_text_input(&mut self, d: &mut Dispatch<'_>) {
        self.text_input = true;
        if self.focus.is_some() {
            d.backend.start_text_input();
        }
    }

    pub fn stop_text_input(&mut self, d: &mut Dispatch<'_>) {
        self.text_input = false;
        d.backend.stop_text_input();
    }

    pub fn is_text_input_active(&self) -> bool {
        self.text_input
    }

    /// Where the IME candidate window should appear
    pub fn set_text_input_rect(&mut self, rect: Rect, d: &mut Dispatch<'_>) {
        d.backend.set_text_input_rect(rect);
    }
}
