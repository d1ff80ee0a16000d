//! Scancode to keycode keymap

use super::{Keycode, Scancode, NUM_SCANCODES};

/// Keycode for every scancode on a US layout
pub const fn default_keymap() -> [Keycode; NUM_SCANCODES] {
    let mut map = [Keycode::UNKNOWN; NUM_SCANCODES];

    // Everything not printable names its own scancode
    let mut i = 1;
    while i < NUM_SCANCODES {
        map[i] = Keycode::from_scancode(Scancode(i as u16));
        i += 1;
    }
    // Reserved slots between UNKNOWN and A
    map[1] = Keycode::UNKNOWN;
    map[2] = Keycode::UNKNOWN;
    map[3] = Keycode::UNKNOWN;

    let mut letter = 0;
    while letter < 26 {
        map[Scancode::A.0 as usize + letter] = Keycode(b'a' as u32 + letter as u32);
        letter += 1;
    }
    let mut digit = 0;
    while digit < 9 {
        map[Scancode::NUM_1.0 as usize + digit] = Keycode(b'1' as u32 + digit as u32);
        digit += 1;
    }
    map[Scancode::NUM_0.0 as usize] = Keycode::from_char('0');

    map[Scancode::RETURN.0 as usize] = Keycode::RETURN;
    map[Scancode::ESCAPE.0 as usize] = Keycode::ESCAPE;
    map[Scancode::BACKSPACE.0 as usize] = Keycode::BACKSPACE;
    map[Scancode::TAB.0 as usize] = Keycode::TAB;
    map[Scancode::SPACE.0 as usize] = Keycode::SPACE;
    map[Scancode::MINUS.0 as usize] = Keycode::from_char('-');
    map[Scancode::EQUALS.0 as usize] = Keycode::from_char('=');
    map[Scancode::LEFTBRACKET.0 as usize] = Keycode::from_char('[');
    map[Scancode::RIGHTBRACKET.0 as usize] = Keycode::from_char(']');
    map[Scancode::BACKSLASH.0 as usize] = Keycode::from_char('\\');
    map[Scancode::NONUSHASH.0 as usize] = Keycode::UNKNOWN;
    map[Scancode::SEMICOLON.0 as usize] = Keycode::from_char(';');
    map[Scancode::APOSTROPHE.0 as usize] = Keycode::from_char('\'');
    map[Scancode::GRAVE.0 as usize] = Keycode::from_char('`');
    map[Scancode::COMMA.0 as usize] = Keycode::from_char(',');
    map[Scancode::PERIOD.0 as usize] = Keycode::from_char('.');
    map[Scancode::SLASH.0 as usize] = Keycode::from_char('/');
    map[Scancode::DELETE.0 as usize] = Keycode::DELETE;
    map
}

/// Active layout mapping, replaceable by the platform layer
#[derive(Debug, Clone)]
pub struct Keymap {
    keys: Box<[Keycode; NUM_SCANCODES]>,
}

impl Keymap {
    pub fn new() -> Self {
        Self {
            keys: Box::new(default_keymap()),
        }
    }

    /// Keycode for `scancode`; out-of-range values map to `UNKNOWN`
    pub fn keycode(&self, scancode: Scancode) -> Keycode {
        self.keys
            .get(scancode.index())
            .copied()
            .unwrap_or(Keycode::UNKNOWN)
    }

    /// First scancode producing `key`
    pub fn scancode(&self, key: Keycode) -> Scancode {
        if key == Keycode::UNKNOWN {
            return Scancode::UNKNOWN;
        }
        self.keys
            .iter()
            .position(|&k| k == key)
            .map_or(Scancode::UNKNOWN, |index| Scancode(index as u16))
    }

    /// Override a span of keycodes starting at `start`
    pub fn set_keys(&mut self, start: Scancode, keys: &[Keycode]) {
        let start = start.index();
        if start >= NUM_SCANCODES {
            return;
        }
        let end = (start + keys.len()).min(NUM_SCANCODES);
        self.keys[start..end].copy_from_slice(&keys[..end - start]);
    }

    /// Restore the US layout
    pub fn reset(&mut self) {
        *self.keys = default_keymap();
    }
}

impl Default for Keymap {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_printables() {
        let map = Keymap::new();
        assert_eq!(map.keycode(Scancode::A), Keycode::from_char('a'));
        assert_eq!(map.keycode(Scancode::Z), Keycode::from_char('z'));
        assert_eq!(map.keycode(Scancode::NUM_1), Keycode::from_char('1'));
        assert_eq!(map.keycode(Scancode::NUM_0), Keycode::from_char('0'));
        assert_eq!(map.keycode(Scancode::SLASH), Keycode::from_char('/'));
    }

    #[test]
    fn test_default_non_printables() {
        let map = Keymap::new();
        assert_eq!(map.keycode(Scancode::F1), Keycode::from_scancode(Scancode::F1));
        assert_eq!(map.keycode(Scancode::LCTRL), Keycode::LCTRL);
        assert_eq!(map.keycode(Scancode::UNKNOWN), Keycode::UNKNOWN);
        assert_eq!(map.keycode(Scancode(2)), Keycode::UNKNOWN);
        assert_eq!(map.keycode(Scancode(9000)), Keycode::UNKNOWN);
    }

    #[test]
    fn test_override_and_reset() {
        let mut map = Keymap::new();
        // AZERTY top-left corner
        map.set_keys(Scancode::Q, &[Keycode::from_char('a')]);
        map.set_keys(Scancode::W, &[Keycode::from_char('z')]);
        assert_eq!(map.keycode(Scancode::Q), Keycode::from_char('a'));
        assert_eq!(map.keycode(Scancode::W), Keycode::from_char('z'));
        assert_eq!(map.scancode(Keycode::from_char('z')), Scancode::W);

        map.reset();
        assert_eq!(map.keycode(Scancode::Q), Keycode::from_char('q'));
    }

    #[test]
    fn test_set_keys_clamps_to_table() {
        let mut map = Keymap::new();
        let last = Scancode((NUM_SCANCODES - 1) as u16);
        map.set_keys(last, &[Keycode::SPACE, Keycode::SPACE]);
        assert_eq!(map.keycode(last), Keycode::SPACE);
    }
}
