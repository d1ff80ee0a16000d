//! Native Key Code Tables
//!
//! Static, read-only translation from platform key identifiers to
//! [`Scancode`]. Each table is a dense array indexed by the native code
//! (after subtracting the platform offset) and built at compile time.
//!
//! | Table | Native source | Offset |
//! |-------|---------------|--------|
//! | [`ScancodeTable::LINUX`] | evdev / console keycodes | 0 |
//! | [`ScancodeTable::X11_EVDEV`] | X server running the evdev driver | 8 |
//! | [`ScancodeTable::X11_XFREE86`] | legacy XFree86 keycodes | 8 |
//! | [`ScancodeTable::BROWSER`] | DOM `keyCode` | 0 |

use serde::{Deserialize, Serialize};

use super::Scancode;
use crate::error::{InputError, Result};

/// Linux evdev keycodes
pub mod evdev {
    pub const KEY_ESC: u16 = 1;
    pub const KEY_1: u16 = 2;
    pub const KEY_2: u16 = 3;
    pub const KEY_3: u16 = 4;
    pub const KEY_4: u16 = 5;
    pub const KEY_5: u16 = 6;
    pub const KEY_6: u16 = 7;
    pub const KEY_7: u16 = 8;
    pub const KEY_8: u16 = 9;
    pub const KEY_9: u16 = 10;
    pub const KEY_0: u16 = 11;
    pub const KEY_MINUS: u16 = 12;
    pub const KEY_EQUAL: u16 = 13;
    pub const KEY_BACKSPACE: u16 = 14;
    pub const KEY_TAB: u16 = 15;
    pub const KEY_Q: u16 = 16;
    pub const KEY_W: u16 = 17;
    pub const KEY_E: u16 = 18;
    pub const KEY_R: u16 = 19;
    pub const KEY_T: u16 = 20;
    pub const KEY_Y: u16 = 21;
    pub const KEY_U: u16 = 22;
    pub const KEY_I: u16 = 23;
    pub const KEY_O: u16 = 24;
    pub const KEY_P: u16 = 25;
    pub const KEY_LEFTBRACE: u16 = 26;
    pub const KEY_RIGHTBRACE: u16 = 27;
    pub const KEY_ENTER: u16 = 28;
    pub const KEY_LEFTCTRL: u16 = 29;
    pub const KEY_A: u16 = 30;
    pub const KEY_S: u16 = 31;
    pub const KEY_D: u16 = 32;
    pub const KEY_F: u16 = 33;
    pub const KEY_G: u16 = 34;
    pub const KEY_H: u16 = 35;
    pub const KEY_J: u16 = 36;
    pub const KEY_K: u16 = 37;
    pub const KEY_L: u16 = 38;
    pub const KEY_SEMICOLON: u16 = 39;
    pub const KEY_APOSTROPHE: u16 = 40;
    pub const KEY_GRAVE: u16 = 41;
    pub const KEY_LEFTSHIFT: u16 = 42;
    pub const KEY_BACKSLASH: u16 = 43;
    pub const KEY_Z: u16 = 44;
    pub const KEY_X: u16 = 45;
    pub const KEY_C: u16 = 46;
    pub const KEY_V: u16 = 47;
    pub const KEY_B: u16 = 48;
    pub const KEY_N: u16 = 49;
    pub const KEY_M: u16 = 50;
    pub const KEY_COMMA: u16 = 51;
    pub const KEY_DOT: u16 = 52;
    pub const KEY_SLASH: u16 = 53;
    pub const KEY_RIGHTSHIFT: u16 = 54;
    pub const KEY_KPASTERISK: u16 = 55;
    pub const KEY_LEFTALT: u16 = 56;
    pub const KEY_SPACE: u16 = 57;
    pub const KEY_CAPSLOCK: u16 = 58;
    pub const KEY_F1: u16 = 59;
    pub const KEY_F2: u16 = 60;
    pub const KEY_F3: u16 = 61;
    pub const KEY_F4: u16 = 62;
    pub const KEY_F5: u16 = 63;
    pub const KEY_F6: u16 = 64;
    pub const KEY_F7: u16 = 65;
    pub const KEY_F8: u16 = 66;
    pub const KEY_F9: u16 = 67;
    pub const KEY_F10: u16 = 68;
    pub const KEY_NUMLOCK: u16 = 69;
    pub const KEY_SCROLLLOCK: u16 = 70;
    pub const KEY_KP7: u16 = 71;
    pub const KEY_KP8: u16 = 72;
    pub const KEY_KP9: u16 = 73;
    pub const KEY_KPMINUS: u16 = 74;
    pub const KEY_KP4: u16 = 75;
    pub const KEY_KP5: u16 = 76;
    pub const KEY_KP6: u16 = 77;
    pub const KEY_KPPLUS: u16 = 78;
    pub const KEY_KP1: u16 = 79;
    pub const KEY_KP2: u16 = 80;
    pub const KEY_KP3: u16 = 81;
    pub const KEY_KP0: u16 = 82;
    pub const KEY_KPDOT: u16 = 83;
    pub const KEY_ZENKAKUHANKAKU: u16 = 85;
    pub const KEY_102ND: u16 = 86;
    pub const KEY_F11: u16 = 87;
    pub const KEY_F12: u16 = 88;
    pub const KEY_RO: u16 = 89;
    pub const KEY_KATAKANA: u16 = 90;
    pub const KEY_HIRAGANA: u16 = 91;
    pub const KEY_HENKAN: u16 = 92;
    pub const KEY_KATAKANAHIRAGANA: u16 = 93;
    pub const KEY_MUHENKAN: u16 = 94;
    pub const KEY_KPENTER: u16 = 96;
    pub const KEY_RIGHTCTRL: u16 = 97;
    pub const KEY_KPSLASH: u16 = 98;
    pub const KEY_SYSRQ: u16 = 99;
    pub const KEY_RIGHTALT: u16 = 100;
    pub const KEY_HOME: u16 = 102;
    pub const KEY_UP: u16 = 103;
    pub const KEY_PAGEUP: u16 = 104;
    pub const KEY_LEFT: u16 = 105;
    pub const KEY_RIGHT: u16 = 106;
    pub const KEY_END: u16 = 107;
    pub const KEY_DOWN: u16 = 108;
    pub const KEY_PAGEDOWN: u16 = 109;
    pub const KEY_INSERT: u16 = 110;
    pub const KEY_DELETE: u16 = 111;
    pub const KEY_MUTE: u16 = 113;
    pub const KEY_VOLUMEDOWN: u16 = 114;
    pub const KEY_VOLUMEUP: u16 = 115;
    pub const KEY_POWER: u16 = 116;
    pub const KEY_KPEQUAL: u16 = 117;
    pub const KEY_KPPLUSMINUS: u16 = 118;
    pub const KEY_PAUSE: u16 = 119;
    pub const KEY_KPCOMMA: u16 = 121;
    pub const KEY_HANGEUL: u16 = 122;
    pub const KEY_HANJA: u16 = 123;
    pub const KEY_YEN: u16 = 124;
    pub const KEY_LEFTMETA: u16 = 125;
    pub const KEY_RIGHTMETA: u16 = 126;
    pub const KEY_COMPOSE: u16 = 127;
    pub const KEY_STOP: u16 = 128;
    pub const KEY_AGAIN: u16 = 129;
    pub const KEY_UNDO: u16 = 131;
    pub const KEY_COPY: u16 = 133;
    pub const KEY_PASTE: u16 = 135;
    pub const KEY_FIND: u16 = 136;
    pub const KEY_CUT: u16 = 137;
    pub const KEY_HELP: u16 = 138;
    pub const KEY_MENU: u16 = 139;
    pub const KEY_CALC: u16 = 140;
    pub const KEY_SLEEP: u16 = 142;
    pub const KEY_WWW: u16 = 150;
    pub const KEY_MAIL: u16 = 155;
    pub const KEY_BOOKMARKS: u16 = 156;
    pub const KEY_COMPUTER: u16 = 157;
    pub const KEY_BACK: u16 = 158;
    pub const KEY_FORWARD: u16 = 159;
    pub const KEY_EJECTCD: u16 = 161;
    pub const KEY_NEXTSONG: u16 = 163;
    pub const KEY_PLAYPAUSE: u16 = 164;
    pub const KEY_PREVIOUSSONG: u16 = 165;
    pub const KEY_STOPCD: u16 = 166;
    pub const KEY_HOMEPAGE: u16 = 172;
    pub const KEY_REFRESH: u16 = 173;
    pub const KEY_F13: u16 = 183;
    pub const KEY_F14: u16 = 184;
    pub const KEY_F15: u16 = 185;
    pub const KEY_F16: u16 = 186;
    pub const KEY_F17: u16 = 187;
    pub const KEY_F18: u16 = 188;
    pub const KEY_F19: u16 = 189;
    pub const KEY_F20: u16 = 190;
    pub const KEY_F21: u16 = 191;
    pub const KEY_F22: u16 = 192;
    pub const KEY_F23: u16 = 193;
    pub const KEY_F24: u16 = 194;
    pub const KEY_PRINT: u16 = 210;
    pub const KEY_SEARCH: u16 = 217;
    pub const KEY_BRIGHTNESSDOWN: u16 = 224;
    pub const KEY_BRIGHTNESSUP: u16 = 225;
    pub const KEY_MEDIA: u16 = 226;
    pub const KEY_SWITCHVIDEOMODE: u16 = 227;
    pub const KEY_KBDILLUMTOGGLE: u16 = 228;
    pub const KEY_KBDILLUMDOWN: u16 = 229;
    pub const KEY_KBDILLUMUP: u16 = 230;
}

/// Position qualifier reported with browser key events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyLocation {
    #[default]
    Standard,
    Left,
    Right,
    Numpad,
}

impl KeyLocation {
    /// Decode a DOM `KeyboardEvent.location` value
    pub fn from_dom(location: u32) -> Self {
        match location {
            1 => Self::Left,
            2 => Self::Right,
            3 => Self::Numpad,
            _ => Self::Standard,
        }
    }
}

/// X server keycode numbering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum X11KeycodeSet {
    #[default]
    Evdev,
    Xfree86,
}

/// Dense native-code to scancode table
#[derive(Debug, Clone, Copy)]
pub struct ScancodeTable {
    name: &'static str,
    offset: u32,
    entries: &'static [Scancode],
}

impl ScancodeTable {
    pub const LINUX: ScancodeTable = ScancodeTable {
        name: "linux",
        offset: 0,
        entries: &LINUX_ENTRIES,
    };
    pub const X11_EVDEV: ScancodeTable = ScancodeTable {
        name: "x11-evdev",
        offset: 8,
        entries: &LINUX_ENTRIES,
    };
    pub const X11_XFREE86: ScancodeTable = ScancodeTable {
        name: "x11-xfree86",
        offset: 8,
        entries: &XFREE86_ENTRIES,
    };
    pub const BROWSER: ScancodeTable = ScancodeTable {
        name: "browser",
        offset: 0,
        entries: &BROWSER_ENTRIES,
    };

    /// Table for an X server keycode set
    pub fn x11(set: X11KeycodeSet) -> Self {
        match set {
            X11KeycodeSet::Evdev => Self::X11_EVDEV,
            X11KeycodeSet::Xfree86 => Self::X11_XFREE86,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Look up a native code, returning [`Scancode::UNKNOWN`] when unmapped
    pub fn lookup(&self, native: u32) -> Scancode {
        native
            .checked_sub(self.offset)
            .and_then(|index| self.entries.get(index as usize))
            .copied()
            .unwrap_or(Scancode::UNKNOWN)
    }

    /// Translate a native code
    ///
    /// # Errors
    ///
    /// Returns [`InputError::UnknownKeyCode`] when the code has no mapping.
    pub fn translate(&self, native: u32) -> Result<Scancode> {
        match self.lookup(native) {
            Scancode::UNKNOWN => Err(InputError::UnknownKeyCode(native)),
            scancode => Ok(scancode),
        }
    }

    /// Reverse lookup: lowest native code producing `scancode`
    pub fn native_code(&self, scancode: Scancode) -> Option<u32> {
        if scancode == Scancode::UNKNOWN {
            return None;
        }
        self.entries
            .iter()
            .position(|&entry| entry == scancode)
            .map(|index| index as u32 + self.offset)
    }

    pub fn is_mapped(&self, native: u32) -> bool {
        self.lookup(native) != Scancode::UNKNOWN
    }

    /// Number of native codes with a mapping
    pub fn mapped_key_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|&&entry| entry != Scancode::UNKNOWN)
            .count()
    }
}

/// Translate a browser key event, resolving side and keypad from `location`
pub fn browser_scancode(key_code: u32, location: KeyLocation) -> Scancode {
    let scancode = ScancodeTable::BROWSER.lookup(key_code);
    match location {
        KeyLocation::Right => match scancode {
            Scancode::LSHIFT => Scancode::RSHIFT,
            Scancode::LCTRL => Scancode::RCTRL,
            Scancode::LALT => Scancode::RALT,
            Scancode::LGUI => Scancode::RGUI,
            other => other,
        },
        KeyLocation::Numpad => match scancode {
            Scancode::NUM_0 | Scancode::INSERT => Scancode::KP_0,
            Scancode::NUM_1 | Scancode::END => Scancode::KP_1,
            Scancode::NUM_2 | Scancode::DOWN => Scancode::KP_2,
            Scancode::NUM_3 | Scancode::PAGEDOWN => Scancode::KP_3,
            Scancode::NUM_4 | Scancode::LEFT => Scancode::KP_4,
            Scancode::NUM_5 => Scancode::KP_5,
            Scancode::NUM_6 | Scancode::RIGHT => Scancode::KP_6,
            Scancode::NUM_7 | Scancode::HOME => Scancode::KP_7,
            Scancode::NUM_8 | Scancode::UP => Scancode::KP_8,
            Scancode::NUM_9 | Scancode::PAGEUP => Scancode::KP_9,
            Scancode::RETURN => Scancode::KP_ENTER,
            Scancode::DELETE => Scancode::KP_PERIOD,
            other => other,
        },
        KeyLocation::Standard | KeyLocation::Left => scancode,
    }
}

const fn dense<const N: usize>(pairs: &[(u16, Scancode)]) -> [Scancode; N] {
    let mut table = [Scancode::UNKNOWN; N];
    let mut i = 0;
    while i < pairs.len() {
        table[pairs[i].0 as usize] = pairs[i].1;
        i += 1;
    }
    table
}

/// Keys shared by evdev and the XFree86 set (AT set 1 order)
const AT_COMMON: &[(u16, Scancode)] = {
    use evdev::*;
    &[
        (KEY_ESC, Scancode::ESCAPE),
        (KEY_1, Scancode::NUM_1),
        (KEY_2, Scancode::NUM_2),
        (KEY_3, Scancode::NUM_3),
        (KEY_4, Scancode::NUM_4),
        (KEY_5, Scancode::NUM_5),
        (KEY_6, Scancode::NUM_6),
        (KEY_7, Scancode::NUM_7),
        (KEY_8, Scancode::NUM_8),
        (KEY_9, Scancode::NUM_9),
        (KEY_0, Scancode::NUM_0),
        (KEY_MINUS, Scancode::MINUS),
        (KEY_EQUAL, Scancode::EQUALS),
        (KEY_BACKSPACE, Scancode::BACKSPACE),
        (KEY_TAB, Scancode::TAB),
        (KEY_Q, Scancode::Q),
        (KEY_W, Scancode::W),
        (KEY_E, Scancode::E),
        (KEY_R, Scancode::R),
        (KEY_T, Scancode::T),
        (KEY_Y, Scancode::Y),
        (KEY_U, Scancode::U),
        (KEY_I, Scancode::I),
        (KEY_O, Scancode::O),
        (KEY_P, Scancode::P),
        (KEY_LEFTBRACE, Scancode::LEFTBRACKET),
        (KEY_RIGHTBRACE, Scancode::RIGHTBRACKET),
        (KEY_ENTER, Scancode::RETURN),
        (KEY_LEFTCTRL, Scancode::LCTRL),
        (KEY_A, Scancode::A),
        (KEY_S, Scancode::S),
        (KEY_D, Scancode::D),
        (KEY_F, Scancode::F),
        (KEY_G, Scancode::G),
        (KEY_H, Scancode::H),
        (KEY_J, Scancode::J),
        (KEY_K, Scancode::K),
        (KEY_L, Scancode::L),
        (KEY_SEMICOLON, Scancode::SEMICOLON),
        (KEY_APOSTROPHE, Scancode::APOSTROPHE),
        (KEY_GRAVE, Scancode::GRAVE),
        (KEY_LEFTSHIFT, Scancode::LSHIFT),
        (KEY_BACKSLASH, Scancode::BACKSLASH),
        (KEY_Z, Scancode::Z),
        (KEY_X, Scancode::X),
        (KEY_C, Scancode::C),
        (KEY_V, Scancode::V),
        (KEY_B, Scancode::B),
        (KEY_N, Scancode::N),
        (KEY_M, Scancode::M),
        (KEY_COMMA, Scancode::COMMA),
        (KEY_DOT, Scancode::PERIOD),
        (KEY_SLASH, Scancode::SLASH),
        (KEY_RIGHTSHIFT, Scancode::RSHIFT),
        (KEY_KPASTERISK, Scancode::KP_MULTIPLY),
        (KEY_LEFTALT, Scancode::LALT),
        (KEY_SPACE, Scancode::SPACE),
        (KEY_CAPSLOCK, Scancode::CAPSLOCK),
        (KEY_F1, Scancode::F1),
        (KEY_F2, Scancode::F2),
        (KEY_F3, Scancode::F3),
        (KEY_F4, Scancode::F4),
        (KEY_F5, Scancode::F5),
        (KEY_F6, Scancode::F6),
        (KEY_F7, Scancode::F7),
        (KEY_F8, Scancode::F8),
        (KEY_F9, Scancode::F9),
        (KEY_F10, Scancode::F10),
        (KEY_NUMLOCK, Scancode::NUMLOCKCLEAR),
        (KEY_SCROLLLOCK, Scancode::SCROLLLOCK),
        (KEY_KP7, Scancode::KP_7),
        (KEY_KP8, Scancode::KP_8),
        (KEY_KP9, Scancode::KP_9),
        (KEY_KPMINUS, Scancode::KP_MINUS),
        (KEY_KP4, Scancode::KP_4),
        (KEY_KP5, Scancode::KP_5),
        (KEY_KP6, Scancode::KP_6),
        (KEY_KPPLUS, Scancode::KP_PLUS),
        (KEY_KP1, Scancode::KP_1),
        (KEY_KP2, Scancode::KP_2),
        (KEY_KP3, Scancode::KP_3),
        (KEY_KP0, Scancode::KP_0),
        (KEY_KPDOT, Scancode::KP_PERIOD),
        (KEY_102ND, Scancode::NONUSBACKSLASH),
        (KEY_F11, Scancode::F11),
        (KEY_F12, Scancode::F12),
    ]
};

/// Keys where evdev departs from AT set 1
const EVDEV_EXTENDED: &[(u16, Scancode)] = {
    use evdev::*;
    &[
        (KEY_ZENKAKUHANKAKU, Scancode::LANG5),
        (KEY_RO, Scancode::INTERNATIONAL1),
        (KEY_KATAKANA, Scancode::LANG3),
        (KEY_HIRAGANA, Scancode::LANG4),
        (KEY_HENKAN, Scancode::INTERNATIONAL4),
        (KEY_KATAKANAHIRAGANA, Scancode::INTERNATIONAL2),
        (KEY_MUHENKAN, Scancode::INTERNATIONAL5),
        (KEY_KPENTER, Scancode::KP_ENTER),
        (KEY_RIGHTCTRL, Scancode::RCTRL),
        (KEY_KPSLASH, Scancode::KP_DIVIDE),
        (KEY_SYSRQ, Scancode::PRINTSCREEN),
        (KEY_RIGHTALT, Scancode::RALT),
        (KEY_HOME, Scancode::HOME),
        (KEY_UP, Scancode::UP),
        (KEY_PAGEUP, Scancode::PAGEUP),
        (KEY_LEFT, Scancode::LEFT),
        (KEY_RIGHT, Scancode::RIGHT),
        (KEY_END, Scancode::END),
        (KEY_DOWN, Scancode::DOWN),
        (KEY_PAGEDOWN, Scancode::PAGEDOWN),
        (KEY_INSERT, Scancode::INSERT),
        (KEY_DELETE, Scancode::DELETE),
        (KEY_MUTE, Scancode::MUTE),
        (KEY_VOLUMEDOWN, Scancode::VOLUMEDOWN),
        (KEY_VOLUMEUP, Scancode::VOLUMEUP),
        (KEY_POWER, Scancode::POWER),
        (KEY_KPEQUAL, Scancode::KP_EQUALS),
        (KEY_KPPLUSMINUS, Scancode::KP_PLUSMINUS),
        (KEY_PAUSE, Scancode::PAUSE),
        (KEY_KPCOMMA, Scancode::KP_COMMA),
        (KEY_HANGEUL, Scancode::LANG1),
        (KEY_HANJA, Scancode::LANG2),
        (KEY_YEN, Scancode::INTERNATIONAL3),
        (KEY_LEFTMETA, Scancode::LGUI),
        (KEY_RIGHTMETA, Scancode::RGUI),
        (KEY_COMPOSE, Scancode::APPLICATION),
        (KEY_STOP, Scancode::STOP),
        (KEY_AGAIN, Scancode::AGAIN),
        (KEY_UNDO, Scancode::UNDO),
        (KEY_COPY, Scancode::COPY),
        (KEY_PASTE, Scancode::PASTE),
        (KEY_FIND, Scancode::FIND),
        (KEY_CUT, Scancode::CUT),
        (KEY_HELP, Scancode::HELP),
        (KEY_MENU, Scancode::MENU),
        (KEY_CALC, Scancode::CALCULATOR),
        (KEY_SLEEP, Scancode::SLEEP),
        (KEY_WWW, Scancode::WWW),
        (KEY_MAIL, Scancode::MAIL),
        (KEY_BOOKMARKS, Scancode::AC_BOOKMARKS),
        (KEY_COMPUTER, Scancode::COMPUTER),
        (KEY_BACK, Scancode::AC_BACK),
        (KEY_FORWARD, Scancode::AC_FORWARD),
        (KEY_EJECTCD, Scancode::EJECT),
        (KEY_NEXTSONG, Scancode::AUDIONEXT),
        (KEY_PLAYPAUSE, Scancode::AUDIOPLAY),
        (KEY_PREVIOUSSONG, Scancode::AUDIOPREV),
        (KEY_STOPCD, Scancode::AUDIOSTOP),
        (KEY_HOMEPAGE, Scancode::AC_HOME),
        (KEY_REFRESH, Scancode::AC_REFRESH),
        (KEY_F13, Scancode::F13),
        (KEY_F14, Scancode::F14),
        (KEY_F15, Scancode::F15),
        (KEY_F16, Scancode::F16),
        (KEY_F17, Scancode::F17),
        (KEY_F18, Scancode::F18),
        (KEY_F19, Scancode::F19),
        (KEY_F20, Scancode::F20),
        (KEY_F21, Scancode::F21),
        (KEY_F22, Scancode::F22),
        (KEY_F23, Scancode::F23),
        (KEY_F24, Scancode::F24),
        (KEY_PRINT, Scancode::PRINTSCREEN),
        (KEY_SEARCH, Scancode::AC_SEARCH),
        (KEY_BRIGHTNESSDOWN, Scancode::BRIGHTNESSDOWN),
        (KEY_BRIGHTNESSUP, Scancode::BRIGHTNESSUP),
        (KEY_MEDIA, Scancode::MEDIASELECT),
        (KEY_SWITCHVIDEOMODE, Scancode::DISPLAYSWITCH),
        (KEY_KBDILLUMTOGGLE, Scancode::KBDILLUMTOGGLE),
        (KEY_KBDILLUMDOWN, Scancode::KBDILLUMDOWN),
        (KEY_KBDILLUMUP, Scancode::KBDILLUMUP),
    ]
};

/// XFree86 keycodes past the AT block (index is X keycode minus 8)
const XFREE86_EXTENDED: &[(u16, Scancode)] = &[
    (89, Scancode::HOME),
    (90, Scancode::UP),
    (91, Scancode::PAGEUP),
    (92, Scancode::LEFT),
    (93, Scancode::BRIGHTNESSDOWN),
    (94, Scancode::RIGHT),
    (95, Scancode::END),
    (96, Scancode::DOWN),
    (97, Scancode::PAGEDOWN),
    (98, Scancode::INSERT),
    (99, Scancode::DELETE),
    (100, Scancode::KP_ENTER),
    (101, Scancode::RCTRL),
    (102, Scancode::PAUSE),
    (103, Scancode::PRINTSCREEN),
    (104, Scancode::KP_DIVIDE),
    (105, Scancode::RALT),
    (107, Scancode::LGUI),
    (108, Scancode::RGUI),
    (109, Scancode::APPLICATION),
    (110, Scancode::F13),
    (111, Scancode::F14),
    (112, Scancode::F15),
    (113, Scancode::F16),
    (114, Scancode::F17),
    (118, Scancode::KP_EQUALS),
    (125, Scancode::INTERNATIONAL3),
];

/// DOM `keyCode` values
const BROWSER_KEYS: &[(u16, Scancode)] = &[
    (8, Scancode::BACKSPACE),
    (9, Scancode::TAB),
    (13, Scancode::RETURN),
    (16, Scancode::LSHIFT),
    (17, Scancode::LCTRL),
    (18, Scancode::LALT),
    (19, Scancode::PAUSE),
    (20, Scancode::CAPSLOCK),
    (27, Scancode::ESCAPE),
    (32, Scancode::SPACE),
    (33, Scancode::PAGEUP),
    (34, Scancode::PAGEDOWN),
    (35, Scancode::END),
    (36, Scancode::HOME),
    (37, Scancode::LEFT),
    (38, Scancode::UP),
    (39, Scancode::RIGHT),
    (40, Scancode::DOWN),
    (44, Scancode::PRINTSCREEN),
    (45, Scancode::INSERT),
    (46, Scancode::DELETE),
    (48, Scancode::NUM_0),
    (49, Scancode::NUM_1),
    (50, Scancode::NUM_2),
    (51, Scancode::NUM_3),
    (52, Scancode::NUM_4),
    (53, Scancode::NUM_5),
    (54, Scancode::NUM_6),
    (55, Scancode::NUM_7),
    (56, Scancode::NUM_8),
    (57, Scancode::NUM_9),
    (59, Scancode::SEMICOLON),
    (61, Scancode::EQUALS),
    (65, Scancode::A),
    (66, Scancode::B),
    (67, Scancode::C),
    (68, Scancode::D),
    (69, Scancode::E),
    (70, Scancode::F),
    (71, Scancode::G),
    (72, Scancode::H),
    (73, Scancode::I),
    (74, Scancode::J),
    (75, Scancode::K),
    (76, Scancode::L),
    (77, Scancode::M),
    (78, Scancode::N),
    (79, Scancode::O),
    (80, Scancode::P),
    (81, Scancode::Q),
    (82, Scancode::R),
    (83, Scancode::S),
    (84, Scancode::T),
    (85, Scancode::U),
    (86, Scancode::V),
    (87, Scancode::W),
    (88, Scancode::X),
    (89, Scancode::Y),
    (90, Scancode::Z),
    (91, Scancode::LGUI),
    (93, Scancode::APPLICATION),
    (96, Scancode::KP_0),
    (97, Scancode::KP_1),
    (98, Scancode::KP_2),
    (99, Scancode::KP_3),
    (100, Scancode::KP_4),
    (101, Scancode::KP_5),
    (102, Scancode::KP_6),
    (103, Scancode::KP_7),
    (104, Scancode::KP_8),
    (105, Scancode::KP_9),
    (106, Scancode::KP_MULTIPLY),
    (107, Scancode::KP_PLUS),
    (109, Scancode::KP_MINUS),
    (110, Scancode::KP_PERIOD),
    (111, Scancode::KP_DIVIDE),
    (112, Scancode::F1),
    (113, Scancode::F2),
    (114, Scancode::F3),
    (115, Scancode::F4),
    (116, Scancode::F5),
    (117, Scancode::F6),
    (118, Scancode::F7),
    (119, Scancode::F8),
    (120, Scancode::F9),
    (121, Scancode::F10),
    (122, Scancode::F11),
    (123, Scancode::F12),
    (124, Scancode::F13),
    (125, Scancode::F14),
    (126, Scancode::F15),
    (127, Scancode::F16),
    (128, Scancode::F17),
    (129, Scancode::F18),
    (130, Scancode::F19),
    (131, Scancode::F20),
    (132, Scancode::F21),
    (133, Scancode::F22),
    (134, Scancode::F23),
    (135, Scancode::F24),
    (144, Scancode::NUMLOCKCLEAR),
    (145, Scancode::SCROLLLOCK),
    (173, Scancode::MINUS),
    (174, Scancode::VOLUMEDOWN),
    (175, Scancode::VOLUMEUP),
    (176, Scancode::AUDIONEXT),
    (177, Scancode::AUDIOPREV),
    (178, Scancode::AUDIOSTOP),
    (179, Scancode::AUDIOPLAY),
    (181, Scancode::AUDIOMUTE),
    (186, Scancode::SEMICOLON),
    (187, Scancode::EQUALS),
    (188, Scancode::COMMA),
    (189, Scancode::MINUS),
    (190, Scancode::PERIOD),
    (191, Scancode::SLASH),
    (192, Scancode::GRAVE),
    (219, Scancode::LEFTBRACKET),
    (220, Scancode::BACKSLASH),
    (221, Scancode::RIGHTBRACKET),
    (222, Scancode::APOSTROPHE),
    (224, Scancode::LGUI),
];

const fn overlay<const N: usize>(
    mut table: [Scancode; N],
    pairs: &[(u16, Scancode)],
) -> [Scancode; N] {
    let mut i = 0;
    while i < pairs.len() {
        table[pairs[i].0 as usize] = pairs[i].1;
        i += 1;
    }
    table
}

static LINUX_ENTRIES: [Scancode; 256] = overlay(dense(AT_COMMON), EVDEV_EXTENDED);
static XFREE86_ENTRIES: [Scancode; 128] = overlay(dense(AT_COMMON), XFREE86_EXTENDED);
static BROWSER_ENTRIES: [Scancode; 256] = dense(BROWSER_KEYS);
