//! Canonical Key Identifiers
//!
//! [`Scancode`] names a physical key position (USB HID usage page 0x07
//! numbering), independent of layout. [`Keycode`] names the symbol a key
//! produces under the active keymap: printable keys use their character,
//! everything else is the scancode with [`SCANCODE_MASK`] set.
//!
//! Platform pumps translate native identifiers through the static tables in
//! [`tables`].

use enumflags2::{bitflags, BitFlags};
use serde::{Deserialize, Serialize};

pub mod keymap;
pub mod tables;

pub use keymap::{default_keymap, Keymap};
pub use tables::{browser_scancode, KeyLocation, ScancodeTable, X11KeycodeSet};

/// Number of canonical scancodes
pub const NUM_SCANCODES: usize = 512;

/// Bit set on keycodes derived directly from a scancode
pub const SCANCODE_MASK: u32 = 1 << 30;

/// Physical key position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Scancode(pub u16);

impl Scancode {
    pub const UNKNOWN: Scancode = Scancode(0);

    pub const A: Scancode = Scancode(4);
    pub const B: Scancode = Scancode(5);
    pub const C: Scancode = Scancode(6);
    pub const D: Scancode = Scancode(7);
    pub const E: Scancode = Scancode(8);
    pub const F: Scancode = Scancode(9);
    pub const G: Scancode = Scancode(10);
    pub const H: Scancode = Scancode(11);
    pub const I: Scancode = Scancode(12);
    pub const J: Scancode = Scancode(13);
    pub const K: Scancode = Scancode(14);
    pub const L: Scancode = Scancode(15);
    pub const M: Scancode = Scancode(16);
    pub const N: Scancode = Scancode(17);
    pub const O: Scancode = Scancode(18);
    pub const P: Scancode = Scancode(19);
    pub const Q: Scancode = Scancode(20);
    pub const R: Scancode = Scancode(21);
    pub const S: Scancode = Scancode(22);
    pub const T: Scancode = Scancode(23);
    pub const U: Scancode = Scancode(24);
    pub const V: Scancode = Scancode(25);
    pub const W: Scancode = Scancode(26);
    pub const X: Scancode = Scancode(27);
    pub const Y: Scancode = Scancode(28);
    pub const Z: Scancode = Scancode(29);

    pub const NUM_1: Scancode = Scancode(30);
    pub const NUM_2: Scancode = Scancode(31);
    pub const NUM_3: Scancode = Scancode(32);
    pub const NUM_4: Scancode = Scancode(33);
    pub const NUM_5: Scancode = Scancode(34);
    pub const NUM_6: Scancode = Scancode(35);
    pub const NUM_7: Scancode = Scancode(36);
    pub const NUM_8: Scancode = Scancode(37);
    pub const NUM_9: Scancode = Scancode(38);
    pub const NUM_0: Scancode = Scancode(39);

    pub const RETURN: Scancode = Scancode(40);
    pub const ESCAPE: Scancode = Scancode(41);
    pub const BACKSPACE: Scancode = Scancode(42);
    pub const TAB: Scancode = Scancode(43);
    pub const SPACE: Scancode = Scancode(44);
    pub const MINUS: Scancode = Scancode(45);
    pub const EQUALS: Scancode = Scancode(46);
    pub const LEFTBRACKET: Scancode = Scancode(47);
    pub const RIGHTBRACKET: Scancode = Scancode(48);
    pub const BACKSLASH: Scancode = Scancode(49);
    pub const NONUSHASH: Scancode = Scancode(50);
    pub const SEMICOLON: Scancode = Scancode(51);
    pub const APOSTROPHE: Scancode = Scancode(52);
    pub const GRAVE: Scancode = Scancode(53);
    pub const COMMA: Scancode = Scancode(54);
    pub const PERIOD: Scancode = Scancode(55);
    pub const SLASH: Scancode = Scancode(56);
    pub const CAPSLOCK: Scancode = Scancode(57);

    pub const F1: Scancode = Scancode(58);
    pub const F2: Scancode = Scancode(59);
    pub const F3: Scancode = Scancode(60);
    pub const F4: Scancode = Scancode(61);
    pub const F5: Scancode = Scancode(62);
    pub const F6: Scancode = Scancode(63);
    pub const F7: Scancode = Scancode(64);
    pub const F8: Scancode = Scancode(65);
    pub const F9: Scancode = Scancode(66);
    pub const F10: Scancode = Scancode(67);
    pub const F11: Scancode = Scancode(68);
    pub const F12: Scancode = Scancode(69);

    pub const PRINTSCREEN: Scancode = Scancode(70);
    pub const SCROLLLOCK: Scancode = Scancode(71);
    pub const PAUSE: Scancode = Scancode(72);
    pub const INSERT: Scancode = Scancode(73);
    pub const HOME: Scancode = Scancode(74);
    pub const PAGEUP: Scancode = Scancode(75);
    pub const DELETE: Scancode = Scancode(76);
    pub const END: Scancode = Scancode(77);
    pub const PAGEDOWN: Scancode = Scancode(78);
    pub const RIGHT: Scancode = Scancode(79);
    pub const LEFT: Scancode = Scancode(80);
    pub const DOWN: Scancode = Scancode(81);
    pub const UP: Scancode = Scancode(82);

    pub const NUMLOCKCLEAR: Scancode = Scancode(83);
    pub const KP_DIVIDE: Scancode = Scancode(84);
    pub const KP_MULTIPLY: Scancode = Scancode(85);
    pub const KP_MINUS: Scancode = Scancode(86);
    pub const KP_PLUS: Scancode = Scancode(87);
    pub const KP_ENTER: Scancode = Scancode(88);
    pub const KP_1: Scancode = Scancode(89);
    pub const KP_2: Scancode = Scancode(90);
    pub const KP_3: Scancode = Scancode(91);
    pub const KP_4: Scancode = Scancode(92);
    pub const KP_5: Scancode = Scancode(93);
    pub const KP_6: Scancode = Scancode(94);
    pub const KP_7: Scancode = Scancode(95);
    pub const KP_8: Scancode = Scancode(96);
    pub const KP_9: Scancode = Scancode(97);
    pub const KP_0: Scancode = Scancode(98);
    pub const KP_PERIOD: Scancode = Scancode(99);

    pub const NONUSBACKSLASH: Scancode = Scancode(100);
    pub const APPLICATION: Scancode = Scancode(101);
    pub const POWER: Scancode = Scancode(102);
    pub const KP_EQUALS: Scancode = Scancode(103);
    pub const F13: Scancode = Scancode(104);
    pub const F14: Scancode = Scancode(105);
    pub const F15: Scancode = Scancode(106);
    pub const F16: Scancode = Scancode(107);
    pub const F17: Scancode = Scancode(108);
    pub const F18: Scancode = Scancode(109);
    pub const F19: Scancode = Scancode(110);
    pub const F20: Scancode = Scancode(111);
    pub const F21: Scancode = Scancode(112);
    pub const F22: Scancode = Scancode(113);
    pub const F23: Scancode = Scancode(114);
    pub const F24: Scancode = Scancode(115);
    pub const EXECUTE: Scancode = Scancode(116);
    pub const HELP: Scancode = Scancode(117);
    pub const MENU: Scancode = Scancode(118);
    pub const SELECT: Scancode = Scancode(119);
    pub const STOP: Scancode = Scancode(120);
    pub const AGAIN: Scancode = Scancode(121);
    pub const UNDO: Scancode = Scancode(122);
    pub const CUT: Scancode = Scancode(123);
    pub const COPY: Scancode = Scancode(124);
    pub const PASTE: Scancode = Scancode(125);
    pub const FIND: Scancode = Scancode(126);
    pub const MUTE: Scancode = Scancode(127);
    pub const VOLUMEUP: Scancode = Scancode(128);
    pub const VOLUMEDOWN: Scancode = Scancode(129);
    pub const KP_COMMA: Scancode = Scancode(133);
    pub const KP_EQUALSAS400: Scancode = Scancode(134);

    pub const INTERNATIONAL1: Scancode = Scancode(135);
    pub const INTERNATIONAL2: Scancode = Scancode(136);
    pub const INTERNATIONAL3: Scancode = Scancode(137);
    pub const INTERNATIONAL4: Scancode = Scancode(138);
    pub const INTERNATIONAL5: Scancode = Scancode(139);
    pub const LANG1: Scancode = Scancode(144);
    pub const LANG2: Scancode = Scancode(145);
    pub const LANG3: Scancode = Scancode(146);
    pub const LANG4: Scancode = Scancode(147);
    pub const LANG5: Scancode = Scancode(148);

    pub const SYSREQ: Scancode = Scancode(154);
    pub const KP_PLUSMINUS: Scancode = Scancode(215);

    pub const LCTRL: Scancode = Scancode(224);
    pub const LSHIFT: Scancode = Scancode(225);
    pub const LALT: Scancode = Scancode(226);
    pub const LGUI: Scancode = Scancode(227);
    pub const RCTRL: Scancode = Scancode(228);
    pub const RSHIFT: Scancode = Scancode(229);
    pub const RALT: Scancode = Scancode(230);
    pub const RGUI: Scancode = Scancode(231);

    pub const MODE: Scancode = Scancode(257);
    pub const AUDIONEXT: Scancode = Scancode(258);
    pub const AUDIOPREV: Scancode = Scancode(259);
    pub const AUDIOSTOP: Scancode = Scancode(260);
    pub const AUDIOPLAY: Scancode = Scancode(261);
    pub const AUDIOMUTE: Scancode = Scancode(262);
    pub const MEDIASELECT: Scancode = Scancode(263);
    pub const WWW: Scancode = Scancode(264);
    pub const MAIL: Scancode = Scancode(265);
    pub const CALCULATOR: Scancode = Scancode(266);
    pub const COMPUTER: Scancode = Scancode(267);
    pub const AC_SEARCH: Scancode = Scancode(268);
    pub const AC_HOME: Scancode = Scancode(269);
    pub const AC_BACK: Scancode = Scancode(270);
    pub const AC_FORWARD: Scancode = Scancode(271);
    pub const AC_STOP: Scancode = Scancode(272);
    pub const AC_REFRESH: Scancode = Scancode(273);
    pub const AC_BOOKMARKS: Scancode = Scancode(274);
    pub const BRIGHTNESSDOWN: Scancode = Scancode(275);
    pub const BRIGHTNESSUP: Scancode = Scancode(276);
    pub const DISPLAYSWITCH: Scancode = Scancode(277);
    pub const KBDILLUMTOGGLE: Scancode = Scancode(278);
    pub const KBDILLUMDOWN: Scancode = Scancode(279);
    pub const KBDILLUMUP: Scancode = Scancode(280);
    pub const EJECT: Scancode = Scancode(281);
    pub const SLEEP: Scancode = Scancode(282);

    /// Index into per-scancode arrays
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Whether the value addresses a real key slot
    pub fn is_valid(self) -> bool {
        self != Self::UNKNOWN && (self.0 as usize) < NUM_SCANCODES
    }

    /// Modifier keys (Ctrl, Shift, Alt, GUI on either side)
    pub fn is_modifier(self) -> bool {
        (Self::LCTRL.0..=Self::RGUI.0).contains(&self.0)
    }
}

/// Symbol produced by a key under the active keymap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Keycode(pub u32);

impl Keycode {
    pub const UNKNOWN: Keycode = Keycode(0);
    pub const RETURN: Keycode = Keycode('\r' as u32);
    pub const ESCAPE: Keycode = Keycode(0x1B);
    pub const BACKSPACE: Keycode = Keycode(0x08);
    pub const TAB: Keycode = Keycode('\t' as u32);
    pub const SPACE: Keycode = Keycode(' ' as u32);
    pub const DELETE: Keycode = Keycode(0x7F);

    pub const CAPSLOCK: Keycode = Keycode::from_scancode(Scancode::CAPSLOCK);
    pub const NUMLOCKCLEAR: Keycode = Keycode::from_scancode(Scancode::NUMLOCKCLEAR);
    pub const SCROLLLOCK: Keycode = Keycode::from_scancode(Scancode::SCROLLLOCK);
    pub const LCTRL: Keycode = Keycode::from_scancode(Scancode::LCTRL);
    pub const LSHIFT: Keycode = Keycode::from_scancode(Scancode::LSHIFT);
    pub const LALT: Keycode = Keycode::from_scancode(Scancode::LALT);
    pub const LGUI: Keycode = Keycode::from_scancode(Scancode::LGUI);
    pub const RCTRL: Keycode = Keycode::from_scancode(Scancode::RCTRL);
    pub const RSHIFT: Keycode = Keycode::from_scancode(Scancode::RSHIFT);
    pub const RALT: Keycode = Keycode::from_scancode(Scancode::RALT);
    pub const RGUI: Keycode = Keycode::from_scancode(Scancode::RGUI);
    pub const MODE: Keycode = Keycode::from_scancode(Scancode::MODE);

    /// Keycode that names a scancode directly
    pub const fn from_scancode(scancode: Scancode) -> Self {
        Keycode(scancode.0 as u32 | SCANCODE_MASK)
    }

    /// Keycode of a printable character
    pub const fn from_char(c: char) -> Self {
        Keycode(c as u32)
    }

    /// Character this keycode stands for, if printable
    pub fn as_char(self) -> Option<char> {
        if self.0 & SCANCODE_MASK != 0 {
            return None;
        }
        char::from_u32(self.0).filter(|c| !c.is_control())
    }
}

/// Modifier key or lock state
#[bitflags]
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyMod {
    LShift = 0x0001,
    RShift = 0x0002,
    LCtrl = 0x0040,
    RCtrl = 0x0080,
    LAlt = 0x0100,
    RAlt = 0x0200,
    LGui = 0x0400,
    RGui = 0x0800,
    Num = 0x1000,
    Caps = 0x2000,
    Mode = 0x4000,
    Scroll = 0x8000,
}

/// Set of active modifiers
pub type KeyMods = BitFlags<KeyMod>;

impl KeyMod {
    /// Modifier held while `scancode` is down
    pub fn held_by(scancode: Scancode) -> Option<KeyMod> {
        Some(match scancode {
            Scancode::LSHIFT => KeyMod::LShift,
            Scancode::RSHIFT => KeyMod::RShift,
            Scancode::LCTRL => KeyMod::LCtrl,
            Scancode::RCTRL => KeyMod::RCtrl,
            Scancode::LALT => KeyMod::LAlt,
            Scancode::RALT => KeyMod::RAlt,
            Scancode::LGUI => KeyMod::LGui,
            Scancode::RGUI => KeyMod::RGui,
            Scancode::MODE => KeyMod::Mode,
            _ => return None,
        })
    }

    /// Lock toggled by pressing `scancode`
    pub fn toggled_by(scancode: Scancode) -> Option<KeyMod> {
        match scancode {
            Scancode::CAPSLOCK => Some(KeyMod::Caps),
            Scancode::NUMLOCKCLEAR => Some(KeyMod::Num),
            Scancode::SCROLLLOCK => Some(KeyMod::Scroll),
            _ => None,
        }
    }
}
