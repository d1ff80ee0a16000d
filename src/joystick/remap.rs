//! Button layout tables
//!
//! Each shadow source numbers its buttons differently. A [`ButtonLayout`]
//! lists, for every canonical gamepad button, the bit the source uses for it,
//! so remapping is a table walk instead of shift arithmetic.

use serde::{Deserialize, Serialize};

/// Canonical gamepad button; the discriminant is its bit in a match state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum GamepadButton {
    A = 0,
    B = 1,
    X = 2,
    Y = 3,
    LeftShoulder = 4,
    RightShoulder = 5,
    Back = 6,
    Start = 7,
    LeftStick = 8,
    RightStick = 9,
    Guide = 10,
    DpadUp = 11,
    DpadDown = 12,
    DpadLeft = 13,
    DpadRight = 14,
}

impl GamepadButton {
    pub const fn bit(self) -> u16 {
        1 << self as u8
    }
}

/// Native bit assignment of one source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonLayout {
    pub name: &'static str,
    /// Canonical button and the native mask that reports it; guide excluded
    pub buttons: &'static [(GamepadButton, u32)],
    /// Native guide mask, if the source reports the guide button
    pub guide: Option<u32>,
    /// Source reports stick Y with up positive
    pub invert_y: bool,
}

impl ButtonLayout {
    /// Polling API with fixed user slots (`XINPUT_GAMEPAD_*` bits)
    pub const POLLING: ButtonLayout = ButtonLayout {
        name: "polling",
        buttons: &[
            (GamepadButton::DpadUp, 0x0001),
            (GamepadButton::DpadDown, 0x0002),
            (GamepadButton::DpadLeft, 0x0004),
            (GamepadButton::DpadRight, 0x0008),
            (GamepadButton::Start, 0x0010),
            (GamepadButton::Back, 0x0020),
            (GamepadButton::LeftStick, 0x0040),
            (GamepadButton::RightStick, 0x0080),
            (GamepadButton::LeftShoulder, 0x0100),
            (GamepadButton::RightShoulder, 0x0200),
            (GamepadButton::A, 0x1000),
            (GamepadButton::B, 0x2000),
            (GamepadButton::X, 0x4000),
            (GamepadButton::Y, 0x8000),
        ],
        guide: Some(0x0400),
        invert_y: true,
    };

    /// Higher-level gamepad API (`GamepadButtons` flags)
    pub const GAMEPAD: ButtonLayout = ButtonLayout {
        name: "gamepad",
        buttons: &[
            (GamepadButton::Start, 0x0001),
            (GamepadButton::Back, 0x0002),
            (GamepadButton::A, 0x0004),
            (GamepadButton::B, 0x0008),
            (GamepadButton::X, 0x0010),
            (GamepadButton::Y, 0x0020),
            (GamepadButton::DpadUp, 0x0040),
            (GamepadButton::DpadDown, 0x0080),
            (GamepadButton::DpadLeft, 0x0100),
            (GamepadButton::DpadRight, 0x0200),
            (GamepadButton::LeftShoulder, 0x0400),
            (GamepadButton::RightShoulder, 0x0800),
            (GamepadButton::LeftStick, 0x1000),
            (GamepadButton::RightStick, 0x2000),
        ],
        guide: None,
        invert_y: true,
    };

    /// Low-level report button bits 0..9, already in canonical order
    pub const REPORT: ButtonLayout = ButtonLayout {
        name: "report",
        buttons: &[
            (GamepadButton::A, 1 << 0),
            (GamepadButton::B, 1 << 1),
            (GamepadButton::X, 1 << 2),
            (GamepadButton::Y, 1 << 3),
            (GamepadButton::LeftShoulder, 1 << 4),
            (GamepadButton::RightShoulder, 1 << 5),
            (GamepadButton::Back, 1 << 6),
            (GamepadButton::Start, 1 << 7),
            (GamepadButton::LeftStick, 1 << 8),
            (GamepadButton::RightStick, 1 << 9),
        ],
        guide: None,
        invert_y: false,
    };

    /// Native bits to canonical bits; the guide button is never included
    pub fn remap(&self, native: u32) -> u16 {
        self.buttons
            .iter()
            .filter(|(_, mask)| native & mask != 0)
            .fold(0, |bits, (button, _)| bits | button.bit())
    }

    pub fn guide_pressed(&self, native: u32) -> bool {
        self.guide.is_some_and(|mask| native & mask != 0)
    }

    /// Native mask for a canonical button
    pub fn native_mask(&self, button: GamepadButton) -> Option<u32> {
        if button == GamepadButton::Guide {
            return self.guide;
        }
        self.buttons
            .iter()
            .find(|(b, _)| *b == button)
            .map(|(_, mask)| *mask)
    }
}
