//! Logical joystick
//!
//! One per opened low-level device. Holds the last reported controls and
//! emits an event only when a control actually changes.

use crate::backend::Dispatch;
use crate::events::{EventData, JoystickId};
use crate::joystick::correlation::{MatchState, SourceLink, SHADOW_SOURCES};
use crate::joystick::report::LowLevelReport;

pub const AXIS_LEFTX: u8 = 0;
pub const AXIS_LEFTY: u8 = 1;
pub const AXIS_RIGHTX: u8 = 2;
pub const AXIS_RIGHTY: u8 = 3;
pub const AXIS_TRIGGERLEFT: u8 = 4;
pub const AXIS_TRIGGERRIGHT: u8 = 5;
pub const NUM_AXES: usize = 6;

/// Report buttons 0..9 plus the guide button
pub const NUM_BUTTONS: usize = 11;
pub const GUIDE_BUTTON: u8 = 10;
pub const NUM_HATS: usize = 1;

/// Timed rumble in progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rumble {
    pub low: u16,
    pub high: u16,
    /// Stop time on the context clock; `None` runs until replaced
    pub deadline: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct Joystick {
    id: JoystickId,
    name: String,
    path: String,
    axes: [i16; NUM_AXES],
    buttons: [bool; NUM_BUTTONS],
    hat: u8,
    report: Option<LowLevelReport>,
    pub(crate) links: [SourceLink; SHADOW_SOURCES],
    pub(crate) rumble: Option<Rumble>,
}

impl Joystick {
    pub fn new(id: JoystickId, name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            path: path.into(),
            axes: [0; NUM_AXES],
            buttons: [false; NUM_BUTTONS],
            hat: 0,
            report: None,
            links: [SourceLink::default(); SHADOW_SOURCES],
            rumble: None,
        }
    }

    pub fn id(&self) -> JoystickId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Device path this joystick was opened from
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn axis(&self, axis: u8) -> Option<i16> {
        self.axes.get(axis as usize).copied()
    }

    pub fn button(&self, button: u8) -> Option<bool> {
        self.buttons.get(button as usize).copied()
    }

    pub fn hat(&self) -> u8 {
        self.hat
    }

    /// Most recent low-level report
    pub fn last_report(&self) -> Option<&LowLevelReport> {
        self.report.as_ref()
    }

    pub fn rumble_state(&self) -> Option<Rumble> {
        self.rumble
    }

    /// Correlation link for a shadow source
    pub fn link(&self, source: usize) -> Option<&SourceLink> {
        self.links.get(source)
    }

    pub fn is_correlated(&self) -> bool {
        self.links.iter().any(|link| link.correlated)
    }

    /// Match state built from the last report
    pub fn match_state(&self) -> MatchState {
        self.report
            .as_ref()
            .map_or(MatchState::default(), MatchState::from_report)
    }

    pub fn set_axis(&mut self, axis: u8, value: i16, d: &Dispatch<'_>) -> bool {
        let Some(slot) = self.axes.get_mut(axis as usize) else {
            return false;
        };
        if *slot == value {
            return false;
        }
        *slot = value;
        d.push(EventData::JoyAxis {
            which: self.id,
            axis,
            value,
        })
    }

    pub fn set_button(&mut self, button: u8, pressed: bool, d: &Dispatch<'_>) -> bool {
        let Some(slot) = self.buttons.get_mut(button as usize) else {
            return false;
        };
        if *slot == pressed {
            return false;
        }
        *slot = pressed;
        d.push(EventData::JoyButton {
            which: self.id,
            button,
            pressed,
        })
    }

    pub fn set_hat(&mut self, value: u8, d: &Dispatch<'_>) -> bool {
        if self.hat == value {
            return false;
        }
        self.hat = value;
        d.push(EventData::JoyHat {
            which: self.id,
            hat: 0,
            value,
        })
    }

    /// Apply a low-level report
    ///
    /// With `report_triggers` off the trigger axes are left to a correlated
    /// shadow slot, which reports them separately.
    pub fn apply_report(&mut self, report: LowLevelReport, report_triggers: bool, d: &Dispatch<'_>) {
        for (axis, index) in [AXIS_LEFTX, AXIS_LEFTY, AXIS_RIGHTX, AXIS_RIGHTY]
            .into_iter()
            .zip(0..)
        {
            self.set_axis(axis, report.stick(index), d);
        }
        if report_triggers {
            let (left, right) = report.triggers();
            self.set_axis(AXIS_TRIGGERLEFT, left, d);
            self.set_axis(AXIS_TRIGGERRIGHT, right, d);
        }
        for button in 0..GUIDE_BUTTON {
            self.set_button(button, report.button(button), d);
        }
        self.set_hat(report.hat_bits(), d);
        self.report = Some(report);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventQueue;
    use crate::joystick::report::HAT_UP;
    use crate::platform::HeadlessBackend;

    #[test]
    fn test_only_changes_emit_events() {
        let mut backend = HeadlessBackend::new();
        let queue = EventQueue::default();
        let d = Dispatch::new(&mut backend, &queue, 0);
        let mut joystick = Joystick::new(3, "pad", "/dev/pad0");

        let mut report = LowLevelReport {
            sticks: [32768; 4],
            trigger: 32768,
            ..LowLevelReport::default()
        };
        joystick.apply_report(report, true, &d);
        assert!(queue.is_empty());

        report.buttons = 0b1;
        report.hat = 1;
        report.sticks[0] = 40000;
        joystick.apply_report(report, true, &d);
        assert_eq!(queue.len(), 3);
        assert_eq!(joystick.axis(AXIS_LEFTX), Some(7232));
        assert_eq!(joystick.button(0), Some(true));
        assert_eq!(joystick.hat(), HAT_UP);

        joystick.apply_report(report, true, &d);
        assert_eq!(queue.len(), 3);
    }

    #[test]
    fn test_triggers_left_to_shadow() {
        let mut backend = HeadlessBackend::new();
        let queue = EventQueue::default();
        let d = Dispatch::new(&mut backend, &queue, 0);
        let mut joystick = Joystick::new(1, "pad", "p");

        let report = LowLevelReport {
            sticks: [32768; 4],
            trigger: 0,
            ..LowLevelReport::default()
        };
        joystick.apply_report(report, false, &d);
        assert_eq!(joystick.axis(AXIS_TRIGGERLEFT), Some(0));
        joystick.apply_report(report, true, &d);
        assert_eq!(joystick.axis(AXIS_TRIGGERLEFT), Some(i16::MAX));
    }

    #[test]
    fn test_out_of_range_controls_ignored() {
        let mut backend = HeadlessBackend::new();
        let queue = EventQueue::default();
        let d = Dispatch::new(&mut backend, &queue, 0);
        let mut joystick = Joystick::new(1, "pad", "p");
        assert!(!joystick.set_axis(NUM_AXES as u8, 5, &d));
        assert!(!joystick.set_button(NUM_BUTTONS as u8, true, &d));
        assert!(joystick.set_button(GUIDE_BUTTON, true, &d));
    }
}
