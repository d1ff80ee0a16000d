//! Touch Registry
//!
//! Devices and their active contacts, keyed by opaque ids. Coordinates arrive
//! normalised to `[0, 1]` and the registry never interprets them beyond
//! computing deltas.
//!
//! When mouse emulation is on, the first finger down on any device drives a
//! synthetic left button. The registry only reports what the pointer should
//! do ([`PointerEmulation`]); the context turns that into mouse calls.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::backend::Dispatch;
use crate::error::{InputError, Result};
use crate::events::{EventData, FingerId, FingerPhase, TouchId, WindowId, MOUSE_TOUCH_ID};

/// How a touch surface relates to the screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TouchDeviceType {
    /// Touchscreen
    #[default]
    Direct,
    /// Trackpad with absolute coordinates
    IndirectAbsolute,
    /// Trackpad with relative coordinates
    IndirectRelative,
}

/// Active contact
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Finger {
    pub id: FingerId,
    pub x: f32,
    pub y: f32,
    pub pressure: f32,
}

/// Registered touch device
#[derive(Debug, Clone)]
pub struct Touch {
    pub id: TouchId,
    pub device_type: TouchDeviceType,
    pub name: String,
    fingers: Vec<Finger>,
}

impl Touch {
    pub fn fingers(&self) -> &[Finger] {
        &self.fingers
    }

    fn finger_index(&self, id: FingerId) -> Option<usize> {
        self.fingers.iter().position(|f| f.id == id)
    }
}

/// Pointer action synthesised from a touch, in normalised coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEmulation {
    Press { window: WindowId, x: f32, y: f32 },
    Release { window: WindowId, x: f32, y: f32 },
    Motion { window: WindowId, x: f32, y: f32 },
}

/// Result of a touch call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TouchOutcome {
    /// At least one finger event was queued
    pub posted: bool,
    /// Pointer actions to replay on the mouse, in order
    pub emulation: Vec<PointerEmulation>,
}

/// Map a normalised coordinate onto `[0, size - 1]`
pub fn denormalize(value: f32, size: i32) -> i32 {
    ((value * size as f32) as i32).clamp(0, (size - 1).max(0))
}

/// Touch devices and their fingers
#[derive(Debug, Default)]
pub struct TouchRegistry {
    devices: Vec<Touch>,
    emulate_mouse: bool,
    tracking: Option<(TouchId, FingerId)>,
}

impl TouchRegistry {
    pub fn new(emulate_mouse: bool) -> Self {
        Self {
            devices: Vec::new(),
            emulate_mouse,
            tracking: None,
        }
    }

    pub fn set_mouse_emulation(&mut self, enabled: bool) {
        self.emulate_mouse = enabled;
        if !enabled {
            self.tracking = None;
        }
    }

    /// Register a device; registering a known id returns its index unchanged
    ///
    /// # Errors
    ///
    /// [`InputError::OutOfMemory`] when the device list cannot grow.
    pub fn add_touch(&mut self, id: TouchId, device_type: TouchDeviceType, name: &str) -> Result<usize> {
        if let Some(index) = self.index_of(id) {
            return Ok(index);
        }
        self.devices
            .try_reserve(1)
            .map_err(|_| InputError::OutOfMemory("touch devices"))?;
        self.devices.push(Touch {
            id,
            device_type,
            name: name.to_string(),
            fingers: Vec::new(),
        });
        debug!(touch_id = id, name, "Touch device added");
        Ok(self.devices.len() - 1)
    }

    /// Remove a device together with its fingers
    pub fn del_touch(&mut self, id: TouchId) {
        if let Some(index) = self.index_of(id) {
            self.devices.remove(index);
            if matches!(self.tracking, Some((touch, _)) if touch == id) {
                self.tracking = None;
            }
            debug!(touch_id = id, "Touch device removed");
        }
    }

    fn index_of(&self, id: TouchId) -> Option<usize> {
        self.devices.iter().position(|t| t.id == id)
    }

    pub fn touch_devices(&self) -> Vec<TouchId> {
        self.devices.iter().map(|t| t.id).collect()
    }

    pub fn touch(&self, id: TouchId) -> Option<&Touch> {
        self.devices.iter().find(|t| t.id == id)
    }

    /// Active fingers of a device
    pub fn fingers(&self, id: TouchId) -> Option<&[Finger]> {
        self.touch(id).map(Touch::fingers)
    }

    pub fn finger(&self, id: TouchId, index: usize) -> Option<&Finger> {
        self.touch(id).and_then(|t| t.fingers.get(index))
    }

    fn emulates(&self, id: TouchId) -> bool {
        self.emulate_mouse && id != MOUSE_TOUCH_ID
    }

    /// Report a finger going down or up
    ///
    /// Unknown devices are registered on the fly. A second down for an
    /// active finger first lifts it; an up for an unknown finger is a no-op.
    ///
    /// # Errors
    ///
    /// [`InputError::OutOfMemory`] when the device or finger list cannot
    /// grow; nothing is changed in that case.
    #[allow(clippy::too_many_arguments)]
    pub fn send_touch(
        &mut self,
        id: TouchId,
        finger_id: FingerId,
        window: Option<WindowId>,
        down: bool,
        x: f32,
        y: f32,
        pressure: f32,
        d: &mut Dispatch<'_>,
    ) -> Result<TouchOutcome> {
        let index = match self.index_of(id) {
            Some(index) => index,
            None => self.add_touch(id, TouchDeviceType::Direct, "")?,
        };
        let mut outcome = TouchOutcome::default();

        if down {
            // Reserve before any implicit lift so a failure changes nothing
            self.devices[index]
                .fingers
                .try_reserve(1)
                .map_err(|_| InputError::OutOfMemory("touch fingers"))?;
            if self.devices[index].finger_index(finger_id).is_some() {
                let lifted = self.send_touch(id, finger_id, window, false, x, y, pressure, d)?;
                outcome.posted |= lifted.posted;
                outcome.emulation.extend(lifted.emulation);
            }

            self.devices[index].fingers.push(Finger {
                id: finger_id,
                x,
                y,
                pressure,
            });

            if self.emulates(id) && self.tracking.is_none() {
                if let Some(window) = window {
                    self.tracking = Some((id, finger_id));
                    outcome.emulation.push(PointerEmulation::Motion { window, x, y });
                    outcome.emulation.push(PointerEmulation::Press { window, x, y });
                }
            }

            outcome.posted |= d.push(EventData::Finger {
                phase: FingerPhase::Down,
                touch_id: id,
                finger_id,
                window,
                x,
                y,
                dx: 0.0,
                dy: 0.0,
                pressure,
            });
        } else {
            let touch = &mut self.devices[index];
            let Some(finger_index) = touch.finger_index(finger_id) else {
                return Ok(outcome);
            };
            touch.fingers.remove(finger_index);

            if self.tracking == Some((id, finger_id)) {
                self.tracking = None;
                if let Some(window) = window {
                    outcome.emulation.push(PointerEmulation::Release { window, x, y });
                }
            }

            outcome.posted |= d.push(EventData::Finger {
                phase: FingerPhase::Up,
                touch_id: id,
                finger_id,
                window,
                x,
                y,
                dx: 0.0,
                dy: 0.0,
                pressure,
            });
        }
        Ok(outcome)
    }

    /// Report finger motion
    ///
    /// Motion for a finger that is not down is a no-op, as is a sample that
    /// changes nothing.
    ///
    /// # Errors
    ///
    /// [`InputError::UnknownTouchDevice`] when `id` was never registered.
    pub fn send_touch_motion(
        &mut self,
        id: TouchId,
        finger_id: FingerId,
        window: Option<WindowId>,
        x: f32,
        y: f32,
        pressure: f32,
        d: &mut Dispatch<'_>,
    ) -> Result<TouchOutcome> {
        let emulates = self.emulates(id);
        let tracked = self.tracking == Some((id, finger_id));
        let index = self.index_of(id).ok_or(InputError::UnknownTouchDevice(id))?;
        let touch = &mut self.devices[index];
        let mut outcome = TouchOutcome::default();

        let Some(finger_index) = touch.finger_index(finger_id) else {
            return Ok(outcome);
        };
        let finger = &mut touch.fingers[finger_index];
        let dx = x - finger.x;
        let dy = y - finger.y;
        let dp = pressure - finger.pressure;
        if dx == 0.0 && dy == 0.0 && dp == 0.0 {
            return Ok(outcome);
        }
        finger.x = x;
        finger.y = y;
        finger.pressure = pressure;

        if emulates && tracked {
            if let Some(window) = window {
                outcome.emulation.push(PointerEmulation::Motion { window, x, y });
            }
        }

        outcome.posted = d.push(EventData::Finger {
            phase: FingerPhase::Motion,
            touch_id: id,
            finger_id,
            window,
            x,
            y,
            dx,
            dy,
            pressure,
        });
        Ok(outcome)
    }

    /// Drop every device
    pub fn clear(&mut self) {
        self.devices.clear();
        self.tracking = None;
    }
}
