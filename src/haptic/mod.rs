//! Haptic devices
//!
//! Each driver contributes a [`HapticEnumerator`]; the registry merges their
//! device lists and owns the opened devices. An opened device holds a fixed
//! table of effect slots sized by its backend's `max_effects`.
//!
//! Drivers without hardware effect timing (the dual-motor rumble driver)
//! get a software deadline instead, checked by [`HapticRegistry::tick`].

pub mod effect;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{InputError, Result};
use crate::sync::ticks_passed;

pub use effect::{HapticEffect, HapticFeature, HapticFeatures, Waveform, HAPTIC_INFINITY};

/// Haptic device index, stable for the lifetime of the device
pub type HapticId = u32;

/// Effect slot index on one device
pub type EffectId = i32;

/// Driver-owned effect handle
pub type EffectHandle = u64;

/// Driver family a device was enumerated by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HapticDriver {
    /// Force-feedback driver with hardware effect timing
    DirectInput,
    /// Dual-motor rumble driver, timed in software
    XInput,
}

impl HapticDriver {
    pub fn software_timed(self) -> bool {
        matches!(self, HapticDriver::XInput)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HapticDeviceInfo {
    pub path: String,
    pub name: String,
    pub driver: HapticDriver,
}

/// Opened haptic device
#[cfg_attr(test, mockall::automock)]
pub trait HapticBackend: Send {
    fn features(&self) -> HapticFeatures;

    fn max_effects(&self) -> usize;

    /// Upload a new effect, or replace `handle` in place
    fn upload(&mut self, effect: &HapticEffect, handle: Option<EffectHandle>) -> Result<EffectHandle>;

    fn start(&mut self, handle: EffectHandle, iterations: u32) -> Result<()>;

    fn stop(&mut self, handle: EffectHandle) -> Result<()>;

    fn erase(&mut self, handle: EffectHandle) -> Result<()>;

    /// Gain in `0..=100`
    fn set_gain(&mut self, gain: u8) -> Result<()>;

    /// Autocenter strength in `0..=100`
    fn set_autocenter(&mut self, autocenter: u8) -> Result<()>;

    fn set_paused(&mut self, paused: bool) -> Result<()>;

    fn stop_all(&mut self) -> Result<()>;
}

/// Per-driver device discovery
pub trait HapticEnumerator: Send {
    fn driver(&self) -> HapticDriver;

    fn enumerate(&mut self) -> Result<Vec<HapticDeviceInfo>>;

    fn open(&mut self, info: &HapticDeviceInfo) -> Result<Box<dyn HapticBackend>>;
}

#[derive(Debug, Clone, Copy)]
struct EffectSlot {
    effect: HapticEffect,
    handle: EffectHandle,
    playing: bool,
    deadline: Option<u64>,
}

struct OpenDevice {
    backend: Box<dyn HapticBackend>,
    features: HapticFeatures,
    effects: Vec<Option<EffectSlot>>,
    rumble: Option<EffectId>,
    paused: bool,
}

struct HapticDevice {
    id: HapticId,
    info: HapticDeviceInfo,
    open: Option<OpenDevice>,
}

/// Merged device list across drivers
#[derive(Default)]
pub struct HapticRegistry {
    enumerators: Vec<Box<dyn HapticEnumerator>>,
    devices: Vec<HapticDevice>,
    next_id: HapticId,
}

impl HapticRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_enumerator(&mut self, enumerator: Box<dyn HapticEnumerator>) {
        self.enumerators.push(enumerator);
    }

    /// Re-enumerate every driver; vanished devices are closed and dropped
    ///
    /// Returns the number of devices now known.
    pub fn refresh(&mut self) -> usize {
        let mut seen: Vec<HapticDeviceInfo> = Vec::new();
        for enumerator in &mut self.enumerators {
            match enumerator.enumerate() {
                Ok(found) => seen.extend(found),
                Err(e) => warn!(driver = ?enumerator.driver(), "Haptic enumeration failed: {}", e),
            }
        }

        self.devices.retain_mut(|device| {
            let keep = seen
                .iter()
                .any(|info| info.path == device.info.path && info.driver == device.info.driver);
            if !keep {
                info!(haptic = device.id, name = %device.info.name, "Haptic device removed");
                if let Some(open) = device.open.as_mut() {
                    if let Err(e) = open.backend.stop_all() {
                        debug!("Stopping removed haptic device failed: {}", e);
                    }
                }
            }
            keep
        });

        for info in seen {
            let known = self
                .devices
                .iter()
                .any(|d| d.info.path == info.path && d.info.driver == info.driver);
            if !known {
                let id = self.next_id;
                self.next_id = self.next_id.wrapping_add(1);
                info!(haptic = id, name = %info.name, driver = ?info.driver, "Haptic device added");
                self.devices.push(HapticDevice { id, info, open: None });
            }
        }
        self.devices.len()
    }

    pub fn devices(&self) -> impl Iterator<Item = (HapticId, &HapticDeviceInfo)> {
        self.devices.iter().map(|d| (d.id, &d.info))
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    fn device_mut(&mut self, id: HapticId) -> Result<&mut HapticDevice> {
        self.devices
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or(InputError::UnknownHapticDevice(id))
    }

    fn opened(&mut self, id: HapticId) -> Result<(&HapticDeviceInfo, &mut OpenDevice)> {
        let device = self.device_mut(id)?;
        match device.open.as_mut() {
            Some(open) => Ok((&device.info, open)),
            None => Err(InputError::invalid(format!("haptic device {} is not open", id))),
        }
    }

    pub fn open(&mut self, id: HapticId) -> Result<()> {
        let index = self
            .devices
            .iter()
            .position(|d| d.id == id)
            .ok_or(InputError::UnknownHapticDevice(id))?;
        if self.devices[index].open.is_some() {
            return Ok(());
        }

        let info = self.devices[index].info.clone();
        let enumerator = self
            .enumerators
            .iter_mut()
            .find(|e| e.driver() == info.driver)
            .ok_or(InputError::Unsupported("haptic driver"))?;
        let backend = enumerator.open(&info)?;

        let mut effects = Vec::new();
        effects
            .try_reserve_exact(backend.max_effects())
            .map_err(|_| InputError::OutOfMemory("haptic effect table"))?;
        effects.resize(backend.max_effects(), None);

        let features = backend.features();
        debug!(haptic = id, slots = effects.len(), features = ?features, "Haptic device opened");
        self.devices[index].open = Some(OpenDevice {
            backend,
            features,
            effects,
            rumble: None,
            paused: false,
        });
        Ok(())
    }

    pub fn is_open(&self, id: HapticId) -> bool {
        self.devices.iter().any(|d| d.id == id && d.open.is_some())
    }

    /// Destroy every effect and release the backend
    pub fn close(&mut self, id: HapticId) -> Result<()> {
        let device = self.device_mut(id)?;
        if let Some(mut open) = device.open.take() {
            for slot in open.effects.iter().flatten() {
                if let Err(e) = open.backend.erase(slot.handle) {
                    debug!(haptic = id, "Erasing effect on close failed: {}", e);
                }
            }
            debug!(haptic = id, "Haptic device closed");
        }
        Ok(())
    }

    pub fn features(&mut self, id: HapticId) -> Result<HapticFeatures> {
        Ok(self.opened(id)?.1.features)
    }

    /// Effect slots on the device
    pub fn capacity(&mut self, id: HapticId) -> Result<usize> {
        Ok(self.opened(id)?.1.effects.len())
    }

    pub fn create_effect(&mut self, id: HapticId, effect: &HapticEffect) -> Result<EffectId> {
        effect.validate()?;
        let (_, open) = self.opened(id)?;
        if !open.features.contains(effect.feature()) {
            return Err(InputError::Unsupported("haptic effect type"));
        }
        let index = open
            .effects
            .iter()
            .position(Option::is_none)
            .ok_or(InputError::OutOfMemory("haptic effect slots"))?;
        let handle = open.backend.upload(effect, None)?;
        open.effects[index] = Some(EffectSlot {
            effect: *effect,
            handle,
            playing: false,
            deadline: None,
        });
        Ok(index as EffectId)
    }

    fn slot(open: &mut OpenDevice, effect: EffectId) -> Result<&mut EffectSlot> {
        usize::try_from(effect)
            .ok()
            .and_then(|index| open.effects.get_mut(index))
            .and_then(Option::as_mut)
            .ok_or(InputError::InvalidEffect(effect))
    }

    /// Replace an effect's parameters; the type must not change
    pub fn update_effect(&mut self, id: HapticId, effect: EffectId, data: &HapticEffect) -> Result<()> {
        data.validate()?;
        let (_, open) = self.opened(id)?;
        let handle = {
            let slot = Self::slot(open, effect)?;
            if !slot.effect.same_kind(data) {
                return Err(InputError::invalid("effect type cannot change on update"));
            }
            slot.handle
        };
        let handle = open.backend.upload(data, Some(handle))?;
        let slot = Self::slot(open, effect)?;
        slot.handle = handle;
        slot.effect = *data;
        Ok(())
    }

    /// Start an effect; software-timed drivers get a stop deadline
    pub fn run_effect(&mut self, id: HapticId, effect: EffectId, iterations: u32, now: u64) -> Result<()> {
        let (info, open) = self.opened(id)?;
        let software = info.driver.software_timed();
        let slot = *Self::slot(open, effect)?;
        open.backend.start(slot.handle, iterations)?;

        let deadline = if software {
            slot.effect.play_time_ms(iterations).map(|ms| now + ms)
        } else {
            None
        };
        let slot = Self::slot(open, effect)?;
        slot.playing = true;
        slot.deadline = deadline;
        Ok(())
    }

    pub fn stop_effect(&mut self, id: HapticId, effect: EffectId) -> Result<()> {
        let (_, open) = self.opened(id)?;
        let handle = Self::slot(open, effect)?.handle;
        open.backend.stop(handle)?;
        let slot = Self::slot(open, effect)?;
        slot.playing = false;
        slot.deadline = None;
        Ok(())
    }

    /// Stop if playing, then free the slot
    pub fn destroy_effect(&mut self, id: HapticId, effect: EffectId) -> Result<()> {
        let (_, open) = self.opened(id)?;
        let slot = *Self::slot(open, effect)?;
        if slot.playing {
            open.backend.stop(slot.handle)?;
        }
        open.backend.erase(slot.handle)?;
        open.effects[effect as usize] = None;
        if open.rumble == Some(effect) {
            open.rumble = None;
        }
        Ok(())
    }

    /// Whether an effect is playing, as far as the registry knows
    pub fn effect_status(&mut self, id: HapticId, effect: EffectId) -> Result<bool> {
        let (_, open) = self.opened(id)?;
        if !open.features.contains(HapticFeature::Status) {
            return Err(InputError::Unsupported("haptic effect status"));
        }
        Ok(Self::slot(open, effect)?.playing)
    }

    pub fn set_gain(&mut self, id: HapticId, gain: u8) -> Result<()> {
        if gain > 100 {
            return Err(InputError::invalid(format!("gain {} above 100", gain)));
        }
        let (_, open) = self.opened(id)?;
        if !open.features.contains(HapticFeature::Gain) {
            return Err(InputError::Unsupported("haptic gain"));
        }
        open.backend.set_gain(gain)
    }

    pub fn set_autocenter(&mut self, id: HapticId, autocenter: u8) -> Result<()> {
        if autocenter > 100 {
            return Err(InputError::invalid(format!("autocenter {} above 100", autocenter)));
        }
        let (_, open) = self.opened(id)?;
        if !open.features.contains(HapticFeature::Autocenter) {
            return Err(InputError::Unsupported("haptic autocenter"));
        }
        open.backend.set_autocenter(autocenter)
    }

    pub fn pause(&mut self, id: HapticId) -> Result<()> {
        self.set_paused(id, true)
    }

    pub fn unpause(&mut self, id: HapticId) -> Result<()> {
        self.set_paused(id, false)
    }

    fn set_paused(&mut self, id: HapticId, paused: bool) -> Result<()> {
        let (_, open) = self.opened(id)?;
        if !open.features.contains(HapticFeature::Pause) {
            return Err(InputError::Unsupported("haptic pause"));
        }
        if open.paused != paused {
            open.backend.set_paused(paused)?;
            open.paused = paused;
        }
        Ok(())
    }

    pub fn stop_all(&mut self, id: HapticId) -> Result<()> {
        let (_, open) = self.opened(id)?;
        open.backend.stop_all()?;
        for slot in open.effects.iter_mut().flatten() {
            slot.playing = false;
            slot.deadline = None;
        }
        Ok(())
    }

    pub fn rumble_supported(&mut self, id: HapticId) -> Result<bool> {
        let (_, open) = self.opened(id)?;
        Ok(effect::rumble_effect(open.features, 1.0, 0).is_some())
    }

    /// Reserve the effect slot used by the rumble helpers
    pub fn rumble_init(&mut self, id: HapticId) -> Result<()> {
        let (_, open) = self.opened(id)?;
        if open.rumble.is_some() {
            return Ok(());
        }
        let effect = effect::rumble_effect(open.features, 0.0, 0).ok_or(InputError::Unsupported("rumble"))?;
        let effect_id = self.create_effect(id, &effect)?;
        self.opened(id)?.1.rumble = Some(effect_id);
        Ok(())
    }

    /// Play rumble at `strength` in `0.0..=1.0` for `length_ms`
    pub fn rumble_play(&mut self, id: HapticId, strength: f32, length_ms: u32, now: u64) -> Result<()> {
        let (_, open) = self.opened(id)?;
        let effect_id = open
            .rumble
            .ok_or_else(|| InputError::invalid("rumble not initialised"))?;
        let effect =
            effect::rumble_effect(open.features, strength, length_ms).ok_or(InputError::Unsupported("rumble"))?;
        self.update_effect(id, effect_id, &effect)?;
        self.run_effect(id, effect_id, 1, now)
    }

    pub fn rumble_stop(&mut self, id: HapticId) -> Result<()> {
        let (_, open) = self.opened(id)?;
        let effect_id = open
            .rumble
            .ok_or_else(|| InputError::invalid("rumble not initialised"))?;
        self.stop_effect(id, effect_id)
    }

    /// Stop software-timed effects whose deadline has passed
    pub fn tick(&mut self, now: u64) {
        for device in &mut self.devices {
            let Some(open) = device.open.as_mut() else {
                continue;
            };
            for (index, slot) in open.effects.iter_mut().enumerate() {
                let Some(slot) = slot.as_mut() else {
                    continue;
                };
                let expired = slot.playing && slot.deadline.is_some_and(|deadline| ticks_passed(now, deadline));
                if !expired {
                    continue;
                }
                if let Err(e) = open.backend.stop(slot.handle) {
                    warn!(haptic = device.id, effect = index, "Failed to stop expired effect: {}", e);
                }
                slot.playing = false;
                slot.deadline = None;
                debug!(haptic = device.id, effect = index, "Effect expired");
            }
        }
    }

    /// Close every open device
    pub fn shutdown(&mut self) {
        let ids: Vec<HapticId> = self.devices.iter().filter(|d| d.open.is_some()).map(|d| d.id).collect();
        for id in ids {
            let _ = self.close(id);
        }
    }
}

impl std::fmt::Debug for HapticRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HapticRegistry")
            .field("drivers", &self.enumerators.iter().map(|e| e.driver()).collect::<Vec<_>>())
            .field("devices", &self.devices.iter().map(|d| &d.info).collect::<Vec<_>>())
            .finish()
    }
}
