//! Cross-source correlation engine
//!
//! A controller opened through the low-level report path may also appear in
//! one or two shadow sources that hand out fixed user slots. Nothing in the
//! OS says which slot belongs to which opened device, so the engine infers it
//! by comparing what both sides report.
//!
//! # Per Tick
//!
//! ```text
//! refresh every shadow slot
//! for each joystick, for each source:
//!   correlated   -> re-verify; `uncorrelate_frames` straight misses free the slot
//!   uncorrelated -> exactly one free slot matches an informative match state:
//!                     bump slot.correlation_id
//!                     same slot and id advanced by one -> count += 1, else count = 1
//!                     count == confirm_frames -> correlated, slot used
//!                   otherwise count = 0
//!   correlated source supplies guide and precise triggers (polling preferred)
//! guide fallback over uncorrelated slots
//! ```
//!
//! The correlation id is the freshness token: if another joystick also bid on
//! the slot in between, the id moved by two and confirmation starts over.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::backend::Dispatch;
use crate::config::JoystickConfig;
use crate::error::{InputError, Result};
use crate::events::JoystickId;
use crate::joystick::device::{Joystick, Rumble, AXIS_TRIGGERLEFT, AXIS_TRIGGERRIGHT, GUIDE_BUTTON};
use crate::joystick::remap::{ButtonLayout, GamepadButton};
use crate::joystick::report::{LowLevelReport, HAT_DOWN, HAT_LEFT, HAT_RIGHT, HAT_UP};
use crate::sync::ticks_passed;

pub const SHADOW_SOURCES: usize = 2;

/// Longest rumble accepted, in milliseconds
pub const MAX_RUMBLE_MS: u64 = 0xFFFF;

/// Slot-assigning API a controller may also be visible through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShadowSource {
    /// Fixed user-slot polling API; preferred when both correlate
    Polling,
    /// Higher-level gamepad API
    Gamepad,
}

impl ShadowSource {
    /// In order of preference
    pub const ALL: [ShadowSource; SHADOW_SOURCES] = [ShadowSource::Polling, ShadowSource::Gamepad];

    pub fn index(self) -> usize {
        match self {
            ShadowSource::Polling => 0,
            ShadowSource::Gamepad => 1,
        }
    }

    pub fn layout(self) -> &'static ButtonLayout {
        match self {
            ShadowSource::Polling => &ButtonLayout::POLLING,
            ShadowSource::Gamepad => &ButtonLayout::GAMEPAD,
        }
    }
}

/// One shadow slot as last polled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShadowSlot {
    pub connected: bool,
    /// Native button bits
    pub buttons: u32,
    /// LX, LY, RX, RY in the source's own orientation
    pub sticks: [i16; 4],
    /// Left and right trigger in `0..=32767`
    pub triggers: (i16, i16),
}

/// Shadow source driver
pub trait ShadowProvider: Send {
    fn source(&self) -> ShadowSource;

    fn slot_count(&self) -> usize;

    /// Current state of a slot; disconnected slots report `connected: false`
    fn poll_slot(&mut self, slot: usize) -> ShadowSlot;

    fn set_rumble(&mut self, slot: usize, low: u16, high: u16) -> Result<()>;
}

/// Opened low-level device
pub trait LowLevelSource: Send {
    /// Next pending report, `None` once drained
    fn poll_report(&mut self) -> Result<Option<Bytes>>;
}

/// Packed comparison key: bits 0..15 canonical buttons, bits 16..31 the high
/// nibble of LX, LY, RX, RY
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct MatchState(pub u32);

impl MatchState {
    pub fn from_report(report: &LowLevelReport) -> Self {
        let mut buttons = ButtonLayout::REPORT.remap(report.buttons as u32);
        let hat = report.hat_bits();
        for (bit, button) in [
            (HAT_UP, GamepadButton::DpadUp),
            (HAT_DOWN, GamepadButton::DpadDown),
            (HAT_LEFT, GamepadButton::DpadLeft),
            (HAT_RIGHT, GamepadButton::DpadRight),
        ] {
            if hat & bit != 0 {
                buttons |= button.bit();
            }
        }

        let mut state = buttons as u32;
        for axis in 0..4 {
            let nibble = (report.stick(axis) as u16 >> 12) as u32;
            state |= nibble << (16 + 4 * axis);
        }
        MatchState(state)
    }

    pub fn buttons(self) -> u16 {
        (self.0 & 0xFFFF) as u16
    }

    pub fn axis_nibble(self, axis: usize) -> u8 {
        ((self.0 >> (16 + 4 * axis)) & 0xF) as u8
    }

    /// Lower bound of the axis bucket as a signed stick value
    pub fn axis_reference(self, axis: usize) -> i16 {
        ((self.axis_nibble(axis) as u16) << 12) as i16
    }

    /// Whether the state says anything: a button held or a stick off centre
    pub fn has_information(self) -> bool {
        self.buttons() != 0
            || (0..4).any(|axis| !matches!(self.axis_nibble(axis), 0x0 | 0x1 | 0xF))
    }
}

/// Whether a slot stick value falls in the window for a match-state bucket
pub fn axis_matches(slot_value: i16, reference: i16) -> bool {
    let diff = slot_value as i32 - reference as i32;
    (-0x1000..=0x1FFF).contains(&diff)
}

/// Compare a shadow slot against a match state
pub fn slot_matches(layout: &ButtonLayout, slot: &ShadowSlot, state: MatchState, match_axes: bool) -> bool {
    if layout.remap(slot.buttons) != state.buttons() {
        return false;
    }
    if !match_axes {
        return true;
    }
    slot.sticks.iter().enumerate().all(|(axis, &value)| {
        let value = if layout.invert_y && axis % 2 == 1 { !value } else { value };
        axis_matches(value, state.axis_reference(axis))
    })
}

/// A joystick's standing with one shadow source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceLink {
    /// Candidate or correlated slot
    pub slot: Option<usize>,
    /// Slot correlation id seen at the last bid
    pub correlation_id: u8,
    pub correlation_count: u8,
    pub uncorrelate_count: u8,
    pub correlated: bool,
}

#[derive(Debug, Clone, Copy, Default)]
struct SlotState {
    last: ShadowSlot,
    correlation_id: u8,
    used: bool,
}

struct ShadowSet {
    provider: Box<dyn ShadowProvider>,
    slots: Vec<SlotState>,
}

/// Correlation state for every shadow source
pub struct CorrelationEngine {
    config: JoystickConfig,
    shadows: [Option<ShadowSet>; SHADOW_SOURCES],
    guide_candidate: Option<JoystickId>,
}

impl CorrelationEngine {
    pub fn new(config: JoystickConfig) -> Self {
        Self {
            config,
            shadows: [None, None],
            guide_candidate: None,
        }
    }

    pub fn config(&self) -> &JoystickConfig {
        &self.config
    }

    /// Attach a shadow source, replacing any provider for the same source
    pub fn add_provider(&mut self, provider: Box<dyn ShadowProvider>) {
        let source = provider.source();
        let slots = vec![SlotState::default(); provider.slot_count()];
        info!(source = ?source, slots = slots.len(), "Shadow source attached");
        self.shadows[source.index()] = Some(ShadowSet { provider, slots });
    }

    pub fn has_provider(&self, source: ShadowSource) -> bool {
        self.shadows[source.index()].is_some()
    }

    /// Whether a joystick holds the slot
    pub fn slot_used(&self, source: ShadowSource, slot: usize) -> bool {
        self.shadows[source.index()]
            .as_ref()
            .and_then(|set| set.slots.get(slot))
            .is_some_and(|s| s.used)
    }

    /// Correlation id of a slot
    pub fn slot_correlation_id(&self, source: ShadowSource, slot: usize) -> Option<u8> {
        self.shadows[source.index()]
            .as_ref()
            .and_then(|set| set.slots.get(slot))
            .map(|s| s.correlation_id)
    }

    /// Joystick currently nominated for fallback guide presses
    pub fn guide_candidate(&self) -> Option<JoystickId> {
        self.guide_candidate
    }

    /// Slot correlated with `joystick`, preferred source first
    pub fn correlated_slot(joystick: &Joystick) -> Option<(ShadowSource, usize)> {
        ShadowSource::ALL.into_iter().find_map(|source| {
            let link = joystick.links[source.index()];
            link.slot.filter(|_| link.correlated).map(|slot| (source, slot))
        })
    }

    /// Run one correlation pass
    pub fn tick(&mut self, joysticks: &mut [&mut Joystick], d: &Dispatch<'_>) {
        for set in self.shadows.iter_mut().flatten() {
            for (index, slot) in set.slots.iter_mut().enumerate() {
                slot.last = set.provider.poll_slot(index);
            }
        }

        let mut confirmed = false;
        for joystick in joysticks.iter_mut() {
            let state = joystick.match_state();
            for source in ShadowSource::ALL {
                confirmed |= self.correlate(joystick, source, state, d);
            }
            self.apply_shadow(joystick, d);
        }

        if confirmed {
            self.clear_guide_candidate(joysticks, d);
        } else if self.config.guide_fallback {
            self.guide_fallback(joysticks, d);
        }
    }

    /// Returns `true` when a correlation was confirmed
    fn correlate(&mut self, joystick: &mut Joystick, source: ShadowSource, state: MatchState, d: &Dispatch<'_>) -> bool {
        let Some(set) = self.shadows[source.index()].as_mut() else {
            return false;
        };
        let layout = source.layout();
        let match_axes = self.config.match_axes;
        let id = joystick.id();
        let link = &mut joystick.links[source.index()];

        if link.correlated {
            let Some(slot) = link.slot.filter(|&s| s < set.slots.len()) else {
                *link = SourceLink::default();
                return false;
            };
            let current = &set.slots[slot].last;
            if current.connected && slot_matches(layout, current, state, match_axes) {
                link.uncorrelate_count = 0;
                return false;
            }
            link.uncorrelate_count = link.uncorrelate_count.saturating_add(1);
            if link.uncorrelate_count >= self.config.uncorrelate_frames {
                set.slots[slot].used = false;
                *link = SourceLink::default();
                info!(joystick = id, source = ?source, slot, "Correlation lost");
                if layout.guide.is_some() {
                    joystick.set_button(GUIDE_BUTTON, false, d);
                }
            }
            return false;
        }

        let mut count = 0;
        if state.has_information() {
            let candidates: Vec<usize> = set
                .slots
                .iter()
                .enumerate()
                .filter(|(_, s)| !s.used && s.last.connected && slot_matches(layout, &s.last, state, match_axes))
                .map(|(index, _)| index)
                .take(2)
                .collect();
            if let [slot] = candidates[..] {
                let slot_state = &mut set.slots[slot];
                slot_state.correlation_id = slot_state.correlation_id.wrapping_add(1);
                let fresh = link.correlation_count > 0
                    && link.slot == Some(slot)
                    && link.correlation_id.wrapping_add(1) == slot_state.correlation_id;
                count = if fresh {
                    link.correlation_count.saturating_add(1)
                } else {
                    1
                };
                link.slot = Some(slot);
                link.correlation_id = slot_state.correlation_id;
            } else if candidates.len() > 1 {
                debug!(joystick = id, source = ?source, "Ambiguous slot match");
            }
        }
        link.correlation_count = count;

        if count >= self.config.confirm_frames {
            if let Some(slot) = link.slot {
                link.correlated = true;
                link.uncorrelate_count = 0;
                set.slots[slot].used = true;
                info!(joystick = id, source = ?source, slot, "Joystick correlated");
                return true;
            }
        }
        false
    }

    /// Guide and precise triggers from the preferred correlated slot
    fn apply_shadow(&self, joystick: &mut Joystick, d: &Dispatch<'_>) {
        let Some((source, slot)) = Self::correlated_slot(joystick) else {
            return;
        };
        let Some(current) = self.shadows[source.index()]
            .as_ref()
            .and_then(|set| set.slots.get(slot))
            .map(|s| s.last)
        else {
            return;
        };
        joystick.set_axis(AXIS_TRIGGERLEFT, current.triggers.0, d);
        joystick.set_axis(AXIS_TRIGGERRIGHT, current.triggers.1, d);
        let layout = source.layout();
        if layout.guide.is_some() {
            joystick.set_button(GUIDE_BUTTON, layout.guide_pressed(current.buttons), d);
        }
    }

    fn clear_guide_candidate(&mut self, joysticks: &mut [&mut Joystick], d: &Dispatch<'_>) {
        if let Some(id) = self.guide_candidate.take() {
            if let Some(joystick) = joysticks.iter_mut().find(|j| j.id() == id) {
                if !joystick.is_correlated() {
                    joystick.set_button(GUIDE_BUTTON, false, d);
                }
            }
        }
    }

    fn guide_fallback(&mut self, joysticks: &mut [&mut Joystick], d: &Dispatch<'_>) {
        let any_guide = ShadowSource::ALL.into_iter().any(|source| {
            let layout = source.layout();
            self.shadows[source.index()].as_ref().is_some_and(|set| {
                set.slots
                    .iter()
                    .any(|s| !s.used && s.last.connected && layout.guide_pressed(s.last.buttons))
            })
        });

        if !any_guide {
            self.clear_guide_candidate(joysticks, d);
            return;
        }

        let candidate = self
            .guide_candidate
            .and_then(|id| joysticks.iter().position(|j| j.id() == id && !j.is_correlated()))
            .or_else(|| joysticks.iter().position(|j| !j.is_correlated()));
        match candidate {
            Some(index) => {
                let joystick = &mut joysticks[index];
                if self.guide_candidate != Some(joystick.id()) {
                    debug!(joystick = joystick.id(), "Guide fallback candidate");
                }
                self.guide_candidate = Some(joystick.id());
                joystick.set_button(GUIDE_BUTTON, true, d);
            }
            None => self.guide_candidate = None,
        }
    }

    /// Start rumble through the correlated slot
    ///
    /// A zero `duration_ms` runs until replaced; other durations are capped
    /// at [`MAX_RUMBLE_MS`].
    ///
    /// # Errors
    ///
    /// [`InputError::Unsupported`] when the joystick has no correlated slot.
    pub fn rumble(&mut self, joystick: &mut Joystick, low: u16, high: u16, duration_ms: u64, now: u64) -> Result<()> {
        let (source, slot) = Self::correlated_slot(joystick)
            .ok_or(InputError::Unsupported("rumble on an uncorrelated joystick"))?;
        let set = self.shadows[source.index()]
            .as_mut()
            .ok_or(InputError::Unsupported("rumble without a shadow source"))?;
        set.provider.set_rumble(slot, low, high)?;

        joystick.rumble = if low == 0 && high == 0 {
            None
        } else {
            Some(Rumble {
                low,
                high,
                deadline: (duration_ms > 0).then(|| now + duration_ms.min(MAX_RUMBLE_MS)),
            })
        };
        Ok(())
    }

    /// Stop rumble whose deadline has passed
    pub fn expire_rumble(&mut self, joystick: &mut Joystick, now: u64) {
        let Some(Rumble {
            deadline: Some(deadline),
            ..
        }) = joystick.rumble
        else {
            return;
        };
        if !ticks_passed(now, deadline) {
            return;
        }
        joystick.rumble = None;
        if let Some((source, slot)) = Self::correlated_slot(joystick) {
            if let Some(set) = self.shadows[source.index()].as_mut() {
                if let Err(e) = set.provider.set_rumble(slot, 0, 0) {
                    warn!(joystick = joystick.id(), "Failed to stop rumble: {}", e);
                }
            }
        }
    }

    /// Free everything a closing joystick holds
    pub fn release(&mut self, joystick: &mut Joystick) {
        for source in ShadowSource::ALL {
            let link = &mut joystick.links[source.index()];
            if let (true, Some(slot)) = (link.correlated, link.slot) {
                if let Some(state) = self.shadows[source.index()]
                    .as_mut()
                    .and_then(|set| set.slots.get_mut(slot))
                {
                    state.used = false;
                }
            }
            *link = SourceLink::default();
        }
        if self.guide_candidate == Some(joystick.id()) {
            self.guide_candidate = None;
        }
    }
}

impl std::fmt::Debug for CorrelationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CorrelationEngine")
            .field("config", &self.config)
            .field(
                "sources",
                &ShadowSource::ALL
                    .into_iter()
                    .filter(|s| self.has_provider(*s))
                    .collect::<Vec<_>>(),
            )
            .field("guide_candidate", &self.guide_candidate)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{EventData, EventQueue};
    use crate::platform::HeadlessBackend;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Default)]
    struct SharedSlots {
        slots: Vec<ShadowSlot>,
        rumble: Vec<(usize, u16, u16)>,
    }

    struct FakeShadow {
        source: ShadowSource,
        shared: Arc<Mutex<SharedSlots>>,
    }

    impl ShadowProvider for FakeShadow {
        fn source(&self) -> ShadowSource {
            self.source
        }

        fn slot_count(&self) -> usize {
            self.shared.lock().slots.len()
        }

        fn poll_slot(&mut self, slot: usize) -> ShadowSlot {
            self.shared.lock().slots[slot]
        }

        fn set_rumble(&mut self, slot: usize, low: u16, high: u16) -> Result<()> {
            self.shared.lock().rumble.push((slot, low, high));
            Ok(())
        }
    }

    const POLLING_A: u32 = 0x1000;
    const POLLING_B: u32 = 0x2000;
    const POLLING_GUIDE: u32 = 0x0400;

    fn slot(buttons: u32) -> ShadowSlot {
        ShadowSlot {
            connected: true,
            buttons,
            sticks: [0, -1, 0, -1],
            triggers: (0, 0),
        }
    }

    fn report(buttons: u16) -> LowLevelReport {
        LowLevelReport {
            sticks: [32768; 4],
            trigger: 32768,
            buttons,
            hat: 0,
        }
    }

    struct Rig {
        engine: CorrelationEngine,
        shared: Arc<Mutex<SharedSlots>>,
        joysticks: Vec<Joystick>,
        backend: HeadlessBackend,
        queue: EventQueue,
    }

    impl Rig {
        fn new(slots: usize, joysticks: u32) -> Self {
            let shared = Arc::new(Mutex::new(SharedSlots {
                slots: vec![ShadowSlot::default(); slots],
                rumble: Vec::new(),
            }));
            let mut engine = CorrelationEngine::new(JoystickConfig::default());
            engine.add_provider(Box::new(FakeShadow {
                source: ShadowSource::Polling,
                shared: shared.clone(),
            }));
            Self {
                engine,
                shared,
                joysticks: (0..joysticks).map(|id| Joystick::new(id, "pad", "")).collect(),
                backend: HeadlessBackend::new(),
                queue: EventQueue::default(),
            }
        }

        fn set_slot(&self, index: usize, state: ShadowSlot) {
            self.shared.lock().slots[index] = state;
        }

        fn feed(&mut self, joystick: usize, buttons: u16) {
            let d = Dispatch::new(&mut self.backend, &self.queue, 0);
            let precise = self.joysticks[joystick].is_correlated();
            self.joysticks[joystick].apply_report(report(buttons), !precise, &d);
        }

        fn tick(&mut self) {
            let d = Dispatch::new(&mut self.backend, &self.queue, 0);
            let mut refs: Vec<&mut Joystick> = self.joysticks.iter_mut().collect();
            self.engine.tick(&mut refs, &d);
        }

        fn link(&self, joystick: usize) -> SourceLink {
            self.joysticks[joystick].links[0]
        }
    }

    #[test]
    fn test_match_state_packing() {
        let mut r = report(0b11);
        r.hat = 1;
        r.sticks[1] = 0xF000;
        let state = MatchState::from_report(&r);
        assert_eq!(
            state.buttons(),
            GamepadButton::A.bit() | GamepadButton::B.bit() | GamepadButton::DpadUp.bit()
        );
        assert_eq!(state.axis_nibble(0), 0x0);
        assert_eq!(state.axis_nibble(1), 0x7);
        assert!(state.has_information());
    }

    #[test]
    fn test_neutral_state_carries_no_information() {
        let state = MatchState::from_report(&report(0));
        assert!(!state.has_information());

        let mut r = report(0);
        r.sticks[0] = 32768 - 100;
        assert!(!MatchState::from_report(&r).has_information());
        r.sticks[0] = 32768 + 0x2000;
        assert!(MatchState::from_report(&r).has_information());
    }

    #[test]
    fn test_axis_window() {
        assert!(axis_matches(0x1000, 0x1000));
        assert!(axis_matches(0x0000, 0x1000));
        assert!(axis_matches(0x2FFF, 0x1000));
        assert!(!axis_matches(0x3000, 0x1000));
        assert!(!axis_matches(-1, 0x1000));
    }

    #[test]
    fn test_inverted_y_matches() {
        // Stick pushed up: report Y small, shadow Y large positive
        let mut r = report(0);
        r.sticks[1] = 0x0800;
        let state = MatchState::from_report(&r);
        let mut s = slot(0);
        s.sticks[1] = 30000;
        assert!(slot_matches(&ButtonLayout::POLLING, &s, state, true));
        s.sticks[1] = -30000;
        assert!(!slot_matches(&ButtonLayout::POLLING, &s, state, true));
        assert!(slot_matches(&ButtonLayout::POLLING, &s, state, false));
    }

    #[test]
    fn test_two_unambiguous_ticks_correlate() {
        let mut rig = Rig::new(4, 1);
        rig.set_slot(2, slot(POLLING_A));
        rig.feed(0, 0b1);

        rig.tick();
        assert_eq!(rig.link(0).correlation_count, 1);
        assert!(!rig.link(0).correlated);

        rig.tick();
        assert!(rig.link(0).correlated);
        assert_eq!(rig.link(0).slot, Some(2));
        assert!(rig.engine.slot_used(ShadowSource::Polling, 2));
    }

    #[test]
    fn test_competing_joystick_blocks_confirmation() {
        let mut rig = Rig::new(4, 2);
        rig.set_slot(1, slot(POLLING_A));
        rig.feed(0, 0b1);
        rig.feed(1, 0b1);

        for _ in 0..5 {
            rig.tick();
        }
        assert!(!rig.link(0).correlated);
        assert!(!rig.link(1).correlated);
        assert!(!rig.engine.slot_used(ShadowSource::Polling, 1));
        assert_eq!(rig.engine.slot_correlation_id(ShadowSource::Polling, 1), Some(10));
    }

    #[test]
    fn test_ambiguous_slots_never_bid() {
        let mut rig = Rig::new(4, 1);
        rig.set_slot(0, slot(POLLING_A));
        rig.set_slot(3, slot(POLLING_A));
        rig.feed(0, 0b1);

        rig.tick();
        rig.tick();
        assert_eq!(rig.link(0).correlation_count, 0);
        assert_eq!(rig.engine.slot_correlation_id(ShadowSource::Polling, 0), Some(0));
    }

    #[test]
    fn test_zero_information_is_not_evidence() {
        let mut rig = Rig::new(1, 1);
        rig.set_slot(0, slot(0));
        rig.feed(0, 0);
        rig.tick();
        rig.tick();
        assert!(!rig.link(0).correlated);
    }

    #[test]
    fn test_uncorrelation_hysteresis() {
        let mut rig = Rig::new(2, 1);
        rig.set_slot(0, slot(POLLING_A));
        rig.feed(0, 0b1);
        rig.tick();
        rig.tick();
        assert!(rig.link(0).correlated);

        // Four misses then a match keep the correlation
        rig.feed(0, 0b10);
        for _ in 0..4 {
            rig.tick();
        }
        assert!(rig.link(0).correlated);
        assert_eq!(rig.link(0).uncorrelate_count, 4);
        rig.set_slot(0, slot(POLLING_B));
        rig.tick();
        assert_eq!(rig.link(0).uncorrelate_count, 0);

        // Five straight misses drop it
        rig.feed(0, 0b100);
        for _ in 0..5 {
            rig.tick();
        }
        assert!(!rig.link(0).correlated);
        assert!(!rig.engine.slot_used(ShadowSource::Polling, 0));
    }

    #[test]
    fn test_guide_from_correlated_slot_and_forced_release() {
        let mut rig = Rig::new(1, 1);
        rig.set_slot(0, slot(POLLING_A));
        rig.feed(0, 0b1);
        rig.tick();
        rig.tick();

        rig.set_slot(0, slot(POLLING_A | POLLING_GUIDE));
        rig.tick();
        assert_eq!(rig.joysticks[0].button(GUIDE_BUTTON), Some(true));

        // Slot vanishes with guide held
        rig.set_slot(0, ShadowSlot::default());
        for _ in 0..5 {
            rig.tick();
        }
        assert_eq!(rig.joysticks[0].button(GUIDE_BUTTON), Some(false));
    }

    #[test]
    fn test_precise_triggers_from_slot() {
        let mut rig = Rig::new(1, 1);
        rig.set_slot(0, slot(POLLING_A));
        rig.feed(0, 0b1);
        rig.tick();
        rig.tick();

        let mut s = slot(POLLING_A);
        s.triggers = (1200, 32000);
        rig.set_slot(0, s);
        rig.tick();
        assert_eq!(rig.joysticks[0].axis(AXIS_TRIGGERLEFT), Some(1200));
        assert_eq!(rig.joysticks[0].axis(AXIS_TRIGGERRIGHT), Some(32000));
    }

    #[test]
    fn test_guide_fallback_nominates_uncorrelated_joystick() {
        let mut rig = Rig::new(2, 1);
        rig.set_slot(1, slot(POLLING_GUIDE));
        rig.tick();
        assert_eq!(rig.engine.guide_candidate(), Some(0));
        assert_eq!(rig.joysticks[0].button(GUIDE_BUTTON), Some(true));

        rig.set_slot(1, slot(0));
        rig.tick();
        assert_eq!(rig.engine.guide_candidate(), None);
        assert_eq!(rig.joysticks[0].button(GUIDE_BUTTON), Some(false));
    }

    #[test]
    fn test_guide_candidate_cleared_on_correlation() {
        let mut rig = Rig::new(2, 1);
        rig.set_slot(1, slot(POLLING_GUIDE));
        rig.tick();
        assert_eq!(rig.engine.guide_candidate(), Some(0));

        rig.set_slot(0, slot(POLLING_A));
        rig.feed(0, 0b1);
        rig.tick();
        rig.tick();
        assert!(rig.link(0).correlated);
        assert_eq!(rig.engine.guide_candidate(), None);
    }

    #[test]
    fn test_rumble_requires_correlation_and_expires() {
        let mut rig = Rig::new(1, 1);
        let err = rig
            .engine
            .rumble(&mut rig.joysticks[0], 100, 200, 50, 0)
            .unwrap_err();
        assert!(err.is_unsupported());

        rig.set_slot(0, slot(POLLING_A));
        rig.feed(0, 0b1);
        rig.tick();
        rig.tick();

        rig.engine.rumble(&mut rig.joysticks[0], 100, 200, 50, 1000).unwrap();
        assert_eq!(rig.joysticks[0].rumble_state().and_then(|r| r.deadline), Some(1050));

        rig.engine.expire_rumble(&mut rig.joysticks[0], 1049);
        assert!(rig.joysticks[0].rumble_state().is_some());
        rig.engine.expire_rumble(&mut rig.joysticks[0], 1050);
        assert!(rig.joysticks[0].rumble_state().is_none());
        assert_eq!(rig.shared.lock().rumble, vec![(0, 100, 200), (0, 0, 0)]);
    }

    #[test]
    fn test_release_frees_slot() {
        let mut rig = Rig::new(1, 1);
        rig.set_slot(0, slot(POLLING_A));
        rig.feed(0, 0b1);
        rig.tick();
        rig.tick();

        rig.engine.release(&mut rig.joysticks[0]);
        assert!(!rig.engine.slot_used(ShadowSource::Polling, 0));
        assert!(!rig.joysticks[0].is_correlated());
    }

    #[test]
    fn test_guide_events_reach_queue() {
        let mut rig = Rig::new(1, 1);
        rig.set_slot(0, slot(POLLING_GUIDE));
        rig.tick();
        assert!(rig.queue.drain().iter().any(|e| matches!(
            e.data,
            EventData::JoyButton {
                button: GUIDE_BUTTON,
                pressed: true,
                ..
            }
        )));
    }
}
