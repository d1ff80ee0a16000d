use std::collections::VecDeque;
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;

use lamco_input_core::events::{EventData, JoystickId};
use lamco_input_core::joystick::{
    DeviceInfo, LowLevelReport, LowLevelSource, ShadowProvider, ShadowSlot, ShadowSource, GUIDE_BUTTON,
};
use lamco_input_core::platform::HeadlessBackend;
use lamco_input_core::sync::ManualClock;
use lamco_input_core::{Config, Event, InputContext};

const POLLING_A: u32 = 0x1000;
const POLLING_GUIDE: u32 = 0x0400;

#[derive(Default)]
struct Slots {
    slots: Vec<ShadowSlot>,
    rumble: Vec<(usize, u16, u16)>,
}

struct TestShadow(Arc<Mutex<Slots>>);

impl ShadowProvider for TestShadow {
    fn source(&self) -> ShadowSource {
        ShadowSource::Polling
    }

    fn slot_count(&self) -> usize {
        self.0.lock().slots.len()
    }

    fn poll_slot(&mut self, slot: usize) -> ShadowSlot {
        self.0.lock().slots[slot]
    }

    fn set_rumble(&mut self, slot: usize, low: u16, high: u16) -> lamco_input_core::Result<()> {
        self.0.lock().rumble.push((slot, low, high));
        Ok(())
    }
}

struct QueuedReports(Arc<Mutex<VecDeque<Bytes>>>);

impl LowLevelSource for QueuedReports {
    fn poll_report(&mut self) -> lamco_input_core::Result<Option<Bytes>> {
        Ok(self.0.lock().pop_front())
    }
}

struct Harness {
    ctx: InputContext,
    clock: Arc<ManualClock>,
    slots: Arc<Mutex<Slots>>,
    reports: Arc<Mutex<VecDeque<Bytes>>>,
    joystick: JoystickId,
}

impl Harness {
    fn new(slot_count: usize) -> Self {
        let clock = Arc::new(ManualClock::new(1000));
        let mut ctx = InputContext::with_clock(
            Config::default(),
            Box::new(HeadlessBackend::new().with_window(1, 640, 480)),
            clock.clone(),
        );

        let slots = Arc::new(Mutex::new(Slots {
            slots: vec![ShadowSlot::default(); slot_count],
            rumble: Vec::new(),
        }));
        ctx.joysticks_mut()
            .add_shadow_provider(Box::new(TestShadow(slots.clone())));

        let reports = Arc::new(Mutex::new(VecDeque::new()));
        let info = DeviceInfo {
            path: "/dev/hidraw3".to_string(),
            name: "Test Pad".to_string(),
            vendor: 0x045E,
            product: 0x028E,
        };
        let joystick = ctx.open_joystick(&info, Box::new(QueuedReports(reports.clone())));

        Self {
            ctx,
            clock,
            slots,
            reports,
            joystick,
        }
    }

    fn report(&self, buttons: u16) {
        let report = LowLevelReport {
            sticks: [32768; 4],
            trigger: 32768,
            buttons,
            hat: 0,
        };
        self.reports.lock().push_back(report.encode());
    }

    fn set_slot(&self, index: usize, buttons: u32, triggers: (i16, i16)) {
        self.slots.lock().slots[index] = ShadowSlot {
            connected: true,
            buttons,
            // Report Y is inverted relative to the polling source
            sticks: [0, -1, 0, -1],
            triggers,
        };
    }

    fn disconnect_slot(&self, index: usize) {
        self.slots.lock().slots[index] = ShadowSlot::default();
    }

    fn tick(&mut self) -> Vec<Event> {
        self.ctx.tick();
        self.ctx.drain_events()
    }

    fn correlated(&self) -> bool {
        self.ctx
            .joysticks()
            .joystick(self.joystick)
            .is_some_and(|j| j.is_correlated())
    }
}

fn guide_events(events: &[Event]) -> Vec<bool> {
    events
        .iter()
        .filter_map(|e| match e.data {
            EventData::JoyButton {
                button: GUIDE_BUTTON,
                pressed,
                ..
            } => Some(pressed),
            _ => None,
        })
        .collect()
}

#[test]
fn test_correlated_slot_supplies_triggers_guide_and_rumble() {
    let mut h = Harness::new(4);
    h.ctx.drain_events();

    h.set_slot(2, POLLING_A, (0, 0));
    h.report(0b1);
    h.tick();
    assert!(!h.correlated());
    h.tick();
    assert!(h.correlated());
    assert!(h.ctx.joysticks().engine().slot_used(ShadowSource::Polling, 2));

    // Triggers and guide now come from the shadow slot
    h.set_slot(2, POLLING_A | POLLING_GUIDE, (1200, 30000));
    let events = h.tick();
    assert!(events.iter().any(|e| matches!(
        e.data,
        EventData::JoyAxis {
            axis: 4,
            value: 1200,
            ..
        }
    )));
    assert!(events.iter().any(|e| matches!(
        e.data,
        EventData::JoyAxis {
            axis: 5,
            value: 30000,
            ..
        }
    )));
    assert_eq!(guide_events(&events), vec![true]);

    h.ctx.rumble_joystick(h.joystick, 0x4000, 0x8000, 50).unwrap();
    assert_eq!(h.slots.lock().rumble.last(), Some(&(2, 0x4000, 0x8000)));

    h.clock.advance(49);
    h.tick();
    assert_eq!(h.slots.lock().rumble.len(), 1);

    h.clock.advance(1);
    h.tick();
    assert_eq!(h.slots.lock().rumble.last(), Some(&(2, 0, 0)));
}

#[test]
fn test_correlation_drops_after_slot_disappears() {
    let mut h = Harness::new(2);
    h.set_slot(0, POLLING_A | POLLING_GUIDE, (0, 0));
    h.report(0b1);
    h.tick();
    h.tick();
    assert!(h.correlated());
    h.ctx.drain_events();

    h.disconnect_slot(0);
    let mut events = Vec::new();
    for _ in 0..4 {
        events.extend(h.tick());
        assert!(h.correlated());
    }

    events.extend(h.tick());
    assert!(!h.correlated());
    assert!(!h.ctx.joysticks().engine().slot_used(ShadowSource::Polling, 0));
    assert_eq!(guide_events(&events), vec![false]);
}

#[test]
fn test_rumble_requires_correlation() {
    let mut h = Harness::new(1);
    let err = h.ctx.rumble_joystick(h.joystick, 1, 1, 100).unwrap_err();
    assert!(err.is_unsupported());
    assert!(h.slots.lock().rumble.is_empty());
}

#[test]
fn test_guide_fallback_reaches_uncorrelated_joystick() {
    let mut h = Harness::new(1);
    h.ctx.drain_events();

    h.set_slot(0, POLLING_GUIDE, (0, 0));
    let events = h.tick();
    assert_eq!(guide_events(&events), vec![true]);
    assert_eq!(h.ctx.joysticks().engine().guide_candidate(), Some(h.joystick));

    h.set_slot(0, 0, (0, 0));
    let events = h.tick();
    assert_eq!(guide_events(&events), vec![false]);
    assert_eq!(h.ctx.joysticks().engine().guide_candidate(), None);
}

#[test]
fn test_close_frees_correlated_slot() {
    let mut h = Harness::new(1);
    h.set_slot(0, POLLING_A, (0, 0));
    h.report(0b1);
    h.tick();
    h.tick();
    assert!(h.correlated());

    h.ctx.close_joystick(h.joystick).unwrap();
    assert!(!h.ctx.joysticks().engine().slot_used(ShadowSource::Polling, 0));
    assert!(h
        .ctx
        .drain_events()
        .iter()
        .any(|e| matches!(e.data, EventData::JoyDeviceRemoved { which } if which == h.joystick)));
    assert!(h.ctx.close_joystick(h.joystick).is_err());
}
