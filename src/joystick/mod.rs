//! Joystick subsystem
//!
//! Opened devices report through [`LowLevelSource`]; shadow sources are
//! attached to the [`CorrelationEngine`], which pairs them up with opened
//! devices. Hot-plug changes arrive either from a running
//! [`HotplugMonitor`] or through [`JoystickSubsystem::apply_hotplug`].

pub mod correlation;
pub mod device;
pub mod hotplug;
pub mod remap;
pub mod report;

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::backend::Dispatch;
use crate::config::JoystickConfig;
use crate::error::{InputError, Result};
use crate::events::{EventData, JoystickId};

pub use correlation::{
    CorrelationEngine, LowLevelSource, MatchState, ShadowProvider, ShadowSlot, ShadowSource, SourceLink,
};
pub use device::{Joystick, Rumble, GUIDE_BUTTON, NUM_AXES, NUM_BUTTONS};
pub use hotplug::{DeviceEnumerator, DeviceInfo, DeviceList, DeviceOpener, HotplugChange, HotplugMonitor};
pub use remap::{ButtonLayout, GamepadButton};
pub use report::LowLevelReport;

/// Reports drained per device per update
const MAX_REPORTS_PER_UPDATE: usize = 64;

struct OpenJoystick {
    joystick: Joystick,
    source: Box<dyn LowLevelSource>,
}

pub struct JoystickSubsystem {
    engine: CorrelationEngine,
    opener: Option<Box<dyn DeviceOpener>>,
    monitor: Option<HotplugMonitor>,
    opened: Vec<OpenJoystick>,
    next_id: JoystickId,
}

impl JoystickSubsystem {
    pub fn new(config: JoystickConfig) -> Self {
        Self {
            engine: CorrelationEngine::new(config),
            opener: None,
            monitor: None,
            opened: Vec::new(),
            next_id: 0,
        }
    }

    pub fn engine(&self) -> &CorrelationEngine {
        &self.engine
    }

    pub fn add_shadow_provider(&mut self, provider: Box<dyn ShadowProvider>) {
        self.engine.add_provider(provider);
    }

    /// Opener used for hot-plugged devices
    pub fn set_opener(&mut self, opener: Box<dyn DeviceOpener>) {
        self.opener = Some(opener);
    }

    /// Start the background scan on the current tokio runtime
    pub fn start_hotplug(&mut self, enumerator: Arc<dyn DeviceEnumerator>) -> Result<()> {
        let interval = Duration::from_millis(self.engine.config().hotplug_interval_ms);
        self.monitor = Some(HotplugMonitor::spawn(enumerator, interval)?);
        Ok(())
    }

    pub fn hotplug_monitor(&self) -> Option<&HotplugMonitor> {
        self.monitor.as_ref()
    }

    /// Register an already opened device
    pub fn open(&mut self, info: &DeviceInfo, source: Box<dyn LowLevelSource>, d: &Dispatch<'_>) -> JoystickId {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        info!(joystick = id, path = %info.path, name = %info.name, "Joystick opened");
        self.opened.push(OpenJoystick {
            joystick: Joystick::new(id, info.name.clone(), info.path.clone()),
            source,
        });
        d.push(EventData::JoyDeviceAdded { which: id });
        id
    }

    pub fn close(&mut self, id: JoystickId, d: &Dispatch<'_>) -> Result<()> {
        let index = self
            .opened
            .iter()
            .position(|o| o.joystick.id() == id)
            .ok_or(InputError::UnknownJoystick(id))?;
        let mut closed = self.opened.remove(index);
        self.engine.release(&mut closed.joystick);
        info!(joystick = id, "Joystick closed");
        d.push(EventData::JoyDeviceRemoved { which: id });
        Ok(())
    }

    pub fn joystick(&self, id: JoystickId) -> Option<&Joystick> {
        self.opened.iter().map(|o| &o.joystick).find(|j| j.id() == id)
    }

    pub fn joysticks(&self) -> impl Iterator<Item = &Joystick> {
        self.opened.iter().map(|o| &o.joystick)
    }

    pub fn len(&self) -> usize {
        self.opened.len()
    }

    pub fn is_empty(&self) -> bool {
        self.opened.is_empty()
    }

    /// Open added devices and close removed ones
    pub fn apply_hotplug(&mut self, changes: Vec<HotplugChange>, d: &Dispatch<'_>) {
        for change in changes {
            match change {
                HotplugChange::Added(info) => {
                    if self.opened.iter().any(|o| o.joystick.path() == info.path) {
                        continue;
                    }
                    let Some(opener) = self.opener.as_mut() else {
                        debug!(path = %info.path, "No opener for added device");
                        continue;
                    };
                    match opener.open(&info) {
                        Ok(source) => {
                            self.open(&info, source, d);
                        }
                        Err(e) => warn!(path = %info.path, "Failed to open joystick: {}", e),
                    }
                }
                HotplugChange::Removed(path) => {
                    let ids: Vec<JoystickId> = self
                        .opened
                        .iter()
                        .filter(|o| o.joystick.path() == path)
                        .map(|o| o.joystick.id())
                        .collect();
                    for id in ids {
                        // Just found by id
                        let _ = self.close(id, d);
                    }
                }
            }
        }
    }

    /// Hot-plug, report polling, correlation and rumble deadlines
    pub fn update(&mut self, now: u64, d: &Dispatch<'_>) {
        let changes = self.monitor.as_ref().map(HotplugMonitor::drain).unwrap_or_default();
        if !changes.is_empty() {
            self.apply_hotplug(changes, d);
        }

        for open in &mut self.opened {
            Self::poll_reports(open, d);
        }

        let mut refs: Vec<&mut Joystick> = self.opened.iter_mut().map(|o| &mut o.joystick).collect();
        self.engine.tick(&mut refs, d);
        for joystick in refs {
            self.engine.expire_rumble(joystick, now);
        }
    }

    fn poll_reports(open: &mut OpenJoystick, d: &Dispatch<'_>) {
        for _ in 0..MAX_REPORTS_PER_UPDATE {
            let data = match open.source.poll_report() {
                Ok(Some(data)) => data,
                Ok(None) => break,
                Err(e) => {
                    warn!(joystick = open.joystick.id(), "Report poll failed: {}", e);
                    break;
                }
            };
            match LowLevelReport::parse(&data) {
                Ok(report) => {
                    let precise = open.joystick.is_correlated();
                    open.joystick.apply_report(report, !precise, d);
                }
                Err(e) => warn!(joystick = open.joystick.id(), "Dropping report: {}", e),
            }
        }
    }

    /// Rumble through the correlated shadow slot
    pub fn rumble(&mut self, id: JoystickId, low: u16, high: u16, duration_ms: u64, now: u64) -> Result<()> {
        let open = self
            .opened
            .iter_mut()
            .find(|o| o.joystick.id() == id)
            .ok_or(InputError::UnknownJoystick(id))?;
        self.engine.rumble(&mut open.joystick, low, high, duration_ms, now)
    }

    /// Stop the monitor and close every device
    pub fn shutdown(&mut self, d: &Dispatch<'_>) {
        if let Some(mut monitor) = self.monitor.take() {
            monitor.stop();
        }
        let ids: Vec<JoystickId> = self.opened.iter().map(|o| o.joystick.id()).collect();
        for id in ids {
            let _ = self.close(id, d);
        }
    }
}

impl std::fmt::Debug for JoystickSubsystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JoystickSubsystem")
            .field("engine", &self.engine)
            .field("open", &self.opened.len())
            .field("hotplug", &self.monitor.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventQueue;
    use crate::platform::HeadlessBackend;
    use bytes::Bytes;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    #[derive(Clone, Default)]
    struct ScriptedSource {
        reports: Arc<Mutex<VecDeque<Bytes>>>,
    }

    impl LowLevelSource for ScriptedSource {
        fn poll_report(&mut self) -> Result<Option<Bytes>> {
            Ok(self.reports.lock().pop_front())
        }
    }

    struct ScriptedOpener {
        source: ScriptedSource,
        refuse: bool,
    }

    impl DeviceOpener for ScriptedOpener {
        fn open(&mut self, info: &DeviceInfo) -> Result<Box<dyn LowLevelSource>> {
            if self.refuse {
                return Err(InputError::Backend(format!("{} busy", info.path)));
            }
            Ok(Box::new(self.source.clone()))
        }
    }

    fn info(path: &str) -> DeviceInfo {
        DeviceInfo {
            path: path.to_string(),
            name: "pad".to_string(),
            vendor: 0,
            product: 0,
        }
    }

    fn neutral(buttons: u16) -> LowLevelReport {
        LowLevelReport {
            sticks: [32768; 4],
            trigger: 32768,
            buttons,
            hat: 0,
        }
    }

    #[test]
    fn test_hotplug_opens_and_closes() {
        let mut backend = HeadlessBackend::new();
        let queue = EventQueue::default();
        let d = Dispatch::new(&mut backend, &queue, 0);
        let mut joysticks = JoystickSubsystem::new(JoystickConfig::default());
        joysticks.set_opener(Box::new(ScriptedOpener {
            source: ScriptedSource::default(),
            refuse: false,
        }));

        joysticks.apply_hotplug(vec![HotplugChange::Added(info("/dev/a"))], &d);
        joysticks.apply_hotplug(vec![HotplugChange::Added(info("/dev/a"))], &d);
        assert_eq!(joysticks.len(), 1);
        joysticks.apply_hotplug(vec![HotplugChange::Removed("/dev/a".to_string())], &d);
        assert!(joysticks.is_empty());

        let events: Vec<_> = queue.drain().into_iter().map(|e| e.data).collect();
        assert_eq!(
            events,
            vec![EventData::JoyDeviceAdded { which: 0 }, EventData::JoyDeviceRemoved { which: 0 }]
        );
    }

    #[test]
    fn test_open_failure_is_skipped() {
        let mut backend = HeadlessBackend::new();
        let queue = EventQueue::default();
        let d = Dispatch::new(&mut backend, &queue, 0);
        let mut joysticks = JoystickSubsystem::new(JoystickConfig::default());
        joysticks.set_opener(Box::new(ScriptedOpener {
            source: ScriptedSource::default(),
            refuse: true,
        }));
        joysticks.apply_hotplug(vec![HotplugChange::Added(info("/dev/a"))], &d);
        assert!(joysticks.is_empty());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_update_applies_reports_and_skips_garbage() {
        let mut backend = HeadlessBackend::new();
        let queue = EventQueue::default();
        let d = Dispatch::new(&mut backend, &queue, 0);
        let mut joysticks = JoystickSubsystem::new(JoystickConfig::default());
        let source = ScriptedSource::default();
        let id = joysticks.open(&info("/dev/a"), Box::new(source.clone()), &d);
        queue.drain();

        source.reports.lock().push_back(Bytes::from_static(&[0x00, 0x01]));
        source.reports.lock().push_back(neutral(0b1).encode());
        joysticks.update(0, &d);

        assert_eq!(joysticks.joystick(id).and_then(|j| j.button(0)), Some(true));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_close_unknown_and_rumble_unknown() {
        let mut backend = HeadlessBackend::new();
        let queue = EventQueue::default();
        let d = Dispatch::new(&mut backend, &queue, 0);
        let mut joysticks = JoystickSubsystem::new(JoystickConfig::default());
        assert!(matches!(joysticks.close(9, &d), Err(InputError::UnknownJoystick(9))));
        assert!(matches!(
            joysticks.rumble(9, 1, 1, 10, 0),
            Err(InputError::UnknownJoystick(9))
        ));

        let id = joysticks.open(&info("/dev/a"), Box::new(ScriptedSource::default()), &d);
        assert!(joysticks.rumble(id, 1, 1, 10, 0).unwrap_err().is_unsupported());
    }

    #[test]
    fn test_shutdown_closes_everything() {
        let mut backend = HeadlessBackend::new();
        let queue = EventQueue::default();
        let d = Dispatch::new(&mut backend, &queue, 0);
        let mut joysticks = JoystickSubsystem::new(JoystickConfig::default());
        joysticks.open(&info("/dev/a"), Box::new(ScriptedSource::default()), &d);
        joysticks.open(&info("/dev/b"), Box::new(ScriptedSource::default()), &d);
        joysticks.shutdown(&d);
        assert!(joysticks.is_empty());
        assert_eq!(queue.len(), 4);
    }
}
