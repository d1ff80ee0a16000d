//! Device hot-plug monitor
//!
//! A background task rescans the device list on an interval, or when asked
//! to, and diffs it against the previous scan. Changes are handed to the
//! pipeline thread over a channel and applied on its next update.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{InputError, Result};
use crate::joystick::correlation::LowLevelSource;

/// Enumerated controller
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Stable identity; two scans naming the same path name the same device
    pub path: String,
    pub name: String,
    #[serde(default)]
    pub vendor: u16,
    #[serde(default)]
    pub product: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HotplugChange {
    Added(DeviceInfo),
    /// Device path that disappeared
    Removed(String),
}

/// Last known device set
#[derive(Debug, Default)]
pub struct DeviceList {
    devices: Vec<DeviceInfo>,
}

impl DeviceList {
    pub fn devices(&self) -> &[DeviceInfo] {
        &self.devices
    }

    /// Replace the set with a fresh scan, returning removals then additions
    pub fn update(&mut self, scanned: Vec<DeviceInfo>) -> Vec<HotplugChange> {
        let mut changes: Vec<HotplugChange> = self
            .devices
            .iter()
            .filter(|old| !scanned.iter().any(|new| new.path == old.path))
            .map(|old| HotplugChange::Removed(old.path.clone()))
            .collect();
        changes.extend(
            scanned
                .iter()
                .filter(|new| !self.devices.iter().any(|old| old.path == new.path))
                .cloned()
                .map(HotplugChange::Added),
        );
        self.devices = scanned;
        changes
    }
}

/// Platform device scan
#[async_trait]
pub trait DeviceEnumerator: Send + Sync {
    async fn scan(&self) -> Result<Vec<DeviceInfo>>;
}

/// Opens an enumerated device for report polling
pub trait DeviceOpener: Send {
    fn open(&mut self, info: &DeviceInfo) -> Result<Box<dyn LowLevelSource>>;
}

/// Handle to the background scan task
#[derive(Debug)]
pub struct HotplugMonitor {
    list: Arc<Mutex<DeviceList>>,
    changes: Receiver<HotplugChange>,
    rescan: Arc<Notify>,
    stop: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

impl HotplugMonitor {
    /// Start scanning on the current tokio runtime
    ///
    /// The first scan runs immediately.
    ///
    /// # Errors
    ///
    /// [`InputError::Backend`] when called outside a tokio runtime.
    pub fn spawn(enumerator: Arc<dyn DeviceEnumerator>, interval: Duration) -> Result<Self> {
        let handle = tokio::runtime::Handle::try_current()
            .map_err(|_| InputError::Backend("hot-plug monitor needs a tokio runtime".to_string()))?;

        let list = Arc::new(Mutex::new(DeviceList::default()));
        let rescan = Arc::new(Notify::new());
        let stop = Arc::new(AtomicBool::new(false));
        let (tx, rx) = unbounded();

        let task = handle.spawn(Self::run(
            enumerator,
            interval.max(Duration::from_millis(1)),
            list.clone(),
            rescan.clone(),
            stop.clone(),
            tx,
        ));
        info!(interval_ms = interval.as_millis() as u64, "Hot-plug monitor started");

        Ok(Self {
            list,
            changes: rx,
            rescan,
            stop,
            task: Some(task),
        })
    }

    async fn run(
        enumerator: Arc<dyn DeviceEnumerator>,
        interval: Duration,
        list: Arc<Mutex<DeviceList>>,
        rescan: Arc<Notify>,
        stop: Arc<AtomicBool>,
        tx: Sender<HotplugChange>,
    ) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = rescan.notified() => {
                    debug!("Hot-plug rescan requested");
                }
            }
            if stop.load(Ordering::Acquire) {
                break;
            }

            let devices = match enumerator.scan().await {
                Ok(devices) => devices,
                Err(e) => {
                    warn!("Device scan failed: {}", e);
                    continue;
                }
            };
            let changes = list.lock().update(devices);
            for change in changes {
                if tx.send(change).is_err() {
                    return;
                }
            }
        }
        debug!("Hot-plug monitor stopped");
    }

    /// Scan now instead of waiting for the interval
    pub fn rescan(&self) {
        self.rescan.notify_one();
    }

    /// Changes received since the last call
    pub fn drain(&self) -> Vec<HotplugChange> {
        let mut out = Vec::new();
        loop {
            match self.changes.try_recv() {
                Ok(change) => out.push(change),
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        out
    }

    /// Device set as of the last completed scan
    pub fn devices(&self) -> Vec<DeviceInfo> {
        self.list.lock().devices().to_vec()
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Release);
        self.rescan.notify_one();
        self.task.take();
    }
}

impl Drop for HotplugMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(path: &str) -> DeviceInfo {
        DeviceInfo {
            path: path.to_string(),
            name: format!("pad at {}", path),
            vendor: 0x045E,
            product: 0x028E,
        }
    }

    struct FakeEnumerator {
        devices: Mutex<Vec<DeviceInfo>>,
        fail: AtomicBool,
    }

    #[async_trait]
    impl DeviceEnumerator for FakeEnumerator {
        async fn scan(&self) -> Result<Vec<DeviceInfo>> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(InputError::Backend("bus unavailable".to_string()));
            }
            Ok(self.devices.lock().clone())
        }
    }

    async fn wait_for(monitor: &HotplugMonitor, count: usize) -> Vec<HotplugChange> {
        let mut seen = Vec::new();
        for _ in 0..200 {
            seen.extend(monitor.drain());
            if seen.len() >= count {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        seen
    }

    #[test]
    fn test_diff_reports_removals_then_additions() {
        let mut list = DeviceList::default();
        assert_eq!(
            list.update(vec![device("a"), device("b")]),
            vec![HotplugChange::Added(device("a")), HotplugChange::Added(device("b"))]
        );
        assert_eq!(
            list.update(vec![device("b"), device("c")]),
            vec![HotplugChange::Removed("a".to_string()), HotplugChange::Added(device("c"))]
        );
        assert!(list.update(vec![device("b"), device("c")]).is_empty());
    }

    #[test]
    fn test_spawn_outside_runtime_fails() {
        let enumerator = Arc::new(FakeEnumerator {
            devices: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
        });
        let err = HotplugMonitor::spawn(enumerator, Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, InputError::Backend(_)));
    }

    #[tokio::test]
    async fn test_initial_scan_and_rescan() {
        let enumerator = Arc::new(FakeEnumerator {
            devices: Mutex::new(vec![device("/dev/pad0")]),
            fail: AtomicBool::new(false),
        });
        let mut monitor = HotplugMonitor::spawn(enumerator.clone(), Duration::from_secs(3600)).unwrap();

        let changes = wait_for(&monitor, 1).await;
        assert_eq!(changes, vec![HotplugChange::Added(device("/dev/pad0"))]);
        assert_eq!(monitor.devices(), vec![device("/dev/pad0")]);

        enumerator.devices.lock().clear();
        monitor.rescan();
        let changes = wait_for(&monitor, 1).await;
        assert_eq!(changes, vec![HotplugChange::Removed("/dev/pad0".to_string())]);

        monitor.stop();
        assert!(!monitor.is_running());
    }

    #[tokio::test]
    async fn test_failed_scan_keeps_previous_set() {
        let enumerator = Arc::new(FakeEnumerator {
            devices: Mutex::new(vec![device("/dev/pad0")]),
            fail: AtomicBool::new(false),
        });
        let monitor = HotplugMonitor::spawn(enumerator.clone(), Duration::from_secs(3600)).unwrap();
        wait_for(&monitor, 1).await;

        enumerator.fail.store(true, Ordering::SeqCst);
        monitor.rescan();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(monitor.drain().is_empty());
        assert_eq!(monitor.devices().len(), 1);
    }
}
