//! Configuration type definitions

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::events::{EventKind, DEFAULT_QUEUE_CAPACITY};
use crate::logging::LogPriority;
use crate::scancode::X11KeycodeSet;

/// Mouse configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MouseConfig {
    /// Maximum interval between presses counted as one multi-click (ms)
    pub double_click_time_ms: u64,

    /// Maximum pointer travel between presses of a multi-click (pixels)
    pub double_click_radius: i32,

    /// Scale applied to relative motion outside relative mode
    pub normal_speed_scale: f32,

    /// Scale applied to relative motion in relative mode
    pub relative_speed_scale: f32,

    /// Emulate relative mode by warping to the window centre
    pub relative_mode_warp: bool,

    /// Synthesize mouse events from touch input
    pub touch_mouse_events: bool,

    /// Synthesize touch events from the left mouse button
    pub mouse_touch_events: bool,
}

impl Default for MouseConfig {
    fn default() -> Self {
        Self {
            double_click_time_ms: 500,
            double_click_radius: 32,
            normal_speed_scale: 1.0,
            relative_speed_scale: 1.0,
            relative_mode_warp: false,
            touch_mouse_events: true,
            mouse_touch_events: false,
        }
    }
}

/// Keyboard configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyboardConfig {
    /// Report auto-repeat presses as repeat events instead of dropping them
    pub key_repeat: bool,

    /// X server keycode numbering
    pub x11_keycodes: X11KeycodeSet,
}

impl Default for KeyboardConfig {
    fn default() -> Self {
        Self {
            key_repeat: true,
            x11_keycodes: X11KeycodeSet::Evdev,
        }
    }
}

/// Joystick correlation and hot-plug configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JoystickConfig {
    /// Consecutive uncontested matches before a slot is trusted
    pub confirm_frames: u8,

    /// Consecutive mismatches before a correlation is dropped
    pub uncorrelate_frames: u8,

    /// Compare stick positions as well as buttons
    pub match_axes: bool,

    /// Forward guide presses from uncorrelated slots to a candidate joystick
    pub guide_fallback: bool,

    /// Device rescan interval (ms)
    pub hotplug_interval_ms: u64,
}

impl Default for JoystickConfig {
    fn default() -> Self {
        Self {
            confirm_frames: 2,
            uncorrelate_frames: 5,
            match_axes: true,
            guide_fallback: true,
            hotplug_interval_ms: 1000,
        }
    }
}

/// Event queue configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    /// Maximum queued events
    pub capacity: usize,

    /// Event kinds never queued
    pub disabled: Vec<EventKind>,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_QUEUE_CAPACITY,
            disabled: Vec::new(),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

/// Priority override for one log category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityOverride {
    /// Category name ("input", "video", ...) or number
    pub category: String,

    pub priority: LogPriority,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter ("trace", "debug", "info", "warn", "error")
    pub level: String,

    /// Output format
    pub format: LogFormat,

    /// Log file (also logs to stdout)
    pub file: Option<PathBuf>,

    /// Priority applied to every log category before overrides
    pub all_priority: Option<LogPriority>,

    /// Per-category priorities
    pub priorities: Vec<PriorityOverride>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            file: None,
            all_priority: None,
            priorities: Vec::new(),
        }
    }
}
