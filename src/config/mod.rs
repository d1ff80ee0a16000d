//! Configuration management
//!
//! Handles loading and validation of configuration from TOML files. Every
//! section is optional; missing keys take the defaults in [`types`].

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub mod types;

pub use types::{
    EventsConfig, JoystickConfig, KeyboardConfig, LogFormat, LoggingConfig, MouseConfig,
    PriorityOverride,
};

use crate::logging::{LogCategory, LogSink};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Mouse configuration
    #[serde(default)]
    pub mouse: MouseConfig,
    /// Keyboard configuration
    #[serde(default)]
    pub keyboard: KeyboardConfig,
    /// Joystick configuration
    #[serde(default)]
    pub joystick: JoystickConfig,
    /// Event queue configuration
    #[serde(default)]
    pub events: EventsConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// Parse and validate configuration text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    /// Create default configuration
    pub fn default_config() -> Self {
        Self::default()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let mouse = &self.mouse;
        if mouse.double_click_radius < 0 {
            anyhow::bail!(
                "double_click_radius must not be negative: {}",
                mouse.double_click_radius
            );
        }
        for (name, scale) in [
            ("normal_speed_scale", mouse.normal_speed_scale),
            ("relative_speed_scale", mouse.relative_speed_scale),
        ] {
            if !scale.is_finite() || scale <= 0.0 {
                anyhow::bail!("{} must be a positive number: {}", name, scale);
            }
        }

        let joystick = &self.joystick;
        if joystick.confirm_frames == 0 {
            anyhow::bail!("confirm_frames must be at least 1");
        }
        if joystick.uncorrelate_frames == 0 {
            anyhow::bail!("uncorrelate_frames must be at least 1");
        }
        if joystick.hotplug_interval_ms == 0 {
            anyhow::bail!("hotplug_interval_ms must be at least 1");
        }

        if self.events.capacity == 0 {
            anyhow::bail!("events.capacity must be at least 1");
        }

        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Invalid log level: {}", self.logging.level),
        }
        for entry in &self.logging.priorities {
            if LogCategory::from_name(&entry.category).is_none() {
                anyhow::bail!("Unknown log category: {}", entry.category);
            }
        }

        Ok(())
    }

    /// Apply the log priority settings to a sink
    pub fn apply_log_priorities(&self, sink: &LogSink) {
        if let Some(priority) = self.logging.all_priority {
            sink.set_all_priority(priority);
        }
        for entry in &self.logging.priorities {
            if let Some(category) = LogCategory::from_name(&entry.category) {
                sink.set_priority(category, entry.priority);
            }
        }
    }
}
