//! Haptic effect descriptions

use enumflags2::{bitflags, BitFlags};
use serde::{Deserialize, Serialize};

use crate::error::{InputError, Result};

/// Effect length meaning "until stopped"
pub const HAPTIC_INFINITY: u32 = u32::MAX;

/// Supported effect types and device controls
#[bitflags]
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HapticFeature {
    Constant = 1 << 0,
    Sine = 1 << 1,
    Triangle = 1 << 2,
    SawtoothUp = 1 << 3,
    SawtoothDown = 1 << 4,
    LeftRight = 1 << 5,
    Gain = 1 << 6,
    Autocenter = 1 << 7,
    Pause = 1 << 8,
    Status = 1 << 9,
}

pub type HapticFeatures = BitFlags<HapticFeature>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Waveform {
    Sine,
    Triangle,
    SawtoothUp,
    SawtoothDown,
}

impl Waveform {
    fn feature(self) -> HapticFeature {
        match self {
            Waveform::Sine => HapticFeature::Sine,
            Waveform::Triangle => HapticFeature::Triangle,
            Waveform::SawtoothUp => HapticFeature::SawtoothUp,
            Waveform::SawtoothDown => HapticFeature::SawtoothDown,
        }
    }
}

/// Effect as uploaded to a device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HapticEffect {
    Constant {
        level: i16,
        length_ms: u32,
    },
    Periodic {
        waveform: Waveform,
        period_ms: u16,
        magnitude: i16,
        length_ms: u32,
    },
    /// Dual-motor rumble
    LeftRight {
        large: u16,
        small: u16,
        length_ms: u32,
    },
}

impl HapticEffect {
    /// Feature a device must advertise to play this effect
    pub fn feature(&self) -> HapticFeature {
        match self {
            HapticEffect::Constant { .. } => HapticFeature::Constant,
            HapticEffect::Periodic { waveform, .. } => waveform.feature(),
            HapticEffect::LeftRight { .. } => HapticFeature::LeftRight,
        }
    }

    pub fn length_ms(&self) -> u32 {
        match *self {
            HapticEffect::Constant { length_ms, .. }
            | HapticEffect::Periodic { length_ms, .. }
            | HapticEffect::LeftRight { length_ms, .. } => length_ms,
        }
    }

    /// Whether `other` may replace this effect in place
    pub fn same_kind(&self, other: &HapticEffect) -> bool {
        self.feature() == other.feature()
    }

    pub fn validate(&self) -> Result<()> {
        if let HapticEffect::Periodic { period_ms: 0, .. } = self {
            return Err(InputError::invalid("periodic effect with zero period"));
        }
        Ok(())
    }

    /// Total play time for `iterations`, `None` when unbounded
    pub fn play_time_ms(&self, iterations: u32) -> Option<u64> {
        let length = self.length_ms();
        if length == HAPTIC_INFINITY || iterations == HAPTIC_INFINITY {
            return None;
        }
        Some(length as u64 * iterations.max(1) as u64)
    }
}

/// Rumble effect for a strength in `0.0..=1.0`
pub(crate) fn rumble_effect(features: HapticFeatures, strength: f32, length_ms: u32) -> Option<HapticEffect> {
    let strength = strength.clamp(0.0, 1.0);
    if features.contains(HapticFeature::LeftRight) {
        let level = (strength * u16::MAX as f32) as u16;
        return Some(HapticEffect::LeftRight {
            large: level,
            small: level,
            length_ms,
        });
    }
    if features.contains(HapticFeature::Sine) {
        return Some(HapticEffect::Periodic {
            waveform: Waveform::Sine,
            period_ms: 1000,
            magnitude: (strength * i16::MAX as f32) as i16,
            length_ms,
        });
    }
    None
}
