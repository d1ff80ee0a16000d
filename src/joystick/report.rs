//! Low-level controller report
//!
//! # Layout (little endian, 14 bytes)
//!
//! | offset | size | field |
//! |--------|------|-------|
//! | 0 | 1 | report id, always `0x00` |
//! | 1 | 2 | left stick X |
//! | 3 | 2 | left stick Y |
//! | 5 | 2 | right stick X |
//! | 7 | 2 | right stick Y |
//! | 9 | 2 | combined trigger Z, 32768 at rest |
//! | 11 | 2 | buttons, bits 0..9 = A B X Y LB RB Back Start LS RS |
//! | 13 | 1 | hat, 0 centred, 1..8 clockwise from north |
//!
//! Sticks are unsigned with 32768 at centre and Y growing downwards. Both
//! triggers share one axis: the left trigger pulls it below centre and the
//! right trigger above, so pressing both reads as released.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{InputError, Result};

pub const REPORT_ID: u8 = 0x00;
pub const REPORT_LEN: usize = 14;

pub const HAT_CENTERED: u8 = 0x00;
pub const HAT_UP: u8 = 0x01;
pub const HAT_RIGHT: u8 = 0x02;
pub const HAT_DOWN: u8 = 0x04;
pub const HAT_LEFT: u8 = 0x08;

/// Hat bits for report values 0..=8
const HAT_DIRECTIONS: [u8; 9] = [
    HAT_CENTERED,
    HAT_UP,
    HAT_UP | HAT_RIGHT,
    HAT_RIGHT,
    HAT_DOWN | HAT_RIGHT,
    HAT_DOWN,
    HAT_DOWN | HAT_LEFT,
    HAT_LEFT,
    HAT_UP | HAT_LEFT,
];

const TRIGGER_CENTER: i32 = 32768;

/// Decoded low-level report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LowLevelReport {
    /// LX, LY, RX, RY as sent
    pub sticks: [u16; 4],
    pub trigger: u16,
    pub buttons: u16,
    /// Hat as sent, 0..=8
    pub hat: u8,
}

impl LowLevelReport {
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < REPORT_LEN {
            return Err(InputError::InvalidReport(format!(
                "{} bytes, expected {}",
                data.len(),
                REPORT_LEN
            )));
        }
        let mut buf = data;
        let id = buf.get_u8();
        if id != REPORT_ID {
            return Err(InputError::InvalidReport(format!("unknown report id 0x{:02X}", id)));
        }

        let mut sticks = [0u16; 4];
        for stick in &mut sticks {
            *stick = buf.get_u16_le();
        }
        let trigger = buf.get_u16_le();
        let buttons = buf.get_u16_le() & 0x03FF;
        let hat = buf.get_u8();
        if hat as usize >= HAT_DIRECTIONS.len() {
            return Err(InputError::InvalidReport(format!("hat value {}", hat)));
        }

        Ok(Self {
            sticks,
            trigger,
            buttons,
            hat,
        })
    }

    /// Wire form
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(REPORT_LEN);
        buf.put_u8(REPORT_ID);
        for stick in self.sticks {
            buf.put_u16_le(stick);
        }
        buf.put_u16_le(self.trigger);
        buf.put_u16_le(self.buttons);
        buf.put_u8(self.hat);
        buf.freeze()
    }

    /// Stick value re-centred on zero
    pub fn stick(&self, index: usize) -> i16 {
        self.sticks
            .get(index)
            .map_or(0, |&v| (v as i32 - 32768) as i16)
    }

    /// Left and right trigger in `0..=32767`
    pub fn triggers(&self) -> (i16, i16) {
        let offset = self.trigger as i32 - TRIGGER_CENTER;
        let left = (-offset).clamp(0, i16::MAX as i32) as i16;
        let right = offset.clamp(0, i16::MAX as i32) as i16;
        (left, right)
    }

    pub fn button(&self, index: u8) -> bool {
        index < 16 && self.buttons & (1 << index) != 0
    }

    /// Hat as `HAT_*` bits
    pub fn hat_bits(&self) -> u8 {
        HAT_DIRECTIONS
            .get(self.hat as usize)
            .copied()
            .unwrap_or(HAT_CENTERED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<u8> {
        vec![
            0x00, // id
            0x00, 0x80, // LX centre
            0xFF, 0xFF, // LY full down
            0x00, 0x00, // RX full left
            0x00, 0x90, // RY
            0x00, 0x40, // Z: left trigger half
            0b0000_0101, 0b0000_0010, // A, X, RS
            0x03, // hat east
        ]
    }

    #[test]
    fn test_parse_fields() {
        let report = LowLevelReport::parse(&sample()).unwrap();
        assert_eq!(report.stick(0), 0);
        assert_eq!(report.stick(1), i16::MAX);
        assert_eq!(report.stick(2), i16::MIN);
        assert_eq!(report.stick(3), 0x1000);
        assert!(report.button(0));
        assert!(!report.button(1));
        assert!(report.button(2));
        assert!(report.button(9));
        assert_eq!(report.hat_bits(), HAT_RIGHT);
    }

    #[test]
    fn test_combined_trigger_split() {
        let mut report = LowLevelReport::parse(&sample()).unwrap();
        assert_eq!(report.triggers(), (16384, 0));

        report.trigger = 0xFFFF;
        assert_eq!(report.triggers(), (0, i16::MAX));

        report.trigger = 0;
        assert_eq!(report.triggers(), (i16::MAX, 0));

        report.trigger = 32768;
        assert_eq!(report.triggers(), (0, 0));
    }

    #[test]
    fn test_short_and_foreign_reports_rejected() {
        let data = sample();
        assert!(matches!(
            LowLevelReport::parse(&data[..13]),
            Err(InputError::InvalidReport(_))
        ));

        let mut foreign = data.clone();
        foreign[0] = 0x02;
        assert!(LowLevelReport::parse(&foreign).is_err());

        let mut bad_hat = data;
        bad_hat[13] = 9;
        assert!(LowLevelReport::parse(&bad_hat).is_err());
    }

    #[test]
    fn test_encode_matches_wire_layout() {
        let report = LowLevelReport::parse(&sample()).unwrap();
        assert_eq!(report.encode().as_ref(), sample().as_slice());
    }

    #[test]
    fn test_reserved_button_bits_ignored() {
        let mut data = sample();
        data[12] = 0xFC | 0x02;
        let report = LowLevelReport::parse(&data).unwrap();
        assert_eq!(report.buttons, 0x0205);
    }
}
