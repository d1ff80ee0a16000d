//! Multi-click detection

use crate::error::{InputError, Result};

/// Press history for one button
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClickState {
    pub last_timestamp: u64,
    pub last_x: i32,
    pub last_y: i32,
    pub click_count: u8,
}

impl ClickState {
    /// Record a press and return the resulting click count
    ///
    /// The count restarts when `time_ms` has elapsed since the previous press
    /// or the pointer moved more than `radius` on either axis.
    pub fn press(&mut self, now: u64, x: i32, y: i32, time_ms: u64, radius: i32) -> u8 {
        let expired = now >= self.last_timestamp.saturating_add(time_ms);
        let moved = (x - self.last_x).abs() > radius || (y - self.last_y).abs() > radius;
        if expired || moved {
            self.click_count = 0;
        }
        self.last_timestamp = now;
        self.last_x = x;
        self.last_y = y;
        self.click_count = self.click_count.saturating_add(1);
        self.click_count
    }
}

/// Click states indexed by button ordinal, grown on demand
#[derive(Debug, Default)]
pub struct ClickTable {
    states: Vec<ClickState>,
}

impl ClickTable {
    /// State for `button`, growing the table if needed
    ///
    /// # Errors
    ///
    /// Fails with [`InputError::OutOfMemory`] if the table cannot grow; the
    /// existing states are left as they were.
    pub fn get_mut(&mut self, button: u8) -> Result<&mut ClickState> {
        let index = button as usize;
        if index >= self.states.len() {
            self.states
                .try_reserve(index + 1 - self.states.len())
                .map_err(|_| InputError::OutOfMemory("mouse click state"))?;
            self.states.resize(index + 1, ClickState::default());
        }
        Ok(&mut self.states[index])
    }

    pub fn get(&self, button: u8) -> Option<&ClickState> {
        self.states.get(button as usize)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn clear(&mut self) {
        self.states.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIME: u64 = 500;
    const RADIUS: i32 = 32;

    #[test]
    fn test_double_click_within_window() {
        let mut state = ClickState::default();
        assert_eq!(state.press(1000, 10, 10, TIME, RADIUS), 1);
        assert_eq!(state.press(1200, 10, 10, TIME, RADIUS), 2);
        assert_eq!(state.press(1300, 12, 9, TIME, RADIUS), 3);
    }

    #[test]
    fn test_slow_clicks_restart() {
        let mut state = ClickState::default();
        assert_eq!(state.press(1000, 10, 10, TIME, RADIUS), 1);
        assert_eq!(state.press(1500, 10, 10, TIME, RADIUS), 1);
    }

    #[test]
    fn test_distant_clicks_restart() {
        let mut state = ClickState::default();
        assert_eq!(state.press(1000, 10, 10, TIME, RADIUS), 1);
        assert_eq!(state.press(1100, 10 + RADIUS + 1, 10, TIME, RADIUS), 1);
        assert_eq!(state.press(1150, 10 + RADIUS + 1, 10 + RADIUS, TIME, RADIUS), 2);
    }

    #[test]
    fn test_count_saturates() {
        let mut state = ClickState {
            last_timestamp: 100,
            last_x: 0,
            last_y: 0,
            click_count: 255,
        };
        assert_eq!(state.press(101, 0, 0, TIME, RADIUS), 255);
    }

    #[test]
    fn test_table_grows_on_demand() {
        let mut table = ClickTable::default();
        assert!(table.is_empty());

        table.get_mut(5).unwrap().click_count = 2;
        assert_eq!(table.len(), 6);
        assert_eq!(table.get(5).map(|s| s.click_count), Some(2));
        assert_eq!(table.get(1).map(|s| s.click_count), Some(0));

        table.get_mut(2).unwrap();
        assert_eq!(table.len(), 6);
    }
}
