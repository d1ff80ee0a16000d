//! Fractional motion accumulation
//!
//! Scaled or fractional input is emitted as whole units while the
//! sub-unit remainder carries over to the next sample, so repeated small
//! values never leak or duplicate motion.

/// Per-axis remainder carried between samples
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Accumulator {
    remainder: f32,
}

impl Accumulator {
    pub const fn new() -> Self {
        Self { remainder: 0.0 }
    }

    /// Add `amount` and take out the whole part, truncated toward zero
    pub fn accumulate(&mut self, amount: f32) -> i32 {
        self.remainder += amount;
        let whole = if self.remainder >= 0.0 {
            self.remainder.floor()
        } else {
            self.remainder.ceil()
        };
        self.remainder -= whole;
        whole as i32
    }

    /// Like [`accumulate`](Self::accumulate), but a change of direction
    /// drops the remainder left over from the other direction
    pub fn accumulate_directional(&mut self, amount: f32) -> i32 {
        if (amount > 0.0 && self.remainder < 0.0) || (amount < 0.0 && self.remainder > 0.0) {
            self.remainder = 0.0;
        }
        self.accumulate(amount)
    }

    /// Scale a raw delta; a scale of exactly 1.0 passes through untouched
    #[allow(clippy::float_cmp)]
    pub fn scale(&mut self, scale: f32, raw: i32) -> i32 {
        if scale == 1.0 {
            return raw;
        }
        self.accumulate(scale * raw as f32)
    }

    pub fn remainder(&self) -> f32 {
        self.remainder
    }

    pub fn reset(&mut self) {
        self.remainder = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_unit_scale_bypasses_accumulator() {
        let mut acc = Accumulator::new();
        assert_eq!(acc.scale(1.0, 7), 7);
        assert_eq!(acc.remainder(), 0.0);
    }

    #[test]
    fn test_half_scale_carries_remainder() {
        let mut acc = Accumulator::new();
        assert_eq!(acc.scale(0.5, 1), 0);
        assert_eq!(acc.scale(0.5, 1), 1);
        assert_eq!(acc.scale(0.5, 1), 0);
        assert_eq!(acc.scale(0.5, 1), 1);
    }

    #[test]
    fn test_negative_truncates_toward_zero() {
        let mut acc = Accumulator::new();
        assert_eq!(acc.accumulate(-1.75), -1);
        assert!((acc.remainder() + 0.75).abs() < 1e-6);
        assert_eq!(acc.accumulate(-0.25), -1);
        assert_eq!(acc.remainder(), 0.0);
    }

    #[test]
    fn test_direction_change_drops_remainder() {
        let mut acc = Accumulator::new();
        assert_eq!(acc.accumulate_directional(0.9), 0);
        assert_eq!(acc.accumulate_directional(-1.0), -1);
        assert_eq!(acc.remainder(), 0.0);

        assert_eq!(acc.accumulate_directional(-0.6), 0);
        assert_eq!(acc.accumulate_directional(-0.6), -1);
        assert!((acc.remainder() + 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_reset_clears_remainder() {
        let mut acc = Accumulator::new();
        acc.accumulate(0.9);
        acc.reset();
        assert_eq!(acc.accumulate(0.9), 0);
    }

    proptest! {
        #[test]
        fn prop_scaled_sum_tracks_exact_sum(
            scale in 0.05f32..4.0,
            raws in proptest::collection::vec(0i32..40, 1..200),
        ) {
            let mut acc = Accumulator::new();
            let emitted: i64 = raws.iter().map(|&r| acc.scale(scale, r) as i64).sum();
            let total: i64 = raws.iter().map(|&r| r as i64).sum();
            let exact = (f64::from(scale) * total as f64).floor() as i64;
            prop_assert!((emitted - exact).abs() <= 1, "emitted {} exact {}", emitted, exact);
        }

        #[test]
        fn prop_remainder_stays_below_one(
            amounts in proptest::collection::vec(-3.0f32..3.0, 1..100),
        ) {
            let mut acc = Accumulator::new();
            for amount in amounts {
                acc.accumulate(amount);
                prop_assert!(acc.remainder().abs() < 1.0);
            }
        }
    }
}
