//! # Lamp Matrix State
//!
//! Virtual brightness of every lamp as a 16-bit fixed-point counter. Each
//! accepted column update moves the eight counters of that column towards
//! fully on or fully off by the lamp's glow step, saturating at both ends.
use crate::{NUM_COLS, NUM_ROWS};

/// Counter value of a fully lit lamp.
pub const FULL_BRIGHTNESS: u16 = u16::MAX;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LampMatrix {
    values: [[u16; NUM_ROWS]; NUM_COLS],
}

impl Default for LampMatrix {
    fn default() -> Self {
        Self::new()
    }
}

impl LampMatrix {
    /// All lamps off.
    pub const fn new() -> Self {
        Self {
            values: [[0; NUM_ROWS]; NUM_COLS],
        }
    }

    /// Integrates one accepted column update.
    ///
    /// `rows` is the original row driver state, active-low: a clear bit
    /// means the lamp in that row is on. Out of range columns are ignored.
    pub fn integrate(&mut self, column: usize, rows: u8, steps: &[u16; NUM_ROWS]) {
        let Some(values) = self.values.get_mut(column) else {
            return;
        };
        for (row, (value, &step)) in values.iter_mut().zip(steps.iter()).enumerate() {
            if rows & (1 << row) == 0 {
                *value = value.saturating_add(step);
            } else {
                *value = value.saturating_sub(step);
            }
        }
    }

    pub fn column(&self, column: usize) -> &[u16; NUM_ROWS] {
        &self.values[column]
    }

    pub fn value(&self, column: usize, row: usize) -> u16 {
        self.values[column][row]
    }

    /// Turns every lamp off.
    pub fn clear(&mut self) {
        self.values = [[0; NUM_ROWS]; NUM_COLS];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::glow_step;

    const ALL_ON: u8 = 0x00;
    const ALL_OFF: u8 = 0xFF;

    #[test]
    fn rise_and_fall_saturate() {
        for step in [1u16, 7, 655, 656, 8192, 30000, u16::MAX] {
            let steps = [step; NUM_ROWS];
            let updates = (u16::MAX as u32).div_ceil(step as u32);
            let mut matrix = LampMatrix::new();

            for _ in 0..updates - 1 {
                matrix.integrate(0, ALL_ON, &steps);
            }
            if step != u16::MAX {
                assert!(matrix.value(0, 0) < FULL_BRIGHTNESS, "step {step}");
            }
            for _ in 0..3 {
                matrix.integrate(0, ALL_ON, &steps);
                assert_eq!(matrix.value(0, 0), FULL_BRIGHTNESS, "step {step}");
            }

            for _ in 0..updates {
                matrix.integrate(0, ALL_OFF, &steps);
            }
            for _ in 0..3 {
                matrix.integrate(0, ALL_OFF, &steps);
                assert_eq!(matrix.value(0, 0), 0, "step {step}");
            }
        }
    }

    #[test]
    fn saturated_lamp_unchanged_by_repeat() {
        let steps = [8192; NUM_ROWS];
        let mut matrix = LampMatrix::new();
        for _ in 0..8 {
            matrix.integrate(3, 0b1111_0000, &steps);
        }
        let before = matrix.clone();
        matrix.integrate(3, 0b1111_0000, &steps);
        assert_eq!(matrix, before);
        assert_eq!(matrix.column(3), &[u16::MAX, u16::MAX, u16::MAX, u16::MAX, 0, 0, 0, 0]);
    }

    #[test]
    fn hundred_updates_traverse_full_range() {
        // 1600 ms glow duration
        let steps = [glow_step(160); NUM_ROWS];
        let mut matrix = LampMatrix::new();
        for _ in 0..99 {
            matrix.integrate(1, 0b1111_1110, &steps);
        }
        assert!(matrix.value(1, 0) < FULL_BRIGHTNESS);
        matrix.integrate(1, 0b1111_1110, &steps);
        assert_eq!(matrix.value(1, 0), FULL_BRIGHTNESS);
        assert_eq!(matrix.value(1, 1), 0);

        for _ in 0..99 {
            matrix.integrate(1, ALL_OFF, &steps);
        }
        assert!(matrix.value(1, 0) > 0);
        matrix.integrate(1, ALL_OFF, &steps);
        assert_eq!(matrix.value(1, 0), 0);
    }

    #[test]
    fn only_addressed_column_changes() {
        let steps = [1000; NUM_ROWS];
        let mut matrix = LampMatrix::new();
        matrix.integrate(6, ALL_ON, &steps);
        for col in 0..NUM_COLS {
            let expected = if col == 6 { 1000 } else { 0 };
            assert!(matrix.column(col).iter().all(|&v| v == expected));
        }
    }

    #[test]
    fn out_of_range_column_ignored() {
        let mut matrix = LampMatrix::new();
        matrix.integrate(NUM_COLS, ALL_ON, &[1; NUM_ROWS]);
        assert_eq!(matrix, LampMatrix::new());
    }

    #[test]
    fn per_lamp_steps() {
        let mut steps = [100; NUM_ROWS];
        steps[7] = u16::MAX;
        let mut matrix = LampMatrix::new();
        matrix.integrate(0, ALL_ON, &steps);
        assert_eq!(matrix.value(0, 0), 100);
        assert_eq!(matrix.value(0, 7), u16::MAX);
        matrix.clear();
        assert_eq!(matrix, LampMatrix::new());
    }
}
