//! # Column Validator
//!
//! The column select lines of the original matrix should be one-hot, but a
//! sample taken while the machine switches columns may show zero or two
//! active columns. The validator drops such frames and only hands a column
//! to the integrator once it has been seen twice in a row with identical
//! row data, and only once per original column period.
use crate::NUM_COLS;

/// Number of consecutive identical samples required before a column is
/// accepted.
pub const SINGLE_UPDATE_CONS: u8 = 2;

/// One 16-bit sample of the original matrix: column select bits in the high
/// byte, row driver state (active-low) in the low byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Sample {
    pub cols: u8,
    pub rows: u8,
}

impl Sample {
    pub const fn new(cols: u8, rows: u8) -> Self {
        Self { cols, rows }
    }

    pub const fn from_word(word: u16) -> Self {
        Self {
            cols: (word >> 8) as u8,
            rows: word as u8,
        }
    }

    pub const fn to_word(self) -> u16 {
        (self.cols as u16) << 8 | self.rows as u16
    }
}

/// A column update cleared for integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Accepted {
    pub column: usize,
    /// Row state, active-low.
    pub rows: u8,
}

/// Diagnostic counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    /// Samples whose column mask was not one-hot.
    pub bad_columns: u32,
    /// Accepted columns that did not follow the previously accepted one.
    pub out_of_order: u32,
    /// Column updates handed to the integrator.
    pub accepted: u32,
}

/// Maps a one-hot column mask to its column index.
pub fn decode_column(mask: u8) -> Option<usize> {
    match mask {
        0x01 => Some(0),
        0x02 => Some(1),
        0x04 => Some(2),
        0x08 => Some(3),
        0x10 => Some(4),
        0x20 => Some(5),
        0x40 => Some(6),
        0x80 => Some(7),
        _ => None,
    }
}

/// Framing state machine.
#[derive(Debug, Clone, Default)]
pub struct ColumnValidator {
    last: Sample,
    last_accepted_cols: u8,
    last_accepted_col: Option<usize>,
    consistent: u8,
    stats: FrameStats,
}

impl ColumnValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one raw sample, returning the column update if it is accepted.
    pub fn check(&mut self, sample: Sample) -> Option<Accepted> {
        let column = decode_column(sample.cols);
        if column.is_none() {
            self.stats.bad_columns = self.stats.bad_columns.wrapping_add(1);
        }

        if sample == self.last {
            self.consistent = self.consistent.saturating_add(1);
        } else {
            self.consistent = 0;
        }
        self.last = sample;

        let column = column?;
        // already handled during this column period
        if sample.cols == self.last_accepted_cols {
            return None;
        }
        if self.consistent < SINGLE_UPDATE_CONS - 1 {
            return None;
        }

        if let Some(prev) = self.last_accepted_col {
            if column != (prev + 1) % NUM_COLS {
                self.stats.out_of_order = self.stats.out_of_order.wrapping_add(1);
            }
        }
        self.last_accepted_cols = sample.cols;
        self.last_accepted_col = Some(column);
        self.stats.accepted = self.stats.accepted.wrapping_add(1);
        Some(Accepted {
            column,
            rows: sample.rows,
        })
    }

    /// Most recent raw sample, valid or not.
    pub fn last_sample(&self) -> Sample {
        self.last
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// Forgets sample history, keeping the counters.
    pub fn reset(&mut self) {
        *self = Self {
            stats: self.stats,
            ..Self::default()
        };
    }
}
