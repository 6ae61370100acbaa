//! # Output PWM Driver
//!
//! Turns the lamp matrix into one 16-bit frame per tick for the output
//! shift register chain: column select in the high byte, lamp rows
//! (active-high) in the low byte.
//!
//! ## Afterglow Mode
//!
//! The driver walks the output columns on its own, `tick % 8`. Consecutive
//! visits to the same column step through `N` sub-cycles,
//! `(tick / 8) % N`. A lamp with a nonzero counter `V` is lit while
//!
//! ```text
//! subcycle <= min(V / (65536 / N), max_subcycle)
//! ```
//!
//! so over one `N`-visit window it is on for a share proportional to its
//! brightness, capped by its configured maximum. Every frame is preceded by
//! an all-off frame so the previous column never bleeds into the next.
//!
//! ## Pass-Through Mode
//!
//! The last raw sample is re-emitted unchanged apart from row polarity, and
//! only when it differs from what was last written.
use crate::bus::ShiftOut;
use crate::matrix::LampMatrix;
use crate::model::BrightnessModel;
use crate::validator::Sample;
use crate::{NUM_COLS, NUM_ROWS};

/// Output behaviour, read from the mode jumper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    #[default]
    Afterglow,
    PassThrough,
}

/// One output frame. Rows are active-high.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Frame {
    pub cols: u8,
    pub rows: u8,
}

impl Frame {
    pub const BLANK: Frame = Frame { cols: 0, rows: 0 };

    pub const fn to_word(self) -> u16 {
        (self.cols as u16) << 8 | self.rows as u16
    }

    /// Output frame mirroring a raw input sample.
    pub const fn from_sample(sample: Sample) -> Self {
        Self {
            cols: sample.cols,
            rows: !sample.rows,
        }
    }
}

/// Sub-cycle up to which a lamp at brightness `value` is lit, before the
/// configured cap.
pub fn subcycle_threshold(value: u16, subcycles: u8) -> u8 {
    let window = 0x1_0000 / subcycles as u32;
    (value as u32 / window) as u8
}

/// Afterglow frame for a given tick.
pub fn afterglow_frame(tick: u32, matrix: &LampMatrix, model: &BrightnessModel) -> Frame {
    let col = tick as usize % NUM_COLS;
    let subcycle = ((tick / NUM_COLS as u32) % model.subcycles() as u32) as u8;
    let values = matrix.column(col);
    let ceilings = model.max_subcycles(col);

    let mut rows = 0u8;
    for row in 0..NUM_ROWS {
        let value = values[row];
        if value == 0 {
            continue;
        }
        let threshold = subcycle_threshold(value, model.subcycles()).min(ceilings[row]);
        if subcycle <= threshold {
            rows |= 1 << row;
        }
    }
    Frame {
        cols: 1 << col,
        rows,
    }
}

/// Frame generator with the pass-through change memory.
#[derive(Debug, Clone, Default)]
pub struct PwmDriver {
    passed: Option<Frame>,
}

impl PwmDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits this tick's output.
    pub fn drive<O: ShiftOut>(
        &mut self,
        out: &mut O,
        mode: OutputMode,
        tick: u32,
        matrix: &LampMatrix,
        model: &BrightnessModel,
        last_sample: Sample,
    ) {
        match mode {
            OutputMode::Afterglow => {
                self.passed = None;
                out.shift_out(Frame::BLANK.to_word());
                out.shift_out(afterglow_frame(tick, matrix, model).to_word());
            }
            OutputMode::PassThrough => {
                let frame = Frame::from_sample(last_sample);
                if self.passed != Some(frame) {
                    out.shift_out(frame.to_word());
                    self.passed = Some(frame);
                }
            }
        }
    }

    /// Forces the next pass-through frame to be written.
    pub fn reset(&mut self) {
        self.passed = None;
    }
}
