//! # Fixed-Point Brightness Model
//!
//! Lamp brightness is a fixed-point fraction in `[0, 1]` held in a `u16`
//! (`0` fully off, `65535` fully on). Two per-lamp tables are derived from
//! the [`Config`] and the active [`TimingMode`]:
//!
//! - **glow step**: how far a lamp's brightness moves per full scan of the
//!   original matrix, so that the configured glow duration traverses the
//!   whole range
//! - **max subcycle**: the configured brightness ceiling expressed as the
//!   last PWM sub-cycle a lamp may be lit in
//!
//! ## Formulas
//!
//! ```text
//! scans        = glow_ms * 1000 / SCAN_PERIOD_US
//! glow_step    = ceil(65535 / scans)            (65535 when scans == 0)
//! max_subcycle = min(brightness, 7) * (N - 1) / 7
//! ```
//!
//! where `N` is the number of sub-cycles per original column period.
use crate::config::{Config, GLOW_DURATION_SCALE_MS, MAX_BRIGHTNESS_CODE};
use crate::{NUM_COLS, NUM_ROWS, ORIG_COLUMN_PERIOD_US};

/// Duration of one full scan of the original matrix.
pub const SCAN_PERIOD_US: u32 = ORIG_COLUMN_PERIOD_US * NUM_COLS as u32;

/// Local tick period selector, read from the timing jumper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimingMode {
    /// 250 µs tick, 8 sub-cycles per original column period.
    #[default]
    A,
    /// 500 µs tick, 4 sub-cycles per original column period.
    ///
    /// The output column still advances once per tick, so one output scan
    /// of the eight columns takes 4 ms, two original column periods.
    B,
}

impl TimingMode {
    /// Local tick period in microseconds.
    pub const fn tick_us(self) -> u32 {
        match self {
            TimingMode::A => 250,
            TimingMode::B => 500,
        }
    }

    /// Local ticks per original column period.
    pub const fn subcycles(self) -> u8 {
        (ORIG_COLUMN_PERIOD_US / self.tick_us()) as u8
    }

    /// Local ticks per millisecond, the replay playback scale.
    pub const fn ticks_per_ms(self) -> u32 {
        1000 / self.tick_us()
    }
}

/// Number of full matrix scans a glow of `glow_code` lasts.
pub fn glow_scans(glow_code: u8) -> u32 {
    glow_code as u32 * GLOW_DURATION_SCALE_MS * 1000 / SCAN_PERIOD_US
}

/// Brightness change per accepted column update for a glow duration code.
///
/// Rounds up so that exactly `scans` updates saturate the counter.
pub fn glow_step(glow_code: u8) -> u16 {
    let scans = glow_scans(glow_code);
    if scans == 0 {
        return u16::MAX;
    }
    let full = u16::MAX as u32;
    ((full + scans - 1) / scans) as u16
}

/// Last sub-cycle a lamp with brightness code `brightness` may be lit in.
///
/// Codes above [`MAX_BRIGHTNESS_CODE`] are clamped.
pub fn max_subcycle(brightness: u8, mode: TimingMode) -> u8 {
    let code = brightness.min(MAX_BRIGHTNESS_CODE) as u32;
    let last = mode.subcycles() as u32 - 1;
    (code * last / MAX_BRIGHTNESS_CODE as u32) as u8
}

/// Precomputed per-lamp tables, always consistent with the last applied
/// configuration and timing mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrightnessModel {
    glow_steps: [[u16; NUM_ROWS]; NUM_COLS],
    max_subcycles: [[u8; NUM_ROWS]; NUM_COLS],
    subcycles: u8,
}

impl BrightnessModel {
    pub fn new(config: &Config, mode: TimingMode) -> Self {
        let mut model = Self {
            glow_steps: [[0; NUM_ROWS]; NUM_COLS],
            max_subcycles: [[0; NUM_ROWS]; NUM_COLS],
            subcycles: mode.subcycles(),
        };
        for col in 0..NUM_COLS {
            for row in 0..NUM_ROWS {
                model.glow_steps[col][row] = glow_step(config.glow_duration[col][row]);
                model.max_subcycles[col][row] = max_subcycle(config.brightness[col][row], mode);
            }
        }
        model
    }

    /// Glow steps for the lamps of one column.
    pub fn glow_steps(&self, col: usize) -> &[u16; NUM_ROWS] {
        &self.glow_steps[col]
    }

    /// Maximum sub-cycles for the lamps of one column.
    pub fn max_subcycles(&self, col: usize) -> &[u8; NUM_ROWS] {
        &self.max_subcycles[col]
    }

    /// Sub-cycles per PWM window.
    pub fn subcycles(&self) -> u8 {
        self.subcycles
    }
}
