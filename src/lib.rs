//! # Afterglow Lamp Matrix Core
//!
//! Hardware-independent core of the afterglow firmware. The firmware sits
//! between a pinball machine's time-multiplexed 8×8 lamp matrix and a bank of
//! LEDs. Every tick it samples the original column/row state, rebuilds a
//! virtual brightness per lamp and re-drives an output shift-register matrix
//! with PWM-coded, decay-filtered values.
//!
//! ## Pipeline
//!
//! ```text
//! tick ─► output driver ─► input sampler ─► column validator ─► integrator
//!         (previous state)  (or test source)  (debounce)          (fade)
//! ```
//!
//! - [`output`]: afterglow PWM and pass-through frames for the output chain
//! - [`bus`]: bit-banged shift-in/shift-out over `embedded-hal` pins
//! - [`source`]: real matrix, test patterns or recorded replay as input
//! - [`validator`]: one-hot column decode and two-sample debounce
//! - [`matrix`]: 16-bit fixed-point brightness per lamp
//! - [`model`]: glow steps and PWM ceilings derived from [`config`]
//! - [`scheduler`]: the [`Afterglow`] engine tying it all together
//!
//! Configuration I/O lives in [`store`] (flash persistence) and
//! [`protocol`] (serial command parsing).
//!
//! The crate is `no_std` so the same code runs in the firmware and in host
//! unit tests.
#![cfg_attr(not(test), no_std)]

pub mod bus;
pub mod config;
pub mod matrix;
pub mod model;
pub mod output;
pub mod protocol;
pub mod scheduler;
pub mod source;
pub mod store;
pub mod validator;

#[cfg(test)]
mod test_utils;

pub use config::{Config, ConfigError, CONFIG_SIZE};
pub use model::{BrightnessModel, TimingMode};
pub use output::OutputMode;
pub use scheduler::{Afterglow, Straps, TickStats, UpdateError};
pub use source::TestSource;

/// Number of columns in the lamp matrix.
pub const NUM_COLS: usize = 8;
/// Number of rows in the lamp matrix.
pub const NUM_ROWS: usize = 8;

/// Interval at which the original machine advances its active column.
pub const ORIG_COLUMN_PERIOD_US: u32 = 2000;

/// Firmware version reported on a version poll.
pub const FIRMWARE_VERSION: u16 = 110;
