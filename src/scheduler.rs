//! # Realtime Scheduler
//!
//! [`Afterglow`] owns every piece of mutable state the realtime tick needs:
//! the buses, the lamp matrix, the validator history, the configuration and
//! the brightness model derived from it. The board calls [`Afterglow::tick`]
//! at a fixed period; everything else (configuration changes, strap changes)
//! happens from the background loop while the engine is stopped.
//!
//! ## Tick Order
//!
//! 1. Drive the output from the state left by the previous tick, so output
//!    timing does not depend on how long input processing takes
//! 2. Sample the input (or the test source)
//! 3. Validate the column
//! 4. Integrate the accepted column into the lamp matrix
//! 5. Check in with the watchdog
//!
//! ## Running and Stopped
//!
//! Stopping blanks the outputs and disarms the watchdog; starting re-arms
//! it. Configuration and strap changes are only applied while stopped, so
//! a tick never sees half of an update.
use crate::bus::{ShiftIn, ShiftOut};
use crate::config::{Config, ConfigError};
use crate::matrix::LampMatrix;
use crate::model::{BrightnessModel, TimingMode};
use crate::output::{OutputMode, PwmDriver};
use crate::source::{InputSource, TestSource};
use crate::store::ConfigStore;
use crate::validator::{ColumnValidator, FrameStats};

/// Hardware watchdog kept alive by completed ticks.
pub trait Watchdog {
    /// Starts supervising the realtime tick.
    fn arm(&mut self);
    /// Suspends supervision while the tick is stopped.
    fn disarm(&mut self);
    /// Checks in. Called after each completed tick, and on each idle tick
    /// while stopped for watchdogs that cannot be switched off.
    fn feed(&mut self);
}

/// Mode jumper state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Straps {
    pub timing: TimingMode,
    pub output: OutputMode,
    /// Synthetic input replacing the real matrix, if test mode is enabled.
    pub test: Option<TestSource>,
}

/// Realtime observability counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickStats {
    /// Longest plausible tick duration seen, in microseconds.
    pub max_duration_us: u32,
    /// Duration samples discarded as measurement artifacts.
    pub outliers: u32,
    /// Ticks that started more than one full period late.
    pub overruns: u32,
}

/// Why a configuration update was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateError<E> {
    /// No record arrived in time.
    Missing,
    /// The record failed validation.
    Invalid(ConfigError),
    /// The record could not be persisted.
    Store(E),
}

/// Multiple of the tick period beyond which a duration sample is treated as
/// a measurement artifact.
const OUTLIER_FACTOR: u32 = 8;

/// The afterglow engine.
pub struct Afterglow<I, O, W> {
    input: I,
    output: O,
    watchdog: W,
    running: bool,
    straps: Straps,
    config: Config,
    model: BrightnessModel,
    matrix: LampMatrix,
    validator: ColumnValidator,
    driver: PwmDriver,
    source: InputSource,
    tick: u32,
    stats: TickStats,
}

impl<I, O, W> Afterglow<I, O, W>
where
    I: ShiftIn,
    O: ShiftOut,
    W: Watchdog,
{
    /// Creates a stopped engine with the outputs blanked.
    pub fn new(input: I, mut output: O, watchdog: W, config: Config, straps: Straps) -> Self {
        output.disable();
        Self {
            input,
            output,
            watchdog,
            running: false,
            straps,
            model: BrightnessModel::new(&config, straps.timing),
            config,
            matrix: LampMatrix::new(),
            validator: ColumnValidator::new(),
            driver: PwmDriver::new(),
            source: InputSource::new(straps.test),
            tick: 0,
            stats: TickStats::default(),
        }
    }

    /// Resumes ticking and arms the watchdog.
    pub fn start(&mut self) {
        if self.running {
            return;
        }
        self.driver.reset();
        self.watchdog.arm();
        self.running = true;
    }

    /// Stops ticking, blanks the outputs and disarms the watchdog.
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        self.output.disable();
        self.watchdog.disarm();
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// One realtime tick. Bounded time, never blocks.
    pub fn tick(&mut self) {
        if !self.running {
            self.watchdog.feed();
            return;
        }

        self.driver.drive(
            &mut self.output,
            self.straps.output,
            self.tick,
            &self.matrix,
            &self.model,
            self.validator.last_sample(),
        );

        let sample = self
            .source
            .sample(&mut self.input, self.tick, self.straps.timing);
        if let Some(accepted) = self.validator.check(sample) {
            self.matrix.integrate(
                accepted.column,
                accepted.rows,
                self.model.glow_steps(accepted.column),
            );
        }

        self.tick = self.tick.wrapping_add(1);
        self.watchdog.feed();
    }

    /// Replaces the configuration and rebuilds the brightness model.
    ///
    /// Must only be called while stopped.
    pub fn apply_config(&mut self, config: Config) {
        debug_assert!(!self.running, "configuration changed while running");
        self.config = config;
        self.model = BrightnessModel::new(&self.config, self.straps.timing);
    }

    /// Completes a configuration update begun with [`Afterglow::stop`].
    ///
    /// A valid `record` is persisted, then applied; on any failure the
    /// running configuration stays as it was. The engine is restarted
    /// either way.
    pub fn finish_update<S: ConfigStore>(
        &mut self,
        store: &mut S,
        record: Option<&[u8]>,
    ) -> Result<(), UpdateError<S::Error>> {
        let result = self.commit_record(store, record);
        self.start();
        result
    }

    fn commit_record<S: ConfigStore>(
        &mut self,
        store: &mut S,
        record: Option<&[u8]>,
    ) -> Result<(), UpdateError<S::Error>> {
        let record = record.ok_or(UpdateError::Missing)?;
        let config = Config::from_bytes(record).map_err(UpdateError::Invalid)?;
        store.save(&config.to_bytes()).map_err(UpdateError::Store)?;
        self.apply_config(config);
        Ok(())
    }

    /// Applies new jumper settings, returning whether anything changed.
    ///
    /// A timing change resets the tick counter and rebuilds the model; a
    /// test-source change swaps the input source. Must only be called while
    /// stopped.
    pub fn apply_straps(&mut self, straps: Straps) -> bool {
        debug_assert!(!self.running, "straps changed while running");
        if straps == self.straps {
            return false;
        }
        if straps.timing != self.straps.timing {
            self.tick = 0;
            self.model = BrightnessModel::new(&self.config, straps.timing);
        }
        if straps.test != self.straps.test {
            self.source = InputSource::new(straps.test);
            self.validator.reset();
        }
        self.driver.reset();
        self.straps = straps;
        true
    }

    /// Records how long a tick took. Implausible samples are counted and
    /// otherwise ignored.
    pub fn record_duration(&mut self, duration_us: u32) {
        if duration_us > self.straps.timing.tick_us() * OUTLIER_FACTOR {
            self.stats.outliers = self.stats.outliers.wrapping_add(1);
            return;
        }
        self.stats.max_duration_us = self.stats.max_duration_us.max(duration_us);
    }

    /// Records a tick that started more than a period late.
    pub fn record_overrun(&mut self) {
        self.stats.overruns = self.stats.overruns.wrapping_add(1);
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn model(&self) -> &BrightnessModel {
        &self.model
    }

    pub fn matrix(&self) -> &LampMatrix {
        &self.matrix
    }

    pub fn straps(&self) -> Straps {
        self.straps
    }

    pub fn tick_count(&self) -> u32 {
        self.tick
    }

    pub fn stats(&self) -> TickStats {
        self.stats
    }

    pub fn frame_stats(&self) -> FrameStats {
        self.validator.stats()
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn input_mut(&mut self) -> &mut I {
        &mut self.input
    }

    pub fn watchdog(&self) -> &W {
        &self.watchdog
    }
}
