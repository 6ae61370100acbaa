//! # Front Panel
//!
//! Background loop polling the mode jumpers and button A.
//!
//! - A jumper change stops the engine, applies the new [`Straps`] and
//!   restarts it
//! - Button A prints the statistics immediately; they are also printed
//!   every few seconds
use crate::*;

/// Jumper polling interval.
const POLL_MS: u64 = 10;
/// Polls between statistics lines, five seconds.
const SHOW_EVERY: u32 = 500;

pub struct Panel<'a> {
    engine: &'a SharedEngine,
    pins: StrapPins,
    straps: Straps,
    button_a: Button,
    button_was_down: bool,
}

impl<'a> Panel<'a> {
    pub fn new(engine: &'a SharedEngine, pins: StrapPins, straps: Straps, button_a: Button) -> Self {
        Self {
            engine,
            pins,
            straps,
            button_a,
            button_was_down: false,
        }
    }

    /// Prints one statistics line to the debug console.
    ///
    /// ```text
    /// tick 1280000 max 41us late 0 artifacts 0 | accepted 160000 bad 3 order 0
    /// ```
    async fn show(&self) {
        let engine = self.engine.lock().await;
        let stats = engine.stats();
        let frames = engine.frame_stats();
        rprintln!(
            "tick {} max {}us late {} artifacts {} | accepted {} bad {} order {}",
            engine.tick_count(),
            stats.max_duration_us,
            stats.overruns,
            stats.outliers,
            frames.accepted,
            frames.bad_columns,
            frames.out_of_order,
        );
    }

    async fn apply_straps(&mut self, straps: Straps) {
        let _control = CONTROL.lock().await;
        let mut engine = self.engine.lock().await;
        engine.stop();
        engine.apply_straps(straps);
        engine.start();
        self.straps = straps;
        rprintln!("straps: {:?}", straps);
    }

    pub async fn run(&mut self) -> ! {
        let mut polls = 0;
        loop {
            let straps = self.pins.read();
            if straps != self.straps {
                self.apply_straps(straps).await;
            }

            let button_down = self.button_a.is_low();
            if button_down && !self.button_was_down {
                self.show().await;
            }
            self.button_was_down = button_down;

            polls += 1;
            if polls >= SHOW_EVERY {
                polls = 0;
                self.show().await;
            }
            Timer::after_millis(POLL_MS).await;
        }
    }
}
