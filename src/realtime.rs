//! # Realtime Tick Task
//!
//! Runs [`Afterglow::tick`] at the period selected by the timing jumper.
//! The engine is locked only for the duration of one tick; everything else
//! that touches it does so between ticks.
//!
//! Each tick is timed with [`Instant`] and the duration handed back to the
//! engine's statistics. A tick that starts more than one period after its
//! deadline counts as an overrun. When the timing mode changes the ticker
//! is rebuilt for the new period.
use crate::*;

pub struct Realtime<'a> {
    engine: &'a SharedEngine,
    timing: TimingMode,
}

impl<'a> Realtime<'a> {
    fn tick_period(timing: TimingMode) -> Duration {
        Duration::from_micros(timing.tick_us() as u64)
    }

    pub fn new(engine: &'a SharedEngine, timing: TimingMode) -> Self {
        Self { engine, timing }
    }

    pub async fn run(mut self) -> ! {
        let mut period = Self::tick_period(self.timing);
        let mut ticker = Ticker::every(period);
        let mut deadline = Instant::now() + period;
        loop {
            ticker.next().await;

            let start = Instant::now();
            let timing = {
                let mut engine = self.engine.lock().await;
                if start > deadline + period {
                    engine.record_overrun();
                    deadline = start;
                }
                engine.tick();
                let elapsed = Instant::now().duration_since(start).as_micros();
                engine.record_duration(u32::try_from(elapsed).unwrap_or(u32::MAX));
                engine.straps().timing
            };
            deadline += period;

            if timing != self.timing {
                self.timing = timing;
                period = Self::tick_period(timing);
                ticker = Ticker::every(period);
                deadline = Instant::now() + period;
                rprintln!("realtime: tick period {} us", timing.tick_us());
            }
        }
    }
}
