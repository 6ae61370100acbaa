//! # Mode Jumpers
//!
//! Four jumpers select the engine's operating mode. Each shorts its pin to
//! ground when fitted, so a fitted jumper reads low.
use crate::*;

type Jumper = Input<'static, AnyPin>;

pub struct StrapPins {
    timing: Jumper,
    pass_through: Jumper,
    test: Jumper,
    replay: Jumper,
}

impl StrapPins {
    pub fn new(timing: AnyPin, pass_through: AnyPin, test: AnyPin, replay: AnyPin) -> Self {
        let jumper = |p| Input::new(p, Pull::Up);
        Self {
            timing: jumper(timing),
            pass_through: jumper(pass_through),
            test: jumper(test),
            replay: jumper(replay),
        }
    }

    /// Reads the jumpers. The replay jumper only matters in test mode.
    pub fn read(&mut self) -> Straps {
        let timing = if self.timing.is_low() {
            TimingMode::B
        } else {
            TimingMode::A
        };
        let output = if self.pass_through.is_low() {
            OutputMode::PassThrough
        } else {
            OutputMode::Afterglow
        };
        let test = match (self.test.is_low(), self.replay.is_low()) {
            (false, _) => None,
            (true, false) => Some(TestSource::Patterns),
            (true, true) => Some(TestSource::Replay),
        };
        Straps {
            timing,
            output,
            test,
        }
    }
}
