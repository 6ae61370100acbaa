//! # Shift Register Buses
//!
//! Two narrow bus interfaces and their bit-banged implementations over
//! `embedded-hal` GPIO pins:
//!
//! - [`ShiftIn`]: a 16-bit parallel-in/serial-out register pair
//!   (74HC165 style) sampling the original column and row lines
//! - [`ShiftOut`]: a 16-bit serial-in/parallel-out register chain
//!   (74HC595 style) driving the LED matrix
//!
//! ## Sequencing
//!
//! ```text
//! shift in:  LOAD low, LOAD high, 16 × (read DATA, CLK high, CLK low)
//! shift out: 16 × (set DATA, CLK high, CLK low), LATCH high, LATCH low, OE low
//! ```
//!
//! Both transfer MSB first. Output enable is active-low, so a frame only
//! reaches the LEDs after it has been fully shifted and latched.
use core::convert::Infallible;

use embedded_hal::digital::{InputPin, OutputPin, PinState};

/// Source of raw 16-bit matrix samples.
pub trait ShiftIn {
    fn shift_in(&mut self) -> u16;
}

/// Sink for 16-bit output frames.
pub trait ShiftOut {
    /// Shifts, latches and enables one frame.
    fn shift_out(&mut self, word: u16);
    /// Blanks the outputs until the next frame is written.
    fn disable(&mut self);
}

fn set<P: OutputPin<Error = Infallible>>(pin: &mut P, state: PinState) {
    let Ok(()) = pin.set_state(state);
}

fn pulse<P: OutputPin<Error = Infallible>>(pin: &mut P) {
    set(pin, PinState::High);
    set(pin, PinState::Low);
}

/// Bit-banged input register pair.
pub struct ShiftRegisterIn<CLK, LOAD, DATA> {
    clk: CLK,
    load: LOAD,
    data: DATA,
}

impl<CLK, LOAD, DATA> ShiftRegisterIn<CLK, LOAD, DATA>
where
    CLK: OutputPin<Error = Infallible>,
    LOAD: OutputPin<Error = Infallible>,
    DATA: InputPin<Error = Infallible>,
{
    /// Takes the pins, parking the clock low and the load line high.
    pub fn new(mut clk: CLK, mut load: LOAD, data: DATA) -> Self {
        set(&mut clk, PinState::Low);
        set(&mut load, PinState::High);
        Self { clk, load, data }
    }

    pub fn release(self) -> (CLK, LOAD, DATA) {
        (self.clk, self.load, self.data)
    }
}

impl<CLK, LOAD, DATA> ShiftIn for ShiftRegisterIn<CLK, LOAD, DATA>
where
    CLK: OutputPin<Error = Infallible>,
    LOAD: OutputPin<Error = Infallible>,
    DATA: InputPin<Error = Infallible>,
{
    fn shift_in(&mut self) -> u16 {
        set(&mut self.load, PinState::Low);
        set(&mut self.load, PinState::High);
        let mut word = 0u16;
        for _ in 0..16 {
            let Ok(high) = self.data.is_high();
            word = word << 1 | high as u16;
            pulse(&mut self.clk);
        }
        word
    }
}

/// Bit-banged output register chain.
pub struct ShiftRegisterOut<CLK, DATA, LATCH, OE> {
    clk: CLK,
    data: DATA,
    latch: LATCH,
    oe: OE,
}

impl<CLK, DATA, LATCH, OE> ShiftRegisterOut<CLK, DATA, LATCH, OE>
where
    CLK: OutputPin<Error = Infallible>,
    DATA: OutputPin<Error = Infallible>,
    LATCH: OutputPin<Error = Infallible>,
    OE: OutputPin<Error = Infallible>,
{
    /// Takes the pins with the outputs blanked.
    pub fn new(mut clk: CLK, mut data: DATA, mut latch: LATCH, mut oe: OE) -> Self {
        set(&mut oe, PinState::High);
        set(&mut clk, PinState::Low);
        set(&mut data, PinState::Low);
        set(&mut latch, PinState::Low);
        Self {
            clk,
            data,
            latch,
            oe,
        }
    }

    pub fn release(self) -> (CLK, DATA, LATCH, OE) {
        (self.clk, self.data, self.latch, self.oe)
    }
}

impl<CLK, DATA, LATCH, OE> ShiftOut for ShiftRegisterOut<CLK, DATA, LATCH, OE>
where
    CLK: OutputPin<Error = Infallible>,
    DATA: OutputPin<Error = Infallible>,
    LATCH: OutputPin<Error = Infallible>,
    OE: OutputPin<Error = Infallible>,
{
    fn shift_out(&mut self, word: u16) {
        for bit in (0..16).rev() {
            set(&mut self.data, PinState::from(word & (1 << bit) != 0));
            pulse(&mut self.clk);
        }
        pulse(&mut self.latch);
        set(&mut self.oe, PinState::Low);
    }

    fn disable(&mut self) {
        set(&mut self.oe, PinState::High);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{FakeInputPin, PinLog};

    #[test]
    fn shift_in_reads_msb_first() {
        let log = PinLog::new();
        let data = FakeInputPin::new(&log, "data", 0xA5_3C);
        let mut bus = ShiftRegisterIn::new(log.pin("clk"), log.pin("load"), data);
        log.clear();

        assert_eq!(bus.shift_in(), 0xA53C);

        let events = log.events();
        assert_eq!(events[0], ("load", false));
        assert_eq!(events[1], ("load", true));
        assert_eq!(events.iter().filter(|e| **e == ("clk", true)).count(), 16);
        assert_eq!(events.last(), Some(&("clk", false)));
    }

    #[test]
    fn shift_in_samples_before_each_clock() {
        let log = PinLog::new();
        let data = FakeInputPin::new(&log, "data", 0x8001);
        let mut bus = ShiftRegisterIn::new(log.pin("clk"), log.pin("load"), data);
        log.clear();
        bus.shift_in();

        let events = log.events();
        assert_eq!(&events[2..5], &[("data", true), ("clk", true), ("clk", false)]);
    }

    #[test]
    fn shift_out_latches_after_full_word() {
        let log = PinLog::new();
        let mut bus =
            ShiftRegisterOut::new(log.pin("clk"), log.pin("data"), log.pin("latch"), log.pin("oe"));
        assert_eq!(log.level("oe"), Some(true));
        log.clear();

        bus.shift_out(0x8103);

        let bits: Vec<bool> = log
            .events()
            .iter()
            .filter(|(name, _)| *name == "data")
            .map(|&(_, level)| level)
            .collect();
        let word = bits.iter().fold(0u16, |word, &bit| word << 1 | bit as u16);
        assert_eq!(bits.len(), 16);
        assert_eq!(word, 0x8103);

        let events = log.events();
        let n = events.len();
        assert_eq!(
            &events[n - 3..],
            &[("latch", true), ("latch", false), ("oe", false)]
        );
        assert!(events[..n - 3].iter().all(|(name, _)| *name != "latch" && *name != "oe"));
    }

    #[test]
    fn disable_blanks_outputs() {
        let log = PinLog::new();
        let mut bus =
            ShiftRegisterOut::new(log.pin("clk"), log.pin("data"), log.pin("latch"), log.pin("oe"));
        bus.shift_out(0xFFFF);
        assert_eq!(log.level("oe"), Some(false));
        bus.disable();
        assert_eq!(log.level("oe"), Some(true));
    }
}
