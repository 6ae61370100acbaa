#![allow(dead_code)]

use core::convert::Infallible;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use embedded_hal::digital::{ErrorType, InputPin, OutputPin};
use embedded_storage::nor_flash::{
    ErrorType as FlashErrorType, NorFlash, NorFlashError, NorFlashErrorKind, ReadNorFlash,
};

use crate::bus::{ShiftIn, ShiftOut};
use crate::scheduler::Watchdog;

/// Shared, ordered record of pin activity.
#[derive(Clone, Default)]
pub struct PinLog {
    events: Rc<RefCell<Vec<(&'static str, bool)>>>,
}

impl PinLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pin(&self, name: &'static str) -> FakeOutputPin {
        FakeOutputPin {
            name,
            log: self.clone(),
        }
    }

    pub fn events(&self) -> Vec<(&'static str, bool)> {
        self.events.borrow().clone()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }

    /// Last level written to or read from a pin.
    pub fn level(&self, name: &str) -> Option<bool> {
        self.events
            .borrow()
            .iter()
            .rev()
            .find(|(n, _)| *n == name)
            .map(|&(_, level)| level)
    }

    fn push(&self, name: &'static str, level: bool) {
        self.events.borrow_mut().push((name, level));
    }
}

pub struct FakeOutputPin {
    name: &'static str,
    log: PinLog,
}

impl ErrorType for FakeOutputPin {
    type Error = Infallible;
}

impl OutputPin for FakeOutputPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.log.push(self.name, false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.log.push(self.name, true);
        Ok(())
    }
}

/// Data pin that presents the bits of a word, MSB first, one per read.
pub struct FakeInputPin {
    name: &'static str,
    log: PinLog,
    word: u16,
    bit: u32,
}

impl FakeInputPin {
    pub fn new(log: &PinLog, name: &'static str, word: u16) -> Self {
        Self {
            name,
            log: log.clone(),
            word,
            bit: 0,
        }
    }
}

impl ErrorType for FakeInputPin {
    type Error = Infallible;
}

impl InputPin for FakeInputPin {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        let high = self.word & (0x8000 >> (self.bit % 16)) != 0;
        self.bit += 1;
        self.log.push(self.name, high);
        Ok(high)
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        self.is_high().map(|high| !high)
    }
}

/// Input bus replaying queued samples, repeating the last one when empty.
#[derive(Default)]
pub struct FakeInputBus {
    queue: VecDeque<u16>,
    last: u16,
    pub reads: usize,
}

impl FakeInputBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, word: u16) {
        self.queue.push_back(word);
    }

    pub fn push_repeated(&mut self, word: u16, count: usize) {
        for _ in 0..count {
            self.queue.push_back(word);
        }
    }
}

impl ShiftIn for FakeInputBus {
    fn shift_in(&mut self) -> u16 {
        self.reads += 1;
        if let Some(word) = self.queue.pop_front() {
            self.last = word;
        }
        self.last
    }
}

/// Output bus recording every frame and blanking.
#[derive(Default)]
pub struct FakeOutputBus {
    pub frames: Vec<u16>,
    pub enabled: bool,
    pub disables: usize,
}

impl FakeOutputBus {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ShiftOut for FakeOutputBus {
    fn shift_out(&mut self, word: u16) {
        self.frames.push(word);
        self.enabled = true;
    }

    fn disable(&mut self) {
        self.enabled = false;
        self.disables += 1;
    }
}

#[derive(Default)]
pub struct FakeWatchdog {
    pub armed: bool,
    pub feeds: usize,
}

impl Watchdog for FakeWatchdog {
    fn arm(&mut self) {
        self.armed = true;
    }

    fn disarm(&mut self) {
        self.armed = false;
    }

    fn feed(&mut self) {
        self.feeds += 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeFlashError {
    OutOfBounds,
    Unaligned,
    NotErased,
}

impl NorFlashError for FakeFlashError {
    fn kind(&self) -> NorFlashErrorKind {
        match self {
            FakeFlashError::OutOfBounds => NorFlashErrorKind::OutOfBounds,
            FakeFlashError::Unaligned => NorFlashErrorKind::NotAligned,
            FakeFlashError::NotErased => NorFlashErrorKind::Other,
        }
    }
}

pub const FAKE_PAGE_SIZE: usize = 4096;

/// Two pages of NOR flash in RAM, enforcing erase-before-write.
pub struct FakeFlash {
    pub data: [u8; 2 * FAKE_PAGE_SIZE],
    pub erases: usize,
    pub fail_writes: bool,
}

impl FakeFlash {
    pub fn new() -> Self {
        Self {
            data: [0xFF; 2 * FAKE_PAGE_SIZE],
            erases: 0,
            fail_writes: false,
        }
    }

    pub fn with_contents(offset: usize, bytes: &[u8]) -> Self {
        let mut flash = Self::new();
        flash.data[offset..offset + bytes.len()].copy_from_slice(bytes);
        flash
    }
}

impl FlashErrorType for FakeFlash {
    type Error = FakeFlashError;
}

impl ReadNorFlash for FakeFlash {
    const READ_SIZE: usize = 1;

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), FakeFlashError> {
        let start = offset as usize;
        let end = start + bytes.len();
        if end > self.data.len() {
            return Err(FakeFlashError::OutOfBounds);
        }
        bytes.copy_from_slice(&self.data[start..end]);
        Ok(())
    }

    fn capacity(&self) -> usize {
        self.data.len()
    }
}

impl NorFlash for FakeFlash {
    const WRITE_SIZE: usize = 4;
    const ERASE_SIZE: usize = FAKE_PAGE_SIZE;

    fn erase(&mut self, from: u32, to: u32) -> Result<(), FakeFlashError> {
        let (from, to) = (from as usize, to as usize);
        if from % FAKE_PAGE_SIZE != 0 || to % FAKE_PAGE_SIZE != 0 {
            return Err(FakeFlashError::Unaligned);
        }
        if to > self.data.len() {
            return Err(FakeFlashError::OutOfBounds);
        }
        self.data[from..to].fill(0xFF);
        self.erases += 1;
        Ok(())
    }

    fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), FakeFlashError> {
        let start = offset as usize;
        if start % Self::WRITE_SIZE != 0 || bytes.len() % Self::WRITE_SIZE != 0 {
            return Err(FakeFlashError::Unaligned);
        }
        let end = start + bytes.len();
        if self.fail_writes || end > self.data.len() {
            return Err(FakeFlashError::OutOfBounds);
        }
        if self.data[start..end].iter().any(|&b| b != 0xFF) {
            return Err(FakeFlashError::NotErased);
        }
        self.data[start..end].copy_from_slice(bytes);
        Ok(())
    }
}
