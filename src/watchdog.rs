//! # Hardware Watchdog
//!
//! The nRF52 WDT cannot be paused or reconfigured once running, so it is
//! left off until the engine is first armed. After that every tick feeds
//! it, including the idle ticks while the engine is stopped.
use crate::*;

/// Timeout in 32.768 kHz ticks, about 200 ms.
const WATCHDOG_TIMEOUT_TICKS: u32 = 6553;

pub struct NrfWatchdog {
    wdt: Option<peripherals::WDT>,
    handle: Option<wdt::WatchdogHandle>,
}

impl NrfWatchdog {
    pub fn new(wdt: peripherals::WDT) -> Self {
        Self {
            wdt: Some(wdt),
            handle: None,
        }
    }

    fn start(&mut self) {
        let Some(wdt) = self.wdt.take() else {
            return;
        };
        let mut config = wdt::Config::default();
        config.timeout_ticks = WATCHDOG_TIMEOUT_TICKS;
        config.run_during_debug_halt = false;
        match wdt::Watchdog::try_new::<1>(wdt, config) {
            Ok((_, [handle])) => {
                rprintln!("watchdog: started");
                self.handle = Some(handle);
            }
            Err(_) => {
                // Still running from before a soft reset, with whatever
                // timeout it had then.
                rprintln!("watchdog: already running, adopting it");
                // SAFETY: this is the only handle in use, and the WDT was
                // started by this firmware with a single reload register.
                self.handle = Some(unsafe { wdt::WatchdogHandle::steal(0) });
            }
        }
    }
}

impl Watchdog for NrfWatchdog {
    fn arm(&mut self) {
        if self.handle.is_none() {
            self.start();
        }
    }

    fn disarm(&mut self) {}

    fn feed(&mut self) {
        if let Some(handle) = self.handle.as_mut() {
            handle.pet();
        }
    }
}
