//! # Afterglow Firmware
//!
//! micro:bit v2 firmware sitting between a pinball machine's lamp matrix and
//! a bank of LEDs. The hardware-independent engine lives in the `afterglow`
//! library; this binary wires it to the board.
//!
//! ## Wiring
//!
//! | edge pin | signal                                  |
//! |----------|-----------------------------------------|
//! | P13      | input register clock                    |
//! | P12      | input register load (active-low)        |
//! | P14      | input register serial data              |
//! | P15      | output register clock                   |
//! | P16      | output register serial data             |
//! | P8       | output register latch                   |
//! | P9       | output enable (active-low)              |
//! | P0       | jumper: timing mode B when closed       |
//! | P1       | jumper: pass-through when closed        |
//! | P2       | jumper: test mode when closed           |
//! | P20      | jumper: replay instead of patterns      |
//!
//! Jumpers short the pin to ground; the pins are pulled up internally.
//! The configuration tool talks over the USB serial port at 115200 baud.
//!
//! ## Tasks
//!
//! Three futures are joined on the thread executor:
//! - [`Realtime`]: fixed-period engine tick
//! - [`Console`]: serial configuration protocol
//! - [`Panel`]: jumper polling, button A and periodic statistics
#![no_std]
#![no_main]

mod console;
mod panel;
mod realtime;
mod straps;
mod watchdog;

pub use console::*;
pub use panel::*;
pub use realtime::*;
pub use straps::*;
pub use watchdog::*;

use panic_rtt_target as _;
use rtt_target::{rprintln, rtt_init_print};

use afterglow::{
    bus::{ShiftRegisterIn, ShiftRegisterOut},
    config::Config,
    protocol::{self, Command, CommandReader},
    scheduler::{Straps, Watchdog},
    store::{self, FlashStore, LoadOutcome},
    Afterglow, CONFIG_SIZE, OutputMode, TestSource, TimingMode, FIRMWARE_VERSION,
};
use embassy_executor::Spawner;
use embassy_futures::join;
use embassy_sync::{blocking_mutex::raw::ThreadModeRawMutex, mutex::Mutex};
use embassy_time::{with_timeout, Duration, Instant, Ticker, Timer};
use microbit_bsp::{
    embassy_nrf::{
        bind_interrupts,
        gpio::{AnyPin, Input, Level, Output, OutputDrive, Pull},
        nvmc::Nvmc,
        peripherals, uarte, wdt,
    },
    Button, Microbit,
};

/// Start of the flash page holding the configuration record. The linker
/// script keeps the program out of this last page.
const CONFIG_FLASH_OFFSET: u32 = 0x7_F000;

pub type Pin = Output<'static, AnyPin>;
pub type InputBus = ShiftRegisterIn<Pin, Pin, Input<'static, AnyPin>>;
pub type OutputBus = ShiftRegisterOut<Pin, Pin, Pin, Pin>;
pub type Engine = Afterglow<InputBus, OutputBus, NrfWatchdog>;
pub type SharedEngine = Mutex<ThreadModeRawMutex, Engine>;
pub type ConfigFlash = FlashStore<Nvmc<'static>>;

/// Held across every stop/reconfigure/start sequence, so the console and
/// the jumper poller never interleave theirs.
pub static CONTROL: Mutex<ThreadModeRawMutex, ()> = Mutex::new(());

bind_interrupts!(struct Irqs {
    UARTE0_UART0 => uarte::InterruptHandler<peripherals::UARTE0>;
});

#[embassy_executor::main]
async fn main(_spawner: Spawner) -> ! {
    rtt_init_print!();
    rprintln!("afterglow {}", FIRMWARE_VERSION);
    let board = Microbit::default();

    let out_pin = |p, level| Output::new(p, level, OutputDrive::Standard);
    let input = ShiftRegisterIn::new(
        out_pin(AnyPin::from(board.p13), Level::Low),
        out_pin(AnyPin::from(board.p12), Level::High),
        Input::new(AnyPin::from(board.p14), Pull::None),
    );
    let output = ShiftRegisterOut::new(
        out_pin(AnyPin::from(board.p15), Level::Low),
        out_pin(AnyPin::from(board.p16), Level::Low),
        out_pin(AnyPin::from(board.p8), Level::Low),
        out_pin(AnyPin::from(board.p9), Level::High),
    );

    let mut straps = StrapPins::new(
        AnyPin::from(board.p0),
        AnyPin::from(board.p1),
        AnyPin::from(board.p2),
        AnyPin::from(board.p20),
    );
    let initial = straps.read();
    rprintln!("straps: {:?}", initial);

    // SAFETY: the board support crate does not hand out the NVMC, WDT or
    // the USB serial pins; nothing else in this firmware touches them.
    let (nvmc, wdt, uart_tx, uart_rx) = unsafe {
        (
            peripherals::NVMC::steal(),
            peripherals::WDT::steal(),
            peripherals::P0_06::steal(),
            peripherals::P1_08::steal(),
        )
    };

    let mut flash = FlashStore::new(Nvmc::new(nvmc), CONFIG_FLASH_OFFSET);
    let config = match store::load_or_default(&mut flash) {
        Ok((config, LoadOutcome::Loaded)) => {
            rprintln!("config: loaded");
            config
        }
        Ok((config, LoadOutcome::Defaulted(e))) => {
            rprintln!("config: stored record refused ({:?}), defaults saved", e);
            config
        }
        Err(e) => {
            rprintln!("config: flash error {:?}, running on defaults", e);
            Config::default()
        }
    };

    let mut engine = Afterglow::new(input, output, NrfWatchdog::new(wdt), config, initial);
    engine.start();
    let engine: SharedEngine = Mutex::new(engine);

    let mut uart_config = uarte::Config::default();
    uart_config.baudrate = uarte::Baudrate::BAUD115200;
    let uart = uarte::Uarte::new(board.uarte0, Irqs, uart_rx, uart_tx, uart_config);
    let (tx, rx) = uart.split();

    let realtime = Realtime::new(&engine, initial.timing);
    let mut console = Console::new(&engine, flash, tx, rx);
    let mut panel = Panel::new(&engine, straps, initial, board.btn_a);

    join::join3(realtime.run(), console.run(), panel.run()).await;

    panic!("fell off end of main loop");
}
