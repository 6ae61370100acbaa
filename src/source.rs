//! # Input Sources
//!
//! Where a tick's column/row sample comes from. Normally that is the input
//! shift register wired to the original machine; in test mode it is a
//! synthetic generator that scans a virtual lamp state the way the original
//! machine would (one column every [`ORIG_COLUMN_PERIOD_US`], rows
//! active-low), so the rest of the pipeline cannot tell the difference.
//!
//! - [`PatternGenerator`]: seven fixed test patterns, eight seconds each
//! - [`ReplayPlayer`]: plays back a recorded table of lamp events
use crate::bus::ShiftIn;
use crate::model::TimingMode;
use crate::validator::Sample;
use crate::{NUM_COLS, NUM_ROWS, ORIG_COLUMN_PERIOD_US};

/// Duration of each test pattern.
pub const PATTERN_DURATION_MS: u32 = 8000;

/// Most replay events applied within a single tick.
const MAX_EVENTS_PER_TICK: usize = 8;

/// Synthetic input selected by the test jumpers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestSource {
    Patterns,
    Replay,
}

/// Scans an on-mask per column into a sample for the current tick.
fn scan(tick: u32, mode: TimingMode, lamps: &[u8; NUM_COLS]) -> Sample {
    let ticks_per_col = ORIG_COLUMN_PERIOD_US / mode.tick_us();
    let col = (tick / ticks_per_col) as usize % NUM_COLS;
    Sample::new(1 << col, !lamps[col])
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    SweepColumns,
    SweepRows,
    InverseSweepColumns,
    InverseSweepRows,
    Blink,
    Alternate,
    SingleLamp,
}

impl Pattern {
    pub const ALL: [Pattern; 7] = [
        Pattern::SweepColumns,
        Pattern::SweepRows,
        Pattern::InverseSweepColumns,
        Pattern::InverseSweepRows,
        Pattern::Blink,
        Pattern::Alternate,
        Pattern::SingleLamp,
    ];

    fn step_ms(self) -> u32 {
        match self {
            Pattern::Blink | Pattern::Alternate => 500,
            Pattern::SingleLamp => PATTERN_DURATION_MS / (NUM_COLS * NUM_ROWS) as u32,
            _ => 250,
        }
    }

    /// Lit rows of `col` at `ms` into the pattern.
    pub fn lamps(self, col: usize, ms: u32) -> u8 {
        let step = ms / self.step_ms();
        let pos = step as usize % NUM_COLS;
        match self {
            Pattern::SweepColumns => {
                if col == pos {
                    0xFF
                } else {
                    0x00
                }
            }
            Pattern::SweepRows => 1 << pos,
            Pattern::InverseSweepColumns => !Pattern::SweepColumns.lamps(col, ms),
            Pattern::InverseSweepRows => !Pattern::SweepRows.lamps(col, ms),
            Pattern::Blink => {
                if step % 2 == 0 {
                    0xFF
                } else {
                    0x00
                }
            }
            Pattern::Alternate => {
                if (col + step as usize) % 2 == 0 {
                    0x55
                } else {
                    0xAA
                }
            }
            Pattern::SingleLamp => {
                let lamp = step as usize % (NUM_COLS * NUM_ROWS);
                if lamp / NUM_ROWS == col {
                    1 << (lamp % NUM_ROWS)
                } else {
                    0x00
                }
            }
        }
    }
}

/// Cycles through every [`Pattern`] on a fixed schedule.
#[derive(Debug, Clone, Default)]
pub struct PatternGenerator;

impl PatternGenerator {
    /// Pattern active at `ms`, and the time into it.
    pub fn pattern_at(ms: u32) -> (Pattern, u32) {
        let index = (ms / PATTERN_DURATION_MS) as usize % Pattern::ALL.len();
        (Pattern::ALL[index], ms % PATTERN_DURATION_MS)
    }

    pub fn sample(&self, tick: u32, mode: TimingMode) -> Sample {
        let ms = tick / mode.ticks_per_ms();
        let (pattern, into) = Self::pattern_at(ms);
        let mut lamps = [0u8; NUM_COLS];
        for (col, lit) in lamps.iter_mut().enumerate() {
            *lit = pattern.lamps(col, into);
        }
        scan(tick, mode, &lamps)
    }
}

/// One recorded lamp change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayEvent {
    /// Time since the previous event. For the first event of a table this
    /// is the pause after the last event before playback loops.
    pub delay_ms: u16,
    /// Lamp index, `column * 8 + row`.
    pub lamp: u8,
    pub on: bool,
}

const fn ev(delay_ms: u16, lamp: u8, on: bool) -> ReplayEvent {
    ReplayEvent { delay_ms, lamp, on }
}

/// Short attract-mode style recording: a chase across the playfield, a
/// flash of the bottom row and a slow fade-out.
pub static DEMO_REPLAY: [ReplayEvent; 36] = [
    ev(0, 0, true),
    ev(120, 9, true),
    ev(0, 0, false),
    ev(120, 18, true),
    ev(0, 9, false),
    ev(120, 27, true),
    ev(0, 18, false),
    ev(120, 36, true),
    ev(0, 27, false),
    ev(120, 45, true),
    ev(0, 36, false),
    ev(120, 54, true),
    ev(0, 45, false),
    ev(120, 63, true),
    ev(0, 54, false),
    ev(120, 63, false),
    ev(300, 7, true),
    ev(0, 15, true),
    ev(0, 23, true),
    ev(0, 31, true),
    ev(0, 39, true),
    ev(0, 47, true),
    ev(0, 55, true),
    ev(0, 63, true),
    ev(400, 7, false),
    ev(150, 15, false),
    ev(150, 23, false),
    ev(150, 31, false),
    ev(150, 39, false),
    ev(150, 47, false),
    ev(150, 55, false),
    ev(150, 63, false),
    ev(500, 32, true),
    ev(0, 33, true),
    ev(800, 32, false),
    ev(0, 33, false),
];

/// Plays a recorded event table into a virtual lamp state, looping.
///
/// The first event fires on the first tick; its delay only separates the
/// end of one pass from the start of the next.
#[derive(Debug, Clone)]
pub struct ReplayPlayer {
    events: &'static [ReplayEvent],
    next: usize,
    wait: u32,
    lamps: [u8; NUM_COLS],
}

impl Default for ReplayPlayer {
    fn default() -> Self {
        Self::new(&DEMO_REPLAY)
    }
}

impl ReplayPlayer {
    pub fn new(events: &'static [ReplayEvent]) -> Self {
        Self {
            events,
            next: 0,
            wait: 0,
            lamps: [0; NUM_COLS],
        }
    }

    /// Advances playback by one tick.
    fn advance(&mut self, mode: TimingMode) {
        if self.wait > 0 {
            self.wait -= 1;
            return;
        }
        for _ in 0..MAX_EVENTS_PER_TICK {
            let Some(event) = self.events.get(self.next) else {
                return;
            };
            let col = event.lamp as usize / NUM_ROWS % NUM_COLS;
            let bit = 1 << (event.lamp as usize % NUM_ROWS);
            if event.on {
                self.lamps[col] |= bit;
            } else {
                self.lamps[col] &= !bit;
            }
            self.next += 1;
            if self.next == self.events.len() {
                self.next = 0;
            }
            let delay = self.events[self.next].delay_ms as u32 * mode.ticks_per_ms();
            if delay > 0 {
                self.wait = delay - 1;
                return;
            }
        }
    }

    pub fn sample(&mut self, tick: u32, mode: TimingMode) -> Sample {
        self.advance(mode);
        scan(tick, mode, &self.lamps)
    }

    /// Lit rows per column.
    pub fn lamps(&self) -> &[u8; NUM_COLS] {
        &self.lamps
    }
}

/// Per-tick sample strategy.
#[derive(Debug, Clone, Default)]
pub enum InputSource {
    #[default]
    Matrix,
    Patterns(PatternGenerator),
    Replay(ReplayPlayer),
}

impl InputSource {
    pub fn new(test: Option<TestSource>) -> Self {
        match test {
            None => InputSource::Matrix,
            Some(TestSource::Patterns) => InputSource::Patterns(PatternGenerator),
            Some(TestSource::Replay) => InputSource::Replay(ReplayPlayer::default()),
        }
    }

    pub fn sample<I: ShiftIn>(&mut self, bus: &mut I, tick: u32, mode: TimingMode) -> Sample {
        match self {
            InputSource::Matrix => Sample::from_word(bus.shift_in()),
            InputSource::Patterns(generator) => generator.sample(tick, mode),
            InputSource::Replay(player) => player.sample(tick, mode),
        }
    }
}
