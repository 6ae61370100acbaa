//! # Serial Configuration Protocol
//!
//! Line protocol spoken with the configuration tool over the serial port.
//! Commands are short ASCII words terminated by `:`.
//!
//! | command | meaning                | reply                                   |
//! |---------|------------------------|-----------------------------------------|
//! | `AGV`   | version poll           | `AGV <firmware> <config version>:`      |
//! | `AGCP`  | configuration poll     | the binary configuration record         |
//! | `AGCD`  | reset to defaults      | `AGCACK:`                               |
//! | `AGCS`  | configuration write    | binary record follows; `AGCACK:` or `AGCNACK:` |
//!
//! This module only parses and formats; the transport lives with the board.
use core::fmt::Write;

use heapless::{String, Vec};

use crate::config::CONFIG_VERSION;
use crate::FIRMWARE_VERSION;

pub const TERMINATOR: u8 = b':';
pub const ACK: &[u8] = b"AGCACK:";
pub const NACK: &[u8] = b"AGCNACK:";

/// Time allowed for a configuration record to arrive after `AGCS:`.
pub const CONFIG_RECEIVE_TIMEOUT_MS: u64 = 1000;

const MAX_COMMAND_LEN: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    VersionPoll,
    ConfigPoll,
    ConfigDefault,
    ConfigSave,
}

impl Command {
    /// Parses one terminator-delimited token, ignoring surrounding
    /// whitespace.
    pub fn parse(token: &[u8]) -> Option<Self> {
        match token.trim_ascii() {
            b"AGV" => Some(Command::VersionPoll),
            b"AGCP" => Some(Command::ConfigPoll),
            b"AGCD" => Some(Command::ConfigDefault),
            b"AGCS" => Some(Command::ConfigSave),
            _ => None,
        }
    }
}

/// Accumulates incoming bytes into commands.
#[derive(Debug, Default)]
pub struct CommandReader {
    buf: Vec<u8, MAX_COMMAND_LEN>,
}

impl CommandReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one byte, returning a command when a terminator completes one.
    /// Unknown input is discarded; overlong input restarts the buffer with
    /// the byte that overflowed it, so a command right after noise is kept.
    pub fn push(&mut self, byte: u8) -> Option<Command> {
        if byte == TERMINATOR {
            let command = Command::parse(&self.buf);
            self.buf.clear();
            return command;
        }
        if self.buf.is_full() {
            self.buf.clear();
        }
        // cannot fail, the buffer has room
        let _ = self.buf.push(byte);
        None
    }
}

/// Reply to a version poll.
pub fn version_reply() -> String<24> {
    let mut reply = String::new();
    // 24 bytes always hold the longest reply
    let _ = write!(reply, "AGV {} {}:", FIRMWARE_VERSION, CONFIG_VERSION);
    reply
}
