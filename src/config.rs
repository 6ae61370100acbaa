//! # Configuration Record
//!
//! Per-lamp glow duration and maximum brightness, plus the version tag and
//! checksum that guard the record in flash and on the serial link.
//!
//! ## Layout
//!
//! ```text
//! offset  size  field
//!      0     2  version (u16, little-endian)
//!      2     2  reserved (u16, kept verbatim)
//!      4    64  glow duration codes [column][row], unit GLOW_DURATION_SCALE_MS
//!     68    64  brightness codes [column][row], 0-7
//!    132     4  CRC-32 over bytes 0..132 (u32, little-endian)
//! ```
use crate::{NUM_COLS, NUM_ROWS};

/// Version tag expected in a stored or received record.
pub const CONFIG_VERSION: u16 = 1;
/// Size of the serialized record in bytes.
pub const CONFIG_SIZE: usize = 4 + 2 * NUM_COLS * NUM_ROWS + 4;
/// Milliseconds represented by one glow duration code step.
pub const GLOW_DURATION_SCALE_MS: u32 = 10;
/// Glow duration code used for every lamp by default (140 ms).
pub const DEFAULT_GLOW_CODE: u8 = 14;
/// Highest meaningful brightness code.
pub const MAX_BRIGHTNESS_CODE: u8 = 7;
/// Brightness code used for every lamp by default.
pub const DEFAULT_BRIGHTNESS: u8 = MAX_BRIGHTNESS_CODE;

const GLOW_OFFSET: usize = 4;
const BRIGHTNESS_OFFSET: usize = GLOW_OFFSET + NUM_COLS * NUM_ROWS;
const CRC_OFFSET: usize = BRIGHTNESS_OFFSET + NUM_COLS * NUM_ROWS;

/// Reasons a serialized record is refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Fewer or more bytes than [`CONFIG_SIZE`].
    Length(usize),
    /// Version tag does not match [`CONFIG_VERSION`].
    Version(u16),
    /// Stored checksum does not match the record contents.
    Checksum { expected: u32, found: u32 },
}

/// Afterglow configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub version: u16,
    pub reserved: u16,
    /// Glow duration codes, indexed `[column][row]`.
    pub glow_duration: [[u8; NUM_ROWS]; NUM_COLS],
    /// Maximum brightness codes, indexed `[column][row]`.
    pub brightness: [[u8; NUM_ROWS]; NUM_COLS],
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            reserved: 0,
            glow_duration: [[DEFAULT_GLOW_CODE; NUM_ROWS]; NUM_COLS],
            brightness: [[DEFAULT_BRIGHTNESS; NUM_ROWS]; NUM_COLS],
        }
    }
}

impl Config {
    /// Glow duration of one lamp in milliseconds.
    pub fn glow_duration_ms(&self, col: usize, row: usize) -> u32 {
        self.glow_duration[col][row] as u32 * GLOW_DURATION_SCALE_MS
    }

    /// Serializes the record, sealing it with a fresh checksum.
    pub fn to_bytes(&self) -> [u8; CONFIG_SIZE] {
        let mut bytes = [0u8; CONFIG_SIZE];
        bytes[0..2].copy_from_slice(&self.version.to_le_bytes());
        bytes[2..4].copy_from_slice(&self.reserved.to_le_bytes());
        let lamps = self.glow_duration.iter().zip(self.brightness.iter());
        for (col, (glow, brightness)) in lamps.enumerate() {
            let at = col * NUM_ROWS;
            bytes[GLOW_OFFSET + at..GLOW_OFFSET + at + NUM_ROWS].copy_from_slice(glow);
            bytes[BRIGHTNESS_OFFSET + at..BRIGHTNESS_OFFSET + at + NUM_ROWS]
                .copy_from_slice(brightness);
        }
        let crc = crc32(&bytes[..CRC_OFFSET]);
        bytes[CRC_OFFSET..].copy_from_slice(&crc.to_le_bytes());
        bytes
    }

    /// Parses and validates a serialized record.
    ///
    /// The checksum is verified before the version so that a corrupted
    /// version field is reported as corruption.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ConfigError> {
        if bytes.len() != CONFIG_SIZE {
            return Err(ConfigError::Length(bytes.len()));
        }
        let found = u32::from_le_bytes([
            bytes[CRC_OFFSET],
            bytes[CRC_OFFSET + 1],
            bytes[CRC_OFFSET + 2],
            bytes[CRC_OFFSET + 3],
        ]);
        let expected = crc32(&bytes[..CRC_OFFSET]);
        if found != expected {
            return Err(ConfigError::Checksum { expected, found });
        }
        let version = u16::from_le_bytes([bytes[0], bytes[1]]);
        if version != CONFIG_VERSION {
            return Err(ConfigError::Version(version));
        }

        let mut config = Config {
            version,
            reserved: u16::from_le_bytes([bytes[2], bytes[3]]),
            glow_duration: [[0; NUM_ROWS]; NUM_COLS],
            brightness: [[0; NUM_ROWS]; NUM_COLS],
        };
        for col in 0..NUM_COLS {
            let at = col * NUM_ROWS;
            config.glow_duration[col]
                .copy_from_slice(&bytes[GLOW_OFFSET + at..GLOW_OFFSET + at + NUM_ROWS]);
            config.brightness[col]
                .copy_from_slice(&bytes[BRIGHTNESS_OFFSET + at..BRIGHTNESS_OFFSET + at + NUM_ROWS]);
        }
        Ok(config)
    }

    /// Checksum the record carries when serialized.
    pub fn checksum(&self) -> u32 {
        crc32(&self.to_bytes()[..CRC_OFFSET])
    }
}

/// CRC-32 (IEEE 802.3, reflected), bitwise.
pub fn crc32(data: &[u8]) -> u32 {
    let mut crc: u32 = 0xFFFF_FFFF;
    for &b in data {
        crc ^= b as u32;
        for _ in 0..8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ 0xEDB8_8320;
            } else {
                crc >>= 1;
            }
        }
    }
    crc ^ 0xFFFF_FFFF
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crc32_check_value() {
        assert_eq!(crc32(b"123456789"), 0xCBF4_3926);
        assert_eq!(crc32(&[]), 0);
    }

    #[test]
    fn default_record() {
        let config = Config::default();
        assert_eq!(config.version, CONFIG_VERSION);
        assert!(config.glow_duration.iter().flatten().all(|&g| g == DEFAULT_GLOW_CODE));
        assert!(config.brightness.iter().flatten().all(|&b| b == DEFAULT_BRIGHTNESS));
        assert_eq!(config.glow_duration_ms(3, 5), 140);
    }

    #[test]
    fn layout_test() {
        let mut config = Config::default();
        config.reserved = 0xBEEF;
        config.glow_duration[1][2] = 0x42;
        config.brightness[7][7] = 3;
        let bytes = config.to_bytes();

        assert_eq!(bytes.len(), 136);
        assert_eq!(&bytes[0..4], &[0x01, 0x00, 0xEF, 0xBE]);
        assert_eq!(bytes[GLOW_OFFSET + NUM_ROWS + 2], 0x42);
        assert_eq!(bytes[BRIGHTNESS_OFFSET - 1], DEFAULT_GLOW_CODE);
        assert_eq!(bytes[CRC_OFFSET - 1], 3);
        assert_eq!(&bytes[CRC_OFFSET..], &crc32(&bytes[..CRC_OFFSET]).to_le_bytes());
        assert_eq!(config.checksum(), crc32(&bytes[..CRC_OFFSET]));
    }

    #[test]
    fn parse_keeps_every_byte() {
        let mut config = Config::default();
        config.reserved = 7;
        for (i, lamp) in config.brightness.iter_mut().flatten().enumerate() {
            *lamp = (i % 11) as u8;
        }
        config.glow_duration[0][0] = 0;
        config.glow_duration[4][6] = 255;
        let bytes = config.to_bytes();

        let parsed = Config::from_bytes(&bytes).unwrap();
        assert_eq!(parsed, config);
        assert_eq!(parsed.to_bytes(), bytes);
    }

    #[test]
    fn short_record_rejected() {
        let bytes = Config::default().to_bytes();
        assert_eq!(
            Config::from_bytes(&bytes[..CONFIG_SIZE - 1]),
            Err(ConfigError::Length(CONFIG_SIZE - 1))
        );
    }

    #[test]
    fn corrupted_record_rejected() {
        let mut bytes = Config::default().to_bytes();
        bytes[GLOW_OFFSET + 10] ^= 0x01;
        assert!(matches!(
            Config::from_bytes(&bytes),
            Err(ConfigError::Checksum { .. })
        ));
    }

    #[test]
    fn version_mismatch_rejected() {
        let mut config = Config::default();
        config.version = 2;
        let bytes = config.to_bytes();
        assert_eq!(Config::from_bytes(&bytes), Err(ConfigError::Version(2)));
    }
}
