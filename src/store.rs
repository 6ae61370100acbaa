//! # Configuration Storage
//!
//! Persists the [`Config`] record in one erasable page of NOR flash. The
//! record validates itself (version tag and checksum), so an erased or
//! corrupted page simply fails to parse and is replaced with the defaults.
use embedded_storage::nor_flash::{NorFlash, ReadNorFlash};

use crate::config::{Config, ConfigError, CONFIG_SIZE};

/// Room for the record padded to any write granularity up to 8 bytes.
const PADDED_SIZE: usize = CONFIG_SIZE.div_ceil(8) * 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError<E> {
    /// The underlying flash failed.
    Flash(E),
    /// The flash write granularity does not fit the record buffer.
    Alignment,
}

/// Byte-level persistence of the configuration record.
pub trait ConfigStore {
    type Error;

    fn load(&mut self) -> Result<[u8; CONFIG_SIZE], Self::Error>;

    fn save(&mut self, bytes: &[u8; CONFIG_SIZE]) -> Result<(), Self::Error>;
}

/// [`ConfigStore`] on a dedicated page of NOR flash.
pub struct FlashStore<F> {
    flash: F,
    offset: u32,
}

impl<F: NorFlash> FlashStore<F> {
    /// `offset` must be the start of an erase page reserved for the record.
    pub fn new(flash: F, offset: u32) -> Self {
        Self { flash, offset }
    }

    pub fn release(self) -> F {
        self.flash
    }
}

impl<F: NorFlash> ConfigStore for FlashStore<F> {
    type Error = StoreError<F::Error>;

    fn load(&mut self) -> Result<[u8; CONFIG_SIZE], Self::Error> {
        let mut bytes = [0u8; CONFIG_SIZE];
        self.flash
            .read(self.offset, &mut bytes)
            .map_err(StoreError::Flash)?;
        Ok(bytes)
    }

    fn save(&mut self, bytes: &[u8; CONFIG_SIZE]) -> Result<(), Self::Error> {
        let len = CONFIG_SIZE.div_ceil(F::WRITE_SIZE) * F::WRITE_SIZE;
        if len > PADDED_SIZE {
            return Err(StoreError::Alignment);
        }
        let mut padded = [0xFF; PADDED_SIZE];
        padded[..CONFIG_SIZE].copy_from_slice(bytes);

        self.flash
            .erase(self.offset, self.offset + F::ERASE_SIZE as u32)
            .map_err(StoreError::Flash)?;
        self.flash
            .write(self.offset, &padded[..len])
            .map_err(StoreError::Flash)
    }
}

/// How the boot configuration was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The stored record was valid.
    Loaded,
    /// The stored record was refused; defaults were applied and persisted.
    Defaulted(ConfigError),
}

/// Loads the stored configuration, replacing an invalid record with the
/// defaults and persisting them right away.
pub fn load_or_default<S: ConfigStore>(store: &mut S) -> Result<(Config, LoadOutcome), S::Error> {
    let bytes = store.load()?;
    match Config::from_bytes(&bytes) {
        Ok(config) => Ok((config, LoadOutcome::Loaded)),
        Err(e) => {
            let config = Config::default();
            store.save(&config.to_bytes())?;
            Ok((config, LoadOutcome::Defaulted(e)))
        }
    }
}
