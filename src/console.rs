//! # Serial Console
//!
//! Serves the configuration tool over the UARTE. Bytes are fed one at a
//! time into a [`CommandReader`]; each complete command is handled before
//! the next byte is read.
//!
//! ## Configuration Changes
//!
//! `AGCD` and `AGCS` both follow the same sequence under [`CONTROL`]:
//!
//! 1. Stop the engine (outputs blanked, tick keeps feeding the watchdog)
//! 2. Obtain the new record (defaults, or 136 bytes within one second)
//! 3. Hand it to [`Afterglow::finish_update`], which persists it, applies
//!    it and restarts the engine
//!
//! The engine lock is never held across a UART transfer.
use crate::*;

pub type UartTx = uarte::UarteTx<'static, peripherals::UARTE0>;
pub type UartRx = uarte::UarteRx<'static, peripherals::UARTE0>;

pub struct Console<'a> {
    engine: &'a SharedEngine,
    flash: ConfigFlash,
    tx: UartTx,
    rx: UartRx,
    reader: CommandReader,
}

impl<'a> Console<'a> {
    pub fn new(engine: &'a SharedEngine, flash: ConfigFlash, tx: UartTx, rx: UartRx) -> Self {
        Self {
            engine,
            flash,
            tx,
            rx,
            reader: CommandReader::new(),
        }
    }

    async fn send(&mut self, bytes: &[u8]) {
        if let Err(e) = self.tx.write(bytes).await {
            rprintln!("console: write failed: {:?}", e);
        }
    }

    async fn stop_engine(&self) {
        self.engine.lock().await.stop();
    }

    /// Receives a configuration record, `None` on timeout or a UART error.
    async fn receive_record(&mut self) -> Option<[u8; CONFIG_SIZE]> {
        let mut record = [0u8; CONFIG_SIZE];
        let timeout = Duration::from_millis(protocol::CONFIG_RECEIVE_TIMEOUT_MS);
        match with_timeout(timeout, self.rx.read(&mut record)).await {
            Ok(Ok(())) => Some(record),
            Ok(Err(e)) => {
                rprintln!("console: receive failed: {:?}", e);
                None
            }
            Err(_) => {
                rprintln!("console: receive timed out");
                None
            }
        }
    }

    /// Finishes an update on the stopped engine and answers the tool.
    async fn finish_update(&mut self, record: Option<&[u8]>) {
        let result = self.engine.lock().await.finish_update(&mut self.flash, record);
        match result {
            Ok(()) => {
                rprintln!("console: config applied");
                self.send(protocol::ACK).await;
            }
            Err(e) => {
                rprintln!("console: update refused: {:?}", e);
                self.send(protocol::NACK).await;
            }
        }
    }

    async fn config_default(&mut self) {
        let _control = CONTROL.lock().await;
        self.stop_engine().await;
        self.finish_update(Some(&Config::default().to_bytes())).await;
    }

    async fn config_save(&mut self) {
        let _control = CONTROL.lock().await;
        self.stop_engine().await;
        let record = self.receive_record().await;
        self.finish_update(record.as_ref().map(|r| &r[..])).await;
    }

    async fn handle(&mut self, command: Command) {
        rprintln!("console: {:?}", command);
        match command {
            Command::VersionPoll => {
                let reply = protocol::version_reply();
                self.send(reply.as_bytes()).await;
            }
            Command::ConfigPoll => {
                let record = self.engine.lock().await.config().to_bytes();
                self.send(&record).await;
            }
            Command::ConfigDefault => self.config_default().await,
            Command::ConfigSave => self.config_save().await,
        }
    }

    pub async fn run(&mut self) -> ! {
        let mut byte = [0u8; 1];
        loop {
            match self.rx.read(&mut byte).await {
                Ok(()) => {
                    if let Some(command) = self.reader.push(byte[0]) {
                        self.handle(command).await;
                    }
                }
                Err(e) => rprintln!("console: read failed: {:?}", e),
            }
        }
    }
}
