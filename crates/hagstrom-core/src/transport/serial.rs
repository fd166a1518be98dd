//! Serial-port transport for the physical emulator.
//!
//! The emulator's receive buffer holds 16 bytes.  Longer frames are written
//! in [`SerialConfig::chunk_size`] pieces with a pause between pieces so the
//! firmware can drain its buffer; the whole delivery still has to fit inside
//! the caller's timeout.
//!
//! Dropping or closing a [`SerialTransport`] sends
//! [`RELEASE_ALL`](crate::keymap::RELEASE_ALL) so no key stays held on the
//! target machine.

use std::io::{self, Write};
use std::thread;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use serialport::SerialPort;
use tracing::{debug, info, warn};

use crate::keymap::RELEASE_ALL;
use crate::protocol::Frame;

use super::{Connector, Transport, TransportError};

/// Upper bound handed to the port's own write timeout.  A single chunk that
/// stalls this long fails even if the caller allowed more.
const MAX_LINK_TIMEOUT: Duration = Duration::from_secs(60 * 60);

/// Line and pacing settings for the emulator's serial link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerialConfig {
    /// Line speed.  The emulator firmware runs at 19 200 baud.
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    /// Largest number of bytes written in one go.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Pause between chunks of a frame longer than `chunk_size`.
    #[serde(default = "default_chunk_delay_ms")]
    pub chunk_delay_ms: u64,
    /// Pause after each complete frame, outside the write deadline.
    #[serde(default)]
    pub settle_delay_ms: u64,
}

fn default_baud_rate() -> u32 {
    19_200
}

fn default_chunk_size() -> usize {
    16
}

fn default_chunk_delay_ms() -> u64 {
    100
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: default_baud_rate(),
            chunk_size: default_chunk_size(),
            chunk_delay_ms: default_chunk_delay_ms(),
            settle_delay_ms: 0,
        }
    }
}

impl SerialConfig {
    pub fn chunk_delay(&self) -> Duration {
        Duration::from_millis(self.chunk_delay_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

/// A byte sink whose per-write timeout can be adjusted.
///
/// Implemented for serial ports; tests supply an in-memory sink.
pub trait TimedWrite: Write + Send {
    fn set_write_timeout(&mut self, timeout: Duration) -> io::Result<()>;
}

impl TimedWrite for Box<dyn SerialPort> {
    fn set_write_timeout(&mut self, timeout: Duration) -> io::Result<()> {
        self.set_timeout(timeout).map_err(io::Error::from)
    }
}

/// A [`Transport`] writing frames to a serial line.
pub struct SerialTransport<W: TimedWrite = Box<dyn SerialPort>> {
    port_name: String,
    link: W,
    config: SerialConfig,
    closed: bool,
}

impl SerialTransport {
    /// Opens `port` with the given line settings.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Open`] if the port is missing or busy.
    pub fn open(port: &str, config: SerialConfig) -> Result<Self, TransportError> {
        let link = serialport::new(port, config.baud_rate)
            .timeout(Duration::from_millis(10))
            .open()
            .map_err(|source| TransportError::Open {
                port: port.to_string(),
                source,
            })?;
        info!(port, baud = config.baud_rate, "serial port opened");
        Ok(Self::from_link(port, link, config))
    }
}

impl<W: TimedWrite> SerialTransport<W> {
    /// Wraps an already open link.
    pub fn from_link(port_name: impl Into<String>, link: W, config: SerialConfig) -> Self {
        Self {
            port_name: port_name.into(),
            link,
            config,
            closed: false,
        }
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    pub fn config(&self) -> &SerialConfig {
        &self.config
    }

    fn send_release_all(&mut self) -> Result<(), TransportError> {
        self.link.write_all(&[RELEASE_ALL])?;
        self.link.flush()?;
        Ok(())
    }
}

impl<W: TimedWrite> Transport for SerialTransport<W> {
    fn write_frame(&mut self, frame: &Frame, timeout: Duration) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }

        let bytes = frame.as_bytes();
        let total = bytes.len();
        // `None` when the timeout is too large to represent as an instant.
        let deadline = Instant::now().checked_add(timeout);
        let timed_out = |written: usize| TransportError::Timeout {
            timeout,
            written,
            total,
        };

        let chunk_size = self.config.chunk_size.max(1);
        let chunk_count = bytes.chunks(chunk_size).len();
        let mut written = 0;

        for (index, chunk) in bytes.chunks(chunk_size).enumerate() {
            let remaining = match deadline {
                Some(deadline) => deadline
                    .checked_duration_since(Instant::now())
                    .filter(|left| !left.is_zero())
                    .ok_or_else(|| timed_out(written))?,
                None => timeout,
            };

            self.link.set_write_timeout(remaining.min(MAX_LINK_TIMEOUT))?;
            match self.link.write_all(chunk) {
                Ok(()) => written += chunk.len(),
                Err(e) if e.kind() == io::ErrorKind::TimedOut => return Err(timed_out(written)),
                Err(e) => return Err(TransportError::Io(e)),
            }

            if index + 1 < chunk_count {
                let pause = self.config.chunk_delay();
                let resume = Instant::now().checked_add(pause);
                let overruns = match (resume, deadline) {
                    (Some(resume), Some(deadline)) => resume >= deadline,
                    (None, Some(_)) => true,
                    (_, None) => false,
                };
                if overruns {
                    return Err(timed_out(written));
                }
                thread::sleep(pause);
            }
        }

        self.link.flush()?;
        debug!(port = %self.port_name, bytes = total, chunks = chunk_count, "frame written");

        let settle = self.config.settle_delay();
        if !settle.is_zero() {
            thread::sleep(settle);
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), TransportError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.send_release_all()?;
        info!(port = %self.port_name, "serial port closed");
        Ok(())
    }
}

impl<W: TimedWrite> Drop for SerialTransport<W> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(port = %self.port_name, "failed to release held keys: {e}");
        }
    }
}

/// Opens [`SerialTransport`]s with a fixed [`SerialConfig`].
#[derive(Debug, Clone, Default)]
pub struct SerialConnector {
    config: SerialConfig,
}

impl SerialConnector {
    pub fn new(config: SerialConfig) -> Self {
        Self { config }
    }
}

impl Connector for SerialConnector {
    fn open(&self, port: &str) -> Result<Box<dyn Transport>, TransportError> {
        Ok(Box::new(SerialTransport::open(port, self.config.clone())?))
    }
}
