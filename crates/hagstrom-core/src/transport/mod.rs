//! The byte pipe between the driver and the emulator device.
//!
//! A [`Transport`] owns one open connection and delivers whole frames within
//! a caller-supplied deadline.  A [`Connector`] opens transports by port name;
//! [`crate::device::DeviceHandle::initialize`] goes through a connector so
//! tests can substitute an in-memory device.
//!
//! Implementations:
//!
//! - [`serial::SerialTransport`] / [`serial::SerialConnector`] – the real
//!   device on a serial port.
//! - [`mock::RecordingTransport`] / [`mock::MockConnector`] – record every
//!   byte in memory for assertions.

pub mod mock;
pub mod serial;

use std::time::Duration;

use thiserror::Error;

use crate::protocol::Frame;

pub use serial::{SerialConfig, SerialConnector, SerialTransport};

/// Errors raised by transports and connectors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The named port could not be opened.
    #[error("could not open serial port {port}: {source}")]
    Open {
        port: String,
        #[source]
        source: serialport::Error,
    },

    /// The frame was not fully delivered before the deadline.
    #[error("write timed out after {timeout:?} ({written} of {total} bytes sent)")]
    Timeout {
        timeout: Duration,
        written: usize,
        total: usize,
    },

    /// The connection failed mid-write.
    #[error("I/O error on serial link: {0}")]
    Io(#[from] std::io::Error),

    /// The transport was already closed.
    #[error("transport is closed")]
    Closed,
}

impl TransportError {
    /// Returns `true` for the deadline-exceeded outcome.
    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Timeout { .. })
    }
}

/// An open, exclusively owned connection to one emulator device.
pub trait Transport: Send {
    /// Writes every byte of `frame`, giving up once `timeout` has elapsed.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Timeout`] if the deadline passes before the
    /// last byte is accepted, or [`TransportError::Io`] if the link fails.
    fn write_frame(&mut self, frame: &Frame, timeout: Duration) -> Result<(), TransportError>;

    /// Releases any held keys and shuts the connection.
    ///
    /// Called before a transport is replaced.  The default does nothing.
    fn close(&mut self) -> Result<(), TransportError> {
        Ok(())
    }
}

/// Opens transports by port name.
pub trait Connector: Send + Sync {
    /// Opens the device on `port`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Open`] if the port does not exist or cannot
    /// be claimed.
    fn open(&self, port: &str) -> Result<Box<dyn Transport>, TransportError>;
}
