//! In-memory transport doubles for tests.
//!
//! [`RecordingTransport`] appends every frame to a shared [`WireLog`] one
//! byte at a time, yielding the thread between bytes.  If two writers were
//! ever allowed onto the transport at once their bytes would interleave in
//! [`WireLog::bytes`], which is exactly what the concurrency tests look for.
//!
//! # Usage in tests
//!
//! ```rust
//! use std::time::Duration;
//! use hagstrom_core::device::{DeviceHandle, ResponseCode};
//! use hagstrom_core::transport::mock::MockConnector;
//!
//! let connector = MockConnector::with_ports(&["COM3"]);
//! let log = connector.log();
//! let handle = DeviceHandle::with_connector(connector);
//!
//! assert_eq!(handle.initialize("COM3"), ResponseCode::Ok);
//! assert_eq!(handle.write_message("Hi", Duration::from_secs(1)), ResponseCode::Ok);
//! assert_eq!(log.frames().len(), 1);
//! assert_eq!(log.frames()[0].len(), 6);
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use crate::protocol::Frame;

use super::{Connector, Transport, TransportError};

/// How a [`RecordingTransport`] misbehaves when asked to write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureMode {
    /// Report [`TransportError::Timeout`] without writing anything.
    Timeout,
    /// Report an I/O error as if the cable had been pulled.
    Disconnect,
    /// Panic in the middle of the write, leaving the caller's guard abandoned.
    Panic,
}

#[derive(Debug, Default)]
struct WireLogInner {
    bytes: Vec<u8>,
    frames: Vec<Vec<u8>>,
    opened: Vec<String>,
    closes: usize,
}

/// Shared record of everything written to one or more mock transports.
#[derive(Debug, Clone, Default)]
pub struct WireLog {
    inner: Arc<Mutex<WireLogInner>>,
}

impl WireLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, WireLogInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Every byte in the order it reached the wire.
    pub fn bytes(&self) -> Vec<u8> {
        self.lock().bytes.clone()
    }

    /// Every completed frame, in completion order.
    pub fn frames(&self) -> Vec<Vec<u8>> {
        self.lock().frames.clone()
    }

    /// Port names passed to successful opens.
    pub fn opened_ports(&self) -> Vec<String> {
        self.lock().opened.clone()
    }

    /// Number of times a transport was closed.
    pub fn close_count(&self) -> usize {
        self.lock().closes
    }

    /// `true` when nothing at all has been written.
    pub fn is_silent(&self) -> bool {
        self.lock().bytes.is_empty()
    }
}

/// A [`Transport`] that records writes into a [`WireLog`].
#[derive(Debug, Clone, Default)]
pub struct RecordingTransport {
    log: WireLog,
    failure: Option<FailureMode>,
}

impl RecordingTransport {
    pub fn new(log: WireLog) -> Self {
        Self { log, failure: None }
    }

    /// Makes every write fail in the given way.
    pub fn failing(log: WireLog, mode: FailureMode) -> Self {
        Self {
            log,
            failure: Some(mode),
        }
    }

    pub fn log(&self) -> &WireLog {
        &self.log
    }
}

impl Transport for RecordingTransport {
    fn write_frame(&mut self, frame: &Frame, timeout: Duration) -> Result<(), TransportError> {
        match self.failure {
            Some(FailureMode::Timeout) => {
                return Err(TransportError::Timeout {
                    timeout,
                    written: 0,
                    total: frame.len(),
                })
            }
            Some(FailureMode::Disconnect) => {
                return Err(TransportError::Io(std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    "mock device disconnected",
                )))
            }
            Some(FailureMode::Panic) => panic!("mock transport aborted mid-write"),
            None => {}
        }

        for &byte in frame.as_bytes() {
            self.log.lock().bytes.push(byte);
            thread::yield_now();
        }
        self.log.lock().frames.push(frame.as_bytes().to_vec());
        Ok(())
    }

    fn close(&mut self) -> Result<(), TransportError> {
        self.log.lock().closes += 1;
        Ok(())
    }
}

/// A [`Connector`] that only knows a fixed set of port names.
#[derive(Debug, Clone, Default)]
pub struct MockConnector {
    log: WireLog,
    ports: Vec<String>,
    failure: Option<FailureMode>,
}

impl MockConnector {
    /// Creates a connector on which `ports` exist.
    pub fn with_ports(ports: &[&str]) -> Self {
        Self {
            log: WireLog::new(),
            ports: ports.iter().map(|p| p.to_string()).collect(),
            failure: None,
        }
    }

    /// Transports opened from now on fail every write with `mode`.
    pub fn failing_writes(mut self, mode: FailureMode) -> Self {
        self.failure = Some(mode);
        self
    }

    /// The log shared by every transport this connector opens.
    pub fn log(&self) -> WireLog {
        self.log.clone()
    }
}

impl Connector for MockConnector {
    fn open(&self, port: &str) -> Result<Box<dyn Transport>, TransportError> {
        if !self.ports.iter().any(|p| p == port) {
            return Err(TransportError::Open {
                port: port.to_string(),
                source: serialport::Error::new(
                    serialport::ErrorKind::NoDevice,
                    format!("no mock device on {port}"),
                ),
            });
        }
        self.log.lock().opened.push(port.to_string());
        let transport = RecordingTransport {
            log: self.log.clone(),
            failure: self.failure,
        };
        Ok(Box::new(transport))
    }
}
