//! `DeviceHandle`: exclusive, thread-safe owner of one emulator connection.
//!
//! # State machine
//!
//! ```text
//! Uninitialized --initialize ok------> Ready
//! Uninitialized --initialize fails---> Uninitialized   (DeviceNotFound)
//! Ready --------initialize-----------> close old, reopen (Ready or Uninitialized)
//! Ready --------write_*--------------> Ready           (Ok / DataFormatting / DeviceNotFound)
//! any ----------holder aborted-------> Faulted         (LockPoisoned from then on)
//! Faulted ------anything-------------> Faulted
//! ```
//!
//! # Guard discipline
//!
//! Every operation runs with the handle's mutex held, so two writers never
//! interleave bytes on the wire and they complete in lock-acquisition order.
//! Before touching the transport the holder raises an `in_flight` marker and
//! lowers it afterwards.  A later holder that finds the marker still raised
//! knows the previous one died mid-operation and moves the handle to
//! `Faulted`.  The same happens when the mutex reports poisoning.  A faulted
//! handle is never repaired; callers discard it and build a new one.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::keymap::KeyCode;
use crate::protocol::{encode_command, encode_message, Command, ProtocolError};
use crate::transport::{Connector, SerialConfig, SerialConnector, Transport, TransportError};

use super::response::ResponseCode;

/// Internal failure causes, collapsed to a [`ResponseCode`] at the boundary.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// The handle has no open transport.
    #[error("emulator not initialized")]
    Uninitialized,

    /// The input could not be encoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The port could not be opened or the write failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A previous holder of the guard aborted; the handle is unusable.
    #[error("device handle is faulted; discard it and open a new one")]
    Faulted,
}

/// Connection state of a [`DeviceHandle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    Uninitialized,
    Ready,
    Faulted,
}

/// Everything guarded by the handle's mutex.
struct Shared {
    state: ConnectionState,
    port: Option<String>,
    transport: Option<Box<dyn Transport>>,
    in_flight: bool,
}

impl Shared {
    fn fault(&mut self, reason: &str) {
        if self.state != ConnectionState::Faulted {
            error!(port = ?self.port, reason, "device handle faulted");
        }
        self.state = ConnectionState::Faulted;
        // No further frame is written.  Dropping a serial transport still
        // sends release-all so a half-typed chord leaves no key held.
        self.transport = None;
    }
}

/// One emulator connection, shareable across threads by reference.
///
/// ```rust,no_run
/// use std::time::Duration;
/// use hagstrom_core::device::{DeviceHandle, ResponseCode};
///
/// let handle = DeviceHandle::new();
/// assert_eq!(handle.initialize("COM3"), ResponseCode::Ok);
/// handle.write_message("Hello, world!\n", Duration::from_millis(1000));
/// ```
pub struct DeviceHandle {
    connector: Box<dyn Connector>,
    shared: Mutex<Shared>,
}

impl Default for DeviceHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceHandle {
    /// Creates an uninitialized handle that opens serial ports with the
    /// default line settings.
    pub fn new() -> Self {
        Self::with_serial_config(SerialConfig::default())
    }

    /// Creates an uninitialized handle using custom serial settings.
    pub fn with_serial_config(config: SerialConfig) -> Self {
        Self::with_connector(SerialConnector::new(config))
    }

    /// Creates an uninitialized handle that opens transports via `connector`.
    pub fn with_connector(connector: impl Connector + 'static) -> Self {
        Self {
            connector: Box::new(connector),
            shared: Mutex::new(Shared {
                state: ConnectionState::Uninitialized,
                port: None,
                transport: None,
                in_flight: false,
            }),
        }
    }

    /// Current state.  Reports `Faulted` if the guard is poisoned.
    pub fn state(&self) -> ConnectionState {
        match self.acquire() {
            Ok(shared) => shared.state,
            Err(_) => ConnectionState::Faulted,
        }
    }

    /// The port of the open transport, if any.
    pub fn port(&self) -> Option<String> {
        self.acquire().ok().and_then(|shared| shared.port.clone())
    }

    // ── Boundary operations ───────────────────────────────────────────────────

    /// Opens `port`, replacing any transport this handle already owns.
    ///
    /// Returns `DeviceNotFound` if the port cannot be opened (the handle is
    /// then `Uninitialized`), or `LockPoisoned` on a faulted handle.
    pub fn initialize(&self, port: &str) -> ResponseCode {
        ResponseCode::from_result(&self.try_initialize(port))
    }

    /// Types `text` on the target.
    ///
    /// Returns `DataFormatting` without sending anything if any character is
    /// unsupported.
    pub fn write_message(&self, text: &str, timeout: Duration) -> ResponseCode {
        ResponseCode::from_result(&self.try_write_message(text, timeout))
    }

    /// Presses and releases each key ordinal in turn.
    ///
    /// Returns `DataFormatting` if any ordinal is outside `0..=72`.
    pub fn write_command(&self, keycodes: &[u8], timeout: Duration) -> ResponseCode {
        ResponseCode::from_result(&self.try_write_command(keycodes, timeout))
    }

    /// Typed variant of [`write_command`](Self::write_command).
    pub fn write_keys(&self, keys: &[KeyCode], timeout: Duration) -> ResponseCode {
        ResponseCode::from_result(&self.send(timeout, || Ok(Command::taps(keys))))
    }

    /// Holds every key down in order, then releases them in reverse.
    pub fn write_chord(&self, keycodes: &[u8], timeout: Duration) -> ResponseCode {
        ResponseCode::from_result(&self.try_write_chord(keycodes, timeout))
    }

    // ── Result-returning variants ─────────────────────────────────────────────

    /// Like [`initialize`](Self::initialize) but keeps the failure cause.
    pub fn try_initialize(&self, port: &str) -> Result<(), DeviceError> {
        let mut guard = self.acquire()?;
        let shared = &mut *guard;

        if let Some(mut old) = shared.transport.take() {
            info!(port = ?shared.port, "closing previous transport before reopening");
            shared.in_flight = true;
            if let Err(e) = old.close() {
                warn!("previous transport did not close cleanly: {e}");
            }
            drop(old);
            shared.in_flight = false;
        }
        shared.state = ConnectionState::Uninitialized;
        shared.port = None;

        shared.in_flight = true;
        let opened = self.connector.open(port);
        shared.in_flight = false;

        match opened {
            Ok(transport) => {
                shared.transport = Some(transport);
                shared.port = Some(port.to_string());
                shared.state = ConnectionState::Ready;
                info!(port, "emulator ready");
                Ok(())
            }
            Err(e) => {
                warn!(port, "emulator not found: {e}");
                Err(e.into())
            }
        }
    }

    /// Like [`write_message`](Self::write_message) but keeps the failure cause.
    pub fn try_write_message(&self, text: &str, timeout: Duration) -> Result<(), DeviceError> {
        self.send(timeout, || encode_message(text))
    }

    /// Like [`write_command`](Self::write_command) but keeps the failure cause.
    pub fn try_write_command(&self, keycodes: &[u8], timeout: Duration) -> Result<(), DeviceError> {
        self.send(timeout, || Command::taps_from_ordinals(keycodes))
    }

    /// Like [`write_chord`](Self::write_chord) but keeps the failure cause.
    pub fn try_write_chord(&self, keycodes: &[u8], timeout: Duration) -> Result<(), DeviceError> {
        self.send(timeout, || Command::chord_from_ordinals(keycodes))
    }

    // ── Internals ─────────────────────────────────────────────────────────────

    /// Takes the guard, detecting an aborted previous holder.
    fn acquire(&self) -> Result<MutexGuard<'_, Shared>, DeviceError> {
        let mut guard = match self.shared.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                let mut guard = poisoned.into_inner();
                guard.fault("guard poisoned by a panicking holder");
                return Err(DeviceError::Faulted);
            }
        };
        if guard.in_flight {
            guard.fault("previous holder abandoned an operation in flight");
        }
        if guard.state == ConnectionState::Faulted {
            return Err(DeviceError::Faulted);
        }
        Ok(guard)
    }

    /// Encodes under the guard and writes the resulting frame.
    fn send<F>(&self, timeout: Duration, build: F) -> Result<(), DeviceError>
    where
        F: FnOnce() -> Result<Command, ProtocolError>,
    {
        let mut guard = self.acquire()?;
        let shared = &mut *guard;

        if shared.state != ConnectionState::Ready {
            return Err(DeviceError::Uninitialized);
        }
        let transport = shared
            .transport
            .as_mut()
            .ok_or(DeviceError::Uninitialized)?;

        let frame = encode_command(&build()?);
        if frame.is_empty() {
            return Ok(());
        }

        shared.in_flight = true;
        let result = transport.write_frame(&frame, timeout);
        shared.in_flight = false;

        match result {
            Ok(()) => {
                debug!(port = ?shared.port, bytes = frame.len(), "frame delivered");
                Ok(())
            }
            Err(e) => {
                warn!(port = ?shared.port, "frame not delivered: {e}");
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keymap::RELEASE_ALL;
    use crate::protocol::Frame;
    use crate::transport::mock::{FailureMode, MockConnector};
    use crate::transport::serial::TimedWrite;
    use crate::transport::SerialTransport;
    use mockall::mock;
    use std::io::{self, Write};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;

    mock! {
        Link {}
        impl Transport for Link {
            fn write_frame(&mut self, frame: &Frame, timeout: Duration) -> Result<(), TransportError>;
            fn close(&mut self) -> Result<(), TransportError>;
        }
    }

    /// Connector that hands out pre-programmed mock links in order.
    struct ScriptedConnector {
        links: Mutex<Vec<MockLink>>,
    }

    impl ScriptedConnector {
        fn new(mut links: Vec<MockLink>) -> Self {
            links.reverse();
            Self {
                links: Mutex::new(links),
            }
        }
    }

    impl Connector for ScriptedConnector {
        fn open(&self, _port: &str) -> Result<Box<dyn Transport>, TransportError> {
            let link = self.links.lock().unwrap().pop().expect("no more scripted links");
            Ok(Box::new(link))
        }
    }

    const TIMEOUT: Duration = Duration::from_millis(1000);

    /// Serial link that records bytes and can be armed to panic on its next
    /// write.
    #[derive(Clone, Default)]
    struct SerialSink {
        bytes: Arc<Mutex<Vec<u8>>>,
        panic_next_write: Arc<AtomicBool>,
    }

    impl Write for SerialSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.panic_next_write.swap(false, Ordering::SeqCst) {
                panic!("serial link aborted mid-write");
            }
            self.bytes.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl TimedWrite for SerialSink {
        fn set_write_timeout(&mut self, _timeout: Duration) -> io::Result<()> {
            Ok(())
        }
    }

    /// Connector opening [`SerialTransport`]s over a shared [`SerialSink`].
    struct SinkConnector {
        sink: SerialSink,
    }

    impl Connector for SinkConnector {
        fn open(&self, port: &str) -> Result<Box<dyn Transport>, TransportError> {
            Ok(Box::new(SerialTransport::from_link(
                port,
                self.sink.clone(),
                SerialConfig::default(),
            )))
        }
    }

    fn serial_handle() -> (DeviceHandle, SerialSink) {
        let sink = SerialSink::default();
        let handle = DeviceHandle::with_connector(SinkConnector { sink: sink.clone() });
        assert_eq!(handle.initialize("COM3"), ResponseCode::Ok);
        (handle, sink)
    }

    #[test]
    fn test_new_handle_is_uninitialized() {
        let handle = DeviceHandle::with_connector(MockConnector::with_ports(&[]));

        assert_eq!(handle.state(), ConnectionState::Uninitialized);
        assert_eq!(handle.port(), None);
    }

    #[test]
    fn test_write_message_sends_one_frame_with_timeout() {
        // Arrange
        let mut link = MockLink::new();
        link.expect_write_frame()
            .withf(|frame, timeout| {
                frame.as_bytes() == [44, 36, 164, 172, 24, 152] && *timeout == TIMEOUT
            })
            .times(1)
            .returning(|_, _| Ok(()));
        let handle = DeviceHandle::with_connector(ScriptedConnector::new(vec![link]));
        assert_eq!(handle.initialize("COM3"), ResponseCode::Ok);

        // Act
        let code = handle.write_message("Hi", TIMEOUT);

        // Assert
        assert_eq!(code, ResponseCode::Ok);
        assert_eq!(handle.state(), ConnectionState::Ready);
        assert_eq!(handle.port().as_deref(), Some("COM3"));
    }

    #[test]
    fn test_unsupported_character_never_reaches_transport() {
        let mut link = MockLink::new();
        link.expect_write_frame().never();
        let handle = DeviceHandle::with_connector(ScriptedConnector::new(vec![link]));
        handle.initialize("COM3");

        assert_eq!(handle.write_message("ab\u{2603}cd", TIMEOUT), ResponseCode::DataFormatting);
        assert_eq!(handle.state(), ConnectionState::Ready);
    }

    #[test]
    fn test_invalid_ordinal_never_reaches_transport() {
        let mut link = MockLink::new();
        link.expect_write_frame().never();
        let handle = DeviceHandle::with_connector(ScriptedConnector::new(vec![link]));
        handle.initialize("COM3");

        assert_eq!(handle.write_command(&[10, 73], TIMEOUT), ResponseCode::DataFormatting);
        assert_eq!(handle.write_chord(&[255], TIMEOUT), ResponseCode::DataFormatting);
    }

    #[test]
    fn test_transport_timeout_maps_to_device_not_found_but_keeps_cause() {
        let mut link = MockLink::new();
        link.expect_write_frame().times(2).returning(|frame, timeout| {
            Err(TransportError::Timeout {
                timeout,
                written: 0,
                total: frame.len(),
            })
        });
        let handle = DeviceHandle::with_connector(ScriptedConnector::new(vec![link]));
        handle.initialize("COM3");

        let err = handle.try_write_command(&[51], TIMEOUT).unwrap_err();
        assert!(matches!(err, DeviceError::Transport(ref t) if t.is_timeout()));

        assert_eq!(handle.write_command(&[51], TIMEOUT), ResponseCode::DeviceNotFound);
        // A failed write is not a fault.
        assert_eq!(handle.state(), ConnectionState::Ready);
    }

    #[test]
    fn test_reinitialize_closes_old_transport_first() {
        let mut first = MockLink::new();
        first.expect_close().times(1).returning(|| Ok(()));
        first.expect_write_frame().never();
        let mut second = MockLink::new();
        second.expect_write_frame().times(1).returning(|_, _| Ok(()));
        let handle = DeviceHandle::with_connector(ScriptedConnector::new(vec![first, second]));

        assert_eq!(handle.initialize("COM3"), ResponseCode::Ok);
        assert_eq!(handle.initialize("COM4"), ResponseCode::Ok);

        assert_eq!(handle.write_keys(&[KeyCode::Enter], TIMEOUT), ResponseCode::Ok);
        assert_eq!(handle.port().as_deref(), Some("COM4"));
    }

    #[test]
    fn test_failed_reinitialize_leaves_handle_uninitialized() {
        let connector = MockConnector::with_ports(&["COM3"]);
        let log = connector.log();
        let handle = DeviceHandle::with_connector(connector);
        assert_eq!(handle.initialize("COM3"), ResponseCode::Ok);

        assert_eq!(handle.initialize("COM7"), ResponseCode::DeviceNotFound);

        assert_eq!(handle.state(), ConnectionState::Uninitialized);
        assert_eq!(log.close_count(), 1);
        assert_eq!(handle.write_message("a", TIMEOUT), ResponseCode::Uninitialized);
    }

    #[test]
    fn test_empty_command_is_ok_and_silent() {
        let mut link = MockLink::new();
        link.expect_write_frame().never();
        let handle = DeviceHandle::with_connector(ScriptedConnector::new(vec![link]));
        handle.initialize("COM3");

        assert_eq!(handle.write_command(&[], TIMEOUT), ResponseCode::Ok);
        assert_eq!(handle.write_message("", TIMEOUT), ResponseCode::Ok);
    }

    #[test]
    fn test_in_flight_marker_left_raised_faults_handle() {
        // Simulates a holder that vanished without lowering the marker,
        // independent of mutex poisoning.
        let connector = MockConnector::with_ports(&["COM3"]);
        let log = connector.log();
        let handle = DeviceHandle::with_connector(connector);
        handle.initialize("COM3");
        handle.shared.lock().unwrap().in_flight = true;

        assert_eq!(handle.write_message("a", TIMEOUT), ResponseCode::LockPoisoned);
        assert_eq!(handle.write_command(&[10], TIMEOUT), ResponseCode::LockPoisoned);
        assert_eq!(handle.initialize("COM3"), ResponseCode::LockPoisoned);
        assert_eq!(handle.state(), ConnectionState::Faulted);
        assert!(log.is_silent());
    }

    #[test]
    fn test_panicking_holder_poisons_handle_for_good() {
        let connector = MockConnector::with_ports(&["COM3"]).failing_writes(FailureMode::Panic);
        let handle = DeviceHandle::with_connector(connector);
        assert_eq!(handle.initialize("COM3"), ResponseCode::Ok);

        let joined = thread::scope(|s| s.spawn(|| handle.write_message("x", TIMEOUT)).join());
        assert!(joined.is_err(), "writer thread must have panicked");

        assert_eq!(handle.state(), ConnectionState::Faulted);
        assert_eq!(handle.write_message("x", TIMEOUT), ResponseCode::LockPoisoned);
        assert_eq!(handle.write_chord(&[53, 28], TIMEOUT), ResponseCode::LockPoisoned);
        assert_eq!(handle.initialize("COM3"), ResponseCode::LockPoisoned);
    }

    #[test]
    fn test_unbounded_timeout_over_serial_link_is_ok() {
        // Arrange
        let (handle, sink) = serial_handle();

        // Act
        let code = handle.write_message("Hi", Duration::MAX);

        // Assert
        assert_eq!(code, ResponseCode::Ok);
        assert_eq!(handle.state(), ConnectionState::Ready);
        assert_eq!(*sink.bytes.lock().unwrap(), vec![44, 36, 164, 172, 24, 152]);
        assert_eq!(handle.write_command(&[51], Duration::MAX), ResponseCode::Ok);
    }

    #[test]
    fn test_faulting_serial_handle_releases_held_keys_once() {
        // Arrange
        let (handle, sink) = serial_handle();
        sink.panic_next_write.store(true, Ordering::SeqCst);

        // Act
        let joined = thread::scope(|s| s.spawn(|| handle.write_chord(&[53, 28], TIMEOUT)).join());
        let code = handle.write_message("a", TIMEOUT);

        // Assert: the aborted chord wrote nothing; dropping the transport
        // sent only release-all.
        assert!(joined.is_err());
        assert_eq!(code, ResponseCode::LockPoisoned);
        assert_eq!(*sink.bytes.lock().unwrap(), vec![RELEASE_ALL]);
        assert_eq!(handle.initialize("COM3"), ResponseCode::LockPoisoned);
        assert_eq!(*sink.bytes.lock().unwrap(), vec![RELEASE_ALL]);
    }
}
