//! # hagstrom-core
//!
//! Driver library for the Hagstrom USB-to-USB keyboard emulator.
//!
//! The emulator is a small board that enumerates as a keyboard on a target
//! computer and is controlled over a serial (COM) port from a host computer.
//! The host sends one byte per key press or release; the board replays the
//! events to the target.
//!
//! # Layers
//!
//! - **`keymap`** – The 73 supported keys ([`KeyCode`]), their stable
//!   ordinals, and the scan codes the board understands.
//!
//! - **`protocol`** – Turns text and key ordinals into a [`Command`] (a list
//!   of press/release events) and a [`Command`] into a wire [`Frame`].
//!
//! - **`transport`** – Delivers frames.  [`SerialTransport`] talks to a real
//!   port; [`transport::mock`] records frames in memory for tests.
//!
//! - **`device`** – The [`DeviceHandle`] state machine.  It owns the open
//!   transport, serialises concurrent callers and reports every outcome as a
//!   [`ResponseCode`].
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use hagstrom_core::{DeviceHandle, KeyCode, ResponseCode};
//!
//! let device = DeviceHandle::new();
//! if device.initialize("COM3") == ResponseCode::Ok {
//!     device.write_message("Hello, world!\n", Duration::from_millis(1000));
//!     device.write_keys(&[KeyCode::Escape], Duration::from_millis(1000));
//! }
//! ```

pub mod device;
pub mod keymap;
pub mod protocol;
pub mod transport;

pub use device::{ConnectionState, DeviceError, DeviceHandle, ResponseCode};
pub use keymap::KeyCode;
pub use protocol::{decode_frame, encode_command, encode_message, Command, Frame, ProtocolError};
pub use transport::{Connector, SerialConfig, SerialTransport, Transport, TransportError};
