//! Encoding of keystrokes into the emulator's wire format.
//!
//! The pipeline is:
//!
//! ```text
//! text ──message::encode_message──▶ Command ──codec::encode_command──▶ Frame
//! [KeyCode] ──Command::taps / Command::chord──▶ Command
//! ```
//!
//! Everything in this module is pure: nothing here touches a transport.

pub mod codec;
pub mod command;
pub mod event;
pub mod message;

pub use codec::{decode_frame, encode_command, Frame, ProtocolError};
pub use command::Command;
pub use event::{KeyAction, KeyEvent};
pub use message::{encode_message, keystroke_for, Keystroke};
