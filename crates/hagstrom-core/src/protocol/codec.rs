//! Wire framing for key commands.
//!
//! Wire format: one byte per key event, no header.
//! ```text
//! [event:1][event:1]...[event:1]
//! ```
//! Each byte is a press scan code (`0x01..=0x7B`) or a release scan code
//! (press | `0x80`).  See [`crate::keymap::scancode`] for the table.
//!
//! The format is total over the 73 keys: every [`Command`] encodes, and every
//! frame produced by [`encode_command`] decodes back to the same command.

use std::fmt;

use thiserror::Error;

use crate::keymap::InvalidKeyCode;

use super::command::Command;
use super::event::KeyEvent;

/// Errors raised while turning input into frames or frames back into input.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// A message character has no key on the emulated keyboard.
    #[error("unsupported character {character:?} at byte {position}")]
    UnsupportedCharacter { character: char, position: usize },

    /// A command payload contains a byte outside the key ordinal range.
    #[error(transparent)]
    InvalidKeyCode(#[from] InvalidKeyCode),

    /// A frame contains a byte that is neither a press nor a release code.
    #[error("unknown scan code 0x{byte:02X} at offset {offset}")]
    UnknownScanCode { byte: u8, offset: usize },
}

/// The encoded bytes of one [`Command`].
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Frame {
    bytes: Vec<u8>,
}

impl Frame {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Frame[")?;
        for (i, b) in self.bytes.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{b:02X}")?;
        }
        write!(f, "]")
    }
}

/// Encodes a [`Command`] into a frame.
///
/// # Examples
///
/// ```rust
/// use hagstrom_core::keymap::KeyCode;
/// use hagstrom_core::protocol::{decode_frame, encode_command, Command};
///
/// let cmd = Command::chord(&[KeyCode::Control, KeyCode::KeyS]);
/// let frame = encode_command(&cmd);
/// assert_eq!(frame.as_bytes(), &[58, 32, 160, 186]);
/// assert_eq!(decode_frame(frame.as_bytes()).unwrap(), cmd);
/// ```
pub fn encode_command(cmd: &Command) -> Frame {
    Frame {
        bytes: cmd.events().iter().map(|event| event.to_wire()).collect(),
    }
}

/// Decodes a frame back into the command it was built from.
///
/// # Errors
///
/// Returns [`ProtocolError::UnknownScanCode`] at the first byte no key owns.
pub fn decode_frame(bytes: &[u8]) -> Result<Command, ProtocolError> {
    bytes
        .iter()
        .enumerate()
        .map(|(offset, &byte)| {
            KeyEvent::from_wire(byte).ok_or(ProtocolError::UnknownScanCode { byte, offset })
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Command::from)
}
