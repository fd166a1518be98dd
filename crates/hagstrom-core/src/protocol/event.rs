//! A single press or release of one key.

use serde::{Deserialize, Serialize};

use crate::keymap::scancode::{key_for_scan_code, press_code, release_code, RELEASE_BIT};
use crate::keymap::KeyCode;

/// Whether a key goes down or comes back up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyAction {
    Press,
    Release,
}

/// One key transition, the unit the emulator firmware consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyEvent {
    pub key: KeyCode,
    pub action: KeyAction,
}

impl KeyEvent {
    pub fn press(key: KeyCode) -> Self {
        Self {
            key,
            action: KeyAction::Press,
        }
    }

    pub fn release(key: KeyCode) -> Self {
        Self {
            key,
            action: KeyAction::Release,
        }
    }

    /// Returns the scan-code byte for this event.
    pub fn to_wire(self) -> u8 {
        match self.action {
            KeyAction::Press => press_code(self.key),
            KeyAction::Release => release_code(self.key),
        }
    }

    /// Parses one scan-code byte, or `None` if no key owns it.
    pub fn from_wire(byte: u8) -> Option<Self> {
        let action = if byte & RELEASE_BIT == 0 {
            KeyAction::Press
        } else {
            KeyAction::Release
        };
        key_for_scan_code(byte & !RELEASE_BIT).map(|key| Self { key, action })
    }
}
