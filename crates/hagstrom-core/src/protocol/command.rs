//! An ordered sequence of key events ready to be framed.
//!
//! Only keyboard events exist today.  Mouse move, click and scroll would be a
//! separate command type next to [`Command`] with its own events and frame
//! encoding; the device handle would gain a matching write method rather than
//! mixing pointer events into a key sequence.

use crate::keymap::KeyCode;

use super::codec::ProtocolError;
use super::event::KeyEvent;

/// Ordered key press/release events.
///
/// A `Command` is built in one of three ways:
///
/// - [`Command::taps`] – each key pressed and released in turn (the meaning of
///   `write_command`).
/// - [`Command::chord`] – every key pressed in order, then released in
///   reverse order (Control+S, Meta+R, ...).
/// - [`super::message::encode_message`] – text translated character by
///   character, with Shift wrapped around keys that need it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Command {
    events: Vec<KeyEvent>,
}

impl Command {
    /// Creates an empty command.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty command with room for `events` events.
    pub fn with_capacity(events: usize) -> Self {
        Self {
            events: Vec::with_capacity(events),
        }
    }

    /// Presses and releases each key in sequence.
    ///
    /// ```rust
    /// use hagstrom_core::keymap::KeyCode;
    /// use hagstrom_core::protocol::{Command, KeyEvent};
    ///
    /// let cmd = Command::taps(&[KeyCode::KeyO, KeyCode::KeyK]);
    /// assert_eq!(
    ///     cmd.events(),
    ///     &[
    ///         KeyEvent::press(KeyCode::KeyO),
    ///         KeyEvent::release(KeyCode::KeyO),
    ///         KeyEvent::press(KeyCode::KeyK),
    ///         KeyEvent::release(KeyCode::KeyK),
    ///     ]
    /// );
    /// ```
    pub fn taps(keys: &[KeyCode]) -> Self {
        let mut cmd = Self::with_capacity(keys.len() * 2);
        for &key in keys {
            cmd.push_tap(key);
        }
        cmd
    }

    /// Presses every key in order, then releases them in reverse order.
    pub fn chord(keys: &[KeyCode]) -> Self {
        let mut cmd = Self::with_capacity(keys.len() * 2);
        cmd.push_chord(keys);
        cmd
    }

    /// Builds a [`Command::taps`] command from raw key ordinals.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidKeyCode`] for the first ordinal outside
    /// `0..=72`.  No partial command is returned.
    pub fn taps_from_ordinals(ordinals: &[u8]) -> Result<Self, ProtocolError> {
        Ok(Self::taps(&keys_from_ordinals(ordinals)?))
    }

    /// Builds a [`Command::chord`] command from raw key ordinals.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidKeyCode`] for the first ordinal outside
    /// `0..=72`.
    pub fn chord_from_ordinals(ordinals: &[u8]) -> Result<Self, ProtocolError> {
        Ok(Self::chord(&keys_from_ordinals(ordinals)?))
    }

    /// Appends a press immediately followed by a release of `key`.
    pub fn push_tap(&mut self, key: KeyCode) {
        self.events.push(KeyEvent::press(key));
        self.events.push(KeyEvent::release(key));
    }

    /// Appends a chord of `keys`.
    pub fn push_chord(&mut self, keys: &[KeyCode]) {
        self.events.extend(keys.iter().copied().map(KeyEvent::press));
        self.events
            .extend(keys.iter().rev().copied().map(KeyEvent::release));
    }

    /// Appends a single raw event.
    pub fn push(&mut self, event: KeyEvent) {
        self.events.push(event);
    }

    /// Appends all events of `other`.
    pub fn extend_from(&mut self, other: &Command) {
        self.events.extend_from_slice(&other.events);
    }

    pub fn events(&self) -> &[KeyEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl From<Vec<KeyEvent>> for Command {
    fn from(events: Vec<KeyEvent>) -> Self {
        Self { events }
    }
}

impl FromIterator<KeyEvent> for Command {
    fn from_iter<I: IntoIterator<Item = KeyEvent>>(iter: I) -> Self {
        Self {
            events: iter.into_iter().collect(),
        }
    }
}

fn keys_from_ordinals(ordinals: &[u8]) -> Result<Vec<KeyCode>, ProtocolError> {
    ordinals
        .iter()
        .map(|&raw| KeyCode::try_from(raw).map_err(ProtocolError::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keymap::InvalidKeyCode;

    #[test]
    fn test_taps_press_and_release_each_key_in_order() {
        let cmd = Command::taps(&[KeyCode::Enter, KeyCode::Tab]);

        assert_eq!(
            cmd.events(),
            &[
                KeyEvent::press(KeyCode::Enter),
                KeyEvent::release(KeyCode::Enter),
                KeyEvent::press(KeyCode::Tab),
                KeyEvent::release(KeyCode::Tab),
            ]
        );
    }

    #[test]
    fn test_chord_releases_in_reverse_order() {
        let cmd = Command::chord(&[KeyCode::Control, KeyCode::Alt, KeyCode::Escape]);

        assert_eq!(
            cmd.events(),
            &[
                KeyEvent::press(KeyCode::Control),
                KeyEvent::press(KeyCode::Alt),
                KeyEvent::press(KeyCode::Escape),
                KeyEvent::release(KeyCode::Escape),
                KeyEvent::release(KeyCode::Alt),
                KeyEvent::release(KeyCode::Control),
            ]
        );
    }

    #[test]
    fn test_taps_from_ordinals_maps_boundary_bytes() {
        // 55 = Meta, 27 = KeyR
        let cmd = Command::taps_from_ordinals(&[55, 27]).unwrap();

        assert_eq!(cmd, Command::taps(&[KeyCode::Meta, KeyCode::KeyR]));
    }

    #[test]
    fn test_invalid_ordinal_rejects_whole_command() {
        let err = Command::taps_from_ordinals(&[10, 11, 99, 12]).unwrap_err();

        assert_eq!(err, ProtocolError::InvalidKeyCode(InvalidKeyCode(99)));
    }

    #[test]
    fn test_empty_input_gives_empty_command() {
        assert!(Command::taps(&[]).is_empty());
        assert!(Command::chord_from_ordinals(&[]).unwrap().is_empty());
    }
}
