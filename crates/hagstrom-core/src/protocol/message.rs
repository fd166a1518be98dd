//! Text to keystroke translation (US keyboard layout).
//!
//! Each supported character maps to one physical key, optionally held
//! together with Shift.  A shifted character is typed as
//!
//! ```text
//! press(Shift) press(key) release(key) release(Shift)
//! ```
//!
//! so `"Hi"` becomes six events.  Characters outside the table make the whole
//! message fail; nothing is ever half-typed.

use crate::keymap::KeyCode;

use super::codec::ProtocolError;
use super::command::Command;

/// The key (and modifier) needed to type one character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Keystroke {
    pub key: KeyCode,
    pub shifted: bool,
}

impl Keystroke {
    const fn plain(key: KeyCode) -> Self {
        Self { key, shifted: false }
    }

    const fn shifted(key: KeyCode) -> Self {
        Self { key, shifted: true }
    }

    fn append_to(self, cmd: &mut Command) {
        if self.shifted {
            cmd.push_chord(&[KeyCode::Shift, self.key]);
        } else {
            cmd.push_tap(self.key);
        }
    }
}

/// Returns the keystroke that types `c`, or `None` if `c` has no key.
pub fn keystroke_for(c: char) -> Option<Keystroke> {
    use KeyCode::*;

    let stroke = match c {
        '1' => Keystroke::plain(Digit1),
        '!' => Keystroke::shifted(Digit1),
        '2' => Keystroke::plain(Digit2),
        '@' => Keystroke::shifted(Digit2),
        '3' => Keystroke::plain(Digit3),
        '#' => Keystroke::shifted(Digit3),
        '4' => Keystroke::plain(Digit4),
        '$' => Keystroke::shifted(Digit4),
        '5' => Keystroke::plain(Digit5),
        '%' => Keystroke::shifted(Digit5),
        '6' => Keystroke::plain(Digit6),
        '^' => Keystroke::shifted(Digit6),
        '7' => Keystroke::plain(Digit7),
        '&' => Keystroke::shifted(Digit7),
        '8' => Keystroke::plain(Digit8),
        '*' => Keystroke::shifted(Digit8),
        '9' => Keystroke::plain(Digit9),
        '(' => Keystroke::shifted(Digit9),
        '0' => Keystroke::plain(Digit0),
        ')' => Keystroke::shifted(Digit0),
        '-' => Keystroke::plain(Minus),
        '_' => Keystroke::shifted(Minus),
        '=' => Keystroke::plain(Equal),
        '+' => Keystroke::shifted(Equal),
        '`' => Keystroke::plain(Backquote),
        '~' => Keystroke::shifted(Backquote),

        'a'..='z' => Keystroke::plain(letter(c)),
        'A'..='Z' => Keystroke::shifted(letter(c.to_ascii_lowercase())),

        '[' => Keystroke::plain(BracketLeft),
        '{' => Keystroke::shifted(BracketLeft),
        ']' => Keystroke::plain(BracketRight),
        '}' => Keystroke::shifted(BracketRight),
        '\\' => Keystroke::plain(Backslash),
        '|' => Keystroke::shifted(Backslash),
        ';' => Keystroke::plain(Semicolon),
        ':' => Keystroke::shifted(Semicolon),
        '\'' => Keystroke::plain(Quote),
        '"' => Keystroke::shifted(Quote),
        ',' => Keystroke::plain(Comma),
        '<' => Keystroke::shifted(Comma),
        '.' => Keystroke::plain(Period),
        '>' => Keystroke::shifted(Period),
        '/' => Keystroke::plain(Slash),
        '?' => Keystroke::shifted(Slash),

        ' ' => Keystroke::plain(Space),
        '\t' => Keystroke::plain(Tab),
        '\n' | '\r' => Keystroke::plain(Enter),

        _ => return None,
    };
    Some(stroke)
}

/// Letters are contiguous in the ordinal table starting at `KeyA`.
fn letter(lower: char) -> KeyCode {
    KeyCode::ALL[usize::from(KeyCode::KeyA.as_u8()) + (lower as usize - 'a' as usize)]
}

/// Encodes `text` into a [`Command`], one keystroke per character.
///
/// `'\r'` and `'\n'` each type Enter, so `"\r\n"` types two.
///
/// # Errors
///
/// Returns [`ProtocolError::UnsupportedCharacter`] for the first character
/// that has no keystroke.  The partially built command is discarded.
///
/// # Examples
///
/// ```rust
/// use hagstrom_core::protocol::encode_message;
///
/// let cmd = encode_message("Hi").unwrap();
/// assert_eq!(cmd.len(), 6);
/// assert!(encode_message("café").is_err());
/// ```
pub fn encode_message(text: &str) -> Result<Command, ProtocolError> {
    let mut cmd = Command::with_capacity(text.len() * 2);

    for (position, c) in text.char_indices() {
        let stroke = keystroke_for(c)
            .ok_or(ProtocolError::UnsupportedCharacter { character: c, position })?;
        stroke.append_to(&mut cmd);
    }

    Ok(cmd)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::event::KeyEvent;

    #[test]
    fn test_hi_encodes_to_shifted_h_then_plain_i() {
        // Arrange / Act
        let cmd = encode_message("Hi").unwrap();

        // Assert
        assert_eq!(
            cmd.events(),
            &[
                KeyEvent::press(KeyCode::Shift),
                KeyEvent::press(KeyCode::KeyH),
                KeyEvent::release(KeyCode::KeyH),
                KeyEvent::release(KeyCode::Shift),
                KeyEvent::press(KeyCode::KeyI),
                KeyEvent::release(KeyCode::KeyI),
            ]
        );
    }

    #[test]
    fn test_every_lowercase_letter_maps_to_its_key() {
        for (offset, c) in ('a'..='z').enumerate() {
            let stroke = keystroke_for(c).unwrap();
            assert_eq!(stroke.key.as_u8(), KeyCode::KeyA.as_u8() + offset as u8);
            assert!(!stroke.shifted, "{c:?} must not need Shift");
        }
    }

    #[test]
    fn test_uppercase_letters_need_shift() {
        for c in 'A'..='Z' {
            let stroke = keystroke_for(c).unwrap();
            assert!(stroke.shifted, "{c:?} must need Shift");
            assert_eq!(Some(stroke.key), keystroke_for(c.to_ascii_lowercase()).map(|s| s.key));
        }
    }

    #[test]
    fn test_shifted_number_row_symbols() {
        let pairs = [
            ('!', KeyCode::Digit1),
            ('@', KeyCode::Digit2),
            ('#', KeyCode::Digit3),
            ('$', KeyCode::Digit4),
            ('%', KeyCode::Digit5),
            ('^', KeyCode::Digit6),
            ('&', KeyCode::Digit7),
            ('*', KeyCode::Digit8),
            ('(', KeyCode::Digit9),
            (')', KeyCode::Digit0),
            ('_', KeyCode::Minus),
            ('+', KeyCode::Equal),
            ('~', KeyCode::Backquote),
        ];
        for (c, key) in pairs {
            assert_eq!(keystroke_for(c), Some(Keystroke::shifted(key)), "{c:?}");
        }
    }

    #[test]
    fn test_whitespace_maps_to_space_tab_enter() {
        assert_eq!(keystroke_for(' '), Some(Keystroke::plain(KeyCode::Space)));
        assert_eq!(keystroke_for('\t'), Some(Keystroke::plain(KeyCode::Tab)));
        assert_eq!(keystroke_for('\n'), Some(Keystroke::plain(KeyCode::Enter)));
        assert_eq!(keystroke_for('\r'), Some(Keystroke::plain(KeyCode::Enter)));
    }

    #[test]
    fn test_crlf_types_two_enters() {
        let cmd = encode_message("a\r\nb").unwrap();

        assert_eq!(
            cmd,
            Command::taps(&[KeyCode::KeyA, KeyCode::Enter, KeyCode::Enter, KeyCode::KeyB])
        );
        assert_eq!(cmd.len(), 8);
    }

    #[test]
    fn test_lone_carriage_returns_each_press_enter() {
        let cmd = encode_message("\r\r").unwrap();
        assert_eq!(cmd, Command::taps(&[KeyCode::Enter, KeyCode::Enter]));
    }

    #[test]
    fn test_unsupported_character_reports_position() {
        let err = encode_message("ok é").unwrap_err();

        assert_eq!(
            err,
            ProtocolError::UnsupportedCharacter {
                character: 'é',
                position: 3
            }
        );
    }

    #[test]
    fn test_control_characters_are_unsupported() {
        assert!(encode_message("\u{7f}").is_err());
        assert!(encode_message("\u{1b}").is_err());
    }

    #[test]
    fn test_empty_message_is_empty_command() {
        assert!(encode_message("").unwrap().is_empty());
    }
}
