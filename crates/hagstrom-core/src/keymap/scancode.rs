//! Hardware scan codes understood by the emulator firmware.
//!
//! Each key has a one-byte *press* code in `1..=123`.  The matching *release*
//! code is the press code with the high bit set, so a receiver can tell the
//! two apart from a single byte:
//!
//! ```text
//!   press   0b0xxx_xxxx
//!   release 0b1xxx_xxxx   (press | 0x80)
//! ```
//!
//! The firmware also reserves [`RELEASE_ALL`], which lifts every key that is
//! still held down.  It does not collide with any press or release code.

use super::keycode::KeyCode;

/// Bit that turns a press code into the matching release code.
pub const RELEASE_BIT: u8 = 0x80;

/// Firmware command that releases every held key.
pub const RELEASE_ALL: u8 = 0x38;

/// Returns the press scan code for `key`.
pub fn press_code(key: KeyCode) -> u8 {
    match key {
        KeyCode::Backquote => 1,
        KeyCode::Digit1 => 2,
        KeyCode::Digit2 => 3,
        KeyCode::Digit3 => 4,
        KeyCode::Digit4 => 5,
        KeyCode::Digit5 => 6,
        KeyCode::Digit6 => 7,
        KeyCode::Digit7 => 8,
        KeyCode::Digit8 => 9,
        KeyCode::Digit9 => 10,
        KeyCode::Digit0 => 11,
        KeyCode::Minus => 12,
        KeyCode::Equal => 13,
        KeyCode::Backspace => 15,
        KeyCode::Tab => 16,
        KeyCode::KeyQ => 17,
        KeyCode::KeyW => 18,
        KeyCode::KeyE => 19,
        KeyCode::KeyR => 20,
        KeyCode::KeyT => 21,
        KeyCode::KeyY => 22,
        KeyCode::KeyU => 23,
        KeyCode::KeyI => 24,
        KeyCode::KeyO => 25,
        KeyCode::KeyP => 26,
        KeyCode::BracketLeft => 27,
        KeyCode::BracketRight => 28,
        KeyCode::Backslash => 29,
        KeyCode::CapsLock => 30,
        KeyCode::KeyA => 31,
        KeyCode::KeyS => 32,
        KeyCode::KeyD => 33,
        KeyCode::KeyF => 34,
        KeyCode::KeyG => 35,
        KeyCode::KeyH => 36,
        KeyCode::KeyJ => 37,
        KeyCode::KeyK => 38,
        KeyCode::KeyL => 39,
        KeyCode::Semicolon => 40,
        KeyCode::Quote => 41,
        KeyCode::Enter => 43,
        KeyCode::Shift => 44,
        KeyCode::KeyZ => 46,
        KeyCode::KeyX => 47,
        KeyCode::KeyC => 48,
        KeyCode::KeyV => 49,
        KeyCode::KeyB => 50,
        KeyCode::KeyN => 51,
        KeyCode::KeyM => 52,
        KeyCode::Comma => 53,
        KeyCode::Period => 54,
        KeyCode::Slash => 55,
        KeyCode::Control => 58,
        KeyCode::Alt => 60,
        KeyCode::Space => 61,
        KeyCode::Meta => 70,
        KeyCode::ArrowLeft => 79,
        KeyCode::ArrowUp => 83,
        KeyCode::ArrowDown => 84,
        KeyCode::ArrowRight => 89,
        KeyCode::Escape => 110,
        KeyCode::F1 => 112,
        KeyCode::F2 => 113,
        KeyCode::F3 => 114,
        KeyCode::F4 => 115,
        KeyCode::F5 => 116,
        KeyCode::F6 => 117,
        KeyCode::F7 => 118,
        KeyCode::F8 => 119,
        KeyCode::F9 => 120,
        KeyCode::F10 => 121,
        KeyCode::F11 => 122,
        KeyCode::F12 => 123,
    }
}

/// Returns the release scan code for `key`.
pub fn release_code(key: KeyCode) -> u8 {
    press_code(key) | RELEASE_BIT
}

/// Reverse lookup: the key whose press code is `code`.
///
/// `code` must have the release bit cleared; returns `None` for unassigned
/// codes.
pub fn key_for_scan_code(code: u8) -> Option<KeyCode> {
    KeyCode::ALL
        .iter()
        .copied()
        .find(|&key| press_code(key) == code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_press_codes_are_unique_and_below_release_bit() {
        let mut seen = HashSet::new();
        for key in KeyCode::ALL {
            let code = press_code(key);
            assert!(code > 0 && code < RELEASE_BIT, "{key:?} press code {code} out of range");
            assert!(seen.insert(code), "{key:?} reuses press code {code}");
        }
        assert_eq!(seen.len(), 73);
    }

    #[test]
    fn test_release_code_sets_high_bit() {
        assert_eq!(release_code(KeyCode::Digit1), 130);
        assert_eq!(release_code(KeyCode::KeyA), 159);
        assert_eq!(release_code(KeyCode::Escape), 238);
        assert_eq!(release_code(KeyCode::F12), 251);
    }

    #[test]
    fn test_release_all_collides_with_no_key() {
        for key in KeyCode::ALL {
            assert_ne!(press_code(key), RELEASE_ALL, "{key:?}");
            assert_ne!(release_code(key), RELEASE_ALL, "{key:?}");
        }
        assert_eq!(key_for_scan_code(RELEASE_ALL), None);
    }

    #[test]
    fn test_reverse_lookup_inverts_press_code() {
        for key in KeyCode::ALL {
            assert_eq!(key_for_scan_code(press_code(key)), Some(key));
        }
    }

    #[test]
    fn test_unassigned_scan_codes_have_no_key() {
        for code in [0u8, 14, 42, 45, 56, 100, 124, 127] {
            assert_eq!(key_for_scan_code(code), None, "scan code {code}");
        }
    }
}
