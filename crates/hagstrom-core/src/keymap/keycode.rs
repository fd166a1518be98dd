//! The closed set of physical keys the emulator can press.
//!
//! Every variant carries a stable ordinal in `0..=72`.  The ordinal is what
//! callers put on the boundary (`write_command` takes a list of these bytes)
//! and it must never be renumbered: language bindings built on top of the
//! driver hard-code the same table.
//!
//! | Range   | Keys                                             |
//! |---------|--------------------------------------------------|
//! | 0–9     | Digits `0`..`9`                                  |
//! | 10–35   | Letters `A`..`Z`                                 |
//! | 36–51   | Punctuation, whitespace and editing keys         |
//! | 52–55   | Modifiers (Shift, Control, Alt, Meta)            |
//! | 56–60   | Escape and the arrow cluster                     |
//! | 61–72   | Function keys `F1`..`F12`                        |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A byte that is not one of the 73 assigned key ordinals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid key code ordinal: {0} (expected 0..=72)")]
pub struct InvalidKeyCode(pub u8);

/// A key name that [`KeyCode::from_str`] does not recognise.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown key name: {0:?}")]
pub struct UnknownKeyName(pub String);

/// One physical key on the emulated keyboard.
///
/// The discriminant of each variant is its wire ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum KeyCode {
    // Digits (0–9)
    Digit0 = 0,
    Digit1 = 1,
    Digit2 = 2,
    Digit3 = 3,
    Digit4 = 4,
    Digit5 = 5,
    Digit6 = 6,
    Digit7 = 7,
    Digit8 = 8,
    Digit9 = 9,

    // Letters (10–35)
    KeyA = 10,
    KeyB = 11,
    KeyC = 12,
    KeyD = 13,
    KeyE = 14,
    KeyF = 15,
    KeyG = 16,
    KeyH = 17,
    KeyI = 18,
    KeyJ = 19,
    KeyK = 20,
    KeyL = 21,
    KeyM = 22,
    KeyN = 23,
    KeyO = 24,
    KeyP = 25,
    KeyQ = 26,
    KeyR = 27,
    KeyS = 28,
    KeyT = 29,
    KeyU = 30,
    KeyV = 31,
    KeyW = 32,
    KeyX = 33,
    KeyY = 34,
    KeyZ = 35,

    // Punctuation, whitespace and editing (36–51)
    Backquote = 36,
    Space = 37,
    Minus = 38,
    Equal = 39,
    BracketLeft = 40,
    BracketRight = 41,
    Backslash = 42,
    Semicolon = 43,
    Quote = 44,
    Comma = 45,
    Period = 46,
    Slash = 47,
    Backspace = 48,
    Tab = 49,
    CapsLock = 50,
    Enter = 51,

    // Modifiers (52–55)
    Shift = 52,
    Control = 53,
    Alt = 54,
    Meta = 55,

    // Escape and arrows (56–60)
    Escape = 56,
    ArrowLeft = 57,
    ArrowUp = 58,
    ArrowDown = 59,
    ArrowRight = 60,

    // Function keys (61–72)
    F1 = 61,
    F2 = 62,
    F3 = 63,
    F4 = 64,
    F5 = 65,
    F6 = 66,
    F7 = 67,
    F8 = 68,
    F9 = 69,
    F10 = 70,
    F11 = 71,
    F12 = 72,
}

impl KeyCode {
    /// Number of assigned key codes.
    pub const COUNT: u8 = 73;

    /// Every key code, indexed by its ordinal.
    pub const ALL: [KeyCode; 73] = [
        KeyCode::Digit0,
        KeyCode::Digit1,
        KeyCode::Digit2,
        KeyCode::Digit3,
        KeyCode::Digit4,
        KeyCode::Digit5,
        KeyCode::Digit6,
        KeyCode::Digit7,
        KeyCode::Digit8,
        KeyCode::Digit9,
        KeyCode::KeyA,
        KeyCode::KeyB,
        KeyCode::KeyC,
        KeyCode::KeyD,
        KeyCode::KeyE,
        KeyCode::KeyF,
        KeyCode::KeyG,
        KeyCode::KeyH,
        KeyCode::KeyI,
        KeyCode::KeyJ,
        KeyCode::KeyK,
        KeyCode::KeyL,
        KeyCode::KeyM,
        KeyCode::KeyN,
        KeyCode::KeyO,
        KeyCode::KeyP,
        KeyCode::KeyQ,
        KeyCode::KeyR,
        KeyCode::KeyS,
        KeyCode::KeyT,
        KeyCode::KeyU,
        KeyCode::KeyV,
        KeyCode::KeyW,
        KeyCode::KeyX,
        KeyCode::KeyY,
        KeyCode::KeyZ,
        KeyCode::Backquote,
        KeyCode::Space,
        KeyCode::Minus,
        KeyCode::Equal,
        KeyCode::BracketLeft,
        KeyCode::BracketRight,
        KeyCode::Backslash,
        KeyCode::Semicolon,
        KeyCode::Quote,
        KeyCode::Comma,
        KeyCode::Period,
        KeyCode::Slash,
        KeyCode::Backspace,
        KeyCode::Tab,
        KeyCode::CapsLock,
        KeyCode::Enter,
        KeyCode::Shift,
        KeyCode::Control,
        KeyCode::Alt,
        KeyCode::Meta,
        KeyCode::Escape,
        KeyCode::ArrowLeft,
        KeyCode::ArrowUp,
        KeyCode::ArrowDown,
        KeyCode::ArrowRight,
        KeyCode::F1,
        KeyCode::F2,
        KeyCode::F3,
        KeyCode::F4,
        KeyCode::F5,
        KeyCode::F6,
        KeyCode::F7,
        KeyCode::F8,
        KeyCode::F9,
        KeyCode::F10,
        KeyCode::F11,
        KeyCode::F12,
    ];

    /// Returns the wire ordinal of this key.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Looks up a key by ordinal, returning `None` outside `0..=72`.
    pub fn from_u8(value: u8) -> Option<Self> {
        Self::ALL.get(usize::from(value)).copied()
    }

    /// Returns `true` for Shift, Control, Alt and Meta.
    pub fn is_modifier(self) -> bool {
        matches!(
            self,
            KeyCode::Shift | KeyCode::Control | KeyCode::Alt | KeyCode::Meta
        )
    }

    /// Returns the canonical name used by [`fmt::Display`] and accepted by
    /// [`KeyCode::from_str`].
    pub fn name(self) -> &'static str {
        match self {
            KeyCode::Digit0 => "Digit0",
            KeyCode::Digit1 => "Digit1",
            KeyCode::Digit2 => "Digit2",
            KeyCode::Digit3 => "Digit3",
            KeyCode::Digit4 => "Digit4",
            KeyCode::Digit5 => "Digit5",
            KeyCode::Digit6 => "Digit6",
            KeyCode::Digit7 => "Digit7",
            KeyCode::Digit8 => "Digit8",
            KeyCode::Digit9 => "Digit9",
            KeyCode::KeyA => "KeyA",
            KeyCode::KeyB => "KeyB",
            KeyCode::KeyC => "KeyC",
            KeyCode::KeyD => "KeyD",
            KeyCode::KeyE => "KeyE",
            KeyCode::KeyF => "KeyF",
            KeyCode::KeyG => "KeyG",
            KeyCode::KeyH => "KeyH",
            KeyCode::KeyI => "KeyI",
            KeyCode::KeyJ => "KeyJ",
            KeyCode::KeyK => "KeyK",
            KeyCode::KeyL => "KeyL",
            KeyCode::KeyM => "KeyM",
            KeyCode::KeyN => "KeyN",
            KeyCode::KeyO => "KeyO",
            KeyCode::KeyP => "KeyP",
            KeyCode::KeyQ => "KeyQ",
            KeyCode::KeyR => "KeyR",
            KeyCode::KeyS => "KeyS",
            KeyCode::KeyT => "KeyT",
            KeyCode::KeyU => "KeyU",
            KeyCode::KeyV => "KeyV",
            KeyCode::KeyW => "KeyW",
            KeyCode::KeyX => "KeyX",
            KeyCode::KeyY => "KeyY",
            KeyCode::KeyZ => "KeyZ",
            KeyCode::Backquote => "Backquote",
            KeyCode::Space => "Space",
            KeyCode::Minus => "Minus",
            KeyCode::Equal => "Equal",
            KeyCode::BracketLeft => "BracketLeft",
            KeyCode::BracketRight => "BracketRight",
            KeyCode::Backslash => "Backslash",
            KeyCode::Semicolon => "Semicolon",
            KeyCode::Quote => "Quote",
            KeyCode::Comma => "Comma",
            KeyCode::Period => "Period",
            KeyCode::Slash => "Slash",
            KeyCode::Backspace => "Backspace",
            KeyCode::Tab => "Tab",
            KeyCode::CapsLock => "CapsLock",
            KeyCode::Enter => "Enter",
            KeyCode::Shift => "Shift",
            KeyCode::Control => "Control",
            KeyCode::Alt => "Alt",
            KeyCode::Meta => "Meta",
            KeyCode::Escape => "Escape",
            KeyCode::ArrowLeft => "ArrowLeft",
            KeyCode::ArrowUp => "ArrowUp",
            KeyCode::ArrowDown => "ArrowDown",
            KeyCode::ArrowRight => "ArrowRight",
            KeyCode::F1 => "F1",
            KeyCode::F2 => "F2",
            KeyCode::F3 => "F3",
            KeyCode::F4 => "F4",
            KeyCode::F5 => "F5",
            KeyCode::F6 => "F6",
            KeyCode::F7 => "F7",
            KeyCode::F8 => "F8",
            KeyCode::F9 => "F9",
            KeyCode::F10 => "F10",
            KeyCode::F11 => "F11",
            KeyCode::F12 => "F12",
        }
    }
}

impl TryFrom<u8> for KeyCode {
    type Error = InvalidKeyCode;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        KeyCode::from_u8(value).ok_or(InvalidKeyCode(value))
    }
}

impl From<KeyCode> for u8 {
    fn from(key: KeyCode) -> Self {
        key.as_u8()
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for KeyCode {
    type Err = UnknownKeyName;

    /// Parses a key name, case-insensitively.
    ///
    /// Accepts the canonical names (`KeyA`, `Digit1`, `ArrowLeft`, ...), bare
    /// letters and digits (`a`, `1`), and the usual short aliases (`ctrl`,
    /// `win`, `super`, `esc`, `left`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();

        let mut chars = lower.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if c.is_ascii_digit() {
                return Ok(KeyCode::ALL[(c as u8 - b'0') as usize]);
            }
            if c.is_ascii_lowercase() {
                return Ok(KeyCode::ALL[(c as u8 - b'a') as usize + 10]);
            }
        }

        let alias = match lower.as_str() {
            "grave" | "tilde" => Some(KeyCode::Backquote),
            "dash" | "hyphen" => Some(KeyCode::Minus),
            "lbracket" => Some(KeyCode::BracketLeft),
            "rbracket" => Some(KeyCode::BracketRight),
            "forwardslash" => Some(KeyCode::Slash),
            "caps" => Some(KeyCode::CapsLock),
            "return" => Some(KeyCode::Enter),
            "ctrl" => Some(KeyCode::Control),
            "super" | "win" | "windows" | "cmd" => Some(KeyCode::Meta),
            "esc" => Some(KeyCode::Escape),
            "left" => Some(KeyCode::ArrowLeft),
            "up" => Some(KeyCode::ArrowUp),
            "down" => Some(KeyCode::ArrowDown),
            "right" => Some(KeyCode::ArrowRight),
            _ => None,
        };
        if let Some(key) = alias {
            return Ok(key);
        }

        KeyCode::ALL
            .iter()
            .copied()
            .find(|key| key.name().eq_ignore_ascii_case(&lower))
            .ok_or_else(|| UnknownKeyName(s.to_string()))
    }
}
