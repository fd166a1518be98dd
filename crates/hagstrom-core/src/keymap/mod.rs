//! Key tables for the emulator.
//!
//! Two layers of numbering exist and they must not be confused:
//!
//! - **Ordinals** ([`KeyCode`]): the stable `0..=72` identifiers callers use
//!   on the driver boundary.
//! - **Scan codes** ([`scancode`]): the bytes the emulator firmware actually
//!   reads off the serial line, one for the press and one for the release of
//!   each key.

pub mod keycode;
pub mod scancode;

pub use keycode::{InvalidKeyCode, KeyCode, UnknownKeyName};
pub use scancode::{key_for_scan_code, press_code, release_code, RELEASE_ALL, RELEASE_BIT};
