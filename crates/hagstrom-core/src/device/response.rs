//! Boundary result codes and the mapping from internal failures.
//!
//! | Code | Name             | Meaning                                            |
//! |------|------------------|----------------------------------------------------|
//! | 0    | `Ok`             | The operation completed                            |
//! | 1    | `Uninitialized`  | No successful `initialize` yet                     |
//! | 2    | `DataFormatting` | Input could not be encoded                         |
//! | 3    | `DeviceNotFound` | Port could not be opened, or the device stopped answering |
//! | 4    | `LockPoisoned`   | The handle is faulted; build a new one             |
//!
//! The ordinals are a published contract.  Transport timeouts deliberately
//! map to `DeviceNotFound` in contract version 1; Rust callers that need to
//! tell them apart use the `try_*` methods on
//! [`DeviceHandle`](super::DeviceHandle) and inspect the [`DeviceError`].

use std::fmt;

use serde::{Deserialize, Serialize};

use super::handle::DeviceError;

/// The outcome of one driver operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ResponseCode {
    Ok = 0,
    Uninitialized = 1,
    DataFormatting = 2,
    DeviceNotFound = 3,
    LockPoisoned = 4,
}

impl ResponseCode {
    /// Version of the code table.  Adding a code requires bumping this.
    pub const CONTRACT_VERSION: u32 = 1;

    /// Every code, indexed by ordinal.
    pub const ALL: [ResponseCode; 5] = [
        ResponseCode::Ok,
        ResponseCode::Uninitialized,
        ResponseCode::DataFormatting,
        ResponseCode::DeviceNotFound,
        ResponseCode::LockPoisoned,
    ];

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        Self::ALL.get(usize::from(value)).copied()
    }

    pub fn is_ok(self) -> bool {
        self == ResponseCode::Ok
    }

    /// Collapses an internal result into its boundary code.
    pub fn from_result(result: &Result<(), DeviceError>) -> Self {
        match result {
            Ok(()) => ResponseCode::Ok,
            Err(e) => ResponseCode::from(e),
        }
    }

    /// Short human-readable description, suitable for a diagnostic line.
    pub fn description(self) -> &'static str {
        match self {
            ResponseCode::Ok => "ok",
            ResponseCode::Uninitialized => "emulator uninitialized",
            ResponseCode::DataFormatting => "data improperly formatted",
            ResponseCode::DeviceNotFound => "device not found",
            ResponseCode::LockPoisoned => "lock poisoned",
        }
    }
}

impl From<&DeviceError> for ResponseCode {
    fn from(err: &DeviceError) -> Self {
        match err {
            DeviceError::Uninitialized => ResponseCode::Uninitialized,
            DeviceError::Protocol(_) => ResponseCode::DataFormatting,
            DeviceError::Transport(_) => ResponseCode::DeviceNotFound,
            DeviceError::Faulted => ResponseCode::LockPoisoned,
        }
    }
}

impl From<ResponseCode> for u8 {
    fn from(code: ResponseCode) -> Self {
        code.as_u8()
    }
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}
