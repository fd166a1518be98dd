//! The device handle and its response taxonomy.
//!
//! A [`DeviceHandle`] owns at most one open transport and serialises every
//! operation on it behind a single guard.  Each boundary operation returns
//! exactly one [`ResponseCode`].

pub mod handle;
pub mod response;

pub use handle::{ConnectionState, DeviceError, DeviceHandle};
pub use response::ResponseCode;
