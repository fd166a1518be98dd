//! # hagstrom-cli
//!
//! Library half of the `hagstrom` command.  The binary in `main.rs` parses
//! arguments and wires these pieces together:
//!
//! - **`config`** – `hagstrom.toml` loading and command-line overrides.
//! - **`script`** – validated typing steps and the runner that plays them
//!   against a [`hagstrom_core::DeviceHandle`].
//! - **`report`** – the diagnostic line and exit status for a failed
//!   [`hagstrom_core::ResponseCode`].

pub mod config;
pub mod report;
pub mod script;

pub use config::{load_config, AppConfig, ConfigError, Overrides};
pub use report::{diagnostic, exit_code, report};
pub use script::{normalize_line_endings, parse_keys, RunReport, Script, ScriptError, Step};
