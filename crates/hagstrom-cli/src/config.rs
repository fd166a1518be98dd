//! TOML configuration for the `hagstrom` command.
//!
//! ```toml
//! [device]
//! port = "COM3"
//! timeout_ms = 1000
//!
//! [serial]
//! baud_rate = 19200
//! chunk_size = 16
//! chunk_delay_ms = 100
//! settle_delay_ms = 0
//!
//! [logging]
//! level = "info"
//! ```
//!
//! Every table and field is optional.  A missing file means all defaults.
//! Command-line flags are applied on top through [`Overrides`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use hagstrom_core::SerialConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// File looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "hagstrom.toml";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("I/O error reading config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// Neither the file nor the command line named a port.
    #[error("no serial port configured; pass --port or set [device].port")]
    MissingPort,
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub serial: SerialConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which device to talk to and how long to wait for it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeviceConfig {
    /// Serial port name, e.g. `"COM3"` or `"/dev/ttyUSB0"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
    /// Per-write deadline in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// `tracing` level used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_timeout_ms() -> u64 {
    1000
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            port: None,
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Values given on the command line, which win over the file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub port: Option<String>,
    pub timeout_ms: Option<u64>,
    pub log_level: Option<String>,
}

impl AppConfig {
    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the TOML is malformed or a field has
    /// the wrong type.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Applies command-line overrides in place.
    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(port) = overrides.port {
            self.device.port = Some(port);
        }
        if let Some(timeout_ms) = overrides.timeout_ms {
            self.device.timeout_ms = timeout_ms;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
    }

    /// The configured port.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingPort`] if no port was configured.
    pub fn port(&self) -> Result<&str, ConfigError> {
        self.device.port.as_deref().ok_or(ConfigError::MissingPort)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.device.timeout_ms)
    }
}

/// Loads the configuration at `path`, or [`DEFAULT_CONFIG_FILE`] when `path`
/// is `None`.  A file that does not exist yields [`AppConfig::default()`].
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));

    match std::fs::read_to_string(path) {
        Ok(content) => AppConfig::from_toml_str(&content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
