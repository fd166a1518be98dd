//! Typing sessions: ordered steps run against one device handle.
//!
//! A script is a TOML file of `[[step]]` tables.  Each step sets exactly one
//! of `message`, `keys`, `chord` or `pause_ms`:
//!
//! ```toml
//! [[step]]
//! chord = ["meta", "r"]
//!
//! [[step]]
//! pause_ms = 500
//!
//! [[step]]
//! message = "notepad\n"
//! ```
//!
//! The single-action subcommands (`type`, `keys`, `chord`, `file`) are run as
//! one-step scripts.

use std::thread;
use std::time::Duration;

use hagstrom_core::keymap::UnknownKeyName;
use hagstrom_core::{DeviceHandle, KeyCode, ResponseCode};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors raised while parsing or validating a script.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// The TOML content could not be parsed.
    #[error("failed to parse script TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// A step sets none of the action fields.
    #[error("step {index} has no action; set one of message, keys, chord, pause_ms")]
    EmptyStep { index: usize },

    /// A step sets more than one action field.
    #[error("step {index} sets more than one of message, keys, chord, pause_ms")]
    AmbiguousStep { index: usize },

    /// A key name in `keys` or `chord` is not on the emulated keyboard.
    #[error("step {index}: {source}")]
    UnknownKey {
        index: usize,
        #[source]
        source: UnknownKeyName,
    },
}

/// One validated action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Type text.
    Message(String),
    /// Press and release each key in turn.
    Keys(Vec<KeyCode>),
    /// Hold every key, then release in reverse.
    Chord(Vec<KeyCode>),
    /// Wait without touching the device.
    Pause(Duration),
}

impl Step {
    /// Runs this step against `handle`.
    pub fn execute(&self, handle: &DeviceHandle, timeout: Duration) -> ResponseCode {
        match self {
            Step::Message(text) => handle.write_message(text, timeout),
            Step::Keys(keys) => handle.write_keys(keys, timeout),
            Step::Chord(keys) => {
                let ordinals: Vec<u8> = keys.iter().map(|k| k.as_u8()).collect();
                handle.write_chord(&ordinals, timeout)
            }
            Step::Pause(duration) => {
                thread::sleep(*duration);
                ResponseCode::Ok
            }
        }
    }
}

/// Parses key names such as `"ctrl"`, `"F5"` or `"a"`.
///
/// # Errors
///
/// Returns the first name that is not a known key.
pub fn parse_keys<S: AsRef<str>>(names: &[S]) -> Result<Vec<KeyCode>, UnknownKeyName> {
    names.iter().map(|name| name.as_ref().parse()).collect()
}

/// Converts Windows line endings to `\n` so each line ends in one Enter.
///
/// Text files typed with `file` go through this; literal messages do not.
pub fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n")
}

/// Raw `[[step]]` table before validation.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawStep {
    message: Option<String>,
    keys: Option<Vec<String>>,
    chord: Option<Vec<String>>,
    pause_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawScript {
    #[serde(default, rename = "step")]
    steps: Vec<RawStep>,
}

impl RawStep {
    fn validate(self, index: usize) -> Result<Step, ScriptError> {
        let set = [
            self.message.is_some(),
            self.keys.is_some(),
            self.chord.is_some(),
            self.pause_ms.is_some(),
        ]
        .into_iter()
        .filter(|&present| present)
        .count();
        match set {
            0 => return Err(ScriptError::EmptyStep { index }),
            1 => {}
            _ => return Err(ScriptError::AmbiguousStep { index }),
        }

        let keys = |names: Vec<String>| {
            parse_keys(names.as_slice()).map_err(|source| ScriptError::UnknownKey { index, source })
        };

        if let Some(text) = self.message {
            Ok(Step::Message(text))
        } else if let Some(names) = self.keys {
            Ok(Step::Keys(keys(names)?))
        } else if let Some(names) = self.chord {
            Ok(Step::Chord(keys(names)?))
        } else {
            Ok(Step::Pause(Duration::from_millis(self.pause_ms.unwrap_or(0))))
        }
    }
}

/// How far a script got.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    /// Steps that returned `Ok`.
    pub completed: usize,
    /// `Ok` if every step succeeded, otherwise the first failing code.
    pub code: ResponseCode,
}

/// An ordered list of validated steps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Script {
    steps: Vec<Step>,
}

impl Script {
    /// Parses and validates a TOML script.  Step indices in errors are
    /// 1-based.
    ///
    /// # Errors
    ///
    /// Returns [`ScriptError`] for malformed TOML or an invalid step.  No
    /// step is run unless the whole script validates.
    pub fn from_toml_str(content: &str) -> Result<Self, ScriptError> {
        let raw: RawScript = toml::from_str(content)?;
        let steps = raw
            .steps
            .into_iter()
            .enumerate()
            .map(|(i, step)| step.validate(i + 1))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { steps })
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Runs each step in order, stopping at the first non-`Ok` code.
    pub fn run(&self, handle: &DeviceHandle, timeout: Duration) -> RunReport {
        for (completed, step) in self.steps.iter().enumerate() {
            debug!(index = completed + 1, ?step, "running step");
            let code = step.execute(handle, timeout);
            if !code.is_ok() {
                warn!(index = completed + 1, %code, "script stopped");
                return RunReport { completed, code };
            }
        }
        info!(steps = self.steps.len(), "script finished");
        RunReport {
            completed: self.steps.len(),
            code: ResponseCode::Ok,
        }
    }
}

impl From<Step> for Script {
    fn from(step: Step) -> Self {
        Self { steps: vec![step] }
    }
}

impl FromIterator<Step> for Script {
    fn from_iter<I: IntoIterator<Item = Step>>(iter: I) -> Self {
        Self {
            steps: iter.into_iter().collect(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
