//! `hagstrom` command-line entry point.
//!
//! ```text
//! hagstrom --port COM3 type "Hello, world!"
//! hagstrom --port COM3 keys ctrl a
//! hagstrom --port COM3 chord meta r
//! hagstrom --port COM3 file notes.txt
//! hagstrom --config lab.toml run login.toml
//! ```
//!
//! Each invocation opens the device once, runs its steps, and exits with the
//! first non-`Ok` response code as the process status.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use hagstrom_cli::{
    load_config, normalize_line_endings, parse_keys, report, Overrides, Script, Step,
};
use hagstrom_core::DeviceHandle;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Types text and key presses through a Hagstrom USB keyboard emulator.
#[derive(Debug, Parser)]
#[command(name = "hagstrom", version)]
struct Cli {
    /// Serial port the emulator is attached to (e.g. COM3, /dev/ttyUSB0).
    #[arg(long, global = true, env = "HAGSTROM_PORT")]
    port: Option<String>,

    /// Per-write deadline in milliseconds.
    #[arg(long, global = true, env = "HAGSTROM_TIMEOUT_MS")]
    timeout_ms: Option<u64>,

    /// Configuration file.  Defaults to ./hagstrom.toml if present.
    #[arg(long, global = true, env = "HAGSTROM_CONFIG")]
    config: Option<PathBuf>,

    /// Log level used when RUST_LOG is unset.
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Type a message.
    Type {
        text: String,
    },
    /// Press and release keys one after another.
    Keys {
        #[arg(required = true)]
        keys: Vec<String>,
    },
    /// Hold keys together, then release them in reverse.
    Chord {
        #[arg(required = true)]
        keys: Vec<String>,
    },
    /// Type the contents of a text file.  CRLF line endings type one Enter.
    File {
        path: PathBuf,
    },
    /// Run a TOML script of [[step]] entries.
    Run {
        script: PathBuf,
    },
}

impl Command {
    /// Resolves the subcommand into the steps to play.
    fn into_script(self) -> anyhow::Result<Script> {
        let script = match self {
            Command::Type { text } => Script::from(Step::Message(text)),
            Command::Keys { keys } => Script::from(Step::Keys(parse_keys(keys.as_slice())?)),
            Command::Chord { keys } => Script::from(Step::Chord(parse_keys(keys.as_slice())?)),
            Command::File { path } => {
                let text = std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                Script::from(Step::Message(normalize_line_endings(&text)))
            }
            Command::Run { script } => {
                let content = std::fs::read_to_string(&script)
                    .with_context(|| format!("failed to read script {}", script.display()))?;
                Script::from_toml_str(&content)
                    .with_context(|| format!("invalid script {}", script.display()))?
            }
        };
        Ok(script)
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref()).context("failed to load configuration")?;
    config.apply(Overrides {
        port: cli.port,
        timeout_ms: cli.timeout_ms,
        log_level: cli.log_level,
    });

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .init();

    // Validate everything before touching the device.
    let script = cli.command.into_script()?;
    let port = config.port()?;
    let timeout = config.timeout();

    let device = DeviceHandle::with_serial_config(config.serial.clone());
    let code = device.initialize(port);
    if !code.is_ok() {
        return Ok(report(code));
    }

    let outcome = script.run(&device, timeout);
    info!(
        port,
        completed = outcome.completed,
        total = script.steps().len(),
        code = %outcome.code,
        "done"
    );
    Ok(report(outcome.code))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
