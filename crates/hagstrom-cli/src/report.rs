//! Turning a non-`Ok` response code into a diagnostic and an exit status.
//!
//! The process exits with the code's ordinal, so `0` is success and `1..=4`
//! identify the failure for calling scripts.

use std::io::{self, Write};
use std::process::ExitCode;

use hagstrom_core::ResponseCode;

/// One-line diagnostic printed for `code`.
pub fn diagnostic(code: ResponseCode) -> String {
    let hint = match code {
        ResponseCode::Ok => return "ok".to_string(),
        ResponseCode::Uninitialized => "the emulator was not initialized",
        ResponseCode::DataFormatting => "input contains a character or key the emulator cannot type",
        ResponseCode::DeviceNotFound => "check the port name and that the emulator is plugged in",
        ResponseCode::LockPoisoned => "an earlier operation aborted; restart the command",
    };
    format!("error {}: {} ({hint})", code.as_u8(), code.description())
}

/// Process exit status for `code`.
pub fn exit_code(code: ResponseCode) -> ExitCode {
    ExitCode::from(code.as_u8())
}

/// Writes the diagnostic for a non-`Ok` code to `out` and returns the
/// matching exit status.
pub fn report_to<W: Write>(code: ResponseCode, out: &mut W) -> ExitCode {
    if !code.is_ok() {
        // Nothing useful can be done if stderr itself is gone.
        let _ = writeln!(out, "hagstrom: {}", diagnostic(code));
    }
    exit_code(code)
}

/// [`report_to`] on standard error.
pub fn report(code: ResponseCode) -> ExitCode {
    report_to(code, &mut io::stderr().lock())
}
