//! Logger bootstrap for the CLI.
//!
//! The core only talks to the `log` facade; this is the one place that picks
//! a backend. Everything goes to stderr so stdout stays parseable with
//! `--format json`.

use flexi_logger::{Logger, LoggerHandle, WriteMode};
use log::debug;

pub const DEFAULT_LEVEL: &str = "warn";

/// Starts the stderr logger. Keep the returned handle alive for the whole run.
pub fn init_logging(level: &str) -> Result<LoggerHandle, String> {
    let level = normalize_level(level).ok_or_else(|| {
        format!("unsupported log level `{level}`; expected off|error|warn|info|debug|trace")
    })?;
    let handle = Logger::try_with_str(level)
        .map_err(|err| format!("invalid log level `{level}`: {err}"))?
        .log_to_stderr()
        .format_for_stderr(flexi_logger::default_format)
        .write_mode(WriteMode::Direct)
        .start()
        .map_err(|err| format!("failed to start logger: {err}"))?;

    debug!(
        "event=cli_start module=cli status=ok level={level} version={}",
        env!("CARGO_PKG_VERSION")
    );
    Ok(handle)
}

pub fn normalize_level(level: &str) -> Option<&'static str> {
    match level.trim().to_ascii_lowercase().as_str() {
        "off" => Some("off"),
        "trace" => Some("trace"),
        "debug" => Some("debug"),
        "info" => Some("info"),
        "warn" | "warning" => Some("warn"),
        "error" => Some("error"),
        _ => None,
    }
}
