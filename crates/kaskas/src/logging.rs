//! Logging initialisation.
//!
//! The verbosity comes from the `LOGLEVEL` environment variable, falling
//! back to the level the caller asks for. Level names are accepted in the
//! spelling operators are used to (`WARNING`, `critical`, ...) as well as
//! full `tracing` filter directives such as `info,kaskas::device=debug`.

use std::io::{self, IsTerminal};

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter.
pub const LOG_LEVEL_ENV: &str = "LOGLEVEL";

/// Level used when neither `LOGLEVEL` nor the caller name one.
pub const DEFAULT_LEVEL: &str = "warn";

/// Installs a global `fmt` subscriber writing to stderr.
///
/// Returns `false` if a global subscriber was already installed, in which
/// case nothing changes. Calling this more than once is harmless.
pub fn init(level: Option<&str>) -> bool {
    let raw = std::env::var(LOG_LEVEL_ENV)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .or_else(|| level.map(str::to_string))
        .unwrap_or_else(|| DEFAULT_LEVEL.to_string());

    let (filter, rejected) = match EnvFilter::try_new(filter_directive(&raw)) {
        Ok(filter) => (filter, None),
        Err(error) => (EnvFilter::new(DEFAULT_LEVEL), Some(error)),
    };

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .try_init()
        .is_ok();
    if let (true, Some(error)) = (installed, rejected) {
        tracing::warn!(filter = %raw, %error, "invalid log filter, using {DEFAULT_LEVEL}");
    }
    installed
}

/// Maps a level name to a filter directive; anything else passes through.
fn filter_directive(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed.to_ascii_lowercase().as_str() {
        "warning" => "warn".to_string(),
        "critical" | "fatal" => "error".to_string(),
        "notset" => "trace".to_string(),
        level @ ("trace" | "debug" | "info" | "warn" | "error" | "off") => level.to_string(),
        _ => trimmed.to_string(),
    }
}
