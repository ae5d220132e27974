//! Application startup and utilities.
//!
//! This module contains exit codes, tracing setup, and error hints
//! that support the main entry point.

use std::fmt;

use pubip_watch::config::{ConfigError, defaults, field};
use pubip_watch::watch::{HEARTBEAT_TARGET, VERBOSE_TARGET};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::fmt::format::{FormatEvent, FormatFields, Writer};
use tracing_subscriber::registry::LookupSpan;

#[cfg(test)]
#[path = "app_tests.rs"]
mod tests;

/// Application exit codes.
pub mod exit_code {
    use std::process::ExitCode;

    /// Success (exit code 0).
    pub const SUCCESS: ExitCode = ExitCode::SUCCESS;

    /// Configuration error (exit code 1) - missing or malformed config file.
    pub const CONFIG_ERROR: ExitCode = ExitCode::FAILURE;

    /// Runtime error (exit code 2) - state file unreadable or unwritable.
    ///
    /// Note: This is a function rather than a constant because `ExitCode::from()` is not `const fn`.
    pub fn runtime_error() -> ExitCode {
        ExitCode::from(2)
    }
}

/// Prints helpful hints for common configuration errors.
pub fn print_config_hint(error: &ConfigError) {
    if let Some(hint) = config_hint(error) {
        eprintln!("\n{hint}");
    }
}

fn config_hint(error: &ConfigError) -> Option<String> {
    match error {
        ConfigError::FileRead { .. } => Some(format!(
            "Create the file, or point ${} at one. Minimal example:\n\n\
             [notify]\nurls = [\"ntfys://ntfy.sh/my-topic\"]",
            defaults::CONFIG_ENV
        )),
        ConfigError::MissingRequired { field: f, .. } if *f == field::NOTIFY_URLS => Some(
            "Add a [notify] table with a urls list, e.g.\n\n\
             [notify]\nurls = [\"ntfys://ntfy.sh/my-topic\"]"
                .to_string(),
        ),
        _ => None,
    }
}

/// Prints each event as `[TAG] message`.
///
/// The tag is `HEARTBEAT` or `VERBOSE` for events on those targets and the
/// level name otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct TagFormatter;

impl<S, N> FormatEvent<S, N> for TagFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let meta = event.metadata();
        write!(writer, "[{}] ", tag(meta.target(), *meta.level()))?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Returns the console tag for an event.
fn tag(target: &str, level: Level) -> &'static str {
    match target {
        HEARTBEAT_TARGET => "HEARTBEAT",
        VERBOSE_TARGET => "VERBOSE",
        _ => level.as_str(),
    }
}

/// Sets up the tracing subscriber for logging.
pub fn setup_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .event_format(TagFormatter)
        .init();
}
