//! CLI argument parsing using clap.

use clap::Parser;

/// pubip-watch: public IP change notifier
///
/// Checks the public IP address once, notifies every configured destination
/// when it changed since the last run, and sends a heartbeat every 30 days.
/// Meant to be run periodically by cron, a systemd timer or a task scheduler.
#[derive(Debug, Parser)]
#[command(name = "pubip-watch")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Diagnostic mode: log the public IP every 90 seconds for 5 minutes,
    /// then send a test notification (no change detection)
    #[arg(long, short)]
    pub verbose: bool,
}

impl Cli {
    /// Parses CLI arguments from the command line.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Parses CLI arguments from an iterator (useful for testing).
    pub fn parse_from_iter<I, T>(iter: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::parse_from(iter)
    }
}
