//! Default values for configuration options.
//!
//! Centralized constants to avoid magic numbers scattered across the codebase.

use std::time::Duration;

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "PUBIP_WATCH_CONFIG";

/// Configuration file used when [`CONFIG_ENV`] is unset.
pub const CONFIG_FILE: &str = "pubip-watch.toml";

/// Default notification title.
pub const TITLE: &str = "PubIP Watch";

/// Primary public address source.
pub const PRIMARY_SOURCE: &str = "https://api.ipify.org";

/// Secondary public address source, used when the primary fails.
pub const SECONDARY_SOURCE: &str = "https://ifconfig.me/ip";

/// Per-attempt timeout for address sources, in seconds.
pub const RESOLVER_TIMEOUT_SECS: u64 = 5;

/// Minimum length of the diagnostic polling sweep, in seconds.
pub const DIAGNOSTIC_WINDOW_SECS: u64 = 300;

/// Pause between diagnostic polls, in seconds.
pub const DIAGNOSTIC_INTERVAL_SECS: u64 = 90;

/// Per-destination delivery timeout, in seconds.
pub const DELIVERY_TIMEOUT_SECS: u64 = 10;

/// Diagnostic sweep length as Duration.
#[must_use]
pub const fn diagnostic_window() -> Duration {
    Duration::from_secs(DIAGNOSTIC_WINDOW_SECS)
}

/// Diagnostic poll interval as Duration.
#[must_use]
pub const fn diagnostic_interval() -> Duration {
    Duration::from_secs(DIAGNOSTIC_INTERVAL_SECS)
}
