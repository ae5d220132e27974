//! Configuration layer for pubip-watch.
//!
//! This module provides:
//! - CLI argument parsing ([`Cli`])
//! - TOML configuration file parsing ([`TomlConfig`])
//! - Validated configuration ([`ValidatedConfig`])
//! - Default values ([`defaults`])
//!
//! # Location
//!
//! The configuration file is read from `$PUBIP_WATCH_CONFIG`, or
//! `pubip-watch.toml` in the working directory when the variable is unset.
//! A missing or malformed file is fatal.
//!
//! # Required Keys
//!
//! Only `notify.urls` is required. Everything else falls back to
//! [`defaults`]; state files default to the directory holding the
//! configuration file.
//!
//! # Fixed Parameters
//!
//! The 30-day heartbeat window and the diagnostic cadence (poll every 90 s
//! for at least 300 s) are not configurable.

mod cli;
pub mod defaults;
mod error;
mod toml;
mod validated;


pub use cli::Cli;
pub use error::{ConfigError, field};
pub use toml::TomlConfig;
pub use validated::{ValidatedConfig, config_path};
