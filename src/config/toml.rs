//! TOML configuration file parsing.
//!
//! Defines the structure of the configuration file with serde.

use std::path::Path;

use serde::Deserialize;

use super::ConfigError;

/// Root configuration structure from TOML file.
///
/// All fields are optional at this layer; required fields are enforced
/// by [`ValidatedConfig`](super::ValidatedConfig).
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    /// Notification destinations and message settings
    #[serde(default)]
    pub notify: NotifySection,

    /// Public address sources
    #[serde(default)]
    pub resolver: ResolverSection,

    /// State file location
    #[serde(default)]
    pub state: StateSection,
}

/// Notification section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NotifySection {
    /// Destination URLs, delivered in order
    pub urls: Option<Vec<String>>,

    /// Title prefix for every notification
    pub title: Option<String>,

    /// Handlebars body template for plain webhook destinations
    pub body_template: Option<String>,

    /// Per-destination delivery timeout in seconds
    pub timeout: Option<u64>,
}

/// Address source section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResolverSection {
    /// Primary source URL
    pub primary: Option<String>,

    /// Secondary source URL
    pub secondary: Option<String>,

    /// Per-attempt timeout in seconds
    pub timeout: Option<u64>,
}

/// State section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StateSection {
    /// Directory holding the state files (`~` is expanded)
    pub dir: Option<String>,
}

impl TomlConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::parse(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::from)
    }
}
