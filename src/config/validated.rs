//! Validated configuration after merging CLI and TOML sources.
//!
//! This module contains the final, validated configuration that is used
//! by the application. All validation is performed during construction.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use handlebars::Handlebars;
use url::Url;

use crate::notify::Destination;

use super::cli::Cli;
use super::defaults;
use super::error::{ConfigError, field};
use super::toml::TomlConfig;

/// Fully validated configuration ready for use by the application.
#[derive(Debug)]
pub struct ValidatedConfig {
    /// Notification destinations, in delivery order
    pub destinations: Vec<Destination>,

    /// Title prefix for every notification
    pub title: String,

    /// Handlebars body template for plain webhook destinations
    pub body_template: Option<String>,

    /// Primary public address source
    pub primary_source: Url,

    /// Secondary public address source
    pub secondary_source: Url,

    /// Per-attempt timeout for address sources
    pub resolver_timeout: Duration,

    /// Directory holding the state files
    pub state_dir: PathBuf,

    /// Bound for one delivery to one destination
    pub delivery_timeout: Duration,

    /// Diagnostic mode
    pub verbose: bool,
}

impl fmt::Display for ValidatedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Config {{ destinations: {}, sources: {} -> {}, timeout: {}s, state_dir: {}, \
             delivery_timeout: {}s, verbose: {} }}",
            self.destinations.len(),
            self.primary_source,
            self.secondary_source,
            self.resolver_timeout.as_secs(),
            self.state_dir.display(),
            self.delivery_timeout.as_secs(),
            self.verbose,
        )
    }
}

/// Returns the configuration file path.
///
/// Uses `$PUBIP_WATCH_CONFIG` when set and non-empty, otherwise
/// `pubip-watch.toml` in the working directory.
#[must_use]
pub fn config_path() -> PathBuf {
    std::env::var_os(defaults::CONFIG_ENV)
        .filter(|value| !value.is_empty())
        .map_or_else(|| PathBuf::from(defaults::CONFIG_FILE), PathBuf::from)
}

impl ValidatedConfig {
    /// Creates a validated configuration from CLI arguments and the parsed file.
    ///
    /// `config_dir` is the directory holding the configuration file; state
    /// files default to it.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `notify.urls` is missing or holds an unusable destination
    /// - A source URL is invalid
    /// - A timeout is zero
    /// - The body template is invalid
    pub fn from_raw(cli: &Cli, toml: &TomlConfig, config_dir: &Path) -> Result<Self, ConfigError> {
        let destinations = Self::resolve_destinations(toml)?;

        let title = toml
            .notify
            .title
            .clone()
            .unwrap_or_else(|| defaults::TITLE.to_string());

        let body_template = Self::resolve_body_template(toml)?;

        let primary_source = parse_source(
            toml.resolver
                .primary
                .as_deref()
                .unwrap_or(defaults::PRIMARY_SOURCE),
        )?;
        let secondary_source = parse_source(
            toml.resolver
                .secondary
                .as_deref()
                .unwrap_or(defaults::SECONDARY_SOURCE),
        )?;

        let resolver_timeout = positive_secs(
            "resolver.timeout",
            toml.resolver.timeout.unwrap_or(defaults::RESOLVER_TIMEOUT_SECS),
        )?;
        let delivery_timeout = positive_secs(
            "notify.timeout",
            toml.notify.timeout.unwrap_or(defaults::DELIVERY_TIMEOUT_SECS),
        )?;

        let state_dir = Self::resolve_state_dir(toml, config_dir);

        Ok(Self {
            destinations,
            title,
            body_template,
            primary_source,
            secondary_source,
            resolver_timeout,
            state_dir,
            delivery_timeout,
            verbose: cli.verbose,
        })
    }

    /// Loads the configuration file from [`config_path`] and validates it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or the
    /// configuration is invalid.
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        Self::load_from(cli, &config_path())
    }

    /// Loads and validates the configuration file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or the
    /// configuration is invalid.
    pub fn load_from(cli: &Cli, path: &Path) -> Result<Self, ConfigError> {
        let toml = TomlConfig::load(path)?;
        let config_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        Self::from_raw(cli, &toml, config_dir)
    }

    fn resolve_destinations(toml: &TomlConfig) -> Result<Vec<Destination>, ConfigError> {
        let urls = toml.notify.urls.as_ref().ok_or_else(|| {
            ConfigError::missing(
                field::NOTIFY_URLS,
                "Set notify.urls to a list of destination URLs in the config file",
            )
        })?;

        urls.iter()
            .enumerate()
            .map(|(index, url)| {
                url.parse::<Destination>()
                    .map_err(|source| ConfigError::InvalidDestination { index, source })
            })
            .collect()
    }

    fn resolve_body_template(toml: &TomlConfig) -> Result<Option<String>, ConfigError> {
        let template = toml.notify.body_template.clone();

        if let Some(ref tmpl) = template {
            let hbs = Handlebars::new();
            hbs.render_template(tmpl, &serde_json::json!({ "title": "", "body": "" }))
                .map_err(|e| ConfigError::InvalidTemplate {
                    reason: e.to_string(),
                })?;
        }

        Ok(template)
    }

    fn resolve_state_dir(toml: &TomlConfig, config_dir: &Path) -> PathBuf {
        toml.state
            .dir
            .as_deref()
            .map_or_else(|| config_dir.to_path_buf(), expand_tilde)
    }
}

fn positive_secs(field: &'static str, seconds: u64) -> Result<Duration, ConfigError> {
    if seconds == 0 {
        return Err(ConfigError::InvalidDuration {
            field,
            reason: "must be greater than 0".to_string(),
        });
    }

    Ok(Duration::from_secs(seconds))
}

fn parse_source(url: &str) -> Result<Url, ConfigError> {
    Url::parse(url).map_err(|e| ConfigError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

/// Expands a leading `~` to the home directory, when one is known.
fn expand_tilde(path: &str) -> PathBuf {
    let home = dirs::home_dir();
    match (path, home) {
        ("~", Some(home)) => home,
        (p, Some(home)) if p.starts_with("~/") => home.join(&p[2..]),
        (p, _) => PathBuf::from(p),
    }
}
