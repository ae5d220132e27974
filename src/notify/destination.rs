//! Destination URL parsing.

use std::fmt;
use std::str::FromStr;

use url::Url;

use super::DestinationError;

/// Supported destination kinds, selected by URL scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestinationKind {
    /// `http://` / `https://`: POST a JSON object with `title` and `body`,
    /// or the rendered body template.
    Webhook,
    /// `json://` / `jsons://`: POST an Apprise-style JSON notification.
    AppriseJson,
    /// `ntfy://host/topic` / `ntfys://…`: POST the body as text with a
    /// `Title` header.
    Ntfy,
    /// `discord://webhook_id/webhook_token`: POST to the Discord webhook API.
    Discord,
}

impl DestinationKind {
    /// Short name used in logs and errors.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Webhook => "webhook",
            Self::AppriseJson => "json",
            Self::Ntfy => "ntfy",
            Self::Discord => "discord",
        }
    }
}

/// A parsed notification destination.
///
/// Holds the HTTP endpoint the notification is POSTed to. [`fmt::Display`]
/// prints only the scheme and host so tokens in paths stay out of logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    kind: DestinationKind,
    endpoint: Url,
}

const DISCORD_API: &str = "https://discord.com/api/webhooks";

impl Destination {
    /// Returns the destination kind.
    #[must_use]
    pub const fn kind(&self) -> DestinationKind {
        self.kind
    }

    /// Returns the HTTP endpoint requests are sent to.
    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

/// Rewrites `scheme://rest` to `http://rest` or `https://rest`.
fn rebase(raw: &str, secure: bool) -> Result<Url, DestinationError> {
    let rest = raw.split_once("://").map_or("", |(_, rest)| rest);
    let scheme = if secure { "https" } else { "http" };
    let rebuilt = format!("{scheme}://{rest}");

    Url::parse(&rebuilt).map_err(|e| DestinationError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })
}

fn has_path(url: &Url) -> bool {
    url.path_segments()
        .is_some_and(|mut segments| segments.any(|s| !s.is_empty()))
}

fn parse_discord(url: &Url) -> Result<Url, DestinationError> {
    let incomplete = |reason| DestinationError::Incomplete {
        kind: DestinationKind::Discord.name(),
        reason,
    };

    let id = url
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| incomplete("missing webhook id"))?;
    let token = url
        .path_segments()
        .and_then(|mut segments| segments.find(|s| !s.is_empty()))
        .ok_or_else(|| incomplete("missing webhook token"))?;

    Url::parse(&format!("{DISCORD_API}/{id}/{token}")).map_err(|e| {
        DestinationError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        }
    })
}

impl FromStr for Destination {
    type Err = DestinationError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        let url = Url::parse(raw).map_err(|e| DestinationError::InvalidUrl {
            url: raw.to_string(),
            reason: e.to_string(),
        })?;

        let scheme = url.scheme().to_string();
        let (kind, endpoint) = match scheme.as_str() {
            "http" | "https" => (DestinationKind::Webhook, url),
            "json" => (DestinationKind::AppriseJson, rebase(raw, false)?),
            "jsons" => (DestinationKind::AppriseJson, rebase(raw, true)?),
            scheme @ ("ntfy" | "ntfys") => {
                let endpoint = rebase(raw, scheme == "ntfys")?;
                if !has_path(&endpoint) {
                    return Err(DestinationError::Incomplete {
                        kind: DestinationKind::Ntfy.name(),
                        reason: "missing topic",
                    });
                }
                (DestinationKind::Ntfy, endpoint)
            }
            "discord" => (DestinationKind::Discord, parse_discord(&url)?),
            other => {
                return Err(DestinationError::UnsupportedScheme {
                    scheme: other.to_string(),
                });
            }
        };

        Ok(Self { kind, endpoint })
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({})",
            self.kind.name(),
            self.endpoint.host_str().unwrap_or("?")
        )
    }
}
