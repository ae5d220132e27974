//! HTTP-backed address resolver.

use std::time::Duration;

use url::Url;

use crate::transport::{HttpClient, HttpError, HttpRequest};

use super::{AddressResolver, ResolveError, SourceError};

/// Resolver that queries two plain-text HTTP sources in order.
///
/// Each attempt is bounded by `timeout`. The response body is trimmed
/// and returned as-is.
#[derive(Debug)]
pub struct HttpResolver<H> {
    client: H,
    primary: Url,
    secondary: Url,
    timeout: Duration,
}

impl<H> HttpResolver<H> {
    /// Creates a resolver over the given sources.
    #[must_use]
    pub const fn new(client: H, primary: Url, secondary: Url, timeout: Duration) -> Self {
        Self {
            client,
            primary,
            secondary,
            timeout,
        }
    }

    /// Returns the underlying HTTP client.
    #[must_use]
    pub const fn client(&self) -> &H {
        &self.client
    }

    /// Returns the primary source URL.
    #[must_use]
    pub const fn primary(&self) -> &Url {
        &self.primary
    }

    /// Returns the secondary source URL.
    #[must_use]
    pub const fn secondary(&self) -> &Url {
        &self.secondary
    }

    /// Returns the per-attempt timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl<H: HttpClient> HttpResolver<H> {
    async fn query(&self, url: &Url) -> Result<String, SourceError> {
        let request = HttpRequest::get(url.clone()).with_timeout(self.timeout);

        let response = tokio::time::timeout(self.timeout, self.client.request(request))
            .await
            .map_err(|_| HttpError::Timeout)??;

        if !response.is_success() {
            return Err(SourceError::Status {
                status: response.status,
            });
        }

        response
            .body_text()
            .map(|text| text.trim().to_string())
            .ok_or(SourceError::InvalidBody)
    }
}

impl<H: HttpClient> AddressResolver for HttpResolver<H> {
    async fn resolve(&self) -> Result<String, ResolveError> {
        let primary = match self.query(&self.primary).await {
            Ok(address) => return Ok(address),
            Err(e) => e,
        };

        tracing::debug!(
            "Primary source {} failed ({primary}), trying {}",
            self.primary,
            self.secondary
        );

        match self.query(&self.secondary).await {
            Ok(address) => Ok(address),
            Err(secondary) => Err(ResolveError::Unavailable { primary, secondary }),
        }
    }
}
