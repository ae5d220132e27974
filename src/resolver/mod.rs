//! Public address resolution.
//!
//! Asks a primary plain-text "what is my IP" service for the caller's
//! public address and falls back to a secondary service once when the
//! primary fails. There is no further retry.

mod http_source;

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;

pub use http_source::HttpResolver;

use thiserror::Error;

use crate::transport::HttpError;

/// Failure of a single address source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The request could not be completed (network error, timeout, bad URL).
    #[error(transparent)]
    Http(#[from] HttpError),

    /// The source answered with a non-2xx status.
    #[error("Unexpected status {status}")]
    Status {
        /// Status returned by the source
        status: http::StatusCode,
    },

    /// The response body was not valid UTF-8.
    #[error("Response body is not valid UTF-8")]
    InvalidBody,
}

/// Error returned when no source produced an address.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Both the primary and the secondary source failed.
    #[error("Public address unavailable (primary: {primary}; secondary: {secondary})")]
    Unavailable {
        /// Why the primary source failed
        primary: SourceError,
        /// Why the secondary source failed
        secondary: SourceError,
    },
}

/// Resolves the caller's current public address.
///
/// The address is an opaque, whitespace-trimmed string. No IP parsing
/// is applied, so IPv4 and IPv6 answers are handled alike.
pub trait AddressResolver: Send + Sync {
    /// Returns the current public address.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Unavailable`] when every source failed.
    fn resolve(&self) -> impl std::future::Future<Output = Result<String, ResolveError>> + Send;
}
