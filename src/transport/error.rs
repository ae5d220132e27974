//! Transport failures shared by address lookups and deliveries.

use thiserror::Error;

/// A request that produced no response.
///
/// The resolver treats every variant as a failed source and moves on to the
/// secondary one; the notifier logs it against the destination.
#[derive(Debug, Error)]
pub enum HttpError {
    /// The host could not be reached (DNS, refused, reset, TLS).
    #[error("Connection error: {0}")]
    Connection(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// No response arrived within the request's bound.
    ///
    /// Also produced by callers wrapping a request in
    /// [`tokio::time::timeout`].
    #[error("Request timed out")]
    Timeout,

    /// The client rejected the URL before sending.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}
