//! Error types for notification delivery.

use thiserror::Error;

use crate::transport::HttpError;

/// A destination URL that cannot be used.
#[derive(Debug, Error)]
pub enum DestinationError {
    /// The string is not a URL.
    #[error("Invalid destination URL '{url}': {reason}")]
    InvalidUrl {
        /// The offending URL
        url: String,
        /// Parser message
        reason: String,
    },

    /// The scheme is not one of the supported destination kinds.
    #[error("Unsupported notification scheme '{scheme}'")]
    UnsupportedScheme {
        /// The unrecognized scheme
        scheme: String,
    },

    /// The URL is missing a part its kind requires.
    #[error("Incomplete {kind} destination: {reason}")]
    Incomplete {
        /// The destination kind
        kind: &'static str,
        /// What is missing
        reason: &'static str,
    },
}

/// Failure to deliver to a single destination.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The request failed or exceeded the delivery timeout.
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    /// The destination answered with a non-2xx status.
    #[error("Non-success status {status}")]
    Status {
        /// Status code returned
        status: http::StatusCode,
        /// Response body, when it was valid UTF-8
        body: Option<String>,
    },

    /// The body template failed to render.
    #[error("Template rendering failed: {0}")]
    Template(String),

    /// The title cannot be carried in a header.
    #[error("Title is not a valid header value: {0}")]
    InvalidHeader(String),
}
