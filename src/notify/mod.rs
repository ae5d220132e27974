//! Notification fan-out.
//!
//! A [`Notifier`] delivers a title and body to every configured
//! destination. Destinations are parsed from URL strings
//! ([`Destination`]). Each destination gets one bounded attempt; failures
//! are logged, never retried and never surfaced to the caller as errors.

mod destination;
mod error;
mod fanout;


pub use destination::{Destination, DestinationKind};
pub use error::{DeliveryError, DestinationError};
pub use fanout::FanoutNotifier;

/// Outcome of one fan-out, used for logging only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Destinations that accepted the notification.
    pub delivered: usize,
    /// Destinations whose delivery failed.
    pub failed: usize,
}

/// Sends notifications to every configured destination.
pub trait Notifier: Send + Sync {
    /// Delivers `title` and `body` to each destination in order.
    ///
    /// Per-destination failures are logged by the implementation and only
    /// counted in the returned report.
    fn send(
        &self,
        title: &str,
        body: &str,
    ) -> impl std::future::Future<Output = DeliveryReport> + Send;
}
