//! HTTP fan-out notifier.

use std::time::Duration;

use handlebars::Handlebars;
use http::header::{CONTENT_TYPE, HeaderName, HeaderValue};
use serde::Serialize;
use serde_json::json;

use crate::transport::{HttpClient, HttpError, HttpRequest};

use super::{DeliveryError, DeliveryReport, Destination, DestinationKind, Notifier};

/// Delivers each notification to every destination, one after another.
///
/// Each destination gets a single attempt bounded by the delivery timeout.
/// A failed destination is logged and skipped.
///
/// # Template Support
///
/// Plain webhook destinations POST `{"title": …, "body": …}` unless a
/// Handlebars body template is set, in which case the rendered template is
/// sent instead. Available variables: `title`, `body`.
#[derive(Debug)]
pub struct FanoutNotifier<H> {
    client: H,
    destinations: Vec<Destination>,
    body_template: Option<String>,
    timeout: Duration,
}

impl<H> FanoutNotifier<H> {
    /// Default bound for one delivery: 10 seconds.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Creates a notifier over `destinations` with the default timeout.
    #[must_use]
    pub fn new(client: H, destinations: Vec<Destination>) -> Self {
        Self {
            client,
            destinations,
            body_template: None,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Sets the body template for plain webhook destinations.
    #[must_use]
    pub fn with_body_template(mut self, template: impl Into<String>) -> Self {
        self.body_template = Some(template.into());
        self
    }

    /// Sets the bound for a single delivery.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the configured destinations.
    #[must_use]
    pub fn destinations(&self) -> &[Destination] {
        &self.destinations
    }

    /// Returns the delivery timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the underlying HTTP client.
    #[must_use]
    pub const fn client(&self) -> &H {
        &self.client
    }
}

#[derive(Serialize)]
struct TemplateData<'a> {
    title: &'a str,
    body: &'a str,
}

fn json_body(value: &serde_json::Value) -> Vec<u8> {
    value.to_string().into_bytes()
}

/// Renders `template` with `title` and `body`, without HTML escaping.
fn render_template(template: &str, title: &str, body: &str) -> Result<Vec<u8>, DeliveryError> {
    let mut handlebars = Handlebars::new();
    handlebars.register_escape_fn(handlebars::no_escape);
    handlebars
        .render_template(template, &TemplateData { title, body })
        .map(String::into_bytes)
        .map_err(|e| DeliveryError::Template(e.to_string()))
}

impl<H: HttpClient> FanoutNotifier<H> {
    /// Builds the request a destination expects.
    fn build_request(
        &self,
        destination: &Destination,
        title: &str,
        body: &str,
    ) -> Result<HttpRequest, DeliveryError> {
        let request = HttpRequest::post(destination.endpoint().clone()).with_timeout(self.timeout);
        let json_type = HeaderValue::from_static("application/json");

        let request = match destination.kind() {
            DestinationKind::Webhook => match &self.body_template {
                Some(template) => request.with_body(render_template(template, title, body)?),
                None => request
                    .with_header(CONTENT_TYPE, json_type)
                    .with_body(json_body(&json!({ "title": title, "body": body }))),
            },
            DestinationKind::AppriseJson => request.with_header(CONTENT_TYPE, json_type).with_body(
                json_body(&json!({
                    "version": "1.0",
                    "title": title,
                    "message": body,
                    "type": "info",
                })),
            ),
            DestinationKind::Ntfy => {
                let title = HeaderValue::from_str(title)
                    .map_err(|e| DeliveryError::InvalidHeader(e.to_string()))?;
                request
                    .with_header(HeaderName::from_static("title"), title)
                    .with_body(body.as_bytes().to_vec())
            }
            DestinationKind::Discord => request.with_header(CONTENT_TYPE, json_type).with_body(
                json_body(&json!({ "content": format!("**{title}**\n{body}") })),
            ),
        };

        Ok(request)
    }

    /// Delivers to one destination with a single bounded attempt.
    async fn deliver(
        &self,
        destination: &Destination,
        title: &str,
        body: &str,
    ) -> Result<(), DeliveryError> {
        let request = self.build_request(destination, title, body)?;

        let response = tokio::time::timeout(self.timeout, self.client.request(request))
            .await
            .map_err(|_| HttpError::Timeout)??;

        if response.is_success() {
            return Ok(());
        }

        Err(DeliveryError::Status {
            status: response.status,
            body: response.body_text().map(ToString::to_string),
        })
    }
}

impl<H: HttpClient> Notifier for FanoutNotifier<H> {
    async fn send(&self, title: &str, body: &str) -> DeliveryReport {
        let mut report = DeliveryReport::default();

        if self.destinations.is_empty() {
            tracing::warn!("No notification destinations configured, dropping '{title}'");
            return report;
        }

        for destination in &self.destinations {
            match self.deliver(destination, title, body).await {
                Ok(()) => {
                    tracing::debug!("Notification '{title}' delivered to {destination}");
                    report.delivered += 1;
                }
                Err(e) => {
                    tracing::error!("Notification '{title}' to {destination} failed: {e}");
                    report.failed += 1;
                }
            }
        }

        report
    }
}
