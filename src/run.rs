//! Application execution logic.
//!
//! Wires the production resolver, notifier and state store from the
//! validated configuration and runs a single invocation.

use pubip_watch::config::ValidatedConfig;
use pubip_watch::notify::FanoutNotifier;
use pubip_watch::resolver::HttpResolver;
use pubip_watch::state::FileStateStore;
use pubip_watch::transport::ReqwestClient;
use pubip_watch::watch::{Mode, Outcome, RunError, Watcher};

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;

/// Type alias for the application's watcher.
type AppWatcher = Watcher<HttpResolver<ReqwestClient>, FanoutNotifier<ReqwestClient>, FileStateStore>;

/// Executes one invocation.
///
/// # Errors
///
/// Returns an error if the state files cannot be read, parsed or written.
///
/// # Coverage Note
///
/// This function is excluded from coverage because it performs real
/// network requests.
#[cfg(not(tarpaulin_include))]
pub async fn execute(config: ValidatedConfig) -> Result<Outcome, RunError> {
    let mode = Mode::from_verbose(config.verbose);
    let watcher = create_watcher(config, ReqwestClient::new());

    if mode == Mode::Diagnostic {
        tracing::info!(target: pubip_watch::watch::VERBOSE_TARGET, "Diagnostic mode enabled");
    }

    watcher.run(mode).await
}

/// Builds the watcher from configuration, sharing one HTTP client.
fn create_watcher(config: ValidatedConfig, client: ReqwestClient) -> AppWatcher {
    let resolver = HttpResolver::new(
        client.clone(),
        config.primary_source,
        config.secondary_source,
        config.resolver_timeout,
    );

    let mut notifier =
        FanoutNotifier::new(client, config.destinations).with_timeout(config.delivery_timeout);
    if let Some(template) = config.body_template {
        notifier = notifier.with_body_template(template);
    }

    let store = FileStateStore::in_dir(&config.state_dir);
    tracing::debug!(
        "State files: {}, {}",
        store.address_path().display(),
        store.heartbeat_path().display()
    );

    Watcher::new(resolver, notifier, store, config.title)
}
