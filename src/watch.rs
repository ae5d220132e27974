//! One invocation of the watcher.
//!
//! Every invocation evaluates the heartbeat first, then either performs a
//! single change-detection cycle (normal mode) or a time-boxed diagnostic
//! sweep (diagnostic mode).

use std::time::{Duration, SystemTime};

use chrono::{DateTime, Local};
use thiserror::Error;

use crate::config::defaults;
use crate::heartbeat::{Evaluation, HeartbeatPolicy, HeartbeatRecord};
use crate::notify::Notifier;
use crate::resolver::AddressResolver;
use crate::state::{StateError, StateStore};
use crate::time::{Clock, SystemClock};

#[cfg(test)]
#[path = "watch_tests.rs"]
mod tests;

/// Log target for heartbeat events.
pub const HEARTBEAT_TARGET: &str = "heartbeat";

/// Log target for diagnostic-mode events.
pub const VERBOSE_TARGET: &str = "verbose";

/// Body of the diagnostic test notification.
pub const TEST_MESSAGE: &str = "Test: 5 minutes elapsed in verbose mode.";

/// Fatal errors of an invocation.
#[derive(Debug, Error)]
pub enum RunError {
    /// Failed to load or save state.
    #[error("State error: {0}")]
    State(#[from] StateError),
}

/// Selects what an invocation does after the heartbeat check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// One change-detection cycle.
    Normal,
    /// Poll and log the address for a fixed window, then send a test
    /// notification.
    Diagnostic,
}

impl Mode {
    /// Diagnostic when `verbose` is set, normal otherwise.
    #[must_use]
    pub const fn from_verbose(verbose: bool) -> Self {
        if verbose { Self::Diagnostic } else { Self::Normal }
    }
}

/// What an invocation did after the heartbeat check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// No source produced an address; nothing was sent or stored.
    Unavailable,
    /// The address matches the stored one; nothing was sent or stored.
    Unchanged {
        /// The current address
        address: String,
    },
    /// The address changed; a check-in was sent and state was updated.
    Changed {
        /// The previously stored address (empty on first run)
        previous: String,
        /// The new address
        current: String,
    },
    /// The diagnostic sweep finished and the test notification was sent.
    DiagnosticComplete {
        /// Number of polls performed
        polls: u32,
    },
}

/// Ties resolver, notifier and state together for one invocation.
///
/// # Type Parameters
///
/// - `R`: Address resolver
/// - `N`: Notifier
/// - `S`: State store
/// - `C`: Wall clock for heartbeat bookkeeping (defaults to [`SystemClock`])
#[derive(Debug)]
pub struct Watcher<R, N, S, C = SystemClock> {
    resolver: R,
    notifier: N,
    store: S,
    clock: C,
    heartbeat: HeartbeatPolicy,
    title: String,
    diagnostic_window: Duration,
    diagnostic_interval: Duration,
}

impl<R, N, S> Watcher<R, N, S, SystemClock> {
    /// Creates a watcher with the system clock and default timings.
    #[must_use]
    pub fn new(resolver: R, notifier: N, store: S, title: impl Into<String>) -> Self {
        Self {
            resolver,
            notifier,
            store,
            clock: SystemClock,
            heartbeat: HeartbeatPolicy::default(),
            title: title.into(),
            diagnostic_window: defaults::diagnostic_window(),
            diagnostic_interval: defaults::diagnostic_interval(),
        }
    }
}

impl<R, N, S, C> Watcher<R, N, S, C> {
    /// Replaces the wall clock.
    #[must_use]
    pub fn with_clock<C2>(self, clock: C2) -> Watcher<R, N, S, C2> {
        Watcher {
            resolver: self.resolver,
            notifier: self.notifier,
            store: self.store,
            clock,
            heartbeat: self.heartbeat,
            title: self.title,
            diagnostic_window: self.diagnostic_window,
            diagnostic_interval: self.diagnostic_interval,
        }
    }

    /// Returns the notifier.
    #[must_use]
    pub const fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Returns the resolver.
    #[must_use]
    pub const fn resolver(&self) -> &R {
        &self.resolver
    }

    /// Returns the state store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Returns the title of change notifications.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    fn heartbeat_title(&self) -> String {
        format!("{} Heartbeat", self.title)
    }

    fn test_title(&self) -> String {
        format!("{} Test", self.title)
    }
}

/// Composes the body of a change notification.
#[must_use]
pub fn check_in_message(address: &str, now: SystemTime) -> String {
    let date = DateTime::<Local>::from(now).format("%m/%d/%Y");
    format!("Public IP Check-In - {date}\n\n{address}")
}

impl<R, N, S, C> Watcher<R, N, S, C>
where
    R: AddressResolver,
    N: Notifier,
    S: StateStore,
    C: Clock,
{
    /// Runs one invocation.
    ///
    /// # Errors
    ///
    /// Returns an error if state cannot be loaded or saved. Resolution and
    /// delivery failures are logged and never returned.
    pub async fn run(&self, mode: Mode) -> Result<Outcome, RunError> {
        let now = self.clock.now();
        let mut record = self.store.load_heartbeat(now)?;

        self.check_heartbeat(&mut record, now).await?;

        match mode {
            Mode::Normal => self.detect_change(&mut record, now).await,
            Mode::Diagnostic => Ok(self.run_diagnostic().await),
        }
    }

    /// Sends and persists the heartbeat when due.
    ///
    /// Returns true if the heartbeat fired.
    async fn check_heartbeat(
        &self,
        record: &mut HeartbeatRecord,
        now: SystemTime,
    ) -> Result<bool, RunError> {
        let Evaluation::Due {
            message,
            record: updated,
        } = self.heartbeat.evaluate(record, now)
        else {
            return Ok(false);
        };

        self.notifier.send(&self.heartbeat_title(), &message).await;
        tracing::info!(target: HEARTBEAT_TARGET, "Heartbeat notification sent");

        *record = updated;
        self.store.save_heartbeat(record)?;

        Ok(true)
    }

    /// Resolves the address once and notifies when it changed.
    async fn detect_change(
        &self,
        record: &mut HeartbeatRecord,
        now: SystemTime,
    ) -> Result<Outcome, RunError> {
        let current = match self.resolver.resolve().await {
            Ok(address) => address,
            Err(e) => {
                tracing::error!("Could not retrieve public IP, no notification sent: {e}");
                return Ok(Outcome::Unavailable);
            }
        };

        let previous = self.store.load_address()?;
        if current == previous {
            tracing::debug!("Public IP unchanged ({current})");
            return Ok(Outcome::Unchanged { address: current });
        }

        tracing::info!("Public IP changed: '{previous}' -> '{current}'");

        self.notifier
            .send(self.title(), &check_in_message(&current, now))
            .await;

        self.store.save_address(&current)?;
        record.record_change(now);
        self.store.save_heartbeat(record)?;

        Ok(Outcome::Changed { previous, current })
    }

    /// Polls and logs the address until the diagnostic window has elapsed,
    /// then sends one test notification.
    async fn run_diagnostic(&self) -> Outcome {
        let start = tokio::time::Instant::now();
        let mut polls = 0;

        loop {
            polls += 1;
            match self.resolver.resolve().await {
                Ok(address) => {
                    tracing::info!(target: VERBOSE_TARGET, "Current public IP: {address}");
                }
                Err(e) => {
                    tracing::info!(target: VERBOSE_TARGET, "Could not retrieve public IP: {e}");
                }
            }

            tokio::time::sleep(self.diagnostic_interval).await;

            if start.elapsed() >= self.diagnostic_window {
                break;
            }
        }

        self.notifier.send(&self.test_title(), TEST_MESSAGE).await;
        tracing::info!(target: VERBOSE_TARGET, "Test notification sent");

        Outcome::DiagnosticComplete { polls }
    }
}
