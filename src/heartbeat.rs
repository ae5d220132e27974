//! Liveness heartbeat bookkeeping.
//!
//! The heartbeat fires once a fixed window has elapsed since the current
//! window started, reporting how long the watcher has been running, how long
//! ago the address last changed, and how many changes were seen in total.

use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

use crate::time::unix_seconds;

const SECS_PER_DAY: f64 = 86_400.0;

/// Durable heartbeat state.
///
/// Timestamps are Unix epoch seconds. Integer and fractional values are both
/// accepted on read; the legacy field names `last_ip_change` and
/// `ip_change_count` are accepted as aliases.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HeartbeatRecord {
    /// Start of the current heartbeat window.
    pub start_time: f64,

    /// Time of the most recent detected address change.
    #[serde(alias = "last_ip_change")]
    pub last_change_time: f64,

    /// Number of detected address changes since the record was created.
    #[serde(alias = "ip_change_count")]
    pub change_count: u64,
}

impl HeartbeatRecord {
    /// Creates a record whose window and last change both start at `now`.
    #[must_use]
    pub fn fresh(now: SystemTime) -> Self {
        let now = unix_seconds(now);
        Self {
            start_time: now,
            last_change_time: now,
            change_count: 0,
        }
    }

    /// Records a detected address change at `now`.
    pub fn record_change(&mut self, now: SystemTime) {
        self.last_change_time = unix_seconds(now);
        self.change_count += 1;
    }

    /// Whole days elapsed since the window started.
    #[must_use]
    pub fn days_since_start(&self, now: SystemTime) -> u64 {
        whole_days(unix_seconds(now) - self.start_time)
    }

    /// Whole days elapsed since the last detected change.
    #[must_use]
    pub fn days_since_last_change(&self, now: SystemTime) -> u64 {
        whole_days(unix_seconds(now) - self.last_change_time)
    }
}

/// Truncates elapsed seconds to whole days. Negative spans count as zero.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn whole_days(elapsed_secs: f64) -> u64 {
    (elapsed_secs.max(0.0) / SECS_PER_DAY).floor() as u64
}

/// Outcome of a heartbeat evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    /// The window has elapsed. The caller must notify and then persist
    /// `record`, whose `start_time` has been reset.
    Due {
        /// Notification body.
        message: String,
        /// The record with a restarted window.
        record: HeartbeatRecord,
    },

    /// The window has not elapsed; the record is unchanged.
    NotDue,
}

impl Evaluation {
    /// Returns true if a heartbeat notification should be sent.
    #[must_use]
    pub const fn should_notify(&self) -> bool {
        matches!(self, Self::Due { .. })
    }
}

/// Decides when the heartbeat fires.
///
/// # Example
///
/// ```
/// use std::time::{Duration, SystemTime};
/// use pubip_watch::heartbeat::{HeartbeatPolicy, HeartbeatRecord};
///
/// let start = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000);
/// let record = HeartbeatRecord::fresh(start);
/// let policy = HeartbeatPolicy::default();
///
/// assert!(!policy.evaluate(&record, start).should_notify());
/// assert!(policy.evaluate(&record, start + policy.window()).should_notify());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeartbeatPolicy {
    window: Duration,
}

impl HeartbeatPolicy {
    /// Default window: 30 days.
    pub const DEFAULT_WINDOW: Duration = Duration::from_secs(30 * 86_400);

    /// Creates a policy with the given window.
    #[must_use]
    pub const fn new(window: Duration) -> Self {
        Self { window }
    }

    /// Returns the window length.
    #[must_use]
    pub const fn window(&self) -> Duration {
        self.window
    }

    /// Evaluates `record` at `now`.
    ///
    /// Does not persist anything.
    #[must_use]
    pub fn evaluate(&self, record: &HeartbeatRecord, now: SystemTime) -> Evaluation {
        let elapsed = unix_seconds(now) - record.start_time;
        if elapsed < self.window.as_secs_f64() {
            return Evaluation::NotDue;
        }

        let message = format!(
            "Heartbeat: watching for {} days.\nNo address change in {} days.\nTotal address changes: {}",
            record.days_since_start(now),
            record.days_since_last_change(now),
            record.change_count,
        );

        let mut record = *record;
        record.start_time = unix_seconds(now);

        Evaluation::Due { message, record }
    }
}

impl Default for HeartbeatPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_WINDOW)
    }
}
