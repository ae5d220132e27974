//! Durable state carried between invocations.
//!
//! Two records are kept: the last notified public address (plain text)
//! and the heartbeat bookkeeping (JSON). Both live behind [`StateStore`]
//! so callers never touch the filesystem directly.
//!
//! Concurrent invocations sharing the same files are not guarded against.

mod file;

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;

pub use file::{ADDRESS_FILE, FileStateStore, HEARTBEAT_FILE};

use std::io;
use std::path::PathBuf;
use std::time::SystemTime;

use thiserror::Error;

use crate::heartbeat::HeartbeatRecord;

/// Errors that can occur while reading or writing state.
#[derive(Debug, Error)]
pub enum StateError {
    /// A state file exists but could not be read.
    #[error("Failed to read state file '{}': {source}", path.display())]
    Read {
        /// Path of the file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// A state file could not be written.
    #[error("Failed to write state file '{}': {source}", path.display())]
    Write {
        /// Path of the file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The heartbeat file exists but does not hold a valid record.
    #[error("Heartbeat file '{}' is malformed: {source}", path.display())]
    Malformed {
        /// Path of the file
        path: PathBuf,
        /// Underlying parse error
        #[source]
        source: serde_json::Error,
    },

    /// The heartbeat record could not be serialized.
    #[error("Failed to serialize heartbeat record: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Abstraction over the two durable records.
///
/// Implementations must:
/// - Treat a missing address record as the empty string
/// - Synthesize (without persisting) a fresh heartbeat record when none exists
/// - Fail on a malformed heartbeat record rather than silently resetting it
pub trait StateStore: Send + Sync {
    /// Loads the last notified address, trimmed.
    ///
    /// # Errors
    ///
    /// Returns an error if the record exists but cannot be read.
    fn load_address(&self) -> Result<String, StateError>;

    /// Overwrites the last notified address with exactly `address`.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be written.
    fn save_address(&self, address: &str) -> Result<(), StateError>;

    /// Loads the heartbeat record, or a fresh one stamped with `now`.
    ///
    /// # Errors
    ///
    /// Returns an error if the record exists but cannot be read or parsed.
    fn load_heartbeat(&self, now: SystemTime) -> Result<HeartbeatRecord, StateError>;

    /// Overwrites the heartbeat record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be serialized or written.
    fn save_heartbeat(&self, record: &HeartbeatRecord) -> Result<(), StateError>;
}
