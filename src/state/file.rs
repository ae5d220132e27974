//! File-based state persistence implementation.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::heartbeat::HeartbeatRecord;

use super::{StateError, StateStore};

/// Default file name for the last notified address.
pub const ADDRESS_FILE: &str = "previous_ip.txt";

/// Default file name for the heartbeat record.
pub const HEARTBEAT_FILE: &str = "heartbeat.json";

/// File-based implementation of [`StateStore`].
///
/// # Atomic Writes
///
/// Both records are written to `{path}.tmp` and then renamed over the
/// target, so a crash mid-write leaves the previous contents in place.
#[derive(Debug, Clone)]
pub struct FileStateStore {
    address_path: PathBuf,
    heartbeat_path: PathBuf,
}

impl FileStateStore {
    /// Creates a store over explicit file paths.
    #[must_use]
    pub fn new(address_path: impl Into<PathBuf>, heartbeat_path: impl Into<PathBuf>) -> Self {
        Self {
            address_path: address_path.into(),
            heartbeat_path: heartbeat_path.into(),
        }
    }

    /// Creates a store using the default file names inside `dir`.
    #[must_use]
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(ADDRESS_FILE), dir.join(HEARTBEAT_FILE))
    }

    /// Returns the address file path.
    #[must_use]
    pub fn address_path(&self) -> &Path {
        &self.address_path
    }

    /// Returns the heartbeat file path.
    #[must_use]
    pub fn heartbeat_path(&self) -> &Path {
        &self.heartbeat_path
    }
}

/// Reads a file, mapping "not found" to `None`.
fn read_optional(path: &Path) -> Result<Option<String>, StateError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(source) => Err(StateError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Writes `content` to `path` via a temporary sibling and a rename.
fn write_atomic(path: &Path, content: &[u8]) -> Result<(), StateError> {
    let write_err = |source| StateError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
    }

    // state.json -> state.json.tmp, not state.tmp
    let temp_path = PathBuf::from(format!("{}.tmp", path.display()));

    std::fs::write(&temp_path, content).map_err(write_err)?;
    std::fs::rename(&temp_path, path).map_err(write_err)?;

    Ok(())
}

impl StateStore for FileStateStore {
    fn load_address(&self) -> Result<String, StateError> {
        Ok(read_optional(&self.address_path)?
            .map(|content| content.trim().to_string())
            .unwrap_or_default())
    }

    fn save_address(&self, address: &str) -> Result<(), StateError> {
        write_atomic(&self.address_path, address.as_bytes())
    }

    fn load_heartbeat(&self, now: SystemTime) -> Result<HeartbeatRecord, StateError> {
        let Some(content) = read_optional(&self.heartbeat_path)? else {
            tracing::debug!(
                "No heartbeat record at {}, starting fresh",
                self.heartbeat_path.display()
            );
            return Ok(HeartbeatRecord::fresh(now));
        };

        serde_json::from_str(&content).map_err(|source| StateError::Malformed {
            path: self.heartbeat_path.clone(),
            source,
        })
    }

    fn save_heartbeat(&self, record: &HeartbeatRecord) -> Result<(), StateError> {
        let content = serde_json::to_string(record).map_err(StateError::Serialize)?;
        write_atomic(&self.heartbeat_path, content.as_bytes())
    }
}
