//! Error taxonomy for the sync core.
//!
//! Transform failures on individual batch members are caught at the sync
//! engine boundary and degrade to drop-and-count; everything else propagates
//! to the caller. There is no retry logic anywhere in this crate - the
//! periodic sync loop is the only resilience mechanism.

use thiserror::Error;

/// Persistence layer failures. Always fatal to the current operation.
#[derive(Debug, Error)]
pub enum StoreError {
  #[error("database error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("failed to serialize payload: {0}")]
  Serialize(#[from] serde_json::Error),

  #[error("store lock poisoned")]
  LockPoisoned,

  #[error("could not determine data directory")]
  NoDataDir,

  #[error("failed to create store directory: {0}")]
  Io(#[from] std::io::Error),
}

/// Failures surfaced by the sync engine and the query facade.
#[derive(Debug, Error)]
pub enum SyncError {
  /// Transport/HTTP failure or malformed response from the catalog source.
  #[error("network error: {reason}")]
  Network { reason: String },

  /// The requested id has no upstream record.
  #[error("no upstream record for item {id}")]
  NotFound { id: i64 },

  /// A summary could not be mapped to an item (e.g. malformed reference URL).
  #[error("cannot transform summary: {reason}")]
  Transform { reason: String },

  #[error(transparent)]
  Store(#[from] StoreError),
}

impl From<reqwest::Error> for SyncError {
  fn from(e: reqwest::Error) -> Self {
    SyncError::Network {
      reason: e.to_string(),
    }
  }
}
