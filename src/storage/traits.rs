//! Checkpoint store trait and error types

use crate::state::{Record, Stats};
use crate::storage::Checkpoint;
use thiserror::Error;

/// Errors that can occur during checkpoint operations
#[derive(Debug, Error)]
pub enum StorageError {
    /// The artifact exists but does not decode as a checkpoint
    #[error("Checkpoint {path} is corrupt: {message}")]
    Corrupt { path: String, message: String },

    /// The artifact exists but could not be read
    #[error("Failed to read checkpoint {path}: {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A save did not reach durable storage
    #[error("Failed to write checkpoint {path}: {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl StorageError {
    /// Returns true if a fresh sweep may replace the artifact
    pub fn is_corrupt(&self) -> bool {
        matches!(self, Self::Corrupt { .. })
    }
}

/// Result type for checkpoint operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Durable snapshot storage for a sweep
///
/// Each save fully supersedes the previous one. Implementations must make a
/// save all-or-nothing: a crash mid-save leaves either the previous
/// checkpoint or the new one, never something `load` cannot decode.
pub trait CheckpointStore: Send {
    /// Loads the latest checkpoint
    ///
    /// # Returns
    ///
    /// * `Ok(Some(Checkpoint))` - A checkpoint was found and decoded
    /// * `Ok(None)` - No checkpoint exists yet
    /// * `Err(StorageError::Corrupt)` - The artifact is unreadable as a checkpoint
    fn load(&self) -> StorageResult<Option<Checkpoint>>;

    /// Persists the records collected so far together with the counters
    ///
    /// The save timestamp is taken at call time.
    fn save(&mut self, records: &[Record], stats: &Stats) -> StorageResult<()>;
}
