//! JSON file checkpoint store
//!
//! Saves go to a temporary file in the checkpoint's directory which is then
//! renamed over the previous checkpoint, so the visible artifact is always a
//! complete document.

use crate::state::{Record, Stats};
use crate::storage::traits::{CheckpointStore, StorageError, StorageResult};
use crate::storage::{Checkpoint, CheckpointRef};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Checkpoint store backed by a single pretty-printed JSON file
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Creates a store for the given checkpoint path
    ///
    /// Nothing is touched on disk until the first `load` or `save`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the checkpoint file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn display_path(&self) -> String {
        self.path.display().to_string()
    }

    /// Directory the temporary file is created in
    ///
    /// Must be on the same filesystem as the checkpoint for the rename to be
    /// atomic.
    fn staging_dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    fn write_failed(&self, source: std::io::Error) -> StorageError {
        StorageError::WriteFailed {
            path: self.display_path(),
            source,
        }
    }
}

impl CheckpointStore for JsonFileStore {
    fn load(&self) -> StorageResult<Option<Checkpoint>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) if e.kind() == ErrorKind::InvalidData => {
                return Err(StorageError::Corrupt {
                    path: self.display_path(),
                    message: e.to_string(),
                });
            }
            Err(e) => {
                return Err(StorageError::ReadFailed {
                    path: self.display_path(),
                    source: e,
                });
            }
        };

        let checkpoint: Checkpoint =
            serde_json::from_str(&content).map_err(|e| StorageError::Corrupt {
                path: self.display_path(),
                message: e.to_string(),
            })?;

        tracing::debug!(
            "Loaded checkpoint {} ({} records, saved {})",
            self.path.display(),
            checkpoint.records.len(),
            checkpoint.saved_at
        );

        Ok(Some(checkpoint))
    }

    fn save(&mut self, records: &[Record], stats: &Stats) -> StorageResult<()> {
        let staging_dir = self.staging_dir().to_path_buf();
        std::fs::create_dir_all(&staging_dir).map_err(|e| self.write_failed(e))?;

        let temp = NamedTempFile::new_in(&staging_dir).map_err(|e| self.write_failed(e))?;

        {
            let mut writer = BufWriter::new(temp.as_file());
            serde_json::to_writer_pretty(&mut writer, &CheckpointRef::now(records, stats))
                .map_err(|e| self.write_failed(e.into()))?;
            writer.flush().map_err(|e| self.write_failed(e))?;
        }
        temp.as_file()
            .sync_all()
            .map_err(|e| self.write_failed(e))?;

        temp.persist(&self.path)
            .map_err(|e| self.write_failed(e.error))?;

        tracing::info!(
            "✓ Checkpoint saved: {} records to {}",
            records.len(),
            self.path.display()
        );

        Ok(())
    }
}
