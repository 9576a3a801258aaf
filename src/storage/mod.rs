//! Storage module for persisting sweep progress
//!
//! This module handles the checkpoint artifact that makes a sweep resumable:
//! - The `Checkpoint` document (records, counters, save time)
//! - The `CheckpointStore` trait the coordinator saves through
//! - An atomic JSON file implementation

mod json_file;
mod traits;

pub use json_file::JsonFileStore;
pub use traits::{CheckpointStore, StorageError, StorageResult};

use crate::state::{Record, Stats};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A durable snapshot of a sweep
///
/// `records` are in completion order, not ID order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkpoint {
    pub records: Vec<Record>,
    pub stats: Stats,
    pub saved_at: DateTime<Utc>,
}

impl Checkpoint {
    /// Creates a checkpoint stamped with the current time
    pub fn new(records: Vec<Record>, stats: Stats) -> Self {
        Self {
            records,
            stats,
            saved_at: Utc::now(),
        }
    }

    /// True if both checkpoints carry the same content, ignoring `saved_at`
    pub fn same_content(&self, other: &Checkpoint) -> bool {
        self.records == other.records && self.stats == other.stats
    }
}

/// Borrowed form of [`Checkpoint`] used when saving, so large record sets
/// are serialized in place instead of cloned
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CheckpointRef<'a> {
    pub records: &'a [Record],
    pub stats: &'a Stats,
    pub saved_at: DateTime<Utc>,
}

impl<'a> CheckpointRef<'a> {
    pub fn now(records: &'a [Record], stats: &'a Stats) -> Self {
        Self {
            records,
            stats,
            saved_at: Utc::now(),
        }
    }
}
