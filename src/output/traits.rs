//! Export sink traits and types
//!
//! This module defines the trait interface for record sinks and the
//! data structure behind the run summary.

use crate::crawler::SweepStatus;
use crate::state::{Record, Stats};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during export operations
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV encoding failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for export operations
pub type ExportResult<T> = Result<T, ExportError>;

/// A destination format for collected records
pub trait RecordSink {
    /// File extension written by this sink, without the dot
    fn extension(&self) -> &'static str;

    /// Writes all records to `path`, replacing any existing file
    fn write(&self, records: &[Record], path: &Path) -> ExportResult<()>;
}

/// Everything the markdown summary reports about one sweep
#[derive(Debug, Clone)]
pub struct SweepSummary {
    // Run metadata
    pub start_id: u64,
    pub end_id: u64,
    pub resumed_from: Option<u64>,
    pub status: String,
    pub config_hash: Option<String>,
    pub generated_at: DateTime<Utc>,

    // Counters as checkpointed
    pub stats: Stats,

    // Operator prefix -> record count
    pub prefix_distribution: BTreeMap<String, u64>,

    // Listing totals over records that advertise a count
    pub total_listings: u64,
    pub records_with_listings: u64,
}

impl SweepSummary {
    /// Builds a summary from the final counters and records
    pub fn new(start_id: u64, end_id: u64, stats: &Stats, records: &[Record]) -> Self {
        let mut prefix_distribution = BTreeMap::new();
        let mut total_listings = 0u64;
        let mut records_with_listings = 0u64;

        for record in records {
            *prefix_distribution
                .entry(record.phone_prefix().to_string())
                .or_insert(0) += 1;

            if let Some(count) = record.listing_count {
                total_listings += u64::from(count);
                records_with_listings += 1;
            }
        }

        let status = match stats.last_processed_id {
            Some(last) if last >= end_id => SweepStatus::Completed.as_str(),
            _ => SweepStatus::Interrupted.as_str(),
        };

        Self {
            start_id,
            end_id,
            resumed_from: None,
            status: status.to_string(),
            config_hash: None,
            generated_at: Utc::now(),
            stats: stats.clone(),
            prefix_distribution,
            total_listings,
            records_with_listings,
        }
    }

    /// Overrides the status derived from the resume cursor
    pub fn with_status(mut self, status: SweepStatus) -> Self {
        self.status = status.as_str().to_string();
        self
    }

    pub fn with_resumed_from(mut self, resumed_from: u64) -> Self {
        self.resumed_from = Some(resumed_from);
        self
    }

    pub fn with_config_hash(mut self, hash: impl Into<String>) -> Self {
        self.config_hash = Some(hash.into());
        self
    }

    /// Number of IDs in the configured range
    pub fn range_size(&self) -> u64 {
        (self.end_id - self.start_id).saturating_add(1)
    }

    /// Average listings per record that advertises a count
    pub fn average_listings(&self) -> f64 {
        if self.records_with_listings == 0 {
            return 0.0;
        }
        self.total_listings as f64 / self.records_with_listings as f64
    }
}
