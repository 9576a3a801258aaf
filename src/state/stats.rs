use crate::state::IdOutcome;
use serde::{Deserialize, Serialize};

/// Sweep counters plus the resume cursor
///
/// Owned and mutated only by the coordinator. Counters never decrease within
/// a run. `total_processed == successful + failed` always holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Stats {
    /// IDs that settled to any outcome
    pub total_processed: u64,

    /// IDs that produced a validated record
    pub successful: u64,

    /// IDs that settled without a record, for any reason
    pub failed: u64,

    /// Profiles without phone-shaped text (also counted in `failed`)
    pub no_identifier: u64,

    /// Profiles whose phone failed validation (also counted in `failed`)
    pub invalid_identifier: u64,

    /// Records collected
    pub valid_records: u64,

    /// Last ID of the last fully settled batch
    ///
    /// This is a batch-granular cursor: every ID up to and including it has
    /// been attempted and counted. `None` until the first batch commits.
    pub last_processed_id: Option<u64>,
}

impl Stats {
    /// Creates zeroed statistics
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one settled outcome
    pub fn record(&mut self, outcome: &IdOutcome) {
        self.total_processed += 1;

        match outcome {
            IdOutcome::Collected(_) => {
                self.successful += 1;
                self.valid_records += 1;
            }
            IdOutcome::MissingIdentifier => {
                self.failed += 1;
                self.no_identifier += 1;
            }
            IdOutcome::InvalidIdentifier { .. } => {
                self.failed += 1;
                self.invalid_identifier += 1;
            }
            _ => self.failed += 1,
        }
    }

    /// Moves the resume cursor to the end of a committed batch
    pub fn commit_through(&mut self, last_id: u64) {
        self.last_processed_id = Some(match self.last_processed_id {
            Some(current) => current.max(last_id),
            None => last_id,
        });
    }

    /// First ID a resumed sweep over `[start_id, ..]` has to attempt
    pub fn resume_point(&self, start_id: u64) -> u64 {
        match self.last_processed_id {
            Some(last) => last.saturating_add(1).max(start_id),
            None => start_id,
        }
    }

    /// Share of processed IDs that yielded a record, as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.total_processed == 0 {
            return 0.0;
        }
        (self.valid_records as f64 / self.total_processed as f64) * 100.0
    }

    /// Processed IDs as a percentage of a range of `total` IDs
    pub fn progress(&self, total: u64) -> f64 {
        if total == 0 {
            return 100.0;
        }
        (self.total_processed as f64 / total as f64) * 100.0
    }

    /// Share of processed IDs that produced no record, as a percentage
    pub fn error_rate(&self) -> f64 {
        if self.total_processed == 0 {
            return 0.0;
        }
        (self.failed as f64 / self.total_processed as f64) * 100.0
    }
}
