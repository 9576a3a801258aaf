//! Batch partitioning and concurrency limiting
//!
//! This module handles:
//! - Carving the remaining ID range into contiguous, fixed-size batches
//! - Capping the number of fetches in flight with a semaphore

use crate::SweepError;
use std::ops::RangeInclusive;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Contiguous batches over `[start, end]`, in ascending order
///
/// The last batch may be shorter than `batch_size`. An empty plan is produced
/// when `start > end` (nothing left to resume).
#[derive(Debug, Clone)]
pub struct BatchPlan {
    next: u64,
    end: u64,
    batch_size: u64,
    exhausted: bool,
}

impl BatchPlan {
    /// Creates a plan
    ///
    /// # Arguments
    ///
    /// * `start` - First ID to attempt
    /// * `end` - Last ID to attempt (inclusive)
    /// * `batch_size` - IDs per batch, clamped to at least 1
    pub fn new(start: u64, end: u64, batch_size: u64) -> Self {
        Self {
            next: start,
            end,
            batch_size: batch_size.max(1),
            exhausted: start > end,
        }
    }

    /// Number of batches remaining
    pub fn batch_count(&self) -> u64 {
        if self.exhausted {
            return 0;
        }
        self.id_count().div_ceil(self.batch_size)
    }

    /// Number of IDs remaining
    pub fn id_count(&self) -> u64 {
        if self.exhausted {
            0
        } else {
            (self.end - self.next).saturating_add(1)
        }
    }
}

impl Iterator for BatchPlan {
    type Item = RangeInclusive<u64>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }

        let start = self.next;
        let last = start
            .saturating_add(self.batch_size - 1)
            .min(self.end);

        if last == self.end {
            self.exhausted = true;
        } else {
            self.next = last + 1;
        }

        Some(start..=last)
    }
}

/// Caps the number of simultaneous fetches
///
/// Every pipeline task holds a permit for its whole lifetime. The coordinator
/// acquires the permit before spawning, so no more than `max_concurrent`
/// tasks ever exist at once. Tokio's semaphore hands out permits in FIFO
/// order, so no waiter starves while permits are being released.
#[derive(Debug, Clone)]
pub struct ConcurrencyLimiter {
    semaphore: Arc<Semaphore>,
    max_concurrent: usize,
}

impl ConcurrencyLimiter {
    /// Creates a limiter with `max_concurrent` slots (at least 1)
    pub fn new(max_concurrent: usize) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
        }
    }

    /// Waits for a free slot
    ///
    /// The slot is released when the returned permit is dropped.
    pub async fn acquire(&self) -> Result<OwnedSemaphorePermit, SweepError> {
        self.semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| SweepError::LimiterClosed)
    }

    /// Configured number of slots
    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }
}
