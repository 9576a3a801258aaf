//! Integration tests for the sweep coordinator
//!
//! These tests drive the coordinator with an in-process fetcher that records
//! which IDs were requested and how many requests overlapped, and with an
//! in-memory checkpoint store that counts saves.

use async_trait::async_trait;
use chrono::Utc;
use mojo_sweep::config::CrawlerConfig;
use mojo_sweep::crawler::{Coordinator, FetchOutcome, PageFetcher, SweepStatus, UrlTemplate};
use mojo_sweep::state::{Record, Stats};
use mojo_sweep::storage::{
    Checkpoint, CheckpointStore, JsonFileStore, StorageError, StorageResult,
};
use mojo_sweep::SweepError;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

/// Page with a name heading and a valid phone number
fn valid_page(id: u64) -> String {
    format!(
        r#"<html><body><div class="p-2">
        <h2 class="pb-0">User {}</h2>
        <p>(050) 555-12-34</p>
        <p>Elan sayı: 2</p>
        </div></body></html>"#,
        id
    )
}

/// Odd IDs are profiles, even IDs are 404
fn odd_profiles(id: u64) -> FetchOutcome {
    if id % 2 == 1 {
        FetchOutcome::Success(valid_page(id))
    } else {
        FetchOutcome::HttpError(404)
    }
}

fn all_profiles(id: u64) -> FetchOutcome {
    FetchOutcome::Success(valid_page(id))
}

/// Fetcher that records requested IDs and peak overlap
struct MockFetcher {
    respond: fn(u64) -> FetchOutcome,
    delay: Duration,
    cancel_at: Option<(u64, CancellationToken)>,
    fetched: Mutex<Vec<u64>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl MockFetcher {
    fn new(respond: fn(u64) -> FetchOutcome) -> Self {
        Self {
            respond,
            delay: Duration::from_millis(1),
            cancel_at: None,
            fetched: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Cancels `token` when `id` is fetched, then never answers for it
    fn cancel_at(mut self, id: u64, token: CancellationToken) -> Self {
        self.cancel_at = Some((id, token));
        self
    }

    fn fetched_sorted(&self) -> Vec<u64> {
        let mut ids = self.fetched.lock().unwrap().clone();
        ids.sort_unstable();
        ids
    }

    fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageFetcher for MockFetcher {
    async fn fetch(&self, id: u64) -> FetchOutcome {
        self.fetched.lock().unwrap().push(id);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        if let Some((cancel_id, token)) = &self.cancel_at {
            if *cancel_id == id {
                token.cancel();
                std::future::pending::<()>().await;
            }
        }

        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        (self.respond)(id)
    }
}

/// In-memory checkpoint store shared with the test
#[derive(Clone, Default)]
struct MemoryStore {
    saves: Arc<Mutex<Vec<Checkpoint>>>,
    fail_writes: bool,
    fail_reads: bool,
}

impl MemoryStore {
    fn save_count(&self) -> usize {
        self.saves.lock().unwrap().len()
    }

    fn latest(&self) -> Option<Checkpoint> {
        self.saves.lock().unwrap().last().cloned()
    }

    fn preload(&self, checkpoint: Checkpoint) {
        self.saves.lock().unwrap().push(checkpoint);
    }
}

impl CheckpointStore for MemoryStore {
    fn load(&self) -> StorageResult<Option<Checkpoint>> {
        if self.fail_reads {
            return Err(StorageError::ReadFailed {
                path: "memory".to_string(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
            });
        }
        Ok(self.latest())
    }

    fn save(&mut self, records: &[Record], stats: &Stats) -> StorageResult<()> {
        if self.fail_writes {
            return Err(StorageError::WriteFailed {
                path: "memory".to_string(),
                source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
            });
        }
        self.preload(Checkpoint::new(records.to_vec(), stats.clone()));
        Ok(())
    }
}

fn crawler_config(start_id: u64, end_id: u64, batch_size: u64, save_every: u64) -> CrawlerConfig {
    CrawlerConfig {
        start_id,
        end_id,
        max_concurrent: 4,
        batch_size,
        save_every,
    }
}

fn coordinator(
    crawler: CrawlerConfig,
    fetcher: &Arc<MockFetcher>,
    store: Box<dyn CheckpointStore>,
) -> Coordinator {
    let fetcher: Arc<dyn PageFetcher> = fetcher.clone();
    Coordinator::with_parts(
        crawler,
        UrlTemplate::new("http://mojo.test/az/users/{id}"),
        fetcher,
        store,
    )
    .unwrap()
}

fn record_ids(records: &[Record]) -> Vec<u64> {
    let mut ids: Vec<u64> = records.iter().map(|r| r.id).collect();
    ids.sort_unstable();
    ids
}

#[tokio::test]
async fn test_end_to_end_small_range() {
    let fetcher = Arc::new(MockFetcher::new(odd_profiles));
    let store = MemoryStore::default();

    let report = coordinator(crawler_config(1, 10, 5, 5), &fetcher, Box::new(store.clone()))
        .run(CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.status, SweepStatus::Completed);
    assert_eq!(record_ids(&report.records), vec![1, 3, 5, 7, 9]);
    assert_eq!(report.stats.total_processed, 10);
    assert_eq!(report.stats.successful, 5);
    assert_eq!(report.stats.failed, 5);
    assert_eq!(report.stats.valid_records, 5);
    assert_eq!(report.stats.last_processed_id, Some(10));

    // One threshold save after batch 1, one final save
    assert_eq!(store.save_count(), 2);
    assert_eq!(report.checkpoints_saved, 2);

    let saved = store.latest().unwrap();
    assert_eq!(saved.stats, report.stats);
    assert_eq!(saved.records, report.records);
    assert_eq!(fetcher.fetched_sorted(), (1..=10).collect::<Vec<_>>());

    let record = report.records.iter().find(|r| r.id == 3).unwrap();
    assert_eq!(record.name, "User 3");
    assert_eq!(record.phone, "505551234");
    assert_eq!(record.listing_count, Some(2));
    assert_eq!(record.source_url, "http://mojo.test/az/users/3");
}

#[tokio::test]
async fn test_mixed_outcomes_partition_counters() {
    fn mixed(id: u64) -> FetchOutcome {
        match id % 4 {
            0 => FetchOutcome::Success("<html><body>Profile not found</body></html>".into()),
            1 => FetchOutcome::Success(valid_page(id)),
            2 => FetchOutcome::Success(
                r#"<div class="p-2"><h2 class="pb-0">Bad</h2><p>040 555 12 34</p></div>"#
                    .into(),
            ),
            _ => FetchOutcome::Timeout,
        }
    }

    let fetcher = Arc::new(MockFetcher::new(mixed));
    let report = coordinator(
        crawler_config(1, 40, 10, 100),
        &fetcher,
        Box::new(MemoryStore::default()),
    )
    .run(CancellationToken::new())
    .await
    .unwrap();

    let stats = report.stats;
    assert_eq!(stats.total_processed, 40);
    // Only the ten valid profiles succeed; missing profiles, bad phones and timeouts all fail
    assert_eq!(stats.successful, 10);
    assert_eq!(stats.failed, 30);
    assert_eq!(stats.valid_records, 10);
    assert_eq!(stats.invalid_identifier, 10);
    assert_eq!(stats.no_identifier, 0);
    assert_eq!(stats.successful, stats.valid_records);
    assert_eq!(stats.total_processed, stats.successful + stats.failed);
    assert_eq!(report.records.len() as u64, stats.valid_records);
}

#[tokio::test]
async fn test_resume_skips_committed_ids() {
    let store = MemoryStore::default();
    let mut stats = Stats::new();
    let mut records = Vec::new();
    for id in 1..=500u64 {
        stats.total_processed += 1;
        stats.successful += 1;
        stats.valid_records += 1;
        records.push(Record {
            id,
            name: format!("User {}", id),
            phone: "505551234".to_string(),
            registration_date_raw: None,
            last_seen_date_raw: None,
            listing_count: None,
            source_url: format!("http://mojo.test/az/users/{}", id),
            fetched_at: Utc::now(),
        });
    }
    stats.commit_through(500);
    store.preload(Checkpoint::new(records, stats));

    let fetcher = Arc::new(MockFetcher::new(all_profiles));
    let report = coordinator(
        crawler_config(1, 1_200, 500, 10_000),
        &fetcher,
        Box::new(store.clone()),
    )
    .run(CancellationToken::new())
    .await
    .unwrap();

    assert_eq!(report.resumed_from, 501);
    assert_eq!(fetcher.fetched_sorted(), (501..=1_200).collect::<Vec<_>>());

    let ids: HashSet<u64> = report.records.iter().map(|r| r.id).collect();
    assert_eq!(ids.len(), report.records.len(), "duplicate records");
    assert_eq!(ids.len(), 1_200);
    assert_eq!(report.stats.total_processed, 1_200);
    assert_eq!(report.stats.last_processed_id, Some(1_200));
}

#[tokio::test]
async fn test_interrupt_mid_batch_then_resume() {
    let store = MemoryStore::default();
    let cancel = CancellationToken::new();
    let fetcher = Arc::new(MockFetcher::new(odd_profiles).cancel_at(6, cancel.clone()));

    let report = coordinator(crawler_config(1, 10, 5, 5), &fetcher, Box::new(store.clone()))
        .run(cancel)
        .await
        .unwrap();

    assert_eq!(report.status, SweepStatus::Interrupted);
    assert_eq!(report.batches_committed, 1);

    // Only batch 1 is in the checkpoint; batch 2's partial results are gone
    let saved = store.latest().unwrap();
    assert_eq!(record_ids(&saved.records), vec![1, 3, 5]);
    assert_eq!(saved.stats.total_processed, 5);
    assert_eq!(saved.stats.last_processed_id, Some(5));

    let fetcher = Arc::new(MockFetcher::new(odd_profiles));
    let report = coordinator(crawler_config(1, 10, 5, 5), &fetcher, Box::new(store.clone()))
        .run(CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.status, SweepStatus::Completed);
    assert_eq!(fetcher.fetched_sorted(), vec![6, 7, 8, 9, 10]);
    assert_eq!(record_ids(&report.records), vec![1, 3, 5, 7, 9]);
    assert_eq!(report.stats.total_processed, 10);
    assert_eq!(report.stats.failed, 5);
}

#[tokio::test]
async fn test_in_flight_never_exceeds_limit() {
    let fetcher = Arc::new(MockFetcher::new(all_profiles).with_delay(Duration::from_millis(5)));
    let crawler = CrawlerConfig {
        max_concurrent: 8,
        ..crawler_config(1, 200, 100, 1_000)
    };

    let report = coordinator(crawler, &fetcher, Box::new(MemoryStore::default()))
        .run(CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.stats.total_processed, 200);
    assert!(fetcher.peak() <= 8, "peak in flight was {}", fetcher.peak());
    assert!(fetcher.peak() >= 2, "requests never overlapped");
}

#[tokio::test]
async fn test_failed_save_is_fatal() {
    let fetcher = Arc::new(MockFetcher::new(odd_profiles));
    let store = MemoryStore {
        fail_writes: true,
        ..MemoryStore::default()
    };

    let result = coordinator(crawler_config(1, 10, 5, 5), &fetcher, Box::new(store))
        .run(CancellationToken::new())
        .await;

    assert!(matches!(
        result,
        Err(SweepError::Storage(StorageError::WriteFailed { .. }))
    ));
    // The sweep stopped at the failed threshold save after batch 1
    assert_eq!(fetcher.fetched_sorted(), vec![1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn test_unreadable_checkpoint_aborts_before_work() {
    let fetcher = Arc::new(MockFetcher::new(odd_profiles));
    let store = MemoryStore {
        fail_reads: true,
        ..MemoryStore::default()
    };

    let result = coordinator(crawler_config(1, 10, 5, 5), &fetcher, Box::new(store.clone()))
        .run(CancellationToken::new())
        .await;

    assert!(matches!(
        result,
        Err(SweepError::Storage(StorageError::ReadFailed { .. }))
    ));
    assert!(fetcher.fetched_sorted().is_empty());
    assert_eq!(store.save_count(), 0);
}

#[tokio::test]
async fn test_fresh_ignores_existing_checkpoint() {
    let store = MemoryStore::default();
    let mut stats = Stats::new();
    stats.commit_through(10);
    store.preload(Checkpoint::new(vec![], stats));

    let fetcher = Arc::new(MockFetcher::new(odd_profiles));
    let report = coordinator(crawler_config(1, 10, 5, 5), &fetcher, Box::new(store.clone()))
        .fresh(true)
        .run(CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.resumed_from, 1);
    assert_eq!(fetcher.fetched_sorted(), (1..=10).collect::<Vec<_>>());
    assert_eq!(report.stats.total_processed, 10);
}

#[tokio::test]
async fn test_corrupt_checkpoint_starts_fresh() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("checkpoint.json");
    std::fs::write(&path, "{ not json").unwrap();

    let fetcher = Arc::new(MockFetcher::new(odd_profiles));
    let report = coordinator(
        crawler_config(1, 4, 2, 100),
        &fetcher,
        Box::new(JsonFileStore::new(&path)),
    )
    .run(CancellationToken::new())
    .await
    .unwrap();

    assert_eq!(report.status, SweepStatus::Completed);
    assert_eq!(fetcher.fetched_sorted(), vec![1, 2, 3, 4]);

    // The corrupt file was replaced by a readable checkpoint
    let saved = JsonFileStore::new(&path).load().unwrap().unwrap();
    assert_eq!(saved.stats.total_processed, 4);
    assert_eq!(record_ids(&saved.records), vec![1, 3]);
}
