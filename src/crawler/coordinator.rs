//! Sweep coordinator - main orchestration logic
//!
//! This module contains the sweep loop that coordinates:
//! - Loading a checkpoint and computing the resume point
//! - Dispatching each batch through the bounded fetch-extract-validate pipeline
//! - Merging settled outcomes into the owned records and counters
//! - Periodic and final checkpoint saves
//! - Cooperative interruption
//!
//! # Lifecycle
//!
//! `Idle -> Resuming -> Running(1) -> ... -> Running(n) -> Draining -> Terminated`
//!
//! Every path out of `Running` goes through `Draining`, which saves a final
//! checkpoint before the run reports completion, interruption or an error.

use crate::config::{validate, Config, CrawlerConfig};
use crate::crawler::parser::{extract, MarkupParser, ProfileParser};
use crate::crawler::scheduler::{BatchPlan, ConcurrencyLimiter};
use crate::crawler::{FetchOutcome, HttpFetcher, PageFetcher, UrlTemplate};
use crate::state::{IdOutcome, Record, Stats};
use crate::storage::{CheckpointStore, JsonFileStore};
use crate::SweepError;
use std::fmt;
use std::ops::RangeInclusive;
use std::sync::Arc;
use tokio::sync::OwnedSemaphorePermit;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Where the coordinator is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepPhase {
    Idle,
    Resuming,
    Running { batch: u64 },
    Draining,
    Terminated,
}

impl fmt::Display for SweepPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Resuming => write!(f, "resuming"),
            Self::Running { batch } => write!(f, "running(batch {})", batch),
            Self::Draining => write!(f, "draining"),
            Self::Terminated => write!(f, "terminated"),
        }
    }
}

/// How a successful run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepStatus {
    /// Every batch up to the end of the range was committed
    Completed,

    /// Stopped early by the cancellation signal; resumable
    Interrupted,
}

impl SweepStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Interrupted => "interrupted",
        }
    }
}

/// Result of a run that did not fail
#[derive(Debug, Clone)]
pub struct SweepReport {
    pub status: SweepStatus,

    /// Counters as saved in the final checkpoint
    pub stats: Stats,

    /// All records, in completion order, as saved in the final checkpoint
    pub records: Vec<Record>,

    /// First ID this run attempted
    pub resumed_from: u64,

    /// Batches committed by this run
    pub batches_committed: u64,

    /// Checkpoints written by this run, final save included
    pub checkpoints_saved: u64,
}

/// Why the batch loop stopped
enum DrainReason {
    Exhausted,
    Interrupted,
}

/// What a single batch produced
enum BatchResult {
    /// Every ID settled; outcomes in completion order
    Settled(Vec<IdOutcome>),

    /// Cancelled mid-batch; partial outcomes were discarded
    Interrupted { settled: usize },
}

/// Main sweep coordinator
///
/// The coordinator is the only owner of the collected records and the
/// counters. Pipeline tasks hand back an `IdOutcome`; nothing else writes to
/// either.
pub struct Coordinator {
    crawler: CrawlerConfig,
    template: UrlTemplate,
    fetcher: Arc<dyn PageFetcher>,
    parser: Arc<dyn ProfileParser>,
    store: Box<dyn CheckpointStore>,
    limiter: ConcurrencyLimiter,
    fresh: bool,
    phase: SweepPhase,
    records: Vec<Record>,
    stats: Stats,
    batches_committed: u64,
    checkpoints_saved: u64,
}

impl Coordinator {
    /// Creates a coordinator wired to the real site and a JSON checkpoint
    ///
    /// # Arguments
    ///
    /// * `config` - The sweep configuration
    /// * `fresh` - Ignore an existing checkpoint and start from `start_id`
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(SweepError)` - Invalid configuration or HTTP client setup failed
    pub fn new(config: &Config, fresh: bool) -> Result<Self, SweepError> {
        validate(config)?;

        let fetcher = HttpFetcher::new(&config.http)?;
        let store = JsonFileStore::new(&config.output.checkpoint_path);

        Ok(Self::with_parts(
            config.crawler.clone(),
            UrlTemplate::new(config.http.url_template.clone()),
            Arc::new(fetcher),
            Box::new(store),
        )?
        .fresh(fresh))
    }

    /// Creates a coordinator from explicit collaborators
    ///
    /// The markup parser is used unless replaced with [`Coordinator::with_parser`].
    pub fn with_parts(
        crawler: CrawlerConfig,
        template: UrlTemplate,
        fetcher: Arc<dyn PageFetcher>,
        store: Box<dyn CheckpointStore>,
    ) -> Result<Self, SweepError> {
        let limiter = ConcurrencyLimiter::new(crawler.max_concurrent);

        Ok(Self {
            crawler,
            template,
            fetcher,
            parser: Arc::new(MarkupParser::new()?),
            store,
            limiter,
            fresh: false,
            phase: SweepPhase::Idle,
            records: Vec::new(),
            stats: Stats::new(),
            batches_committed: 0,
            checkpoints_saved: 0,
        })
    }

    /// Replaces the profile parser
    pub fn with_parser(mut self, parser: Arc<dyn ProfileParser>) -> Self {
        self.parser = parser;
        self
    }

    /// Sets whether an existing checkpoint is ignored
    pub fn fresh(mut self, fresh: bool) -> Self {
        self.fresh = fresh;
        self
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> SweepPhase {
        self.phase
    }

    /// Runs the sweep to completion, interruption or failure
    ///
    /// Cancelling `cancel` stops the sweep at the next opportunity: fetches
    /// in flight are aborted, the unfinished batch is discarded and a final
    /// checkpoint is saved. A restart then resumes at the first ID of that
    /// batch.
    ///
    /// # Returns
    ///
    /// * `Ok(SweepReport)` - Completed or interrupted; the checkpoint is current
    /// * `Err(SweepError)` - Fatal error, raised after a best-effort final save
    ///
    /// # Example
    ///
    /// ```no_run
    /// use mojo_sweep::{Config, Coordinator};
    /// use tokio_util::sync::CancellationToken;
    ///
    /// # async fn example() -> Result<(), mojo_sweep::SweepError> {
    /// let coordinator = Coordinator::new(&Config::default(), false)?;
    /// let report = coordinator.run(CancellationToken::new()).await?;
    /// println!("{} records", report.records.len());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn run(mut self, cancel: CancellationToken) -> Result<SweepReport, SweepError> {
        self.transition(SweepPhase::Resuming);
        if let Err(e) = self.resume() {
            self.transition(SweepPhase::Terminated);
            tracing::error!("Cannot resume sweep: {}", e);
            return Err(e);
        }

        let resumed_from = self.stats.resume_point(self.crawler.start_id);
        let plan = BatchPlan::new(resumed_from, self.crawler.end_id, self.crawler.batch_size);

        if resumed_from > self.crawler.start_id {
            tracing::info!("Resuming from ID: {}", resumed_from);
        }
        tracing::info!(
            "Starting sweep: {} to {} ({} IDs in {} batches)",
            resumed_from,
            self.crawler.end_id,
            plan.id_count(),
            plan.batch_count()
        );
        tracing::info!(
            "Max concurrent requests: {}, checkpoint every {} IDs",
            self.limiter.max_concurrent(),
            self.crawler.save_every
        );

        let outcome = self.run_batches(plan, &cancel).await;

        self.transition(SweepPhase::Draining);
        let final_save = self.save_checkpoint();
        self.transition(SweepPhase::Terminated);

        match outcome {
            Ok(reason) => {
                final_save?;
                let status = match reason {
                    DrainReason::Exhausted => SweepStatus::Completed,
                    DrainReason::Interrupted => SweepStatus::Interrupted,
                };
                self.log_summary(status);
                Ok(self.into_report(status, resumed_from))
            }
            Err(e) => {
                if let Err(save_err) = final_save {
                    tracing::error!("Final checkpoint save failed: {}", save_err);
                }
                tracing::error!("Sweep aborted: {}", e);
                Err(e)
            }
        }
    }

    /// Adopts the stored checkpoint, if any
    fn resume(&mut self) -> Result<(), SweepError> {
        if self.fresh {
            tracing::info!("Starting fresh sweep (ignoring any existing checkpoint)");
            return Ok(());
        }

        match self.store.load() {
            Ok(Some(checkpoint)) => {
                tracing::info!(
                    "✓ Checkpoint loaded: {} records from {}",
                    checkpoint.records.len(),
                    checkpoint.saved_at
                );
                self.records = checkpoint.records;
                self.stats = checkpoint.stats;
            }
            Ok(None) => {
                tracing::info!("No checkpoint found, starting new sweep");
            }
            Err(e) if e.is_corrupt() => {
                tracing::warn!("{}; starting a fresh sweep", e);
            }
            Err(e) => return Err(e.into()),
        }

        Ok(())
    }

    /// Processes batches strictly in order
    async fn run_batches(
        &mut self,
        plan: BatchPlan,
        cancel: &CancellationToken,
    ) -> Result<DrainReason, SweepError> {
        let total_batches = plan.batch_count();
        let span = (self.crawler.end_id - self.crawler.start_id).saturating_add(1);
        let mut processed_at_last_save = self.stats.total_processed;

        for (index, batch) in plan.enumerate() {
            let batch_no = index as u64 + 1;

            if cancel.is_cancelled() {
                tracing::warn!("⚠ Sweep interrupted before batch {}/{}", batch_no, total_batches);
                return Ok(DrainReason::Interrupted);
            }

            self.transition(SweepPhase::Running { batch: batch_no });
            tracing::info!(
                "Processing batch {}/{}: {} to {}",
                batch_no,
                total_batches,
                batch.start(),
                batch.end()
            );

            let last_id = *batch.end();
            let outcomes = match self.dispatch_batch(batch, cancel).await? {
                BatchResult::Settled(outcomes) => outcomes,
                BatchResult::Interrupted { settled } => {
                    tracing::warn!(
                        "⚠ Sweep interrupted during batch {}/{}; discarding {} settled IDs, \
                         the batch is retried on resume",
                        batch_no,
                        total_batches,
                        settled
                    );
                    return Ok(DrainReason::Interrupted);
                }
            };

            let collected = self.commit_batch(last_id, outcomes);
            tracing::info!(
                "Batch complete. Valid records in batch: {}. Progress: {}/{} ({:.1}%), {} records total",
                collected,
                self.stats.total_processed,
                span,
                self.stats.progress(span),
                self.stats.valid_records
            );

            // The final save in Draining covers the last batch
            let is_last = batch_no == total_batches;
            if !is_last
                && self.stats.total_processed - processed_at_last_save >= self.crawler.save_every
            {
                self.save_checkpoint()?;
                processed_at_last_save = self.stats.total_processed;
            }
        }

        Ok(DrainReason::Exhausted)
    }

    /// Runs one batch through the pipeline
    ///
    /// A task is spawned only once a limiter permit is held, so the number of
    /// live tasks never exceeds `max_concurrent` regardless of batch size.
    /// Finished tasks are joined while waiting for permits.
    async fn dispatch_batch(
        &self,
        batch: RangeInclusive<u64>,
        cancel: &CancellationToken,
    ) -> Result<BatchResult, SweepError> {
        let mut ids = batch;
        let mut next_id = ids.next();
        let mut tasks: JoinSet<Result<(u64, IdOutcome), SweepError>> = JoinSet::new();
        let mut settled = Vec::new();

        loop {
            if next_id.is_none() && tasks.is_empty() {
                break;
            }

            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    tasks.abort_all();
                    return Ok(BatchResult::Interrupted { settled: settled.len() });
                }

                Some(joined) = tasks.join_next() => {
                    let (id, outcome) = joined??;
                    log_outcome(id, &outcome);
                    settled.push(outcome);
                }

                permit = self.limiter.acquire(), if next_id.is_some() => {
                    let permit = permit?;
                    if let Some(id) = next_id.take() {
                        tasks.spawn(process_id(
                            id,
                            permit,
                            Arc::clone(&self.fetcher),
                            Arc::clone(&self.parser),
                            self.template.clone(),
                        ));
                    }
                    next_id = ids.next();
                }
            }
        }

        Ok(BatchResult::Settled(settled))
    }

    /// Merges a fully settled batch; the single write point for records and stats
    fn commit_batch(&mut self, last_id: u64, outcomes: Vec<IdOutcome>) -> usize {
        let mut collected = 0;

        for outcome in outcomes {
            self.stats.record(&outcome);
            if let IdOutcome::Collected(record) = outcome {
                self.records.push(record);
                collected += 1;
            }
        }

        self.stats.commit_through(last_id);
        self.batches_committed += 1;
        collected
    }

    fn save_checkpoint(&mut self) -> Result<(), SweepError> {
        self.store.save(&self.records, &self.stats)?;
        self.checkpoints_saved += 1;
        Ok(())
    }

    fn transition(&mut self, next: SweepPhase) {
        tracing::info!("Sweep phase: {} -> {}", self.phase, next);
        self.phase = next;
    }

    fn log_summary(&self, status: SweepStatus) {
        let banner = match status {
            SweepStatus::Completed => "SWEEP COMPLETE",
            SweepStatus::Interrupted => "SWEEP INTERRUPTED (progress saved)",
        };
        tracing::info!("{}", "=".repeat(60));
        tracing::info!("{}", banner);
        tracing::info!("{}", "=".repeat(60));
        tracing::info!("Total processed: {}", self.stats.total_processed);
        tracing::info!("Valid records saved: {}", self.stats.valid_records);
        tracing::info!("Failed (no record): {}", self.stats.failed);
        tracing::info!("No phone found: {}", self.stats.no_identifier);
        tracing::info!("Invalid phone: {}", self.stats.invalid_identifier);
        tracing::info!("{}", "=".repeat(60));
    }

    fn into_report(self, status: SweepStatus, resumed_from: u64) -> SweepReport {
        SweepReport {
            status,
            stats: self.stats,
            records: self.records,
            resumed_from,
            batches_committed: self.batches_committed,
            checkpoints_saved: self.checkpoints_saved,
        }
    }
}

/// Fetch, extract and validate one ID while holding a limiter slot
async fn process_id(
    id: u64,
    _permit: OwnedSemaphorePermit,
    fetcher: Arc<dyn PageFetcher>,
    parser: Arc<dyn ProfileParser>,
    template: UrlTemplate,
) -> Result<(u64, IdOutcome), SweepError> {
    let outcome = match fetcher.fetch(id).await {
        FetchOutcome::Success(body) => {
            let source_url = template.render(id);
            // HTML parsing is CPU-bound; keep it off the reactor threads
            tokio::task::spawn_blocking(move || {
                extract(parser.as_ref(), &body, id, &source_url)
            })
            .await?
        }
        FetchOutcome::HttpError(status) => IdOutcome::HttpError(status),
        FetchOutcome::Timeout => IdOutcome::Timeout,
        FetchOutcome::NetworkError(cause) => IdOutcome::NetworkError(cause),
    };

    Ok((id, outcome))
}

fn log_outcome(id: u64, outcome: &IdOutcome) {
    match outcome {
        IdOutcome::Collected(record) => {
            tracing::info!("✓ Profile {}: {} - {}", id, record.name, record.phone);
        }
        other => {
            tracing::debug!("✗ Profile {}: {} [{}]", id, other, other.kind());
        }
    }
}

/// Runs a complete sweep with the production collaborators
///
/// # Example
///
/// ```no_run
/// use mojo_sweep::config::load_config;
/// use mojo_sweep::crawler::run_sweep;
/// use std::path::Path;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("sweep.toml"))?;
/// let report = run_sweep(&config, false, CancellationToken::new()).await?;
/// println!("{:?}: {} records", report.status, report.records.len());
/// # Ok(())
/// # }
/// ```
pub async fn run_sweep(
    config: &Config,
    fresh: bool,
    cancel: CancellationToken,
) -> Result<SweepReport, SweepError> {
    Coordinator::new(config, fresh)?.run(cancel).await
}
