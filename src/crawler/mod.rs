//! Crawler module for sweeping the profile ID space
//!
//! This module contains the core sweep logic, including:
//! - HTTP fetching with classified outcomes and optional retry
//! - Profile extraction and phone validation
//! - Batch planning and concurrency limiting
//! - Overall sweep coordination, checkpointing and interruption

mod coordinator;
mod fetcher;
mod parser;
mod scheduler;

pub use coordinator::{run_sweep, Coordinator, SweepPhase, SweepReport, SweepStatus};
pub use fetcher::{build_http_client, FetchOutcome, HttpFetcher, PageFetcher, UrlTemplate};
pub use parser::{extract, MarkupParser, ProfileFields, ProfileParser};
pub use scheduler::{BatchPlan, ConcurrencyLimiter};
