//! Mojo-Sweep: a resumable ID-space profile sweeper
//!
//! This crate enumerates a dense range of numeric profile IDs against a remote
//! site, extracts one record per profile, validates the embedded phone number
//! and checkpoints progress so an interrupted sweep resumes where it stopped.

pub mod config;
pub mod crawler;
pub mod output;
pub mod phone;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for Mojo-Sweep operations
///
/// Per-ID failures (HTTP errors, missing fields, rejected phones) are not
/// errors; they settle as [`state::IdOutcome`] values. Only conditions that
/// end the sweep surface here.
#[derive(Debug, Error)]
pub enum SweepError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Checkpoint error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Export error: {0}")]
    Export(#[from] output::ExportError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Invalid extraction pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Pipeline task failed: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error("Concurrency limiter closed")]
    LimiterClosed,
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Mojo-Sweep operations
pub type Result<T> = std::result::Result<T, SweepError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, SweepReport, SweepStatus};
pub use phone::{validate_phone, PhoneRejection};
pub use state::{IdOutcome, Record, Stats};
pub use storage::{Checkpoint, CheckpointStore, JsonFileStore};
