//! State module for tracking sweep progress
//!
//! # Components
//!
//! - `Record`: a validated profile
//! - `IdOutcome`: the settled result for a single ID
//! - `Stats`: counters and the batch-granular resume cursor

mod outcome;
mod record;
mod stats;

// Re-export main types
pub use outcome::IdOutcome;
pub use record::Record;
pub use stats::Stats;
