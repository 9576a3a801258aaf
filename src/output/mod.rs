//! Output module for exporting records and reporting sweep results
//!
//! This module handles:
//! - Exporting collected records as CSV and JSON
//! - Printing sweep statistics
//! - Generating markdown summaries of a sweep

mod csv_output;
mod json_output;
mod markdown;
pub mod stats;
mod traits;

pub use csv_output::CsvSink;
pub use json_output::JsonSink;
pub use markdown::{format_markdown_summary, generate_markdown_summary};
pub use stats::{format_statistics, print_statistics};
pub use traits::{ExportError, ExportResult, RecordSink, SweepSummary};

use crate::config::{ExportFormat, OutputConfig};
use crate::state::Record;
use std::path::PathBuf;

/// Returns the sink that writes `format`
pub fn sink_for(format: ExportFormat) -> Box<dyn RecordSink> {
    match format {
        ExportFormat::Csv => Box::new(CsvSink),
        ExportFormat::Json => Box::new(JsonSink),
    }
}

/// Exports records in every configured format
///
/// Each file is written to `<export-base>.<extension>`. Nothing is written
/// when there are no records.
///
/// # Returns
///
/// * `Ok(paths)` - The files written, empty when there was nothing to export
/// * `Err(ExportError)` - A sink failed; earlier files may already exist
pub fn export_records(records: &[Record], config: &OutputConfig) -> ExportResult<Vec<PathBuf>> {
    if records.is_empty() {
        tracing::warn!("No records to export");
        return Ok(Vec::new());
    }

    let mut written = Vec::with_capacity(config.formats.len());
    for format in &config.formats {
        let sink = sink_for(*format);
        let path = PathBuf::from(format!("{}.{}", config.export_base, sink.extension()));
        sink.write(records, &path)?;
        written.push(path);
    }

    Ok(written)
}
