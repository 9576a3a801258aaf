//! JSON record export

use crate::output::traits::{ExportError, ExportResult, RecordSink};
use crate::state::Record;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes all records as one pretty-printed JSON array
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSink;

impl RecordSink for JsonSink {
    fn extension(&self) -> &'static str {
        "json"
    }

    fn write(&self, records: &[Record], path: &Path) -> ExportResult<()> {
        let io_error = |source| ExportError::Io {
            path: path.display().to_string(),
            source,
        };

        let file = File::create(path).map_err(io_error)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, records)?;
        writer.flush().map_err(io_error)?;

        tracing::info!("✓ Exported {} records to {}", records.len(), path.display());
        Ok(())
    }
}
