//! CSV record export

use crate::output::traits::{ExportResult, RecordSink};
use crate::state::Record;
use std::path::Path;

/// Writes one row per record with a header of record field names
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvSink;

impl RecordSink for CsvSink {
    fn extension(&self) -> &'static str {
        "csv"
    }

    fn write(&self, records: &[Record], path: &Path) -> ExportResult<()> {
        let mut writer = csv::Writer::from_path(path)?;
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush().map_err(csv::Error::from)?;

        tracing::info!("✓ Exported {} records to {}", records.len(), path.display());
        Ok(())
    }
}
