//! Markdown summary generation
//!
//! This module generates a human-readable markdown summary of a sweep,
//! including counters, rates, the phone prefix distribution and listing
//! totals.

use crate::output::traits::{ExportError, ExportResult, SweepSummary};
use std::path::Path;

/// Generates a markdown summary and writes it to `output_path`
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote markdown summary
/// * `Err(ExportError)` - Failed to write summary
pub fn generate_markdown_summary(summary: &SweepSummary, output_path: &Path) -> ExportResult<()> {
    let markdown = format_markdown_summary(summary);

    std::fs::write(output_path, markdown).map_err(|source| ExportError::Io {
        path: output_path.display().to_string(),
        source,
    })?;

    tracing::info!("✓ Summary written to {}", output_path.display());
    Ok(())
}

/// Formats a sweep summary as markdown
pub fn format_markdown_summary(summary: &SweepSummary) -> String {
    let stats = &summary.stats;
    let mut md = String::new();

    md.push_str("# Mojo Profile Sweep Summary\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!(
        "- **ID Range**: {} - {} ({} IDs)\n",
        summary.start_id,
        summary.end_id,
        summary.range_size()
    ));
    if let Some(resumed_from) = summary.resumed_from {
        md.push_str(&format!("- **Resumed From**: {}\n", resumed_from));
    }
    match stats.last_processed_id {
        Some(last) => md.push_str(&format!("- **Last Committed ID**: {}\n", last)),
        None => md.push_str("- **Last Committed ID**: none\n"),
    }
    md.push_str(&format!("- **Status**: {}\n", summary.status));
    if let Some(hash) = &summary.config_hash {
        md.push_str(&format!("- **Config Hash**: {}\n", hash));
    }
    md.push_str(&format!(
        "- **Generated**: {}\n\n",
        summary.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    // Overall statistics
    md.push_str("## Overall Statistics\n\n");
    md.push_str(&format!(
        "- **Total Processed**: {} ({:.1}% of range)\n",
        stats.total_processed,
        stats.progress(summary.range_size())
    ));
    md.push_str(&format!("- **Valid Records**: {}\n", stats.valid_records));
    md.push_str(&format!("- **Success Rate**: {:.2}%\n", stats.success_rate()));
    md.push_str(&format!("- **Error Rate**: {:.2}%\n\n", stats.error_rate()));

    // Outcome breakdown
    md.push_str("## Outcome Breakdown\n\n");
    md.push_str("| Outcome | Count |\n");
    md.push_str("|---------|-------|\n");
    md.push_str(&format!("| Successful (valid record) | {} |\n", stats.successful));
    md.push_str(&format!("| Failed | {} |\n", stats.failed));
    md.push_str(&format!("| Failed: no phone found | {} |\n", stats.no_identifier));
    md.push_str(&format!(
        "| Failed: invalid phone | {} |\n\n",
        stats.invalid_identifier
    ));

    // Prefix distribution, most common first
    if !summary.prefix_distribution.is_empty() {
        md.push_str("## Phone Prefix Distribution\n\n");
        md.push_str("| Prefix | Records | Share |\n");
        md.push_str("|--------|---------|-------|\n");

        let total: u64 = summary.prefix_distribution.values().sum();
        let mut prefixes: Vec<_> = summary.prefix_distribution.iter().collect();
        prefixes.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

        for (prefix, count) in prefixes {
            md.push_str(&format!(
                "| 0{} | {} | {:.1}% |\n",
                prefix,
                count,
                *count as f64 / total as f64 * 100.0
            ));
        }
        md.push('\n');
    }

    // Listings
    md.push_str("## Listings\n\n");
    md.push_str(&format!("- **Total Listings**: {}\n", summary.total_listings));
    md.push_str(&format!(
        "- **Records With Listing Count**: {}\n",
        summary.records_with_listings
    ));
    md.push_str(&format!(
        "- **Average Listings**: {:.2}\n",
        summary.average_listings()
    ));

    md
}
