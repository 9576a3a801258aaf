//! Statistics display
//!
//! This module renders sweep counters for the terminal.

use crate::state::Stats;

/// Formats statistics as an aligned text block
///
/// # Arguments
///
/// * `stats` - The counters to display
/// * `range_size` - Number of IDs in the configured range
pub fn format_statistics(stats: &Stats, range_size: u64) -> String {
    let mut out = String::new();

    out.push_str("=== Sweep Statistics ===\n\n");

    out.push_str("Progress:\n");
    out.push_str(&format!(
        "  Processed: {} / {} ({:.1}%)\n",
        stats.total_processed,
        range_size,
        stats.progress(range_size)
    ));
    match stats.last_processed_id {
        Some(last) => out.push_str(&format!("  Last committed ID: {}\n\n", last)),
        None => out.push_str("  Last committed ID: none\n\n"),
    }

    out.push_str("Outcomes:\n");
    out.push_str(&format!("  Successful (valid records): {}\n", stats.successful));
    out.push_str(&format!("  Failed: {}\n", stats.failed));
    out.push_str(&format!("    of which no phone found: {}\n", stats.no_identifier));
    out.push_str(&format!(
        "    of which invalid phone: {}\n\n",
        stats.invalid_identifier
    ));

    out.push_str(&format!(
        "Success Rate: {:.1}% ({} / {} IDs yielded a record)\n",
        stats.success_rate(),
        stats.valid_records,
        stats.total_processed
    ));
    out.push_str(&format!("Error Rate: {:.1}%\n", stats.error_rate()));

    out
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &Stats, range_size: u64) {
    print!("{}", format_statistics(stats, range_size));
}
