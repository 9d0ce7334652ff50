//! Run statistics
//!
//! This module provides the counters collected over one harvest run and the
//! console report printed when the run ends.

use std::time::Duration;

/// Counters for one harvest run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Seeds supplied
    pub seeds: usize,

    /// Seeds whose first listing page loaded
    pub seeds_loaded: usize,

    /// Listing records collected across all seeds, before URL deduplication
    pub listing_records: usize,

    /// Listing items dropped because the item itself was unusable
    pub discarded_records: usize,

    /// Listing records removed by URL deduplication
    pub duplicates_removed: usize,

    /// Detail pages fetched successfully
    pub detail_fetched: usize,

    /// Detail pages that failed (placeholders written)
    pub detail_failures: usize,

    /// Records without a URL, for which no detail fetch was attempted
    pub detail_skipped: usize,

    /// Records in the final dataset
    pub final_records: usize,

    pub elapsed: Duration,
}

impl RunStats {
    /// Share of attempted detail fetches that succeeded, in percent
    pub fn detail_success_rate(&self) -> f64 {
        let attempted = self.detail_fetched + self.detail_failures;
        if attempted > 0 {
            (self.detail_fetched as f64 / attempted as f64) * 100.0
        } else {
            0.0
        }
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &RunStats) {
    println!("=== Harvest Statistics ===\n");

    println!("Listing:");
    println!("  Seeds loaded: {} / {}", stats.seeds_loaded, stats.seeds);
    println!("  Records collected: {}", stats.listing_records);
    println!("  Records discarded: {}", stats.discarded_records);
    println!("  Duplicates removed: {}", stats.duplicates_removed);
    println!();

    println!("Detail:");
    println!("  Fetched: {}", stats.detail_fetched);
    println!("  Failed: {}", stats.detail_failures);
    println!("  Skipped (no URL): {}", stats.detail_skipped);
    println!();

    println!(
        "Final dataset: {} records in {:.1}s",
        stats.final_records,
        stats.elapsed.as_secs_f64()
    );
    println!(
        "Detail Success Rate: {:.1}% ({} / {} detail pages)",
        stats.detail_success_rate(),
        stats.detail_fetched,
        stats.detail_fetched + stats.detail_failures
    );
}
