//! Markdown summary generation
//!
//! This module generates a human-readable markdown summary of one harvest run,
//! including per-seed termination, totals and failure counts.

use crate::crawler::RunOutcome;

/// Formats a run outcome as markdown
///
/// # Arguments
///
/// * `outcome` - The completed run
/// * `site` - Name of the harvested site profile
/// * `config_hash` - SHA-256 of the configuration file
///
/// # Returns
///
/// A formatted markdown string
pub fn format_markdown_summary(outcome: &RunOutcome, site: &str, config_hash: &str) -> String {
    let stats = &outcome.stats;
    let mut md = String::new();

    // Title
    md.push_str("# Catalog-Harvest Run Summary\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Site**: {}\n", site));
    md.push_str(&format!("- **Started**: {}\n", outcome.started_at.to_rfc3339()));
    md.push_str(&format!("- **Finished**: {}\n", outcome.finished_at.to_rfc3339()));
    md.push_str(&format!(
        "- **Duration**: {:.1} seconds\n",
        stats.elapsed.as_secs_f64()
    ));
    md.push_str(&format!("- **Config Hash**: {}\n\n", config_hash));

    // Seeds
    md.push_str("## Seeds\n\n");
    md.push_str("| Seed | Collected | Pages | Discarded | Termination |\n");
    md.push_str("|------|-----------|-------|-----------|-------------|\n");
    for seed in &outcome.seeds {
        md.push_str(&format!(
            "| {} | {} | {} | {} | {} |\n",
            seed.seed,
            seed.collected,
            seed.pages_loaded,
            seed.discarded,
            escape_cell(&seed.termination.to_string())
        ));
    }
    md.push('\n');

    // Totals
    md.push_str("## Totals\n\n");
    md.push_str(&format!(
        "- **Seeds Loaded**: {} / {}\n",
        stats.seeds_loaded, stats.seeds
    ));
    md.push_str(&format!("- **Listing Records**: {}\n", stats.listing_records));
    md.push_str(&format!(
        "- **Discarded Records**: {}\n",
        stats.discarded_records
    ));
    md.push_str(&format!(
        "- **Duplicates Removed**: {}\n",
        stats.duplicates_removed
    ));
    md.push_str(&format!("- **Detail Pages Fetched**: {}\n", stats.detail_fetched));
    md.push_str(&format!("- **Detail Failures**: {}\n", stats.detail_failures));
    md.push_str(&format!(
        "- **Detail Skipped (no URL)**: {}\n",
        stats.detail_skipped
    ));
    md.push_str(&format!("- **Final Records**: {}\n\n", stats.final_records));

    // Failed detail pages
    let failures: Vec<_> = outcome
        .details
        .iter()
        .filter_map(|detail| detail.error.as_ref().map(|e| (&detail.canonical_url, e)))
        .collect();
    if !failures.is_empty() {
        md.push_str("## Detail Failures\n\n");
        md.push_str("| URL | Cause |\n");
        md.push_str("|-----|-------|\n");
        for (url, cause) in failures.iter().take(50) {
            md.push_str(&format!("| {} | {} |\n", url, escape_cell(cause)));
        }
        if failures.len() > 50 {
            md.push_str(&format!("\n... and {} more\n", failures.len() - 50));
        }
        md.push('\n');
    }

    md
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}
