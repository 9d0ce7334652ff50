//! Output module for run datasets and summaries
//!
//! This module handles:
//! - Writing listing, detail and final datasets as JSON and CSV
//! - Generating the markdown run summary
//! - Recording and printing run statistics

mod markdown;
pub mod stats;
mod writer;

pub use markdown::format_markdown_summary;
pub use stats::{print_statistics, RunStats};
pub use writer::{
    DatasetWriter, DETAIL_FILE, FINAL_CSV_FILE, FINAL_JSON_FILE, LISTING_FILE, SUMMARY_FILE,
};

use crate::crawler::RunOutcome;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to write CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Writes every output file for a completed run
///
/// # Arguments
///
/// * `writer` - Destination directory and file prefix
/// * `outcome` - The completed run
/// * `site` - Name of the harvested site profile
/// * `config_hash` - SHA-256 of the configuration file
///
/// # Returns
///
/// * `Ok(Vec<PathBuf>)` - Paths of the files written, in write order
/// * `Err(OutputError)` - A file could not be written
pub fn write_run(
    writer: &DatasetWriter,
    outcome: &RunOutcome,
    site: &str,
    config_hash: &str,
) -> OutputResult<Vec<PathBuf>> {
    let paths = vec![
        writer.write_json(LISTING_FILE, &outcome.listing)?,
        writer.write_json(DETAIL_FILE, &outcome.details)?,
        writer.write_json(FINAL_JSON_FILE, &outcome.dataset)?,
        writer.write_csv(FINAL_CSV_FILE, &outcome.dataset.records)?,
        writer.write_text(
            SUMMARY_FILE,
            &format_markdown_summary(outcome, site, config_hash),
        )?,
    ];

    for path in &paths {
        tracing::info!("Wrote {}", path.display());
    }

    Ok(paths)
}
