//! Catalog-Harvest: a listing + detail product catalog harvester
//!
//! This crate walks paginated or infinite-scroll product listings for one target site,
//! extracts a declared field set per item with sentinel fallbacks, fetches every item's
//! detail page, and merges both into a deduplicated dataset exported as JSON and CSV.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod output;
pub mod record;
pub mod site;
pub mod url;

use thiserror::Error;

/// Main error type for Catalog-Harvest operations
///
/// Only configuration problems, output failures and the "no seed could be loaded" case
/// surface here. Field, record and page failures are recovered inside the pipeline.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("None of the {seeds} seed URLs could be loaded")]
    NoSeedLoaded { seeds: usize },
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

    #[error("Unknown site preset: {0}")]
    UnknownPreset(String),

    #[error("Invalid CSS selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },
}

/// Result type alias for Catalog-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{MergePipeline, RunOutcome};
pub use record::{DetailRecord, FieldValue, ItemRecord, MergedRecord, SENTINEL};
pub use site::SiteProfile;
