//! Configuration module for Catalog-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use catalog_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Harvesting {} seeds", config.input.seeds.len());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, HttpConfig, InputConfig, OutputConfig, PipelineConfig, SiteConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, read_config, read_config_with_hash};

pub use validation::validate;
