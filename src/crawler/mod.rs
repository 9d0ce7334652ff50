//! Listing and detail harvesting
//!
//! This module contains the core pipeline logic, including:
//! - Page loading over one shared HTTP session
//! - Listing page parsing into item handles
//! - Pagination with stagnation and ceiling termination
//! - Detail page fetching with an optional retry policy
//! - Deduplication, merge and overall run orchestration

mod detail;
mod loader;
mod merge;
mod paginator;
mod parser;
mod pipeline;

pub use detail::{DetailFetcher, FetchCause, FetchError, RetryPolicy};
pub use loader::{build_http_client, HttpPageLoader, PageLoadError, PageLoader};
pub use merge::{dedup_by_url, index_details, merge_records, Dataset};
pub use paginator::{
    Cursor, ListingPaginator, PaginatorSettings, SeedReport, SeedSummary, Termination,
};
pub use parser::{is_ready, parse_listing, ListingSelectors};
pub use pipeline::{MergePipeline, RunOutcome};
