//! URL handling module for Catalog-Harvest
//!
//! This module provides item URL resolution against a site origin, listing cursor URL
//! construction, and identifier derivation from product URLs.

mod cursor;
mod resolve;

// Re-export main functions
pub use cursor::with_query_param;
pub use resolve::{absolutize, derive_identifier, parse_http_url};
