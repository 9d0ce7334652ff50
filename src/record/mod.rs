//! Record types flowing through one harvest run
//!
//! - `ItemRecord`: one listing item, deduplicated by `identifier` during pagination
//! - `DetailRecord`: supplementary fields from an item's detail page, keyed by URL
//! - `MergedRecord`: listing fields overlaid with detail fields
//!
//! Records are immutable once produced; merging always builds a new record.

mod value;

pub use value::{FieldValue, SENTINEL};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Field name -> value mapping shared by all record kinds
pub type Fields = BTreeMap<String, FieldValue>;

/// Column names reserved for record metadata
pub const IDENTIFIER_KEY: &str = "identifier";
pub const CANONICAL_URL_KEY: &str = "canonical_url";
pub const EXTRACTED_AT_KEY: &str = "extracted_at";
pub const DETAIL_EXTRACTED_AT_KEY: &str = "detail_extracted_at";
pub const ERROR_KEY: &str = "error";

/// Keys a declared field may not use, since records serialize flat
pub const RESERVED_KEYS: &[&str] = &[
    IDENTIFIER_KEY,
    CANONICAL_URL_KEY,
    EXTRACTED_AT_KEY,
    DETAIL_EXTRACTED_AT_KEY,
    ERROR_KEY,
];

/// A listing item extracted from a listing page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRecord {
    /// Site-assigned identifier, or derived from the URL
    pub identifier: String,

    /// Absolute detail-page URL, or the sentinel
    pub canonical_url: String,

    pub extracted_at: DateTime<Utc>,

    #[serde(flatten)]
    pub fields: Fields,
}

impl ItemRecord {
    pub fn new(identifier: impl Into<String>, canonical_url: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            canonical_url: canonical_url.into(),
            extracted_at: Utc::now(),
            fields: Fields::new(),
        }
    }

    /// Adds a field, returning the record (builder style)
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Returns true if the item has a real detail URL
    pub fn has_url(&self) -> bool {
        self.canonical_url != SENTINEL
    }

    /// Key used for run-level deduplication
    ///
    /// The canonical URL when present, otherwise `id:<identifier>` so that URL-less items
    /// are not all collapsed onto the sentinel.
    pub fn dedup_key(&self) -> String {
        if self.has_url() {
            self.canonical_url.clone()
        } else {
            format!("id:{}", self.identifier)
        }
    }
}

/// Supplementary fields loaded from an item's detail page
///
/// Failed fetches are represented by a placeholder with every declared field set to the
/// sentinel and `error` describing the cause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailRecord {
    pub canonical_url: String,

    pub extracted_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(flatten)]
    pub fields: Fields,
}

impl DetailRecord {
    pub fn new(canonical_url: impl Into<String>, fields: Fields) -> Self {
        Self {
            canonical_url: canonical_url.into(),
            extracted_at: Utc::now(),
            error: None,
            fields,
        }
    }

    /// Builds the error placeholder written to `detail.json` for a failed URL
    pub fn placeholder<'a>(
        canonical_url: impl Into<String>,
        field_names: impl IntoIterator<Item = &'a str>,
        cause: impl Into<String>,
    ) -> Self {
        let fields = field_names
            .into_iter()
            .map(|name| (name.to_string(), FieldValue::sentinel()))
            .collect();

        Self {
            canonical_url: canonical_url.into(),
            extracted_at: Utc::now(),
            error: Some(cause.into()),
            fields,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.error.is_some()
    }
}

/// Union of a listing record and its detail record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedRecord {
    pub identifier: String,

    pub canonical_url: String,

    pub extracted_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail_extracted_at: Option<DateTime<Utc>>,

    #[serde(flatten)]
    pub fields: Fields,
}

impl MergedRecord {
    /// Merges a listing record with its detail record
    ///
    /// Detail fields override listing fields on key collision. Without a detail record,
    /// every name in `detail_fields` that the listing does not already carry is set to the
    /// sentinel.
    pub fn merge<'a>(
        item: &ItemRecord,
        detail: Option<&DetailRecord>,
        detail_fields: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        let mut fields = item.fields.clone();

        let detail_extracted_at = match detail {
            Some(detail) => {
                fields.extend(
                    detail
                        .fields
                        .iter()
                        .map(|(name, value)| (name.clone(), value.clone())),
                );
                Some(detail.extracted_at)
            }
            None => {
                for name in detail_fields {
                    fields
                        .entry(name.to_string())
                        .or_insert_with(FieldValue::sentinel);
                }
                None
            }
        };

        Self {
            identifier: item.identifier.clone(),
            canonical_url: item.canonical_url.clone(),
            extracted_at: item.extracted_at,
            detail_extracted_at,
            fields,
        }
    }

    /// Flattens the record into a column -> cell mapping for tabular output
    pub fn to_row(&self) -> BTreeMap<String, String> {
        let mut row: BTreeMap<String, String> = self
            .fields
            .iter()
            .map(|(name, value)| (name.clone(), value.to_cell()))
            .collect();

        row.insert(IDENTIFIER_KEY.to_string(), self.identifier.clone());
        row.insert(CANONICAL_URL_KEY.to_string(), self.canonical_url.clone());
        row.insert(EXTRACTED_AT_KEY.to_string(), self.extracted_at.to_rfc3339());
        if let Some(at) = self.detail_extracted_at {
            row.insert(DETAIL_EXTRACTED_AT_KEY.to_string(), at.to_rfc3339());
        }

        row
    }
}
