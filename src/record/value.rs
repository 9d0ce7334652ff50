//! Field values and the "not available" sentinel

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Placeholder for a field that could not be extracted
///
/// Distinct from absence of the key: a sentinel field was declared and attempted.
pub const SENTINEL: &str = "N/A";

/// A single extracted field value
///
/// Serialized untagged, so JSON output reads as plain strings, arrays and objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Single text value
    Text(String),

    /// Multi-valued field (sizes, bullet points)
    List(Vec<String>),

    /// Key/value table (specifications, product facts)
    Table(BTreeMap<String, String>),
}

impl FieldValue {
    /// The `"N/A"` sentinel value
    pub fn sentinel() -> Self {
        Self::Text(SENTINEL.to_string())
    }

    /// Returns true if this is the sentinel
    pub fn is_sentinel(&self) -> bool {
        matches!(self, Self::Text(text) if text == SENTINEL)
    }

    /// Renders the value as a single CSV cell
    ///
    /// Text is emitted verbatim; lists and tables are compact JSON so the cell stays lossless.
    pub fn to_cell(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::List(_) | Self::Table(_) => {
                serde_json::to_string(self).unwrap_or_else(|_| SENTINEL.to_string())
            }
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_cell())
    }
}
