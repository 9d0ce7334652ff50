//! Field extraction with sentinel fallbacks
//!
//! A [`FieldExtractor`] knows how to read one site's fields from an [`ItemHandle`]. The
//! fallback policy lives here rather than in each extractor:
//!
//! - every declared field gets its own bounded wait; a timeout, an error or an absent value
//!   resolves that field to the `"N/A"` sentinel (partial extraction is success)
//! - only a failure to identify the item itself discards the whole record
//!
//! The same policy serves listing items and detail pages; a detail page is simply a handle
//! whose HTML is the whole document.

mod selector;

pub use selector::{compile, Scope, SelectorExtractor};

use crate::record::{FieldValue, Fields, ItemRecord};
use crate::site::FieldSpec;
use crate::url::derive_identifier;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by field extractors
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("item #{position} is unusable: {reason}")]
    HandleGone { position: usize, reason: String },

    #[error("item #{position} has neither an identifier nor a URL")]
    Unidentified { position: usize },

    #[error("field '{field}' failed: {reason}")]
    Field { field: String, reason: String },
}

/// An owned snapshot of one rendered item
///
/// Owning the markup keeps extraction futures `Send`; the parsed DOM is rebuilt by the
/// extractor and never held across an await.
#[derive(Debug, Clone, Default)]
pub struct ItemHandle {
    /// Zero-based position within the seed's enumeration
    pub position: usize,

    /// Outer HTML of the item (or the whole document for detail pages)
    pub html: String,

    /// Attributes of the item's root element
    pub attributes: HashMap<String, String>,
}

impl ItemHandle {
    pub fn new(position: usize, html: impl Into<String>) -> Self {
        Self {
            position,
            html: html.into(),
            attributes: HashMap::new(),
        }
    }

    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    /// Non-blank root attribute value
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .get(name)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }
}

/// Identity located on an item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemIdentity {
    /// Site-assigned identifier, when the item carries one
    pub identifier: Option<String>,

    /// Absolute URL, or the sentinel
    pub canonical_url: String,
}

/// Site-specific field reader
#[async_trait]
pub trait FieldExtractor: Send + Sync {
    /// Fields this extractor declares, in output order
    fn fields(&self) -> &[FieldSpec];

    /// Locates the item's identifier and URL
    ///
    /// An error here means the handle itself is unusable and the record is dropped.
    async fn identify(&self, item: &ItemHandle) -> Result<ItemIdentity, ExtractError>;

    /// Reads one field; `Ok(None)` when the field is absent on this item
    async fn field(
        &self,
        item: &ItemHandle,
        spec: &FieldSpec,
    ) -> Result<Option<FieldValue>, ExtractError>;
}

/// Extracts every declared field, substituting the sentinel for each failed one
pub async fn extract_fields<E>(extractor: &E, item: &ItemHandle, field_timeout: Duration) -> Fields
where
    E: FieldExtractor + ?Sized,
{
    let mut fields = Fields::new();

    for spec in extractor.fields() {
        let value = match tokio::time::timeout(field_timeout, extractor.field(item, spec)).await {
            Ok(Ok(Some(value))) => value,
            Ok(Ok(None)) => {
                tracing::trace!(item = item.position, field = %spec.name, "field absent");
                FieldValue::sentinel()
            }
            Ok(Err(e)) => {
                tracing::debug!(item = item.position, field = %spec.name, error = %e, "field failed");
                FieldValue::sentinel()
            }
            Err(_) => {
                tracing::debug!(
                    item = item.position,
                    field = %spec.name,
                    timeout_ms = field_timeout.as_millis() as u64,
                    "field timed out"
                );
                FieldValue::sentinel()
            }
        };

        fields.insert(spec.name.clone(), value);
    }

    fields
}

/// Extracts a full listing record from one item
///
/// The identifier falls back to one derived from the canonical URL; an item with neither
/// is an error. Field failures never fail the record.
pub async fn extract_item<E>(
    extractor: &E,
    item: &ItemHandle,
    field_timeout: Duration,
) -> Result<ItemRecord, ExtractError>
where
    E: FieldExtractor + ?Sized,
{
    let identity = match tokio::time::timeout(field_timeout, extractor.identify(item)).await {
        Ok(result) => result?,
        Err(_) => {
            return Err(ExtractError::HandleGone {
                position: item.position,
                reason: "identity lookup timed out".to_string(),
            })
        }
    };

    let identifier = identity
        .identifier
        .filter(|id| !id.trim().is_empty())
        .or_else(|| derive_identifier(&identity.canonical_url))
        .ok_or(ExtractError::Unidentified {
            position: item.position,
        })?;

    let mut record = ItemRecord::new(identifier, identity.canonical_url);
    record.fields = extract_fields(extractor, item, field_timeout).await;
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::SENTINEL;

    /// Extractor whose fields behave according to their name
    struct ScriptedExtractor {
        fields: Vec<FieldSpec>,
        identity: Option<ItemIdentity>,
    }

    #[async_trait]
    impl FieldExtractor for ScriptedExtractor {
        fn fields(&self) -> &[FieldSpec] {
            &self.fields
        }

        async fn identify(&self, item: &ItemHandle) -> Result<ItemIdentity, ExtractError> {
            self.identity.clone().ok_or(ExtractError::HandleGone {
                position: item.position,
                reason: "detached".to_string(),
            })
        }

        async fn field(
            &self,
            _item: &ItemHandle,
            spec: &FieldSpec,
        ) -> Result<Option<FieldValue>, ExtractError> {
            match spec.name.as_str() {
                "slow" => {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    Ok(Some(FieldValue::from("late")))
                }
                "broken" => Err(ExtractError::Field {
                    field: spec.name.clone(),
                    reason: "boom".to_string(),
                }),
                "absent" => Ok(None),
                _ => Ok(Some(FieldValue::from("ok"))),
            }
        }
    }

    fn extractor(identity: Option<ItemIdentity>) -> ScriptedExtractor {
        ScriptedExtractor {
            fields: ["good", "slow", "broken", "absent"]
                .iter()
                .map(|name| FieldSpec::text(name, &["x"]))
                .collect(),
            identity,
        }
    }

    #[tokio::test]
    async fn test_partial_extraction_is_success() {
        let extractor = extractor(Some(ItemIdentity {
            identifier: Some("42".to_string()),
            canonical_url: "https://shop.com/p/42".to_string(),
        }));

        let record = extract_item(&extractor, &ItemHandle::new(0, ""), Duration::from_millis(50))
            .await
            .unwrap();

        assert_eq!(record.identifier, "42");
        assert_eq!(record.fields["good"], FieldValue::from("ok"));
        assert!(record.fields["slow"].is_sentinel());
        assert!(record.fields["broken"].is_sentinel());
        assert!(record.fields["absent"].is_sentinel());
    }

    #[tokio::test]
    async fn test_identifier_derived_from_url() {
        let extractor = extractor(Some(ItemIdentity {
            identifier: Some("  ".to_string()),
            canonical_url: "https://www.myntra.com/kurtas/acme/9911/buy".to_string(),
        }));

        let record = extract_item(&extractor, &ItemHandle::new(3, ""), Duration::from_millis(50))
            .await
            .unwrap();
        assert_eq!(record.identifier, "9911");
    }

    #[tokio::test]
    async fn test_unidentified_item_is_dropped() {
        let extractor = extractor(Some(ItemIdentity {
            identifier: None,
            canonical_url: SENTINEL.to_string(),
        }));

        let result = extract_item(&extractor, &ItemHandle::new(7, ""), Duration::from_millis(50)).await;
        assert!(matches!(result, Err(ExtractError::Unidentified { position: 7 })));
    }

    #[tokio::test]
    async fn test_unusable_handle_is_dropped() {
        let extractor = extractor(None);
        let result = extract_item(&extractor, &ItemHandle::new(1, ""), Duration::from_millis(50)).await;
        assert!(matches!(result, Err(ExtractError::HandleGone { position: 1, .. })));
    }

    #[test]
    fn test_blank_attribute_is_absent() {
        let handle = ItemHandle::new(0, "").with_attribute("data-asin", " ");
        assert_eq!(handle.attribute("data-asin"), None);
        assert_eq!(handle.attribute("missing"), None);
    }
}
