//! In-memory deduplication and merge
//!
//! Nothing here suspends: the pipeline hands over complete listing and detail sequences and
//! gets back the final dataset.

use crate::record::{DetailRecord, ItemRecord, MergedRecord};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Final merged records in listing order, unique by canonical URL
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Dataset {
    pub records: Vec<MergedRecord>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Drops listing records whose dedup key was already seen; first occurrence wins
///
/// Returns the surviving records and the number removed.
pub fn dedup_by_url(records: Vec<ItemRecord>) -> (Vec<ItemRecord>, usize) {
    let before = records.len();
    let mut seen = HashSet::new();

    let unique: Vec<ItemRecord> = records
        .into_iter()
        .filter(|record| {
            let fresh = seen.insert(record.dedup_key());
            if !fresh {
                tracing::debug!(
                    identifier = %record.identifier,
                    url = %record.canonical_url,
                    "Dropping duplicate listing record"
                );
            }
            fresh
        })
        .collect();

    let removed = before - unique.len();
    (unique, removed)
}

/// Indexes successful detail records by canonical URL
pub fn index_details(details: &[DetailRecord]) -> HashMap<&str, &DetailRecord> {
    details
        .iter()
        .filter(|detail| !detail.is_placeholder())
        .map(|detail| (detail.canonical_url.as_str(), detail))
        .collect()
}

/// Merges each listing record with its detail record, preserving listing order
///
/// A record without a successful detail record keeps its listing fields and gets the
/// sentinel for every name in `detail_fields`.
pub fn merge_records(
    listing: &[ItemRecord],
    details: &HashMap<&str, &DetailRecord>,
    detail_fields: &[String],
) -> Dataset {
    let records = listing
        .iter()
        .map(|item| {
            let detail = details.get(item.canonical_url.as_str()).copied();
            MergedRecord::merge(item, detail, detail_fields.iter().map(String::as_str))
        })
        .collect();

    Dataset { records }
}
