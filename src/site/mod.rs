//! Site profiles: the per-site extraction strategy
//!
//! A `SiteProfile` declares everything that differs between target sites: the base origin,
//! how listing pages paginate, which element is one item, how an item is identified, and
//! which fields are extracted from listing items and detail pages. The pipeline itself is
//! site-agnostic.
//!
//! Profiles are either one of the built-in presets (see [`preset`]) or written inline in the
//! configuration file.

mod presets;

pub use presets::{preset, PRESET_NAMES};

use serde::Deserialize;
use std::collections::BTreeMap;

/// Complete extraction strategy for one site
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SiteProfile {
    /// Short site name used in logs and the run summary
    pub name: String,

    /// Origin used to resolve relative item URLs (e.g. "https://www.ajio.com/")
    pub base_url: String,

    pub listing: ListingProfile,

    pub detail: DetailProfile,
}

impl SiteProfile {
    /// Names of the declared detail fields, in declaration order
    pub fn detail_field_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.detail.fields.iter().map(|field| field.name.as_str())
    }

    /// Every CSS selector the profile declares, for up-front validation
    pub fn selectors(&self) -> Vec<&str> {
        let mut selectors = vec![self.listing.item_selector.as_str()];
        selectors.extend(self.listing.ready_selector.as_deref());
        selectors.extend(self.listing.identity.url_selector.as_deref());
        selectors.extend(self.detail.ready_selector.as_deref());

        for field in self.listing.fields.iter().chain(&self.detail.fields) {
            selectors.extend(field.selectors.iter().map(String::as_str));
            match &field.kind {
                FieldKind::Pairs {
                    key_selector,
                    value_selector,
                    ..
                } => {
                    selectors.push(key_selector);
                    selectors.push(value_selector);
                }
                FieldKind::Labeled { labels } => {
                    selectors.extend(labels.values().map(String::as_str));
                }
                _ => {}
            }
        }

        selectors
    }
}

/// How listing pages are enumerated
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ListingProfile {
    /// Selector matching one element per listing item
    pub item_selector: String,

    /// Selector that must be present for the page to count as loaded
    #[serde(default)]
    pub ready_selector: Option<String>,

    pub pagination: PaginationStyle,

    #[serde(default)]
    pub identity: IdentitySpec,

    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

/// How the detail page is parsed
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DetailProfile {
    #[serde(default)]
    pub ready_selector: Option<String>,

    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

/// Listing pagination style
///
/// Infinite-scroll loads skip the items already visible on the previous load; both styles
/// stop on loads that add no unseen identifier.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "style", rename_all = "kebab-case")]
pub enum PaginationStyle {
    /// Numbered pages carried in a query parameter, starting at 1
    Page {
        #[serde(default = "default_page_param")]
        param: String,
    },

    /// Cumulative scroll offset carried in a query parameter, starting at 0
    Scroll {
        #[serde(default = "default_scroll_step")]
        step: u32,
        #[serde(default = "default_scroll_param")]
        param: String,
    },
}

fn default_page_param() -> String {
    "page".to_string()
}

fn default_scroll_step() -> u32 {
    800
}

fn default_scroll_param() -> String {
    "offset".to_string()
}

/// How an item's identifier and canonical URL are located
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct IdentitySpec {
    /// Attribute on the item root holding the site identifier (e.g. "data-id")
    #[serde(default)]
    pub id_attribute: Option<String>,

    /// Selector for the element carrying the item link; the item root itself when `None`
    #[serde(default = "default_url_selector")]
    pub url_selector: Option<String>,

    #[serde(default = "default_url_attribute")]
    pub url_attribute: String,
}

impl Default for IdentitySpec {
    fn default() -> Self {
        Self {
            id_attribute: None,
            url_selector: default_url_selector(),
            url_attribute: default_url_attribute(),
        }
    }
}

fn default_url_selector() -> Option<String> {
    Some("a".to_string())
}

fn default_url_attribute() -> String {
    "href".to_string()
}

/// One declared field
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FieldSpec {
    /// Output field name
    pub name: String,

    /// Fallback selectors, tried in order; the first one yielding a value wins
    pub selectors: Vec<String>,

    #[serde(flatten)]
    pub kind: FieldKind,
}

impl FieldSpec {
    pub fn text(name: &str, selectors: &[&str]) -> Self {
        Self::new(name, selectors, FieldKind::Text)
    }

    pub fn digits(name: &str, selectors: &[&str]) -> Self {
        Self::new(name, selectors, FieldKind::Digits)
    }

    pub fn list(name: &str, selectors: &[&str]) -> Self {
        Self::new(name, selectors, FieldKind::List)
    }

    pub fn flag(name: &str, selectors: &[&str]) -> Self {
        Self::new(name, selectors, FieldKind::Flag)
    }

    pub fn attribute(name: &str, selectors: &[&str], attribute: &str, absolute: bool) -> Self {
        Self::new(
            name,
            selectors,
            FieldKind::Attribute {
                attribute: attribute.to_string(),
                absolute,
            },
        )
    }

    pub fn pairs(name: &str, selectors: &[&str], key_selector: &str, value_selector: &str) -> Self {
        Self::new(
            name,
            selectors,
            FieldKind::Pairs {
                key_selector: key_selector.to_string(),
                value_selector: value_selector.to_string(),
                keys: Vec::new(),
            },
        )
    }

    /// Pairs restricted to an allow-list of keys
    pub fn pairs_with_keys(
        name: &str,
        selectors: &[&str],
        key_selector: &str,
        value_selector: &str,
        keys: &[&str],
    ) -> Self {
        Self::new(
            name,
            selectors,
            FieldKind::Pairs {
                key_selector: key_selector.to_string(),
                value_selector: value_selector.to_string(),
                keys: keys.iter().map(|k| k.to_string()).collect(),
            },
        )
    }

    pub fn attributes(name: &str, selectors: &[&str], attribute: &str) -> Self {
        Self::new(
            name,
            selectors,
            FieldKind::Attributes {
                attribute: attribute.to_string(),
            },
        )
    }

    pub fn keywords(name: &str, selectors: &[&str], map: &[(&str, &[&str])]) -> Self {
        let map = map
            .iter()
            .map(|(label, keywords)| {
                (
                    label.to_string(),
                    keywords.iter().map(|k| k.to_string()).collect(),
                )
            })
            .collect();
        Self::new(name, selectors, FieldKind::Keywords { map })
    }

    pub fn labeled(name: &str, selectors: &[&str], labels: &[(&str, &str)]) -> Self {
        let labels = labels
            .iter()
            .map(|(label, selector)| (label.to_string(), selector.to_string()))
            .collect();
        Self::new(name, selectors, FieldKind::Labeled { labels })
    }

    fn new(name: &str, selectors: &[&str], kind: FieldKind) -> Self {
        Self {
            name: name.to_string(),
            selectors: selectors.iter().map(|s| s.to_string()).collect(),
            kind,
        }
    }
}

/// What a field extracts from its matched elements
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum FieldKind {
    /// Trimmed text of the first match
    Text,

    /// Text of the first match reduced to its ASCII digits
    Digits,

    /// Attribute of the first match; optionally resolved against the site origin
    Attribute {
        attribute: String,
        #[serde(default)]
        absolute: bool,
    },

    /// Trimmed text of every match
    List,

    /// Every non-empty value of an attribute across all matches of the first matching selector
    Attributes { attribute: String },

    /// Key/value table built inside every match; only `keys` are kept when non-empty
    Pairs {
        #[serde(rename = "key-selector")]
        key_selector: String,
        #[serde(rename = "value-selector")]
        value_selector: String,
        #[serde(default)]
        keys: Vec<String>,
    },

    /// Table of label -> first matched text containing one of the label's keywords
    ///
    /// Matching is case-insensitive; a trailing ':' on a keyword is ignored.
    Keywords { map: BTreeMap<String, Vec<String>> },

    /// Table of label -> text of the label's selector inside the first match
    Labeled { labels: BTreeMap<String, String> },

    /// "Yes" when any selector matches, otherwise "No"
    Flag,
}
