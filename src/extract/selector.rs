//! CSS-selector driven extractor built from a site profile

use super::{ExtractError, FieldExtractor, ItemHandle, ItemIdentity};
use crate::record::{FieldValue, SENTINEL};
use crate::site::{FieldKind, FieldSpec, IdentitySpec, SiteProfile};
use crate::url::absolutize;
use crate::ConfigError;
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use std::collections::{BTreeMap, HashMap};
use url::Url;

/// How the handle's HTML is parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// One listing item's outer HTML
    Fragment,
    /// A full detail page
    Document,
}

/// Field extractor driven by the selectors declared in a [`SiteProfile`]
///
/// All selectors are compiled once at construction; an invalid selector is a configuration
/// error, reported before any page is loaded.
#[derive(Debug)]
pub struct SelectorExtractor {
    fields: Vec<FieldSpec>,
    identity: IdentitySpec,
    base: Url,
    scope: Scope,
    compiled: HashMap<String, Selector>,
}

impl SelectorExtractor {
    /// Extractor for listing items
    pub fn listing(profile: &SiteProfile) -> Result<Self, ConfigError> {
        Self::build(
            profile,
            profile.listing.fields.clone(),
            profile.listing.identity.clone(),
            Scope::Fragment,
        )
    }

    /// Extractor for detail pages
    pub fn detail(profile: &SiteProfile) -> Result<Self, ConfigError> {
        Self::build(
            profile,
            profile.detail.fields.clone(),
            IdentitySpec::default(),
            Scope::Document,
        )
    }

    fn build(
        profile: &SiteProfile,
        fields: Vec<FieldSpec>,
        identity: IdentitySpec,
        scope: Scope,
    ) -> Result<Self, ConfigError> {
        let base = Url::parse(&profile.base_url).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid base URL '{}': {}", profile.base_url, e))
        })?;

        let mut compiled = HashMap::new();
        for selector in profile.selectors() {
            if !compiled.contains_key(selector) {
                compiled.insert(selector.to_string(), compile(selector)?);
            }
        }

        Ok(Self {
            fields,
            identity,
            base,
            scope,
            compiled,
        })
    }

    fn parse(&self, html: &str) -> Html {
        match self.scope {
            Scope::Fragment => Html::parse_fragment(html),
            Scope::Document => Html::parse_document(html),
        }
    }

    fn selector(&self, raw: &str) -> Result<Selector, ExtractError> {
        match self.compiled.get(raw) {
            Some(selector) => Ok(selector.clone()),
            None => Selector::parse(raw).map_err(|e| ExtractError::Field {
                field: raw.to_string(),
                reason: format!("invalid selector: {:?}", e),
            }),
        }
    }

    /// Synchronous extraction; the parsed DOM never outlives this call
    fn read_field(&self, html: &str, spec: &FieldSpec) -> Result<Option<FieldValue>, ExtractError> {
        let document = self.parse(html);
        let selectors = spec
            .selectors
            .iter()
            .map(|raw| self.selector(raw))
            .collect::<Result<Vec<_>, _>>()?;

        let value = match &spec.kind {
            FieldKind::Text => first_text(&document, &selectors).map(FieldValue::Text),
            FieldKind::Digits => selectors.iter().find_map(|selector| {
                document.select(selector).find_map(|element| {
                    let digits: String = element
                        .text()
                        .flat_map(str::chars)
                        .filter(char::is_ascii_digit)
                        .collect();
                    (!digits.is_empty()).then_some(FieldValue::Text(digits))
                })
            }),
            FieldKind::Attribute {
                attribute,
                absolute,
            } => selectors
                .iter()
                .find_map(|selector| {
                    document
                        .select(selector)
                        .find_map(|element| element.value().attr(attribute))
                        .map(str::trim)
                        .filter(|value| !value.is_empty())
                })
                .map(|value| {
                    if *absolute {
                        absolutize(Some(value), &self.base)
                    } else {
                        value.to_string()
                    }
                })
                .filter(|value| value != SENTINEL)
                .map(FieldValue::Text),
            FieldKind::List => selectors.iter().find_map(|selector| {
                let items: Vec<String> = document
                    .select(selector)
                    .map(element_text)
                    .filter(|text| !text.is_empty())
                    .collect();
                (!items.is_empty()).then_some(FieldValue::List(items))
            }),
            FieldKind::Attributes { attribute } => selectors.iter().find_map(|selector| {
                let values: Vec<String> = document
                    .select(selector)
                    .filter_map(|element| element.value().attr(attribute))
                    .map(str::trim)
                    .filter(|value| !value.is_empty())
                    .map(str::to_string)
                    .collect();
                (!values.is_empty()).then_some(FieldValue::List(values))
            }),
            FieldKind::Pairs {
                key_selector,
                value_selector,
                keys,
            } => {
                let key_selector = self.selector(key_selector)?;
                let value_selector = self.selector(value_selector)?;
                selectors.iter().find_map(|selector| {
                    let table: BTreeMap<String, String> = document
                        .select(selector)
                        .filter_map(|row| {
                            let key = row.select(&key_selector).next().map(element_text)?;
                            let value = row.select(&value_selector).next().map(element_text)?;
                            let key = key.trim_end_matches(':').trim().to_string();
                            let wanted = keys.is_empty() || keys.contains(&key);
                            (wanted && !key.is_empty() && !value.is_empty()).then_some((key, value))
                        })
                        .collect();
                    (!table.is_empty()).then_some(FieldValue::Table(table))
                })
            }
            FieldKind::Keywords { map } => {
                let texts: Vec<String> = selectors
                    .iter()
                    .map(|selector| {
                        document
                            .select(selector)
                            .map(element_text)
                            .filter(|text| !text.is_empty())
                            .collect::<Vec<_>>()
                    })
                    .find(|texts| !texts.is_empty())
                    .unwrap_or_default();
                let table = match_keywords(&texts, map);
                (!table.is_empty()).then_some(FieldValue::Table(table))
            }
            FieldKind::Labeled { labels } => {
                let labels = labels
                    .iter()
                    .map(|(label, raw)| self.selector(raw).map(|inner| (label, inner)))
                    .collect::<Result<Vec<_>, _>>()?;
                selectors.iter().find_map(|selector| {
                    let scope = document.select(selector).next()?;
                    let table: BTreeMap<String, String> = labels
                        .iter()
                        .filter_map(|(label, inner)| {
                            let text = scope
                                .select(inner)
                                .map(element_text)
                                .find(|text| !text.is_empty())?;
                            Some((label.to_string(), text))
                        })
                        .collect();
                    (!table.is_empty()).then_some(FieldValue::Table(table))
                })
            }
            FieldKind::Flag => {
                let present = selectors
                    .iter()
                    .any(|selector| document.select(selector).next().is_some());
                Some(FieldValue::from(if present { "Yes" } else { "No" }))
            }
        };

        Ok(value)
    }

    fn read_identity(&self, item: &ItemHandle) -> Result<ItemIdentity, ExtractError> {
        let identifier = self
            .identity
            .id_attribute
            .as_deref()
            .and_then(|name| item.attribute(name))
            .map(str::to_string);

        let href = match &self.identity.url_selector {
            None => item.attribute(&self.identity.url_attribute).map(str::to_string),
            Some(raw) => {
                let selector = self.selector(raw).map_err(|e| ExtractError::HandleGone {
                    position: item.position,
                    reason: e.to_string(),
                })?;
                let document = self.parse(&item.html);
                let href = document
                    .select(&selector)
                    .find_map(|element| element.value().attr(&self.identity.url_attribute))
                    .map(str::to_string);
                href
            }
        };

        Ok(ItemIdentity {
            identifier,
            canonical_url: absolutize(href.as_deref(), &self.base),
        })
    }
}

#[async_trait]
impl FieldExtractor for SelectorExtractor {
    fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    async fn identify(&self, item: &ItemHandle) -> Result<ItemIdentity, ExtractError> {
        if item.html.trim().is_empty() {
            return Err(ExtractError::HandleGone {
                position: item.position,
                reason: "empty item markup".to_string(),
            });
        }
        self.read_identity(item)
    }

    async fn field(
        &self,
        item: &ItemHandle,
        spec: &FieldSpec,
    ) -> Result<Option<FieldValue>, ExtractError> {
        self.read_field(&item.html, spec)
    }
}

/// Compiles a selector, mapping failures to a configuration error
pub fn compile(raw: &str) -> Result<Selector, ConfigError> {
    Selector::parse(raw).map_err(|e| ConfigError::InvalidSelector {
        selector: raw.to_string(),
        message: format!("{:?}", e),
    })
}

/// Whitespace-collapsed text content of an element
pub fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Assigns each label the first text containing one of its keywords
fn match_keywords(
    texts: &[String],
    map: &BTreeMap<String, Vec<String>>,
) -> BTreeMap<String, String> {
    let lowered: Vec<String> = texts.iter().map(|text| text.to_lowercase()).collect();

    map.iter()
        .filter_map(|(label, keywords)| {
            let keywords: Vec<String> = keywords
                .iter()
                .map(|kw| kw.to_lowercase().trim_end_matches(':').to_string())
                .filter(|kw| !kw.is_empty())
                .collect();
            lowered
                .iter()
                .position(|text| keywords.iter().any(|kw| text.contains(kw.as_str())))
                .map(|index| (label.clone(), texts[index].clone()))
        })
        .collect()
}

fn first_text(document: &Html, selectors: &[Selector]) -> Option<String> {
    selectors.iter().find_map(|selector| {
        document
            .select(selector)
            .map(element_text)
            .find(|text| !text.is_empty())
    })
}
