//! Listing page parser
//!
//! This module turns one loaded listing page into owned item handles:
//! - Checking the page's ready marker
//! - Enumerating items in document order
//! - Capturing each item's outer HTML and root attributes

use crate::extract::compile;
use crate::extract::ItemHandle;
use crate::site::ListingProfile;
use crate::ConfigResult;
use scraper::{Html, Selector};

/// Compiled selectors used to enumerate a listing page
#[derive(Debug, Clone)]
pub struct ListingSelectors {
    item: Selector,
    ready: Option<Selector>,
    ready_raw: Option<String>,
}

impl ListingSelectors {
    pub fn from_profile(profile: &ListingProfile) -> ConfigResult<Self> {
        let ready = profile.ready_selector.as_deref().map(compile).transpose()?;

        Ok(Self {
            item: compile(&profile.item_selector)?,
            ready,
            ready_raw: profile.ready_selector.clone(),
        })
    }

    /// The ready marker as written in the profile
    pub fn ready_marker(&self) -> Option<&str> {
        self.ready_raw.as_deref()
    }
}

/// Returns true if the document contains the ready marker (or none is required)
pub fn is_ready(html: &str, ready: Option<&Selector>) -> bool {
    match ready {
        Some(selector) => Html::parse_document(html).select(selector).next().is_some(),
        None => true,
    }
}

/// Enumerates the items visible on a listing page
///
/// Positions are page-local and zero-based; the paginator rebases them onto the seed's
/// enumeration.
///
/// # Returns
///
/// * `Some(items)` - The page is ready (possibly with no items)
/// * `None` - The ready marker is missing
///
/// # Example
///
/// ```
/// use catalog_harvest::crawler::{parse_listing, ListingSelectors};
/// use catalog_harvest::site::preset;
///
/// let profile = preset("ajio").unwrap();
/// let selectors = ListingSelectors::from_profile(&profile.listing).unwrap();
/// let html = r#"<div id="products"><div class="item" data-id="7">x</div></div>"#;
/// let items = parse_listing(html, &selectors).unwrap();
/// assert_eq!(items[0].attribute("data-id"), Some("7"));
/// ```
pub fn parse_listing(html: &str, selectors: &ListingSelectors) -> Option<Vec<ItemHandle>> {
    let document = Html::parse_document(html);

    if let Some(ready) = &selectors.ready {
        document.select(ready).next()?;
    }

    let items = document
        .select(&selectors.item)
        .enumerate()
        .map(|(position, element)| {
            element
                .value()
                .attrs()
                .fold(ItemHandle::new(position, element.html()), |handle, (name, value)| {
                    handle.with_attribute(name, value)
                })
        })
        .collect();

    Some(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::site::{IdentitySpec, PaginationStyle};

    fn listing(item: &str, ready: Option<&str>) -> ListingProfile {
        ListingProfile {
            item_selector: item.to_string(),
            ready_selector: ready.map(str::to_string),
            pagination: PaginationStyle::Page {
                param: "page".to_string(),
            },
            identity: IdentitySpec::default(),
            fields: Vec::new(),
        }
    }

    #[test]
    fn test_items_in_document_order() {
        let selectors = ListingSelectors::from_profile(&listing("li.product", None)).unwrap();
        let html = r#"
            <ul>
                <li class="product" data-id="a"><a href="/a">A</a></li>
                <li class="ad">sponsored</li>
                <li class="product" data-id="b"><a href="/b">B</a></li>
            </ul>
        "#;

        let items = parse_listing(html, &selectors).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].position, 0);
        assert_eq!(items[0].attribute("data-id"), Some("a"));
        assert_eq!(items[1].position, 1);
        assert_eq!(items[1].attribute("class"), Some("product"));
        assert!(items[1].html.contains(r#"href="/b""#));
    }

    #[test]
    fn test_missing_ready_marker() {
        let selectors =
            ListingSelectors::from_profile(&listing(".item", Some("#products"))).unwrap();
        assert!(parse_listing(r#"<div class="item">x</div>"#, &selectors).is_none());
        assert_eq!(selectors.ready_marker(), Some("#products"));
    }

    #[test]
    fn test_ready_page_without_items() {
        let selectors =
            ListingSelectors::from_profile(&listing(".item", Some("#products"))).unwrap();
        let items = parse_listing(r#"<div id="products"></div>"#, &selectors).unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn test_is_ready() {
        let ready = Selector::parse(".prod-container").unwrap();
        assert!(is_ready(r#"<div class="prod-container"></div>"#, Some(&ready)));
        assert!(!is_ready("<p>blocked</p>", Some(&ready)));
        assert!(is_ready("<p>anything</p>", None));
    }

    #[test]
    fn test_invalid_item_selector() {
        assert!(ListingSelectors::from_profile(&listing("li[[", None)).is_err());
    }
}
