//! Built-in profiles for the supported storefronts

use super::{
    DetailProfile, FieldSpec, IdentitySpec, ListingProfile, PaginationStyle, SiteProfile,
};

/// Names accepted by [`preset`]
pub const PRESET_NAMES: &[&str] = &["ajio", "amazon", "flipkart", "myntra"];

/// Looks up a built-in site profile by name (case-insensitive)
///
/// # Examples
///
/// ```
/// use catalog_harvest::site::preset;
///
/// let ajio = preset("Ajio").unwrap();
/// assert_eq!(ajio.name, "ajio");
/// assert!(preset("ebay").is_none());
/// ```
pub fn preset(name: &str) -> Option<SiteProfile> {
    match name.to_ascii_lowercase().as_str() {
        "ajio" => Some(ajio()),
        "amazon" => Some(amazon()),
        "flipkart" => Some(flipkart()),
        "myntra" => Some(myntra()),
        _ => None,
    }
}

/// Ajio: infinite-scroll grid, items keyed by `data-id`
fn ajio() -> SiteProfile {
    SiteProfile {
        name: "ajio".to_string(),
        base_url: "https://www.ajio.com/".to_string(),
        listing: ListingProfile {
            item_selector: "#products .item".to_string(),
            ready_selector: Some("#products".to_string()),
            pagination: PaginationStyle::Scroll {
                step: 800,
                param: "offset".to_string(),
            },
            identity: IdentitySpec {
                id_attribute: Some("data-id".to_string()),
                ..IdentitySpec::default()
            },
            fields: vec![
                FieldSpec::text("Brand Name", &[".brand"]),
                FieldSpec::text("Product Name", &[".nameCls"]),
                FieldSpec::text("Rating", &["._1gIWf ._3I65V"]),
                FieldSpec::text("Rating Count", &[r#"p[aria-label*="|"]"#]),
                FieldSpec::text("Price", &[".price strong"]),
                FieldSpec::text("Original Price", &[".orginal-price"]),
                FieldSpec::text("Discount", &[".discount"]),
                FieldSpec::flag("Bestseller", &[".exclusive-new"]),
            ],
        },
        detail: DetailProfile {
            ready_selector: Some(".prod-container".to_string()),
            fields: vec![
                FieldSpec::list("Sizes Available", &[".size-variant-item.size-instock span"]),
                FieldSpec::list(
                    "Product Details",
                    &["section.prod-desc ul.prod-list li.detail-list"],
                ),
            ],
        },
    }
}

/// Amazon: numbered search pages, items keyed by `data-asin`
fn amazon() -> SiteProfile {
    const BULLETS: &str = "div.a-expander-content ul.a-unordered-list li";
    const TITLE_LINK: &str = "a.a-link-normal.s-line-clamp-2.s-link-style.a-text-normal";

    SiteProfile {
        name: "amazon".to_string(),
        base_url: "https://www.amazon.in/".to_string(),
        listing: ListingProfile {
            item_selector: "div[data-asin]".to_string(),
            ready_selector: None,
            pagination: PaginationStyle::Page {
                param: "page".to_string(),
            },
            identity: IdentitySpec {
                id_attribute: Some("data-asin".to_string()),
                url_selector: Some(TITLE_LINK.to_string()),
                url_attribute: "href".to_string(),
            },
            fields: vec![
                FieldSpec::text("Brand Name", &["span.a-size-base-plus.a-color-base"]),
                FieldSpec::text(
                    "Product Name",
                    &[
                        "a.a-link-normal.s-line-clamp-2.s-link-style.a-text-normal h2 span",
                        "h2 span",
                    ],
                ),
                FieldSpec::text("Rating", &["span.a-icon-alt"]),
                FieldSpec::text("Rating Count", &["span.a-size-base.s-underline-text"]),
                FieldSpec::text("Price (INR)", &["span.a-price span.a-offscreen"]),
                FieldSpec::text(
                    "Original Price (INR)",
                    &["span.a-text-price span.a-offscreen"],
                ),
                FieldSpec::text(
                    "Discount",
                    &[
                        "span.savingsPercentage",
                        "span.s-price-instructions-style span.a-color-price",
                    ],
                ),
                FieldSpec::text(
                    "Badge",
                    &[
                        "div.puis-status-badge-container span.a-badge-text",
                        "span.a-badge[aria-labelledby$='-amazons-choice-label']",
                    ],
                ),
            ],
        },
        detail: DetailProfile {
            ready_selector: None,
            fields: vec![
                FieldSpec::pairs(
                    "Product Details",
                    &["div.a-fixed-left-grid.product-facts-detail"],
                    "div.a-col-left",
                    "div.a-col-right",
                ),
                FieldSpec::list("All Bullet Points", &[BULLETS]),
                FieldSpec::pairs(
                    "Product and Seller Details",
                    &["#detailBullets_feature_div li", "div.a-fixed-left-grid"],
                    "span.a-text-bold",
                    "span.a-text-bold + span",
                ),
                FieldSpec::keywords(
                    "About This Item",
                    &[BULLETS],
                    &[
                        ("Fabric Info", &["fabric", "kurta and bottom fabric"]),
                        ("Color Info", &["color :-", "color"]),
                        ("Style Info", &["style"]),
                        ("Length Info", &["length"]),
                        ("Sleeve Info", &["sleeves"]),
                        ("Size Chart", &["size chart"]),
                        ("Includes Info", &["this set includes"]),
                        ("Work/Design Info", &["work :-", "work"]),
                        ("Neck Style", &["neck style:-", "neck style"]),
                        ("Color Disclaimer", &["colour declaration"]),
                        ("Occasion / Usage", &["occasion", "ocassion"]),
                        ("Brand Mention / CTA", &["click on brand name"]),
                    ],
                ),
                FieldSpec::pairs_with_keys(
                    "Additional Details",
                    &["div.a-fixed-left-grid"],
                    "div.a-fixed-left-grid-col.a-col-left span",
                    "div.a-fixed-left-grid-col.a-col-right span",
                    &[
                        "Manufacturer",
                        "Item Weight",
                        "Product Dimensions",
                        "Country of Origin",
                        "Packer",
                        "Importer",
                        "Net Quantity",
                        "Included Components",
                    ],
                ),
                FieldSpec::labeled(
                    "Brand Snapshot",
                    &["body"],
                    &[
                        (
                            "Brand Name",
                            "div.a-cardui-body.brand-snapshot-card-content p > span.a-size-medium.a-text-bold",
                        ),
                        (
                            "Top Brand Heading",
                            "div.a-section.a-text-center.brand-snapshot-title-container > p",
                        ),
                        (
                            "Positive Ratings",
                            "div.brand-snapshot-flex-row[role='listitem']:nth-of-type(1) p",
                        ),
                        (
                            "Recent Orders",
                            "div.brand-snapshot-flex-row[role='listitem']:nth-of-type(2) p",
                        ),
                        (
                            "Years on Amazon",
                            "div.brand-snapshot-flex-row[role='listitem']:nth-of-type(3) p",
                        ),
                    ],
                ),
                FieldSpec::attributes(
                    "Brand Badge Image URLs",
                    &["div.brand-snapshot-flex-row[role='listitem'] img.brand-snapshot-item-image"],
                    "src",
                ),
                FieldSpec::text(
                    "Product Description",
                    &["#productDescription_feature_div #productDescription p span"],
                ),
            ],
        },
    }
}

/// Flipkart: numbered pages, items keyed by `data-id`
fn flipkart() -> SiteProfile {
    const NAME_LINK: &str = "div.hCKiGj a.WKTcLC";

    SiteProfile {
        name: "flipkart".to_string(),
        base_url: "https://www.flipkart.com/".to_string(),
        listing: ListingProfile {
            item_selector: "[data-id]".to_string(),
            ready_selector: Some("[data-id]".to_string()),
            pagination: PaginationStyle::Page {
                param: "page".to_string(),
            },
            identity: IdentitySpec {
                id_attribute: Some("data-id".to_string()),
                url_selector: Some(NAME_LINK.to_string()),
                url_attribute: "href".to_string(),
            },
            fields: vec![
                FieldSpec::text("Brand Name", &["div.hCKiGj div.syl9yP"]),
                FieldSpec::text("Product Name", &[NAME_LINK]),
            ],
        },
        detail: DetailProfile {
            ready_selector: None,
            fields: vec![
                FieldSpec::text("Price (INR)", &["div.Nx9bqj"]),
                FieldSpec::text("Original Price (INR)", &["div.yRaY8j"]),
                FieldSpec::text("Discount", &["div.UkUFwK span"]),
                FieldSpec::text("Rating", &["span.Y1HWO0 div.XQDdHH"]),
                FieldSpec::text("Rating Count", &["span.Wphh3N span"]),
                FieldSpec::pairs("Sizes", &["ul.hSEbzK li"], "a", "div.V3Zflw"),
                FieldSpec::text("Seller Name", &["div#sellerName span span"]),
                FieldSpec::text("Seller Rating", &["div.XQDdHH.uuhqql"]),
                FieldSpec::pairs(
                    "Specifications",
                    &["div.Cnl9Jt div._5Pmv5S div.row"],
                    "div.col.col-3-12",
                    "div.col.col-9-12",
                ),
                FieldSpec::text(
                    "All Reviews Summary",
                    &["a[href*='/product-reviews/'] div._23J90q.iIbIvC span._6n9Uuq"],
                ),
                FieldSpec::attribute(
                    "All Reviews Link",
                    &["a[href*='/product-reviews/']"],
                    "href",
                    true,
                ),
            ],
        },
    }
}

/// Myntra: numbered pages via `p`, identifier derived from the product URL when missing
fn myntra() -> SiteProfile {
    SiteProfile {
        name: "myntra".to_string(),
        base_url: "https://www.myntra.com/".to_string(),
        listing: ListingProfile {
            item_selector: "#desktopSearchResults .results-base li".to_string(),
            ready_selector: Some("#desktopSearchResults .results-base li".to_string()),
            pagination: PaginationStyle::Page {
                param: "p".to_string(),
            },
            identity: IdentitySpec {
                id_attribute: Some("id".to_string()),
                url_selector: Some(r#"a[data-refreshpage="true"]"#.to_string()),
                url_attribute: "href".to_string(),
            },
            fields: vec![
                FieldSpec::text("Brand Name", &["h3"]),
                FieldSpec::text("Product Name", &["h4.product-product"]),
                FieldSpec::text("Rating", &[".product-ratingsContainer span"]),
                FieldSpec::digits(
                    "Rating Count",
                    &[".product-ratingsContainer .product-ratingsCount"],
                ),
            ],
        },
        detail: DetailProfile {
            ready_selector: None,
            fields: vec![
                FieldSpec::text("Product Name (PDP)", &["h1.pdp-name"]),
                FieldSpec::list("Product Details", &["p.pdp-product-description-content"]),
                FieldSpec::pairs(
                    "Size & Material",
                    &["div.pdp-sizeFitDesc"],
                    "h4.pdp-sizeFitDescTitle",
                    "p.pdp-sizeFitDescContent",
                ),
                FieldSpec::text("Offer Details", &["div.pdp-offers-offer"]),
                FieldSpec::text("Price (INR)", &["span.pdp-price strong"]),
                FieldSpec::text("Original Price (INR)", &["span.pdp-mrp s"]),
                FieldSpec::text("Discount", &["span.pdp-discount"]),
                FieldSpec::pairs(
                    "Specifications",
                    &["div.index-tableContainer > div.index-row"],
                    "div.index-rowKey",
                    "div.index-rowValue",
                ),
            ],
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Selector;

    #[test]
    fn test_all_presets_resolve() {
        for name in PRESET_NAMES {
            let profile = preset(name).unwrap();
            assert_eq!(&profile.name, name);
            assert!(url::Url::parse(&profile.base_url).is_ok());
        }
    }

    #[test]
    fn test_all_preset_selectors_parse() {
        for name in PRESET_NAMES {
            let profile = preset(name).unwrap();
            for selector in profile.selectors() {
                assert!(
                    Selector::parse(selector).is_ok(),
                    "{}: selector '{}' does not parse",
                    name,
                    selector
                );
            }
        }
    }

    #[test]
    fn test_pagination_styles() {
        assert!(matches!(
            preset("ajio").unwrap().listing.pagination,
            PaginationStyle::Scroll { step: 800, .. }
        ));
        assert_eq!(
            preset("myntra").unwrap().listing.pagination,
            PaginationStyle::Page {
                param: "p".to_string()
            }
        );
    }
}
