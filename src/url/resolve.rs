use crate::record::SENTINEL;
use url::Url;

/// Resolves an item link against the site's base origin
///
/// # Resolution Rules
///
/// 1. Missing or blank href resolves to the `"N/A"` sentinel
/// 2. Already-absolute http(s) URLs pass through unchanged (only trimmed)
/// 3. Relative paths (`/p/123`, `p/123`, `//host/p`) are joined onto `base`
/// 4. `javascript:`, `mailto:`, `tel:`, `data:` and fragment-only hrefs resolve to the sentinel
///
/// # Examples
///
/// ```
/// use catalog_harvest::url::absolutize;
/// use url::Url;
///
/// let base = Url::parse("https://www.ajio.com").unwrap();
/// assert_eq!(absolutize(Some("/p/460"), &base), "https://www.ajio.com/p/460");
/// assert_eq!(absolutize(None, &base), "N/A");
/// ```
pub fn absolutize(href: Option<&str>, base: &Url) -> String {
    let href = match href.map(str::trim) {
        Some(h) if !h.is_empty() => h,
        _ => return SENTINEL.to_string(),
    };

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
        || href.starts_with('#')
    {
        return SENTINEL.to_string();
    }

    if let Ok(absolute) = Url::parse(href) {
        return if is_http(&absolute) {
            href.to_string()
        } else {
            SENTINEL.to_string()
        };
    }

    match base.join(href) {
        Ok(joined) if is_http(&joined) => joined.to_string(),
        _ => SENTINEL.to_string(),
    }
}

/// Parses a string as an http(s) URL, returning `None` for anything else
pub fn parse_http_url(value: &str) -> Option<Url> {
    Url::parse(value).ok().filter(is_http)
}

/// Derives an item identifier from its canonical URL
///
/// Prefers the last all-digit path segment (`/dresses/acme/12345/buy` -> `12345`), falling
/// back to the last non-empty segment. Returns `None` for the sentinel, unparseable URLs
/// and URLs with an empty path.
pub fn derive_identifier(canonical_url: &str) -> Option<String> {
    if canonical_url == SENTINEL {
        return None;
    }

    let url = Url::parse(canonical_url).ok()?;
    let segments: Vec<&str> = url
        .path_segments()?
        .filter(|segment| !segment.is_empty())
        .collect();

    segments
        .iter()
        .rev()
        .find(|segment| segment.chars().all(|c| c.is_ascii_digit()))
        .or_else(|| segments.last())
        .map(|segment| segment.to_string())
}

fn is_http(url: &Url) -> bool {
    url.scheme() == "http" || url.scheme() == "https"
}
