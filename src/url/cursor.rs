use url::Url;

/// Returns `seed` with query parameter `name` set to `value`
///
/// An existing occurrence of the parameter is replaced in place (first occurrence kept,
/// later duplicates dropped); otherwise the parameter is appended. All other query pairs
/// keep their original order.
///
/// # Examples
///
/// ```
/// use catalog_harvest::url::with_query_param;
/// use url::Url;
///
/// let seed = Url::parse("https://www.amazon.in/s?k=kurta&page=1").unwrap();
/// let next = with_query_param(&seed, "page", "3");
/// assert_eq!(next.as_str(), "https://www.amazon.in/s?k=kurta&page=3");
/// ```
pub fn with_query_param(seed: &Url, name: &str, value: &str) -> Url {
    let mut replaced = false;
    let mut pairs: Vec<(String, String)> = Vec::new();

    for (key, current) in seed.query_pairs() {
        if key == name {
            if !replaced {
                pairs.push((key.into_owned(), value.to_string()));
                replaced = true;
            }
        } else {
            pairs.push((key.into_owned(), current.into_owned()));
        }
    }

    if !replaced {
        pairs.push((name.to_string(), value.to_string()));
    }

    let mut url = seed.clone();
    url.query_pairs_mut().clear().extend_pairs(pairs);
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_appends_when_absent() {
        let seed = Url::parse("https://www.myntra.com/dresses").unwrap();
        assert_eq!(
            with_query_param(&seed, "p", "2").as_str(),
            "https://www.myntra.com/dresses?p=2"
        );
    }

    #[test]
    fn test_appends_after_existing_query() {
        let seed = Url::parse("https://www.flipkart.com/search?q=kurta").unwrap();
        assert_eq!(
            with_query_param(&seed, "page", "1").as_str(),
            "https://www.flipkart.com/search?q=kurta&page=1"
        );
    }

    #[test]
    fn test_replaces_existing_value_in_place() {
        let seed = Url::parse("https://www.amazon.in/s?page=7&k=saree").unwrap();
        assert_eq!(
            with_query_param(&seed, "page", "2").as_str(),
            "https://www.amazon.in/s?page=2&k=saree"
        );
    }

    #[test]
    fn test_drops_duplicate_occurrences() {
        let seed = Url::parse("https://shop.com/c?page=1&page=9").unwrap();
        assert_eq!(
            with_query_param(&seed, "page", "4").as_str(),
            "https://shop.com/c?page=4"
        );
    }
}
