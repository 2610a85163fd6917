use scraper::{Html, Selector};
use std::collections::BTreeSet;

/// Collect every anchor target containing `must_contain`, minus the
/// `excluding` URLs. Duplicates collapse.
pub fn extract_links(document: &Html, must_contain: &str, excluding: &[&str]) -> BTreeSet<String> {
    let selector = Selector::parse("a[href]").unwrap();

    document
        .select(&selector)
        .filter_map(|a| a.value().attr("href"))
        .filter(|href| href.contains(must_contain))
        .filter(|href| !excluding.contains(href))
        .map(str::to_string)
        .collect()
}
