//! Listing discovery: paginated index page -> absolute article URLs.
//!
//! A source's index markup rarely announces "these are the articles", so
//! likely article links are located through a prioritized selector chain:
//! heading-wrapped anchors first, then title-class anchors, then any
//! anchor inside an `<article>` whose href contains a path separator.
//! The first selector with at least one match wins; later selectors are
//! never tried once an earlier one succeeds.
//!
//! Every matched href is normalized to an absolute URL and the result is
//! deduplicated while preserving first-seen order, so re-running discovery
//! on an unchanged index yields an identical list.

use crate::fetch::Fetcher;
use crate::models::Source;
use itertools::Itertools;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::{debug, info, instrument, warn};
use url::Url;

static LINK_CHAIN: Lazy<Vec<Selector>> = Lazy::new(|| {
    vec![
        Selector::parse("article h1 a[href], article h2 a[href], article h3 a[href]").unwrap(),
        Selector::parse("article a.entry-title[href], article a.post-title[href]").unwrap(),
        Selector::parse(r#"article a[href*="/"]"#).unwrap(),
    ]
});

/// Reduce a page URL to its scheme+host origin, path `/`.
///
/// Relative hrefs are resolved against this rather than against the
/// listing page's own path.
pub fn page_origin(page_url: &Url) -> Url {
    let mut origin = page_url.clone();
    origin.set_path("/");
    origin.set_query(None);
    origin.set_fragment(None);
    origin
}

/// Normalize one href to an absolute URL.
///
/// Absolute http(s) URLs pass through unchanged, protocol-relative URLs
/// gain the `https:` scheme, and anything else is resolved against the
/// source origin. Unresolvable hrefs are dropped.
pub fn normalize_href(href: &str, origin: &Url) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    if href.starts_with("http://") || href.starts_with("https://") {
        return Some(href.to_string());
    }
    if let Some(rest) = href.strip_prefix("//") {
        return Some(format!("https://{rest}"));
    }
    origin.join(href).ok().map(|u| u.to_string())
}

/// Extract normalized article links from index markup.
///
/// Pure core of [`discover`], separated so it can be exercised on static
/// HTML. Applies the first-match-wins selector chain, normalizes every
/// matched href, and deduplicates by exact URL in first-seen order.
pub fn extract_listing_links(html: &str, base_url: &Url) -> Vec<String> {
    let document = Html::parse_document(html);
    let origin = page_origin(base_url);

    for selector in LINK_CHAIN.iter() {
        let matched: Vec<_> = document.select(selector).collect();
        if matched.is_empty() {
            continue;
        }
        return matched
            .into_iter()
            .filter_map(|element| element.value().attr("href"))
            .filter_map(|href| normalize_href(href, &origin))
            .unique()
            .collect();
    }
    Vec::new()
}

/// Discover article URLs on one listing page of a source.
///
/// Builds the paginated index URL under the source's path rule, fetches
/// it, and extracts links. A fetch failure is reported and yields an
/// empty set; it never fails the overall run.
#[instrument(level = "info", skip_all, fields(source = %source.name, page))]
pub async fn discover(fetcher: &Fetcher, source: &Source, page: u32) -> Vec<String> {
    let listing_url = source.listing_url(page);
    info!(url = %listing_url, "Scanning listing page");

    let base_url = match Url::parse(&source.base_url) {
        Ok(url) => url,
        Err(e) => {
            warn!(base_url = %source.base_url, error = %e, "Source root is not a valid URL");
            return Vec::new();
        }
    };

    match fetcher.get(&listing_url).await {
        Ok(html) => {
            let links = extract_listing_links(&html, &base_url);
            info!(count = links.len(), "Discovered article links");
            debug!(urls = ?links, "Listing links");
            links
        }
        Err(e) => {
            warn!(url = %listing_url, error = %e, "Failed to load listing page");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://stories.example.com").unwrap()
    }

    #[test]
    fn test_heading_anchors_win_over_generic_anchors() {
        let html = r#"
            <article>
              <h2><a href="/story-one/">Story One</a></h2>
              <a href="/elsewhere/ignored/">read more</a>
            </article>
        "#;
        let links = extract_listing_links(html, &base());
        assert_eq!(links, vec!["https://stories.example.com/story-one/"]);
    }

    #[test]
    fn test_title_class_anchors_used_when_no_headings() {
        let html = r#"
            <article>
              <a class="entry-title" href="/story-two/">Story Two</a>
              <a href="/elsewhere/ignored/">read more</a>
            </article>
        "#;
        let links = extract_listing_links(html, &base());
        assert_eq!(links, vec!["https://stories.example.com/story-two/"]);
    }

    #[test]
    fn test_generic_anchor_fallback() {
        let html = r#"<article><a href="/story-three/">Story Three</a></article>"#;
        let links = extract_listing_links(html, &base());
        assert_eq!(links, vec!["https://stories.example.com/story-three/"]);
    }

    #[test]
    fn test_duplicate_anchors_in_mixed_forms_collapse_to_one() {
        // Absolute, protocol-relative, and root-relative hrefs for the
        // same article must normalize to a single entry.
        let html = r#"
            <article><h2><a href="https://stories.example.com/story-one/">A</a></h2></article>
            <article><h2><a href="//stories.example.com/story-one/">B</a></h2></article>
            <article><h2><a href="/story-one/">C</a></h2></article>
        "#;
        let links = extract_listing_links(html, &base());
        assert_eq!(links, vec!["https://stories.example.com/story-one/"]);
    }

    #[test]
    fn test_order_is_first_seen_and_idempotent() {
        let html = r#"
            <article><h2><a href="/b/">B</a></h2></article>
            <article><h2><a href="/a/">A</a></h2></article>
            <article><h2><a href="/b/">B again</a></h2></article>
        "#;
        let first = extract_listing_links(html, &base());
        let second = extract_listing_links(html, &base());
        assert_eq!(
            first,
            vec![
                "https://stories.example.com/b/",
                "https://stories.example.com/a/"
            ]
        );
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_page_yields_empty_set() {
        assert!(extract_listing_links("<html><body></body></html>", &base()).is_empty());
    }

    #[test]
    fn test_relative_hrefs_resolve_against_origin_not_page_path() {
        let page = Url::parse("https://stories.example.com/page/2/").unwrap();
        let origin = page_origin(&page);
        assert_eq!(
            normalize_href("story-four/", &origin).unwrap(),
            "https://stories.example.com/story-four/"
        );
    }
}
