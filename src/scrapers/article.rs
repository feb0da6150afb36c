//! Article extraction: one article URL -> a normalized [`StoryRecord`].
//!
//! Source pages share a family of WordPress-style layouts but agree on
//! almost nothing, so every field is located through its own fallback
//! chain (see [`crate::scrapers`] for the first-match-wins policy):
//!
//! - **title**: entry/post title headings, most specific first
//! - **body**: content containers, with script/style subtrees stripped
//!   and text-node breaks preserved so paragraph structure survives
//! - **published**: machine-readable date attributes, date portion only
//! - **category**: category-relation links, then section metadata
//! - **tags**: all tag-relation links
//! - **image**: featured image, first body image, then Open Graph
//!
//! A chain that finds nothing resolves to the field's documented default.
//! Only a failed fetch aborts the record; the caller logs it and moves on
//! to the next article.

use crate::fetch::Fetcher;
use crate::models::{StoryRecord, DEFAULT_CATEGORY, DEFAULT_TAGS, UNTITLED};
use crate::scrapers::listing::{normalize_href, page_origin};
use chrono::{Local, NaiveDate};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use std::error::Error;
use tracing::{debug, instrument};
use url::Url;

/// How a chain entry reads its value out of a matched element.
#[derive(Debug, Clone, Copy)]
enum Probe {
    /// Collected descendant text.
    Text,
    /// A named attribute value.
    Attr(&'static str),
}

static TITLE_CHAIN: Lazy<Vec<(Selector, Probe)>> = Lazy::new(|| {
    vec![
        (Selector::parse("h1.entry-title").unwrap(), Probe::Text),
        (Selector::parse("h2.entry-title").unwrap(), Probe::Text),
        (Selector::parse("h1.post-title").unwrap(), Probe::Text),
        (Selector::parse("h1").unwrap(), Probe::Text),
    ]
});

static BODY_CHAIN: Lazy<Vec<Selector>> = Lazy::new(|| {
    vec![
        Selector::parse("div.entry-content").unwrap(),
        Selector::parse("div.td-post-content").unwrap(),
        Selector::parse("div.post-content").unwrap(),
        Selector::parse("article").unwrap(),
    ]
});

static DATE_CHAIN: Lazy<Vec<(Selector, Probe)>> = Lazy::new(|| {
    vec![
        (
            Selector::parse("time.entry-date[datetime]").unwrap(),
            Probe::Attr("datetime"),
        ),
        (
            Selector::parse("time[datetime]").unwrap(),
            Probe::Attr("datetime"),
        ),
        (
            Selector::parse(r#"meta[property="article:published_time"]"#).unwrap(),
            Probe::Attr("content"),
        ),
    ]
});

static CATEGORY_CHAIN: Lazy<Vec<(Selector, Probe)>> = Lazy::new(|| {
    vec![
        (
            Selector::parse(r#"a[rel="category tag"]"#).unwrap(),
            Probe::Text,
        ),
        (Selector::parse(r#"a[rel="category"]"#).unwrap(), Probe::Text),
        (
            Selector::parse(r#"meta[property="article:section"]"#).unwrap(),
            Probe::Attr("content"),
        ),
    ]
});

static TAG_LINKS: Lazy<Selector> = Lazy::new(|| Selector::parse(r#"a[rel="tag"]"#).unwrap());

static FEATURED_IMAGE_CHAIN: Lazy<Vec<Selector>> = Lazy::new(|| {
    vec![
        Selector::parse("img.wp-post-image[src]").unwrap(),
        Selector::parse(".post-thumbnail img[src]").unwrap(),
    ]
});

static BODY_IMAGE: Lazy<Selector> = Lazy::new(|| Selector::parse("img[src]").unwrap());

static OG_IMAGE: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[property="og:image"]"#).unwrap());

/// Walk the first-match-wins chain and return the first non-empty value.
fn first_chain_value(document: &Html, chain: &[(Selector, Probe)]) -> Option<String> {
    for (selector, probe) in chain {
        for element in document.select(selector) {
            let value = match probe {
                Probe::Text => element.text().collect::<String>().trim().to_string(),
                Probe::Attr(name) => element
                    .value()
                    .attr(name)
                    .map(|v| v.trim().to_string())
                    .unwrap_or_default(),
            };
            if !value.is_empty() {
                return Some(value);
            }
        }
    }
    None
}

fn collect_text(el: ElementRef<'_>, out: &mut Vec<String>) {
    use scraper::node::Node;
    for child in el.children() {
        match child.value() {
            Node::Text(text) => {
                let trimmed = text.text.trim();
                if !trimmed.is_empty() {
                    out.push(trimmed.to_string());
                }
            }
            Node::Element(element) => {
                // Inline scripts and styles would otherwise leak into the text.
                let name = element.name();
                if name != "script" && name != "style" {
                    if let Some(child_el) = ElementRef::wrap(child) {
                        collect_text(child_el, out);
                    }
                }
            }
            _ => {}
        }
    }
}

/// Flatten an element's text with line breaks between text nodes,
/// skipping script/style subtrees.
pub fn flatten_text(root: ElementRef<'_>) -> String {
    let mut parts = Vec::new();
    collect_text(root, &mut parts);
    parts.join("\n")
}

/// Parse a machine-readable date attribute into a calendar date.
///
/// Takes only the date portion (everything before a `T` or a space,
/// minus any trailing `Z`) and reparses it. Any failure falls back to
/// `today`; date trouble never escapes the extractor.
pub fn parse_machine_date(raw: &str, today: NaiveDate) -> NaiveDate {
    let date_part = raw.split(['T', ' ']).next().unwrap_or(raw).trim_end_matches('Z');
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").unwrap_or(today)
}

/// Resolve an image candidate to an absolute URL and validate it.
///
/// Candidates are resolved against the article's own origin. A candidate
/// that resolves to the page itself or to the bare origin is markup noise
/// (empty `src`, `href="/"`) and is rejected so the next fallback runs.
fn resolve_image_candidate(raw: &str, page_url: &Url, origin: &Url) -> Option<String> {
    let resolved = normalize_href(raw, origin)?;
    if resolved == page_url.as_str() || resolved == origin.as_str() {
        return None;
    }
    Some(resolved)
}

/// Pick the on-page image for a story, if any candidate survives.
fn extract_image(
    document: &Html,
    body_container: Option<ElementRef<'_>>,
    page_url: &Url,
    origin: &Url,
) -> Option<String> {
    for selector in FEATURED_IMAGE_CHAIN.iter() {
        for element in document.select(selector) {
            if let Some(src) = element.value().attr("src") {
                if let Some(resolved) = resolve_image_candidate(src, page_url, origin) {
                    return Some(resolved);
                }
            }
        }
    }
    if let Some(container) = body_container {
        if let Some(element) = container.select(&BODY_IMAGE).next() {
            if let Some(src) = element.value().attr("src") {
                if let Some(resolved) = resolve_image_candidate(src, page_url, origin) {
                    return Some(resolved);
                }
            }
        }
    }
    if let Some(element) = document.select(&OG_IMAGE).next() {
        if let Some(content) = element.value().attr("content") {
            if let Some(resolved) = resolve_image_candidate(content, page_url, origin) {
                return Some(resolved);
            }
        }
    }
    None
}

/// Parse article markup into a [`StoryRecord`].
///
/// Pure core of [`extract`]: infallible by construction, every field
/// falls back to its documented default when its chain misses.
pub fn parse_article(html: &str, page_url: &Url, today: NaiveDate) -> StoryRecord {
    let document = Html::parse_document(html);
    let origin = page_origin(page_url);

    let title =
        first_chain_value(&document, &TITLE_CHAIN).unwrap_or_else(|| UNTITLED.to_string());

    let mut body = String::new();
    let mut body_container = None;
    for selector in BODY_CHAIN.iter() {
        if let Some(element) = document.select(selector).next() {
            let text = flatten_text(element);
            if !text.trim().is_empty() {
                body = text;
                body_container = Some(element);
                break;
            }
        }
    }

    let published = first_chain_value(&document, &DATE_CHAIN)
        .map(|raw| parse_machine_date(&raw, today))
        .unwrap_or(today);

    let category = first_chain_value(&document, &CATEGORY_CHAIN)
        .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());

    let mut tags: Vec<String> = document
        .select(&TAG_LINKS)
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect();
    if tags.is_empty() {
        tags = DEFAULT_TAGS.iter().map(|t| t.to_string()).collect();
    }

    let image_url = extract_image(&document, body_container, page_url, &origin);

    StoryRecord {
        title,
        body,
        published,
        source_url: page_url.to_string(),
        category,
        tags,
        image_url,
    }
}

/// Fetch and extract one article.
///
/// A transport error or non-2xx status yields `Err`; the caller skips
/// this article and continues with the rest of the run. Everything past
/// the fetch is infallible.
#[instrument(level = "info", skip_all, fields(%url))]
pub async fn extract(fetcher: &Fetcher, url: &str) -> Result<StoryRecord, Box<dyn Error>> {
    let page_url = Url::parse(url)?;
    let html = fetcher.get(url).await?;
    let record = parse_article(&html, &page_url, Local::now().date_naive());
    debug!(
        title = %record.title,
        body_bytes = record.body.len(),
        "Extracted story"
    );
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_url() -> Url {
        Url::parse("https://stories.example.com/a-story/").unwrap()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 6).unwrap()
    }

    const FULL_PAGE: &str = r#"
        <html>
          <head>
            <meta property="og:image" content="/og.jpg">
          </head>
          <body>
            <h1 class="entry-title">  A Proper Story  </h1>
            <time class="entry-date" datetime="2023-01-15T08:30:00Z">Jan 15</time>
            <a rel="category tag" href="/cat/drama/">Drama</a>
            <a rel="tag" href="/tag/one/">one</a>
            <a rel="tag" href="/tag/two/">two</a>
            <div class="entry-content">
              <p>First paragraph.</p>
              <script>var tracker = 1;</script>
              <style>.ad { display: none; }</style>
              <p>Second paragraph.</p>
              <img src="/inline.jpg">
            </div>
          </body>
        </html>
    "#;

    #[test]
    fn test_full_page_extraction() {
        let record = parse_article(FULL_PAGE, &page_url(), today());
        assert_eq!(record.title, "A Proper Story");
        assert_eq!(record.body, "First paragraph.\nSecond paragraph.");
        assert_eq!(record.published, NaiveDate::from_ymd_opt(2023, 1, 15).unwrap());
        assert_eq!(record.category, "Drama");
        assert_eq!(record.tags, vec!["one", "two"]);
        assert_eq!(
            record.image_url.as_deref(),
            Some("https://stories.example.com/inline.jpg")
        );
        assert_eq!(record.source_url, "https://stories.example.com/a-story/");
    }

    #[test]
    fn test_every_field_defined_on_bare_page() {
        let record = parse_article("<html><body><p>hi</p></body></html>", &page_url(), today());
        assert_eq!(record.title, UNTITLED);
        assert_eq!(record.body, "");
        assert_eq!(record.published, today());
        assert_eq!(record.category, DEFAULT_CATEGORY);
        assert_eq!(record.tags, vec!["stories", "untagged"]);
        assert!(record.image_url.is_none());
    }

    #[test]
    fn test_missing_date_uses_run_date() {
        let html = r#"<h1 class="entry-title">No Date</h1>"#;
        let record = parse_article(html, &page_url(), today());
        assert_eq!(record.published_display(), "06/05/2025");
    }

    #[test]
    fn test_malformed_date_falls_back_to_run_date() {
        let html = r#"<time datetime="sometime soon">soon</time>"#;
        let record = parse_article(html, &page_url(), today());
        assert_eq!(record.published, today());
    }

    #[test]
    fn test_date_portion_only_is_parsed() {
        assert_eq!(
            parse_machine_date("2024-11-30T23:59:59+06:00", today()),
            NaiveDate::from_ymd_opt(2024, 11, 30).unwrap()
        );
        assert_eq!(
            parse_machine_date("2024-11-30 23:59", today()),
            NaiveDate::from_ymd_opt(2024, 11, 30).unwrap()
        );
        assert_eq!(
            parse_machine_date("2024-11-30Z", today()),
            NaiveDate::from_ymd_opt(2024, 11, 30).unwrap()
        );
    }

    #[test]
    fn test_h2_entry_title_beats_generic_h1() {
        let html = r#"
            <h1>Site Name</h1>
            <h2 class="entry-title">The Actual Title</h2>
        "#;
        let record = parse_article(html, &page_url(), today());
        assert_eq!(record.title, "The Actual Title");
    }

    #[test]
    fn test_scripts_and_styles_do_not_leak_into_body() {
        let html = r#"
            <div class="td-post-content">
              Text before.
              <script>should_not_appear();</script>
              Text after.
            </div>
        "#;
        let record = parse_article(html, &page_url(), today());
        assert_eq!(record.body, "Text before.\nText after.");
    }

    #[test]
    fn test_featured_image_beats_body_image() {
        let html = r#"
            <img class="wp-post-image" src="/featured.jpg">
            <div class="entry-content"><p>x</p><img src="/body.jpg"></div>
        "#;
        let record = parse_article(html, &page_url(), today());
        assert_eq!(
            record.image_url.as_deref(),
            Some("https://stories.example.com/featured.jpg")
        );
    }

    #[test]
    fn test_candidate_equal_to_page_base_is_rejected() {
        // A featured image resolving to the bare origin is noise; the
        // Open Graph fallback should win instead.
        let html = r#"
            <head><meta property="og:image" content="https://cdn.example.com/real.jpg"></head>
            <img class="wp-post-image" src="/">
        "#;
        let record = parse_article(html, &page_url(), today());
        assert_eq!(record.image_url.as_deref(), Some("https://cdn.example.com/real.jpg"));
    }

    #[test]
    fn test_no_image_candidates_yields_none() {
        let record = parse_article("<p>plain</p>", &page_url(), today());
        assert!(record.image_url.is_none());
    }

    #[test]
    fn test_category_section_meta_fallback() {
        let html = r#"<meta property="article:section" content="Folk Tales">"#;
        let record = parse_article(html, &page_url(), today());
        assert_eq!(record.category, "Folk Tales");
    }
}
