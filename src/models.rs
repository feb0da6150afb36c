//! Data models for harvested stories and run configuration.
//!
//! This module defines the core data structures used throughout the application:
//! - [`StoryRecord`]: A normalized story extracted from a single article page
//! - [`Source`]: A configured story source with its listing-path convention
//! - [`PoolConfig`]: Settings for the image pool acquisition subsystem
//! - [`HarvestConfig`]: The full run configuration, loadable from YAML
//!
//! Every non-optional [`StoryRecord`] field has a defined default, so
//! extraction never has to abort a record over a missing field.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Sentinel title used when no title selector matches.
pub const UNTITLED: &str = "Untitled";

/// Category applied when no category relation is found on the page.
pub const DEFAULT_CATEGORY: &str = "Uncategorized";

/// Tag pair applied when a page carries no tag-relation links.
pub const DEFAULT_TAGS: [&str; 2] = ["stories", "untagged"];

/// A normalized story extracted from one article page.
///
/// Fields are filled by cascading selector chains; each has a documented
/// default so a sparse page still yields a complete record. Only a total
/// fetch failure aborts extraction.
#[derive(Debug, Clone)]
pub struct StoryRecord {
    /// The story title, or [`UNTITLED`] when unresolvable.
    pub title: String,
    /// Plain body text with paragraph breaks preserved as line breaks.
    pub body: String,
    /// The publication date; today's date when absent or unparsable.
    pub published: NaiveDate,
    /// The absolute URL the story was extracted from.
    pub source_url: String,
    /// The story category, defaulting to [`DEFAULT_CATEGORY`].
    pub category: String,
    /// Ordered tags, defaulting to [`DEFAULT_TAGS`].
    pub tags: Vec<String>,
    /// An on-page image candidate, if one survived validation. `None`
    /// means the image pool assigns one downstream.
    pub image_url: Option<String>,
}

impl StoryRecord {
    /// Publication date in the `DD/MM/YYYY` form used by the front matter.
    pub fn published_display(&self) -> String {
        self.published.format("%d/%m/%Y").to_string()
    }

    /// A truncated content excerpt for the front matter.
    ///
    /// The first 120 characters of the body with embedded line breaks
    /// flattened to spaces, always suffixed with `"..."`.
    pub fn excerpt(&self) -> String {
        let flat = self.body.replace('\n', " ");
        let cut: String = flat.chars().take(120).collect();
        format!("{}...", cut.trim_end())
    }
}

/// How a source's paginated listing path is built from its root.
///
/// One observed source ignores any trailing slash on its root before the
/// `page/{n}/` segment is appended; another requires the root to be used
/// verbatim. Preserved as a per-source rule rather than a global one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PagePathStyle {
    /// Strip any trailing slash from the root, then append `/page/{n}/`.
    #[default]
    TrimSlash,
    /// Concatenate `page/{n}/` onto the root exactly as configured.
    Verbatim,
}

/// A configured story source.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Source {
    /// Human-readable source name, used in logs.
    pub name: String,
    /// The source root, e.g. `https://stories.example.com`.
    pub base_url: String,
    /// How many listing pages the default run mode scans.
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,
    /// Listing-path construction rule for this source.
    #[serde(default)]
    pub page_path: PagePathStyle,
}

fn default_page_limit() -> u32 {
    3
}

impl Source {
    /// A one-off source built from an explicit root URL (explicit run mode).
    pub fn ad_hoc(base_url: &str) -> Self {
        let name = url::Url::parse(base_url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_else(|| base_url.to_string());
        Source {
            name,
            base_url: base_url.to_string(),
            page_limit: default_page_limit(),
            page_path: PagePathStyle::default(),
        }
    }

    /// Build the paginated index URL for `page` under this source's rule.
    pub fn listing_url(&self, page: u32) -> String {
        match self.page_path {
            PagePathStyle::TrimSlash => {
                format!("{}/page/{}/", self.base_url.trim_end_matches('/'), page)
            }
            PagePathStyle::Verbatim => format!("{}page/{}/", self.base_url, page),
        }
    }
}

/// Settings for image pool acquisition and placeholder backfill.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Root of the external image listing; the page number is appended
    /// as a trailing path segment.
    pub listing_base: String,
    /// Hard ceiling on listing pages scanned before giving up.
    pub page_ceiling: u32,
    /// Alternate category listings on the same host, tried once each
    /// when the primary listing under-delivers.
    pub alternates: Vec<String>,
    /// Placeholder service root used for shortfall backfill.
    pub placeholder_base: String,
}

impl Default for PoolConfig {
    fn default() -> Self {
        PoolConfig {
            listing_base: "https://gallery.example.com/en/latest".to_string(),
            page_ceiling: 25,
            alternates: vec![
                "https://gallery.example.com/en/popular/1".to_string(),
                "https://gallery.example.com/en/archive/1".to_string(),
            ],
            placeholder_base: "https://placehold.co".to_string(),
        }
    }
}

/// The full run configuration: sources plus image pool settings.
///
/// Loadable from a YAML file via `--sources`; compiled-in defaults are
/// used when no file is given.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HarvestConfig {
    pub sources: Vec<Source>,
    #[serde(default)]
    pub images: PoolConfig,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        HarvestConfig {
            sources: vec![
                Source {
                    name: "stories.example.com".to_string(),
                    base_url: "https://stories.example.com".to_string(),
                    page_limit: 3,
                    page_path: PagePathStyle::TrimSlash,
                },
                Source {
                    name: "tales.example.org".to_string(),
                    base_url: "https://tales.example.org/".to_string(),
                    page_limit: 3,
                    page_path: PagePathStyle::Verbatim,
                },
            ],
            images: PoolConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(body: &str) -> StoryRecord {
        StoryRecord {
            title: "A Story".to_string(),
            body: body.to_string(),
            published: NaiveDate::from_ymd_opt(2025, 5, 6).unwrap(),
            source_url: "https://stories.example.com/a-story/".to_string(),
            category: DEFAULT_CATEGORY.to_string(),
            tags: DEFAULT_TAGS.iter().map(|t| t.to_string()).collect(),
            image_url: None,
        }
    }

    #[test]
    fn test_published_display_is_day_month_year() {
        assert_eq!(record("x").published_display(), "06/05/2025");
    }

    #[test]
    fn test_excerpt_flattens_line_breaks() {
        let r = record("first line\nsecond line");
        assert_eq!(r.excerpt(), "first line second line...");
    }

    #[test]
    fn test_excerpt_truncates_to_120_chars() {
        let r = record(&"a".repeat(500));
        let excerpt = r.excerpt();
        assert_eq!(excerpt.len(), 123);
        assert!(excerpt.ends_with("..."));
    }

    #[test]
    fn test_listing_url_trims_trailing_slash() {
        let source = Source {
            name: "s".to_string(),
            base_url: "https://stories.example.com/".to_string(),
            page_limit: 3,
            page_path: PagePathStyle::TrimSlash,
        };
        assert_eq!(source.listing_url(2), "https://stories.example.com/page/2/");
    }

    #[test]
    fn test_listing_url_verbatim_root() {
        let source = Source {
            name: "s".to_string(),
            base_url: "https://tales.example.org/".to_string(),
            page_limit: 3,
            page_path: PagePathStyle::Verbatim,
        };
        assert_eq!(source.listing_url(1), "https://tales.example.org/page/1/");
    }

    #[test]
    fn test_ad_hoc_source_uses_host_as_name() {
        let source = Source::ad_hoc("https://stories.example.com");
        assert_eq!(source.name, "stories.example.com");
        assert_eq!(source.listing_url(1), "https://stories.example.com/page/1/");
    }

    #[test]
    fn test_config_round_trips_through_yaml() {
        let yaml = r#"
sources:
  - name: demo
    base_url: https://demo.example.net
    page_limit: 5
  - name: verbatim
    base_url: https://verbatim.example.net/
    page_path: verbatim
"#;
        let config: HarvestConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.sources.len(), 2);
        assert_eq!(config.sources[0].page_limit, 5);
        assert_eq!(config.sources[0].page_path, PagePathStyle::TrimSlash);
        assert_eq!(config.sources[1].page_path, PagePathStyle::Verbatim);
        assert_eq!(config.images.page_ceiling, 25);
    }
}
