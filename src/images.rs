//! Image pool acquisition, deduplication, and assignment.
//!
//! Stories rarely carry a usable image of their own, so each run builds a
//! pool of distinct image references up front, sized to exactly the number
//! of articles being processed. References are harvested from successive
//! pages of an external image listing until the quota is met or a hard
//! page ceiling is hit, optionally widening to a few alternate category
//! listings on the same host. Any remaining shortfall is backfilled with
//! synthetic placeholder URLs that are pairwise distinct by construction.
//!
//! The finished pool is shuffled so assignment order does not correlate
//! with listing order, then handed out strictly left-to-right through
//! [`ImagePool::next`].

use crate::fetch::Fetcher;
use crate::models::PoolConfig;
use itertools::Itertools;
use once_cell::sync::Lazy;
use rand::seq::SliceRandom;
use scraper::{Html, Selector};
use tracing::{debug, info, instrument, warn};

static CONTENT_URL_IMAGES: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"img[itemprop="contentUrl"]"#).unwrap());

/// Fallback placeholder service root, used only by the defensive branch
/// of [`ImagePool::next`] when the pool is somehow empty.
const FALLBACK_PLACEHOLDER_BASE: &str = "https://placehold.co";

/// Pull image references out of listing markup.
///
/// Only `img` elements carrying the `itemprop="contentUrl"` marker are
/// considered, and only http(s) references are accepted.
pub fn extract_image_refs(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    document
        .select(&CONTENT_URL_IMAGES)
        .filter_map(|element| element.value().attr("src"))
        .map(str::trim)
        .filter(|src| src.starts_with("http://") || src.starts_with("https://"))
        .map(str::to_string)
        .collect()
}

/// Build a synthetic placeholder reference for backfill slot `index`.
///
/// Width, height, and color are all derived from the index, so any two
/// backfilled entries differ even though they point at the same service.
pub fn placeholder_url(base: &str, index: usize) -> String {
    let width = 640 + 16 * index as u32;
    let height = 480 + 9 * index as u32;
    let color = (0x1f_6f_8b_u32.wrapping_add(index as u32 * 0x01_03_05)) & 0x00ff_ffff;
    format!(
        "{}/{}x{}/{:06x}/ffffff",
        base.trim_end_matches('/'),
        width,
        height,
        color
    )
}

/// A run-scoped pool of distinct image references.
///
/// Created once before article processing begins, consumed left-to-right,
/// never refilled mid-run.
#[derive(Debug)]
pub struct ImagePool {
    entries: Vec<String>,
    cursor: usize,
}

impl ImagePool {
    /// Assemble a pool from already-acquired references.
    ///
    /// Pure core of [`ImagePool::build`]: deduplicates the references in
    /// first-seen order, truncates to `required`, backfills any shortfall
    /// with distinct placeholders, and shuffles.
    pub fn from_refs(refs: Vec<String>, required: usize, placeholder_base: &str) -> ImagePool {
        let mut entries: Vec<String> = refs.into_iter().unique().take(required).collect();

        let shortfall = required - entries.len();
        if shortfall > 0 {
            info!(shortfall, "Backfilling image pool with placeholders");
        }
        let mut index = 0;
        while entries.len() < required {
            let candidate = placeholder_url(placeholder_base, index);
            index += 1;
            // A harvested reference could collide with a placeholder URL.
            if !entries.contains(&candidate) {
                entries.push(candidate);
            }
        }

        entries.shuffle(&mut rand::rng());
        ImagePool { entries, cursor: 0 }
    }

    /// Acquire references from the configured listing and assemble a pool
    /// of exactly `required` distinct entries.
    #[instrument(level = "info", skip(fetcher, config))]
    pub async fn build(fetcher: &Fetcher, config: &PoolConfig, required: usize) -> ImagePool {
        let refs = acquire_refs(fetcher, config, required).await;
        Self::from_refs(refs, required, &config.placeholder_base)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Hand out the next entry, advancing the cursor.
    ///
    /// The pool is sized to the article count, so the cursor should never
    /// run off the end; if it does, the cursor wraps to the start and a
    /// warning is logged, since a wrap means the pool was sized wrong.
    pub fn next(&mut self) -> String {
        if self.entries.is_empty() {
            warn!("Image pool is empty; emitting a fallback placeholder");
            let url = placeholder_url(FALLBACK_PLACEHOLDER_BASE, self.cursor);
            self.cursor += 1;
            return url;
        }
        if self.cursor >= self.entries.len() {
            warn!(
                pool_size = self.entries.len(),
                "Image pool exhausted; wrapping to the start (pool was undersized)"
            );
            self.cursor = 0;
        }
        let entry = self.entries[self.cursor].clone();
        self.cursor += 1;
        entry
    }
}

/// Scan listing pages until the quota is met, the page ceiling is hit,
/// and the alternate listings are exhausted, in that order.
///
/// Returns the deduplicated references found; the caller backfills any
/// shortfall.
async fn acquire_refs(fetcher: &Fetcher, config: &PoolConfig, required: usize) -> Vec<String> {
    let mut refs: Vec<String> = Vec::new();

    let mut page = 1;
    while refs.len() < required && page <= config.page_ceiling {
        let url = format!("{}/{}", config.listing_base.trim_end_matches('/'), page);
        match fetcher.get(&url).await {
            Ok(html) => {
                let found = extract_image_refs(&html);
                debug!(url = %url, found = found.len(), "Scanned image listing page");
                for image in found {
                    if !refs.contains(&image) {
                        refs.push(image);
                    }
                }
            }
            Err(e) => {
                warn!(url = %url, error = %e, "Failed to load image listing page");
            }
        }
        page += 1;
    }

    if refs.len() < required {
        for alternate in &config.alternates {
            if refs.len() >= required {
                break;
            }
            match fetcher.get(alternate).await {
                Ok(html) => {
                    for image in extract_image_refs(&html) {
                        if !refs.contains(&image) {
                            refs.push(image);
                        }
                    }
                }
                Err(e) => {
                    warn!(url = %alternate, error = %e, "Failed to load alternate image listing");
                }
            }
        }
    }

    let shortfall = required.saturating_sub(refs.len());
    info!(
        found = refs.len(),
        required, shortfall, "Image acquisition finished"
    );
    refs
}
