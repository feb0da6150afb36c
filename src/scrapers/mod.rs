//! Story source scrapers: listing discovery and article extraction.
//!
//! The two submodules split the harvesting work into the same two phases
//! every source goes through:
//!
//! 1. **Discovery** ([`listing`]): turn a source root plus a page number
//!    into a deduplicated set of absolute article URLs.
//! 2. **Extraction** ([`article`]): turn one article URL into a normalized
//!    [`crate::models::StoryRecord`].
//!
//! # Common Patterns
//!
//! Source markup varies wildly, so both phases locate content through
//! *fallback chains*: ordered lists of selectors tried in sequence where
//! the first selector producing a non-empty result wins and later entries
//! are never consulted. A chain that finds nothing resolves to a
//! documented default value, never an error.
//!
//! Scrapers use:
//! - One shared [`crate::fetch::Fetcher`] for all requests
//! - Graceful error handling (failed fetches are logged and skipped)
//! - `url::Url` joins against the source origin for href normalization

pub mod article;
pub mod listing;
