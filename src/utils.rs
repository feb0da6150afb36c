//! Utility functions for slug derivation, page-range parsing, request
//! pacing, and file system checks.

use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;
use std::error::Error;
use std::fs as stdfs;
use tokio::fs;
use tracing::{debug, info, instrument};

/// Maximum slug length, counted after run collapsing.
pub const SLUG_MAX_LEN: usize = 50;

static NON_ALNUM_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new("[^a-z0-9]+").unwrap());

/// Derive a filesystem- and URL-safe slug from a story title.
///
/// Lowercases the title, collapses every run of non-alphanumeric
/// characters (punctuation, spaces, non-ASCII) to a single `-`, trims
/// separators from both ends, and caps the result at [`SLUG_MAX_LEN`]
/// characters. Titles that slug down to nothing yield `"untitled"`.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(slugify("Hello, World! Part 1"), "hello-world-part-1");
/// ```
pub fn slugify(title: &str) -> String {
    let lowered = title.to_lowercase();
    let mut slug = NON_ALNUM_RUNS
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string();
    if slug.len() > SLUG_MAX_LEN {
        slug.truncate(SLUG_MAX_LEN);
        slug = slug.trim_end_matches('-').to_string();
    }
    if slug.is_empty() {
        "untitled".to_string()
    } else {
        slug
    }
}

/// Parse a page spec into an explicit page list.
///
/// Accepts a single number (`"3"`) or an inclusive `start-end` range
/// (`"2-5"`). Pages are 1-based; a reversed or zero-based range is an
/// error.
pub fn parse_range(spec: &str) -> Result<Vec<u32>, Box<dyn Error>> {
    if let Some((start, end)) = spec.split_once('-') {
        let start: u32 = start.trim().parse()?;
        let end: u32 = end.trim().parse()?;
        if start == 0 || end < start {
            return Err(format!("invalid page range: {spec}").into());
        }
        Ok((start..=end).collect())
    } else {
        let page: u32 = spec.trim().parse()?;
        if page == 0 {
            return Err(format!("invalid page number: {spec}").into());
        }
        Ok(vec![page])
    }
}

/// Sleep for a uniformly random 1-2 s between listing-page fetches.
///
/// The only intentional pacing control in the pipeline; there is no
/// adaptive rate limiting.
pub async fn pacing_delay() {
    let millis = rand::rng().random_range(1000..2000u64);
    debug!(millis, "Pacing between listing fetches");
    tokio::time::sleep(std::time::Duration::from_millis(millis)).await;
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then probes it with a throwaway
/// write so permission problems surface before the run starts.
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> Result<(), Box<dyn Error>> {
    if let Err(e) = fs::create_dir_all(path).await {
        return Err(Box::new(e));
    }
    // Try a small sync write using std fs (simpler error surface)
    let probe_path = format!("{}/..__probe_write__", path.trim_end_matches('/'));
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!("Output directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_strips_punctuation_and_lowercases() {
        assert_eq!(slugify("Hello, World! Part 1"), "hello-world-part-1");
    }

    #[test]
    fn test_slugify_collapses_runs() {
        assert_eq!(slugify("Multiple   Spaces -- and dashes"), "multiple-spaces-and-dashes");
    }

    #[test]
    fn test_slugify_caps_length() {
        let long = "word ".repeat(40);
        let slug = slugify(&long);
        assert!(slug.len() <= SLUG_MAX_LEN);
        assert!(!slug.ends_with('-'));
    }

    #[test]
    fn test_slugify_non_ascii_falls_back_to_untitled() {
        assert_eq!(slugify("!!!"), "untitled");
        assert_eq!(slugify(""), "untitled");
    }

    #[test]
    fn test_slugify_is_filesystem_safe() {
        let slug = slugify("a/b\\c:d*e?f\"g<h>i|j");
        assert!(slug.chars().all(|c| c.is_ascii_alphanumeric() || c == '-'));
    }

    #[test]
    fn test_parse_range_single_page() {
        assert_eq!(parse_range("3").unwrap(), vec![3]);
    }

    #[test]
    fn test_parse_range_span() {
        assert_eq!(parse_range("2-5").unwrap(), vec![2, 3, 4, 5]);
    }

    #[test]
    fn test_parse_range_rejects_garbage() {
        assert!(parse_range("abc").is_err());
        assert!(parse_range("5-2").is_err());
        assert!(parse_range("0").is_err());
    }

    #[tokio::test]
    async fn test_ensure_writable_dir_creates_missing_dir() {
        let dir = std::env::temp_dir().join("story_harvest_probe_test");
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.to_str().unwrap().to_string();
        ensure_writable_dir(&path).await.unwrap();
        assert!(dir.is_dir());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
