//! # story_harvest
//!
//! A story harvesting pipeline that scrapes article-style pages from
//! WordPress-flavored story sources, normalizes each one into a structured
//! record, pairs it with an image from a deduplicated pool, and writes it
//! out as a front-matter-annotated Markdown document.
//!
//! ## Usage
//!
//! ```sh
//! # Default mode: every configured source across its own page range
//! story_harvest -o ./stories
//!
//! # One page across all sources
//! story_harvest --page 2
//!
//! # One explicit source over a page range
//! story_harvest --source https://stories.example.com --pages 2-5
//! ```
//!
//! ## Architecture
//!
//! The application follows a strictly sequential pipeline:
//! 1. **Discovery**: Collect article URLs from each source's listing pages
//! 2. **Pool build**: Acquire exactly one distinct image per discovered URL
//! 3. **Extraction**: Fetch and normalize each article in listing order
//! 4. **Serialization**: Write one Markdown document per story
//!
//! Per-article failures are isolated: a fetch or write error drops that
//! story and the run continues. Producing zero documents is still a
//! successful process exit.

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod cli;
mod fetch;
mod images;
mod models;
mod outputs;
mod scrapers;
mod utils;

use cli::Cli;
use fetch::Fetcher;
use images::ImagePool;
use models::{HarvestConfig, Source};
use outputs::markdown::{write_story, WriteOutcome, WritePolicy};
use scrapers::{article, listing};
use utils::{ensure_writable_dir, pacing_delay, parse_range};

/// Load the run configuration, falling back to compiled-in defaults.
fn load_config(path: Option<&str>) -> Result<HarvestConfig, Box<dyn Error>> {
    match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)?;
            let config: HarvestConfig = serde_yaml::from_str(&raw)?;
            info!(path, sources = config.sources.len(), "Loaded sources file");
            Ok(config)
        }
        None => {
            debug!("No sources file given; using built-in defaults");
            Ok(HarvestConfig::default())
        }
    }
}

/// Resolve the run mode into per-source page lists.
fn resolve_plan(args: &Cli, config: &HarvestConfig) -> Result<Vec<(Source, Vec<u32>)>, Box<dyn Error>> {
    if let (Some(root), Some(spec)) = (args.source.as_deref(), args.pages.as_deref()) {
        let pages = parse_range(spec)?;
        info!(source = root, ?pages, "Explicit source mode");
        return Ok(vec![(Source::ad_hoc(root), pages)]);
    }
    if let Some(page) = args.page {
        info!(page, "Single-page mode across all sources");
        return Ok(config
            .sources
            .iter()
            .map(|source| (source.clone(), vec![page]))
            .collect());
    }
    info!("Default mode: each source across its configured page range");
    Ok(config
        .sources
        .iter()
        .map(|source| (source.clone(), (1..=source.page_limit).collect()))
        .collect())
}

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("story_harvest starting up");

    let args = Cli::parse();
    debug!(?args.output_dir, ?args.sources, "Parsed CLI arguments");

    let config = load_config(args.sources.as_deref())?;
    let plan = resolve_plan(&args, &config)?;

    // Early check: ensure the output dir is writable before any network work
    if let Err(e) = ensure_writable_dir(&args.output_dir).await {
        error!(
            path = %args.output_dir,
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    let policy = if args.overwrite {
        WritePolicy::Overwrite
    } else {
        WritePolicy::SkipExisting
    };

    let fetcher = Fetcher::new()?;

    // ---- Discovery: collect article URLs in listing order ----
    let mut links: Vec<String> = Vec::new();
    for (source, pages) in &plan {
        for page in pages {
            let found = listing::discover(&fetcher, source, *page).await;
            for url in found {
                if !links.contains(&url) {
                    links.push(url);
                }
            }
            pacing_delay().await;
        }
    }
    info!(count = links.len(), "Discovery complete");

    if links.is_empty() {
        warn!("No articles discovered from any source");
        info!(
            discovered = 0,
            written = 0,
            skipped = 0,
            failed = 0,
            "Run complete with nothing to do"
        );
        return Ok(());
    }

    // ---- Image pool: one distinct image per discovered article ----
    let mut pool = ImagePool::build(&fetcher, &config.images, links.len()).await;
    info!(pool_size = pool.len(), "Image pool ready");

    // ---- Extract and serialize, one article at a time ----
    let mut written = 0usize;
    let mut skipped = 0usize;
    let mut failed = 0usize;

    for url in &links {
        match article::extract(&fetcher, url).await {
            Ok(record) => {
                // On-page image when one survived validation, else the pool
                // assigns the next distinct entry.
                let image_url = record
                    .image_url
                    .clone()
                    .unwrap_or_else(|| pool.next());

                match write_story(&record, &image_url, &args.output_dir, policy).await {
                    Ok(WriteOutcome::Written(path)) => {
                        info!(path = %path.display(), title = %record.title, "Saved story");
                        written += 1;
                    }
                    Ok(WriteOutcome::SkippedDuplicate(path)) => {
                        info!(path = %path.display(), "Duplicate skipped");
                        skipped += 1;
                    }
                    Err(e) => {
                        error!(%url, error = %e, "Failed to write story document");
                        failed += 1;
                    }
                }
            }
            Err(e) => {
                warn!(%url, error = %e, "Failed to extract article; skipping");
                failed += 1;
            }
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        discovered = links.len(),
        written,
        skipped,
        failed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Run complete"
    );

    Ok(())
}
