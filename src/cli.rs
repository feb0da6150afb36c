//! Command-line interface definitions for story_harvest.
//!
//! Three run modes are resolved from the arguments:
//!
//! - **default**: no mode flags; every configured source is scanned
//!   across its own page range.
//! - **single-page**: `--page N`; page `N` is scanned across all
//!   configured sources.
//! - **explicit**: `--source URL --pages SPEC`; one ad hoc source root
//!   scanned over a page number or `start-end` range.

use clap::Parser;

/// Command-line arguments for the story harvester.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Output directory for harvested story documents
    #[arg(short, long, default_value = "stories")]
    pub output_dir: String,

    /// Optional YAML file with sources and image pool settings
    #[arg(short, long, env = "STORY_HARVEST_SOURCES")]
    pub sources: Option<String>,

    /// Scrape a single listing page number across all configured sources
    #[arg(short, long, conflicts_with_all = ["source", "pages"])]
    pub page: Option<u32>,

    /// Scrape one explicit source root instead of the configured set
    #[arg(long, requires = "pages")]
    pub source: Option<String>,

    /// Page number or start-end page range for --source (e.g. "3" or "2-5")
    #[arg(long, requires = "source")]
    pub pages: Option<String>,

    /// Overwrite existing documents instead of skipping duplicates
    #[arg(long)]
    pub overwrite: bool,
}
