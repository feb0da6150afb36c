//! Markdown document serialization with front matter.
//!
//! Each story becomes one `.md` file: a delimited YAML front-matter block
//! (title, author, publishedDate as `DD/MM/YYYY`, category, tags as a
//! bracketed quoted list, imageUrl, excerpt), a blank line, then the raw
//! body text. The filename is the `DD-MM-YYYY` date followed by the
//! length-capped title slug.
//!
//! Whether an existing file of the same name is skipped or overwritten is
//! a run-level policy; skipping is the default.

use crate::models::StoryRecord;
use crate::utils::slugify;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument, warn};

/// What to do when the derived filename already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WritePolicy {
    /// Leave the existing document alone and report a duplicate skip.
    SkipExisting,
    /// Replace the existing document.
    Overwrite,
}

/// Outcome of a single document write.
#[derive(Debug, PartialEq, Eq)]
pub enum WriteOutcome {
    Written(PathBuf),
    SkippedDuplicate(PathBuf),
}

/// The front-matter header block, as re-read from a document.
///
/// Field names mirror what the downstream site expects; parsing this
/// back out of a written document must reproduce the original record's
/// title, date, category, and tags exactly.
#[derive(Debug, Deserialize, Serialize, PartialEq)]
pub struct FrontMatter {
    pub title: String,
    pub author: String,
    #[serde(rename = "publishedDate")]
    pub published_date: String,
    pub category: String,
    pub tags: Vec<String>,
    #[serde(rename = "imageUrl")]
    pub image_url: String,
    pub excerpt: String,
}

/// Fixed author label; the sources never attribute authors.
pub const AUTHOR: &str = "Anonymous";

fn yaml_quote(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Derive the document filename: `DD-MM-YYYY-<slug>.md`.
pub fn document_filename(record: &StoryRecord) -> String {
    format!(
        "{}-{}.md",
        record.published.format("%d-%m-%Y"),
        slugify(&record.title)
    )
}

/// Render the full document text: front matter, blank line, body.
pub fn render_document(record: &StoryRecord, image_url: &str) -> String {
    let tags = record
        .tags
        .iter()
        .map(|tag| yaml_quote(tag))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "---\n\
         title: {title}\n\
         author: {author}\n\
         publishedDate: {date}\n\
         category: {category}\n\
         tags: [{tags}]\n\
         imageUrl: {image}\n\
         excerpt: {excerpt}\n\
         ---\n\
         \n\
         {body}\n",
        title = yaml_quote(&record.title),
        author = yaml_quote(AUTHOR),
        date = yaml_quote(&record.published_display()),
        category = yaml_quote(&record.category),
        tags = tags,
        image = yaml_quote(image_url),
        excerpt = yaml_quote(&record.excerpt()),
        body = record.body
    )
}

/// Re-parse the front-matter block out of a rendered document.
pub fn parse_front_matter(document: &str) -> Result<FrontMatter, Box<dyn Error>> {
    let rest = document
        .strip_prefix("---\n")
        .ok_or("document has no front matter opening delimiter")?;
    let (block, _) = rest
        .split_once("\n---\n")
        .ok_or("document has no front matter closing delimiter")?;
    Ok(serde_yaml::from_str(block)?)
}

/// Serialize one story to disk.
///
/// Ensures the output directory exists, then writes the rendered document
/// under the duplicate policy. A failure here drops this document only;
/// the caller logs it and the run continues.
#[instrument(level = "info", skip_all, fields(title = %record.title))]
pub async fn write_story(
    record: &StoryRecord,
    image_url: &str,
    output_dir: &str,
    policy: WritePolicy,
) -> Result<WriteOutcome, Box<dyn Error>> {
    fs::create_dir_all(output_dir).await?;

    let filename = document_filename(record);
    let path = Path::new(output_dir).join(&filename);

    if policy == WritePolicy::SkipExisting && fs::try_exists(&path).await.unwrap_or(false) {
        warn!(path = %path.display(), "Skipped duplicate document");
        return Ok(WriteOutcome::SkippedDuplicate(path));
    }

    fs::write(&path, render_document(record, image_url)).await?;
    info!(path = %path.display(), "Wrote story document");
    Ok(WriteOutcome::Written(path))
}
