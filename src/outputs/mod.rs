//! Output generation for harvested stories.
//!
//! One submodule for now:
//!
//! - [`markdown`]: renders a [`crate::models::StoryRecord`] plus its
//!   assigned image into a front-matter-annotated Markdown document and
//!   writes it to disk under the duplicate policy in force.
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── 15-01-2023-a-proper-story.md
//! ├── 16-01-2023-another-story.md
//! └── ...
//! ```

pub mod markdown;
