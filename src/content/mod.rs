//! Content module - handles posts and content processing

mod frontmatter;
pub mod loader;
mod markdown;
mod post;

pub use frontmatter::{parse_date_string, FrontMatter};
pub use loader::{ContentLoader, LoadedPosts, PostFailure};
pub use markdown::MarkdownRenderer;
pub use post::{
    newest_first, output_name, slugify, sort_posts, split_dated_stem, Post, PostSummary,
};
