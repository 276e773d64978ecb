//! Post model and slug derivation

use chrono::{DateTime, FixedOffset, NaiveDate};
use lazy_static::lazy_static;
use regex::Regex;
use std::cmp::Ordering;

lazy_static! {
    /// Jekyll-style post filename: `2020-03-22-some-name.md`
    static ref DATED_FILENAME: Regex =
        Regex::new(r"^(\d{4}-\d{2}-\d{2})-(.+)$").expect("valid dated filename pattern");
}

/// A blog post
#[derive(Debug, Clone)]
pub struct Post {
    /// Post title
    pub title: String,

    /// Publication date
    pub date: DateTime<FixedOffset>,

    /// Last updated date
    pub updated: Option<DateTime<FixedOffset>>,

    /// Rendered HTML content
    pub content: String,

    /// Rendered excerpt (before <!-- more -->)
    pub excerpt: Option<String>,

    /// Post categories, first occurrence order
    pub categories: Vec<String>,

    /// Post tags, first occurrence order
    pub tags: Vec<String>,

    /// Slug (URL-friendly name)
    pub slug: String,

    /// Source file path relative to the input directory
    pub source: String,
}

impl Post {
    /// Create a new post with minimal required fields
    pub fn new(title: String, date: DateTime<FixedOffset>, slug: String, source: String) -> Self {
        Self {
            title,
            date,
            updated: None,
            content: String::new(),
            excerpt: None,
            categories: Vec::new(),
            tags: Vec::new(),
            slug,
            source,
        }
    }

    /// Output file name, `YYYY-MM-DD-slug.html`
    pub fn output_name(&self) -> String {
        output_name(&self.date, &self.slug)
    }

    pub fn summary(&self) -> PostSummary {
        PostSummary {
            title: self.title.clone(),
            date: self.date,
            slug: self.slug.clone(),
            output_name: self.output_name(),
        }
    }
}

/// The index entry for a rendered post
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostSummary {
    pub title: String,
    pub date: DateTime<FixedOffset>,
    pub slug: String,
    pub output_name: String,
}

pub fn output_name(date: &DateTime<FixedOffset>, slug: &str) -> String {
    format!("{}-{}.html", date.format("%Y-%m-%d"), slug)
}

/// Newest first; equal instants fall back to slug so the order is total
pub fn newest_first(
    a: (&DateTime<FixedOffset>, &str),
    b: (&DateTime<FixedOffset>, &str),
) -> Ordering {
    b.0.cmp(a.0).then_with(|| a.1.cmp(b.1))
}

/// Sort posts newest first
pub fn sort_posts(posts: &mut [Post]) {
    posts.sort_by(|a, b| newest_first((&a.date, &a.slug), (&b.date, &b.slug)));
}

/// Turn arbitrary text into a URL-safe slug.
///
/// `+` and `#` would otherwise vanish, which makes `C` / `C++` / `C#`
/// collide, so they are spelled out first.
pub fn slugify(text: &str) -> String {
    let mut spelled = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '+' => spelled.push('p'),
            '#' => spelled.push_str("sharp"),
            _ => spelled.push(c),
        }
    }
    slug::slugify(spelled)
}

/// Split a Jekyll-style file stem into its date and name parts
pub fn split_dated_stem(stem: &str) -> Option<(NaiveDate, &str)> {
    let caps = DATED_FILENAME.captures(stem)?;
    let date = NaiveDate::parse_from_str(caps.get(1)?.as_str(), "%Y-%m-%d").ok()?;
    let name = caps.get(2)?.as_str();
    Some((date, name))
}
