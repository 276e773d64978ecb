//! Generator module - writes post pages, the index and enabled extensions

use std::collections::BTreeMap;
use std::fs;

use tera::Context;

use crate::config::Extension;
use crate::content::{slugify, Post, PostFailure, PostSummary};
use crate::error::{BuildError, PostError};
use crate::templates::{CategoryLink, PostEntry, PostPageData, SiteData, TemplateRenderer};
use crate::Site;

/// Directory (under the output root) holding category pages
pub const CATEGORY_DIR: &str = "categories";

/// What a generation pass produced
#[derive(Debug, Default)]
pub struct Generated {
    /// Posts written, newest first
    pub rendered: Vec<PostSummary>,
    /// Posts whose page could not be rendered
    pub failures: Vec<PostFailure>,
}

/// Static site generator using Tera templates
pub struct Generator<'a> {
    site: &'a Site,
    renderer: TemplateRenderer,
}

impl<'a> Generator<'a> {
    /// Create a new generator
    pub fn new(site: &'a Site) -> Result<Self, BuildError> {
        Ok(Self::with_renderer(site, TemplateRenderer::new()?))
    }

    /// Create a generator rendering pages with `renderer`
    pub fn with_renderer(site: &'a Site, renderer: TemplateRenderer) -> Self {
        Self { site, renderer }
    }

    /// Generate the entire site from posts sorted newest first
    pub fn generate(&self, posts: &[Post]) -> Result<Generated, BuildError> {
        let output_dir = &self.site.output_dir;
        fs::create_dir_all(output_dir).map_err(|e| BuildError::output(output_dir, e))?;

        let mut generated = Generated::default();
        let mut written: Vec<&Post> = Vec::with_capacity(posts.len());

        // Generate post pages
        for post in posts {
            match self.render_post(post) {
                Ok(html) => {
                    self.write(&post.output_name(), &html)?;
                    tracing::debug!("Generated post: {}", post.output_name());
                    generated.rendered.push(post.summary());
                    written.push(post);
                }
                Err(error) => {
                    tracing::warn!("Skipping {}: {}", post.source, error);
                    generated.failures.push(PostFailure {
                        source: post.source.clone(),
                        error,
                    });
                }
            }
        }

        // The index and every extension only see posts that were written
        self.generate_index(&written)?;

        if self.site.has_extension(Extension::Categories) {
            self.generate_category_pages(&written)?;
        }
        if self.site.has_extension(Extension::Feed) {
            self.generate_atom_feed(&written)?;
        }
        if self.site.has_extension(Extension::Search) {
            self.generate_search_index(&written)?;
        }

        Ok(generated)
    }

    /// Build site data for templates
    fn site_data(&self) -> SiteData {
        SiteData {
            title: self.site.config.title.clone(),
            description: self.site.config.description.clone(),
            author: self.site.config.author.clone(),
        }
    }

    /// Create a base context with common variables
    fn create_base_context(&self, root: &str) -> Context {
        let mut context = Context::new();
        context.insert("site", &self.site_data());
        context.insert("root", root);
        context.insert("feed", &self.site.has_extension(Extension::Feed));
        context
    }

    fn entry(&self, post: &Post, with_excerpt: bool) -> PostEntry {
        PostEntry {
            title: post.title.clone(),
            date: self.format_date(post),
            date_iso: post.date.to_rfc3339(),
            link: post.output_name(),
            excerpt: if with_excerpt { post.excerpt.clone() } else { None },
        }
    }

    fn format_date(&self, post: &Post) -> String {
        post.date.format(&self.site.config.date_format).to_string()
    }

    /// Render one post page
    pub fn render_post(&self, post: &Post) -> Result<String, PostError> {
        let link_categories = self.site.has_extension(Extension::Categories);
        let categories = post
            .categories
            .iter()
            .map(|name| {
                // Names that slugify to nothing get no page
                let has_page = link_categories && !slugify(name).is_empty();
                CategoryLink {
                    name: name.clone(),
                    link: has_page.then(|| category_file(name)),
                }
            })
            .collect();

        let page = PostPageData {
            title: post.title.clone(),
            date: self.format_date(post),
            date_iso: post.date.to_rfc3339(),
            content: post.content.clone(),
            categories,
            tags: post.tags.clone(),
        };

        let mut context = self.create_base_context("");
        context.insert("post", &page);
        Ok(self.renderer.render("post.html", &context)?)
    }

    /// Generate the index page listing every post newest first
    fn generate_index(&self, posts: &[&Post]) -> Result<(), BuildError> {
        let entries: Vec<PostEntry> = posts.iter().map(|p| self.entry(p, true)).collect();

        let mut context = self.create_base_context("");
        context.insert("posts", &entries);

        let html = self.renderer.render("index.html", &context)?;
        self.write("index.html", &html)?;
        tracing::info!("Generated index with {} posts", entries.len());
        Ok(())
    }

    /// Generate one page per category
    fn generate_category_pages(&self, posts: &[&Post]) -> Result<(), BuildError> {
        // Keyed by slug so `C++` and `c++` share a page; first spelling names it
        let mut categories: BTreeMap<String, (String, Vec<PostEntry>)> = BTreeMap::new();

        for post in posts {
            for name in &post.categories {
                let slug = slugify(name);
                if slug.is_empty() {
                    continue;
                }
                categories
                    .entry(slug)
                    .or_insert_with(|| (name.clone(), Vec::new()))
                    .1
                    .push(self.entry(post, false));
            }
        }

        for (name, entries) in categories.values() {
            let mut context = self.create_base_context("../");
            context.insert("category", name);
            context.insert("posts", entries);

            let html = self.renderer.render("category.html", &context)?;
            self.write(&category_file(name), &html)?;
        }

        tracing::info!("Generated {} category pages", categories.len());
        Ok(())
    }

    /// Generate Atom feed
    fn generate_atom_feed(&self, posts: &[&Post]) -> Result<(), BuildError> {
        let config = &self.site.config;
        let base_url = config.url.trim_end_matches('/');

        // Newest post's date keeps the feed reproducible
        let updated = posts
            .first()
            .map(|p| p.updated.unwrap_or(p.date).to_rfc3339())
            .unwrap_or_else(|| "1970-01-01T00:00:00+00:00".to_string());

        let mut feed = String::new();
        feed.push_str(r#"<?xml version="1.0" encoding="utf-8"?>"#);
        feed.push('\n');
        feed.push_str(r#"<feed xmlns="http://www.w3.org/2005/Atom">"#);
        feed.push('\n');
        feed.push_str(&format!("  <title>{}</title>\n", escape_xml(&config.title)));
        feed.push_str(&format!(
            "  <link href=\"{}/atom.xml\" rel=\"self\"/>\n",
            escape_xml(base_url)
        ));
        feed.push_str(&format!("  <link href=\"{}/\"/>\n", escape_xml(base_url)));
        feed.push_str(&format!("  <updated>{}</updated>\n", updated));
        feed.push_str(&format!("  <id>{}/</id>\n", escape_xml(base_url)));
        if !config.author.is_empty() {
            feed.push_str(&format!(
                "  <author><name>{}</name></author>\n",
                escape_xml(&config.author)
            ));
        }

        for post in posts.iter().take(config.feed_limit) {
            let link = escape_xml(&format!("{}/{}", base_url, post.output_name()));
            feed.push_str("  <entry>\n");
            feed.push_str(&format!("    <title>{}</title>\n", escape_xml(&post.title)));
            feed.push_str(&format!("    <link href=\"{}\"/>\n", link));
            feed.push_str(&format!("    <id>{}</id>\n", link));
            feed.push_str(&format!(
                "    <published>{}</published>\n",
                post.date.to_rfc3339()
            ));
            feed.push_str(&format!(
                "    <updated>{}</updated>\n",
                post.updated.unwrap_or(post.date).to_rfc3339()
            ));
            for category in &post.categories {
                feed.push_str(&format!(
                    "    <category term=\"{}\"/>\n",
                    escape_xml(category)
                ));
            }
            let content = post.excerpt.as_ref().unwrap_or(&post.content);
            feed.push_str(&format!(
                "    <content type=\"html\"><![CDATA[{}]]></content>\n",
                escape_cdata(&strip_invalid_xml_chars(content))
            ));
            feed.push_str("  </entry>\n");
        }

        feed.push_str("</feed>\n");

        self.write("atom.xml", &feed)?;
        tracing::info!("Generated atom.xml");
        Ok(())
    }

    /// Generate search index (JSON)
    fn generate_search_index(&self, posts: &[&Post]) -> Result<(), BuildError> {
        let search_data: Vec<serde_json::Value> = posts
            .iter()
            .map(|p| {
                serde_json::json!({
                    "title": p.title,
                    "url": p.output_name(),
                    "date": p.date.format("%Y-%m-%d").to_string(),
                    "categories": p.categories,
                    "content": strip_html(&p.content),
                })
            })
            .collect();

        let json = serde_json::to_string_pretty(&search_data)
            .map_err(|e| BuildError::output(&self.site.output_dir, e.into()))?;
        self.write("search.json", &json)?;
        tracing::info!("Generated search.json");
        Ok(())
    }

    /// Write a file below the output directory, creating parents
    fn write(&self, relative: &str, content: &str) -> Result<(), BuildError> {
        let output_path = self.site.output_dir.join(relative);
        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent).map_err(|e| BuildError::output(parent, e))?;
        }
        fs::write(&output_path, content).map_err(|e| BuildError::output(&output_path, e))
    }
}

/// Category page path relative to the output root
fn category_file(name: &str) -> String {
    format!("{}/{}.html", CATEGORY_DIR, slugify(name))
}

/// Strip HTML tags from content
fn strip_html(html: &str) -> String {
    let mut result = String::new();
    let mut in_tag = false;

    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => result.push(c),
            _ => {}
        }
    }

    result
}

/// Escape XML special characters
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// A literal `]]>` would end the CDATA section early
fn escape_cdata(s: &str) -> String {
    s.replace("]]>", "]]]]><![CDATA[>")
}

/// Strip invalid XML control characters (except tab, newline, carriage return)
/// XML 1.0 only allows: #x9 | #xA | #xD | [#x20-#xD7FF] | [#xE000-#xFFFD] | [#x10000-#x10FFFF]
fn strip_invalid_xml_chars(s: &str) -> String {
    s.chars()
        .filter(|&c| {
            c == '\t'
                || c == '\n'
                || c == '\r'
                || ('\u{0020}'..='\u{D7FF}').contains(&c)
                || ('\u{E000}'..='\u{FFFD}').contains(&c)
                || ('\u{10000}'..='\u{10FFFF}').contains(&c)
        })
        .collect()
}
