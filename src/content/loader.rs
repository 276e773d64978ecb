//! Content loader - loads posts from the input directory

use chrono::TimeZone;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;
use walkdir::{DirEntry, WalkDir};

use super::{slugify, sort_posts, split_dated_stem, FrontMatter, MarkdownRenderer, Post};
use crate::error::{BuildError, PostError};
use crate::Site;

/// A source file that could not be turned into a post
#[derive(Debug)]
pub struct PostFailure {
    /// Source path relative to the input directory
    pub source: String,
    pub error: PostError,
}

impl fmt::Display for PostFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.source, self.error)
    }
}

/// Result of a load pass: posts newest first, plus every skipped file
#[derive(Debug, Default)]
pub struct LoadedPosts {
    pub posts: Vec<Post>,
    pub failures: Vec<PostFailure>,
    /// Unpublished posts skipped on purpose
    pub drafts: usize,
}

/// Loads content from the input directory
pub struct ContentLoader<'a> {
    site: &'a Site,
    renderer: MarkdownRenderer,
}

impl<'a> ContentLoader<'a> {
    /// Create a new content loader
    pub fn new(site: &'a Site) -> Self {
        Self::with_renderer(site, MarkdownRenderer::with_options(&site.config.highlight))
    }

    /// Create a loader converting bodies with `renderer`
    pub fn with_renderer(site: &'a Site, renderer: MarkdownRenderer) -> Self {
        Self { site, renderer }
    }

    /// Load all posts below the input directory.
    ///
    /// Only a missing input directory is fatal. Files are visited in sorted
    /// path order, so when two posts share a slug the first one keeps it.
    pub fn load_posts(&self) -> Result<LoadedPosts, BuildError> {
        self.site.check_input()?;

        let mut loaded = LoadedPosts::default();
        let mut slugs: HashMap<String, String> = HashMap::new();

        let walker = WalkDir::new(&self.site.input_dir)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let source = e
                        .path()
                        .map(|p| self.relative_source(p))
                        .unwrap_or_else(|| self.site.input_dir.display().to_string());
                    tracing::warn!("Failed to read {}: {}", source, e);
                    loaded.failures.push(PostFailure {
                        source,
                        error: PostError::Read(e.into()),
                    });
                    continue;
                }
            };

            let path = entry.path();
            if !path.is_file() || !is_markdown_file(path) {
                continue;
            }

            let source = self.relative_source(path);
            let result = self.load_post(path, &source).and_then(|post| match post {
                Some(post) => match slugs.get(&post.slug) {
                    Some(existing) => Err(PostError::SlugCollision {
                        slug: post.slug.clone(),
                        existing: existing.clone(),
                    }),
                    None => Ok(Some(post)),
                },
                None => Ok(None),
            });

            match result {
                Ok(Some(post)) => {
                    tracing::debug!("Loaded {} as {}", source, post.slug);
                    slugs.insert(post.slug.clone(), source);
                    loaded.posts.push(post);
                }
                Ok(None) => {
                    tracing::debug!("Skipping unpublished post {}", source);
                    loaded.drafts += 1;
                }
                Err(error) => {
                    tracing::warn!("Skipping {}: {}", source, error);
                    loaded.failures.push(PostFailure { source, error });
                }
            }
        }

        // Sort by date descending (newest first)
        sort_posts(&mut loaded.posts);

        Ok(loaded)
    }

    /// Load a single post from a file. `Ok(None)` for unpublished posts.
    fn load_post(&self, path: &Path, source: &str) -> Result<Option<Post>, PostError> {
        let content = fs::read_to_string(path)?;
        let (fm, body) = FrontMatter::parse(&content)?;

        if !fm.published {
            return Ok(None);
        }

        let offset = self.site.offset;
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("");
        let dated = split_dated_stem(stem);

        let title = fm
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(PostError::MissingField("title"))?
            .to_string();

        // Header date wins, then the dated filename prefix
        let date = match fm.parse_date(offset)? {
            Some(date) => date,
            None => dated
                .and_then(|(d, _)| offset.from_local_datetime(&d.and_hms_opt(0, 0, 0)?).single())
                .ok_or(PostError::MissingField("date"))?,
        };
        let updated = fm.parse_updated(offset)?;

        // Explicit slug, then the dated filename name, then the title
        let slug_source = fm
            .slug
            .clone()
            .or_else(|| dated.map(|(_, name)| name.to_string()))
            .unwrap_or_else(|| title.clone());
        let slug = slugify(&slug_source);
        if slug.is_empty() {
            return Err(PostError::EmptySlug(slug_source));
        }

        // Split excerpt and render markdown
        let (excerpt_md, full_md) = MarkdownRenderer::split_excerpt(body);
        let content_html = self.renderer.render(&full_md)?;
        let excerpt_html = match excerpt_md {
            Some(ref e) => Some(self.renderer.render(e)?),
            None => None,
        };

        let mut post = Post::new(title, date, slug, source.to_string());
        post.updated = updated;
        post.content = content_html;
        post.excerpt = excerpt_html;
        post.categories = fm.categories;
        post.tags = fm.tags;

        Ok(Some(post))
    }

    /// Path relative to the input directory, with `/` separators
    fn relative_source(&self, path: &Path) -> String {
        path.strip_prefix(&self.site.input_dir)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/")
    }
}

/// Check if a file is a markdown file
fn is_markdown_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e == "md" || e == "markdown")
        .unwrap_or(false)
}

/// Dotfiles and dot-directories (`.git`, editor swap files) are never content
fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|s| s.starts_with('.'))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{HighlightConfig, SiteConfig};
    use crate::generator::Generator;
    use std::path::PathBuf;
    use syntect::highlighting::ThemeSet;

    fn site(input: &Path) -> Site {
        let config = SiteConfig {
            highlight: HighlightConfig {
                enable: false,
                ..Default::default()
            },
            ..Default::default()
        };
        Site::with_config(config, input, input.join("_site")).unwrap()
    }

    fn write(dir: &Path, name: &str, content: &str) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_load_posts_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "serialization.md",
            "---\ntitle: C++ Simple Binary Serialization\ndate: 2020-03-22\ncategories: c++, serialization\n---\n\nBody\n",
        );
        write(
            dir.path(),
            "docker.md",
            "---\ntitle: Docker and CLion\ndate: 2020-04-25\n---\n\nBody\n",
        );

        let site = site(dir.path());
        let loaded = ContentLoader::new(&site).load_posts().unwrap();
        assert!(loaded.failures.is_empty());
        let slugs: Vec<_> = loaded.posts.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["docker-and-clion", "cpp-simple-binary-serialization"]);
        assert_eq!(loaded.posts[1].categories, vec!["c++", "serialization"]);
    }

    #[test]
    fn test_missing_title_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "untitled.md", "---\ndate: 2020-01-01\n---\n\nBody\n");

        let site = site(dir.path());
        let loaded = ContentLoader::new(&site).load_posts().unwrap();
        assert!(loaded.posts.is_empty());
        assert_eq!(loaded.failures.len(), 1);
        assert_eq!(loaded.failures[0].source, "untitled.md");
        assert!(matches!(
            loaded.failures[0].error,
            PostError::MissingField("title")
        ));
    }

    #[test]
    fn test_date_and_slug_from_dated_filename() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "_posts/2020-04-25-docker-clion-toolchain.md",
            "---\ntitle: Using Docker as a CLion Toolchain\n---\n\nBody\n",
        );

        let site = site(dir.path());
        let loaded = ContentLoader::new(&site).load_posts().unwrap();
        let post = &loaded.posts[0];
        assert_eq!(post.slug, "docker-clion-toolchain");
        assert_eq!(post.source, "_posts/2020-04-25-docker-clion-toolchain.md");
        assert_eq!(post.output_name(), "2020-04-25-docker-clion-toolchain.html");
    }

    #[test]
    fn test_missing_date_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "nodate.md", "title: No Date\n\nBody\n");

        let site = site(dir.path());
        let loaded = ContentLoader::new(&site).load_posts().unwrap();
        assert!(matches!(
            loaded.failures[0].error,
            PostError::MissingField("date")
        ));
    }

    #[test]
    fn test_slug_collision_keeps_first() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.md", "---\ntitle: Same Title\ndate: 2020-01-01\n---\nfirst\n");
        write(dir.path(), "b.md", "---\ntitle: Same Title\ndate: 2021-01-01\n---\nsecond\n");

        let site = site(dir.path());
        let loaded = ContentLoader::new(&site).load_posts().unwrap();
        assert_eq!(loaded.posts.len(), 1);
        assert_eq!(loaded.posts[0].source, "a.md");
        assert_eq!(loaded.failures[0].source, "b.md");
        match &loaded.failures[0].error {
            PostError::SlugCollision { slug, existing } => {
                assert_eq!(slug, "same-title");
                assert_eq!(existing, "a.md");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_drafts_and_non_markdown_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "draft.md", "---\ntitle: WIP\npublished: false\n---\n");
        write(dir.path(), "notes.txt", "title: not a post\n");
        write(dir.path(), ".hidden/secret.md", "---\ntitle: Hidden\ndate: 2020-01-01\n---\n");
        write(dir.path(), "_config.yml", "title: Blog\n");

        let site = site(dir.path());
        let loaded = ContentLoader::new(&site).load_posts().unwrap();
        assert!(loaded.posts.is_empty());
        assert!(loaded.failures.is_empty());
        assert_eq!(loaded.drafts, 1);
    }

    #[test]
    fn test_missing_input_is_fatal() {
        let site = site(&PathBuf::from("/definitely/not/here"));
        assert!(matches!(
            ContentLoader::new(&site).load_posts(),
            Err(BuildError::InputMissing(_))
        ));
    }

    #[test]
    fn test_excerpt_is_rendered() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "post.md",
            "---\ntitle: Excerpt\ndate: 2020-01-01\n---\nShort intro.\n\n<!-- more -->\n\nThe rest.\n",
        );

        let site = site(dir.path());
        let loaded = ContentLoader::new(&site).load_posts().unwrap();
        let post = &loaded.posts[0];
        assert_eq!(post.excerpt.as_deref(), Some("<p>Short intro.</p>\n"));
        assert!(post.content.contains("<p>The rest.</p>"));
    }

    #[test]
    fn test_render_failure_skips_only_that_post() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "2020-04-25-code.md",
            "---\ntitle: Has Code\n---\n\n```cpp\nint main() {}\n```\n",
        );
        write(
            dir.path(),
            "2020-03-22-prose.md",
            "---\ntitle: Just Prose\n---\n\nNo code here.\n",
        );

        // Highlighting on, but no theme to highlight with
        let out = dir.path().join("_site");
        let site = Site::with_config(SiteConfig::default(), dir.path(), &out).unwrap();
        let renderer = MarkdownRenderer::with_themes(&site.config.highlight, ThemeSet::new());
        let loaded = ContentLoader::with_renderer(&site, renderer).load_posts().unwrap();

        assert_eq!(loaded.failures.len(), 1);
        assert_eq!(loaded.failures[0].source, "2020-04-25-code.md");
        assert!(matches!(loaded.failures[0].error, PostError::Render(_)));
        assert_eq!(loaded.posts.len(), 1);
        assert_eq!(loaded.posts[0].slug, "prose");

        let generated = Generator::new(&site).unwrap().generate(&loaded.posts).unwrap();
        assert_eq!(generated.rendered.len(), 1);
        let index = fs::read_to_string(out.join("index.html")).unwrap();
        assert!(index.contains("2020-03-22-prose.html"));
        assert!(!index.contains("code.html"));
        assert!(!out.join("2020-04-25-code.html").exists());
    }
}
