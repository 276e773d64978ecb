//! Built-in page templates using the Tera template engine
//!
//! The layout is embedded in the binary; there is no theme directory.

use serde::Serialize;
use tera::{Context, Tera};

/// Template renderer with the embedded layout
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer with all templates loaded
    pub fn new() -> tera::Result<Self> {
        Self::from_templates(vec![
            ("base.html", include_str!("layout/base.html")),
            ("index.html", include_str!("layout/index.html")),
            ("post.html", include_str!("layout/post.html")),
            ("category.html", include_str!("layout/category.html")),
        ])
    }

    /// Create a renderer from `(name, source)` pairs
    pub fn from_templates(templates: Vec<(&str, &str)>) -> tera::Result<Self> {
        let mut tera = Tera::default();

        // Titles and names are escaped; rendered markdown goes through `| safe`
        tera.autoescape_on(vec![".html"]);
        tera.add_raw_templates(templates)?;

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> tera::Result<String> {
        self.tera.render(template_name, context)
    }
}

/// Data structures for template context

#[derive(Debug, Clone, Serialize)]
pub struct SiteData {
    pub title: String,
    pub description: String,
    pub author: String,
}

/// A post as listed on the index and category pages
#[derive(Debug, Clone, Serialize)]
pub struct PostEntry {
    pub title: String,
    pub date: String,
    pub date_iso: String,
    /// File name relative to the site root
    pub link: String,
    pub excerpt: Option<String>,
}

/// A full post page
#[derive(Debug, Clone, Serialize)]
pub struct PostPageData {
    pub title: String,
    pub date: String,
    pub date_iso: String,
    pub content: String,
    pub categories: Vec<CategoryLink>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryLink {
    pub name: String,
    /// Set only when category pages are generated
    pub link: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site() -> SiteData {
        SiteData {
            title: "Notes".into(),
            description: String::new(),
            author: String::new(),
        }
    }

    #[test]
    fn test_index_lists_entries() {
        let renderer = TemplateRenderer::new().unwrap();
        let mut context = Context::new();
        context.insert("site", &site());
        context.insert("root", "");
        context.insert("feed", &false);
        context.insert(
            "posts",
            &vec![PostEntry {
                title: "Fish <and> Chips".into(),
                date: "Mar 22, 2020".into(),
                date_iso: "2020-03-22T00:00:00+00:00".into(),
                link: "2020-03-22-fish-and-chips.html".into(),
                excerpt: None,
            }],
        );

        let html = renderer.render("index.html", &context).unwrap();
        assert!(html.contains(r#"<a href="2020-03-22-fish-and-chips.html">Fish &lt;and&gt; Chips</a>"#));
        assert!(!html.contains("No posts yet."));
    }

    #[test]
    fn test_empty_index() {
        let renderer = TemplateRenderer::new().unwrap();
        let mut context = Context::new();
        context.insert("site", &site());
        context.insert("root", "");
        context.insert("feed", &false);
        context.insert("posts", &Vec::<PostEntry>::new());

        let html = renderer.render("index.html", &context).unwrap();
        assert!(html.contains("No posts yet."));
        assert!(!html.contains("<li>"));
    }

    #[test]
    fn test_post_keeps_rendered_html() {
        let renderer = TemplateRenderer::new().unwrap();
        let mut context = Context::new();
        context.insert("site", &site());
        context.insert("root", "");
        context.insert("feed", &true);
        context.insert(
            "post",
            &PostPageData {
                title: "Hello".into(),
                date: "Jan 1, 2020".into(),
                date_iso: "2020-01-01T00:00:00+00:00".into(),
                content: "<p>Body <em>text</em></p>".into(),
                categories: vec![CategoryLink {
                    name: "c++".into(),
                    link: Some("categories/cpp.html".into()),
                }],
                tags: vec![],
            },
        );

        let html = renderer.render("post.html", &context).unwrap();
        assert!(html.contains("<p>Body <em>text</em></p>"));
        assert!(html.contains(r#"href="categories/cpp.html">c++</a>"#));
        assert!(html.contains(r#"href="atom.xml""#));
        assert!(html.contains("<title>Hello | Notes</title>"));
    }
}
