//! Template catalog and resolution.
//!
//! Templates are indexed by their path relative to the template root, with
//! their own extension kept in the key (`/blog/post.tera`). Template files are
//! Tera sources; native templates are any Rust value implementing
//! [`Template`], including plain closures.
//!
//! Tera templates see `site` (`url`, `data`), `page` (the page metadata) and
//! `content`, and can call `url_for(path="/blog/")` for absolute links.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use tera::{Context, Tera};

use super::error::BuildError;
use super::parser::Page;
use super::paths::{
    TEMPLATE_EXT, exact_template_key, extension, fallback_template_key, qualified_url, relative_key,
};
use super::state::Site;
use super::walk::walk_files;

#[derive(thiserror::Error, Debug)]
pub enum TemplateError {
    #[error("template error: {0}")]
    Tera(#[from] tera::Error),

    #[error("{0}")]
    Render(String),
}

/// Renders a page to its final output text.
pub trait Template: Send + Sync {
    fn render(&self, site: &Site, page: &Page) -> Result<String, TemplateError>;
}

impl<F> Template for F
where
    F: Fn(&Site, &Page) -> Result<String, TemplateError> + Send + Sync,
{
    fn render(&self, site: &Site, page: &Page) -> Result<String, TemplateError> {
        self(site, page)
    }
}

/// Site-level information exposed to Tera templates as `site.*`.
#[derive(Debug, Serialize)]
struct SiteContext<'a> {
    url: &'a str,
    data: &'a HashMap<String, Value>,
}

/// A template loaded from a `.tera` file.
///
/// All file templates of one catalog load share a single Tera instance, so
/// they can extend and include each other by key.
struct TeraTemplate {
    tera: Arc<Tera>,
    name: String,
}

impl Template for TeraTemplate {
    fn render(&self, site: &Site, page: &Page) -> Result<String, TemplateError> {
        let mut context = Context::new();
        context.insert(
            "site",
            &SiteContext {
                url: &site.url,
                data: &site.data,
            },
        );
        context.insert("page", &page.data);
        context.insert("content", &page.content);

        Ok(self.tera.render(&self.name, &context)?)
    }
}

/// Templates keyed by path relative to the template root.
#[derive(Clone, Default)]
pub struct TemplateCatalog {
    templates: IndexMap<String, Arc<dyn Template>>,
}

impl TemplateCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a template under a key such as `/blog/_default.tera`.
    pub fn insert<T: Template + 'static>(&mut self, key: impl Into<String>, template: T) {
        self.templates.insert(key.into(), Arc::new(template));
    }

    pub fn get(&self, key: &str) -> Option<Arc<dyn Template>> {
        self.templates.get(key).cloned()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Merge another catalog into this one; its keys win on conflict.
    pub fn extend(&mut self, other: TemplateCatalog) {
        self.templates.extend(other.templates);
    }

    /// Find the template for a page key.
    ///
    /// Looks for a template with the page's own name first, then for the
    /// `_default` template in the page's directory. Parent directories are
    /// never searched. Returns the key of the template used alongside it.
    pub fn resolve(&self, page_key: &str) -> Result<(String, Arc<dyn Template>), BuildError> {
        let exact = exact_template_key(page_key);
        if let Some(template) = self.get(&exact) {
            return Ok((exact, template));
        }

        let fallback = fallback_template_key(page_key);
        if let Some(template) = self.get(&fallback) {
            return Ok((fallback, template));
        }

        Err(BuildError::MissingTemplate(page_key.to_string()))
    }
}

impl fmt::Debug for TemplateCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.keys()).finish()
    }
}

/// Tera function `url_for(path=...)`, resolving a path from the site root
/// against the base URL.
fn url_for_function(base_url: String) -> impl tera::Function {
    move |args: &HashMap<String, Value>| -> tera::Result<Value> {
        let path = args
            .get("path")
            .and_then(Value::as_str)
            .ok_or_else(|| tera::Error::msg("url_for requires a string `path` argument"))?;
        Ok(Value::from(qualified_url(&base_url, path)))
    }
}

/// Load every `.tera` file under `root` into a new catalog.
///
/// The files are compiled together; a syntax error in any of them (or an
/// `extends` pointing at a missing template) fails the whole load. Their
/// `url_for` function resolves against `base_url`.
pub async fn load_templates(root: &Path, base_url: &str) -> Result<TemplateCatalog, BuildError> {
    let mut sources = Vec::new();
    for path in walk_files(root).await? {
        let Some(key) = relative_key(root, &path) else {
            continue;
        };
        if extension(&key) != TEMPLATE_EXT {
            continue;
        }

        let source = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| BuildError::io(&path, e))?;
        tracing::debug!(template = %key, "loaded template");
        sources.push((key, source));
    }

    let mut tera = Tera::default();
    tera.register_function("url_for", url_for_function(base_url.to_string()));
    tera.add_raw_templates(sources.iter().map(|(key, source)| (key.as_str(), source.as_str())))
        .map_err(|e| BuildError::TemplateLoad {
            root: root.to_path_buf(),
            source: e,
        })?;
    let tera = Arc::new(tera);

    let mut catalog = TemplateCatalog::new();
    for (key, _) in sources {
        let template = TeraTemplate {
            tera: Arc::clone(&tera),
            name: key.clone(),
        };
        catalog.insert(key, template);
    }

    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed(text: &'static str) -> impl Template {
        move |_: &Site, _: &Page| -> Result<String, TemplateError> { Ok(text.to_string()) }
    }

    fn write(root: &Path, relative: &str, text: &str) {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, text).unwrap();
    }

    fn render(catalog: &TemplateCatalog, key: &str) -> String {
        let site = Site::new("https://example.com", "/site");
        let (_, template) = catalog.resolve(key).unwrap();
        template.render(&site, &Page::default()).unwrap()
    }

    #[test]
    fn test_resolve_exact_template() {
        let mut catalog = TemplateCatalog::new();
        catalog.insert("/a/b.tera", fixed("exact"));
        catalog.insert("/a/_default.tera", fixed("fallback"));

        let (key, _) = catalog.resolve("/a/b.md").unwrap();
        assert_eq!(key, "/a/b.tera");
        assert_eq!(render(&catalog, "/a/b.md"), "exact");
    }

    #[test]
    fn test_resolve_directory_fallback() {
        let mut catalog = TemplateCatalog::new();
        catalog.insert("/a/_default.tera", fixed("fallback"));

        let (key, _) = catalog.resolve("/a/b.md").unwrap();
        assert_eq!(key, "/a/_default.tera");
        assert_eq!(render(&catalog, "/a/c.html"), "fallback");
    }

    #[test]
    fn test_resolve_does_not_search_parent_directories() {
        let mut catalog = TemplateCatalog::new();
        catalog.insert("/_default.tera", fixed("root"));

        let result = catalog.resolve("/a/b.md");
        assert!(matches!(result, Err(BuildError::MissingTemplate(key)) if key == "/a/b.md"));
        assert!(catalog.resolve("/top.md").is_ok());
    }

    #[test]
    fn test_missing_template_message() {
        let catalog = TemplateCatalog::new();
        let err = catalog.resolve("/a/b.md").err().unwrap();
        assert_eq!(err.to_string(), "No template found for: /a/b.md");
    }

    #[tokio::test]
    async fn test_load_templates_keeps_extension_in_key() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "_default.tera", "<h1>{{ page.title }}</h1>{{ content }}");
        write(dir.path(), "blog/post.tera", "post");
        write(dir.path(), "notes.txt", "not a template");

        let catalog = load_templates(dir.path(), "").await.unwrap();

        let mut keys: Vec<&str> = catalog.keys().collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["/_default.tera", "/blog/post.tera"]);
    }

    #[tokio::test]
    async fn test_load_templates_renders_site_and_page() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "_default.tera",
            "{{ site.url }}|{{ site.data.title }}|{{ page.title }}|{{ content }}",
        );

        let catalog = load_templates(dir.path(), "").await.unwrap();
        let mut site = Site::new("https://example.com", dir.path());
        site.data.insert("title".to_string(), Value::from("My Site"));
        let mut page = Page::new("<p>body</p>", Default::default());
        page.data.insert("title".to_string(), Value::from("Hi"));

        let (_, template) = catalog.resolve("/post.md").unwrap();
        let html = template.render(&site, &page).unwrap();

        assert_eq!(html, "https://example.com|My Site|Hi|<p>body</p>");
    }

    #[tokio::test]
    async fn test_load_templates_url_for() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "_default.tera",
            "<a href=\"{{ url_for(path='/blog/') }}\">blog</a>",
        );
        write(dir.path(), "broken.tera", "{{ url_for() }}");

        let catalog = load_templates(dir.path(), "https://example.com/").await.unwrap();
        let site = Site::new("https://example.com/", dir.path());

        let (_, template) = catalog.resolve("/post.md").unwrap();
        let html = template.render(&site, &Page::default()).unwrap();
        assert_eq!(html, "<a href=\"https://example.com/blog/\">blog</a>");

        let (_, broken) = catalog.resolve("/broken.md").unwrap();
        assert!(broken.render(&site, &Page::default()).is_err());
    }

    #[tokio::test]
    async fn test_load_templates_supports_inheritance() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "base.tera",
            "<main>{% block body %}{% endblock body %}</main>",
        );
        write(
            dir.path(),
            "_default.tera",
            "{% extends \"/base.tera\" %}{% block body %}{{ content }}{% endblock body %}",
        );

        let catalog = load_templates(dir.path(), "").await.unwrap();
        let site = Site::new("", dir.path());
        let (_, template) = catalog.resolve("/x.md").unwrap();

        let html = template.render(&site, &Page::new("hi", Default::default())).unwrap();
        assert_eq!(html, "<main>hi</main>");
    }

    #[tokio::test]
    async fn test_load_templates_fails_on_syntax_error() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "good.tera", "fine");
        write(dir.path(), "bad.tera", "{% if %}");

        let result = load_templates(dir.path(), "").await;
        assert!(matches!(result, Err(BuildError::TemplateLoad { .. })));
    }

    #[tokio::test]
    async fn test_load_templates_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_templates(&dir.path().join("templates"), "").await;
        assert!(matches!(result, Err(BuildError::Io { .. })));
    }
}
