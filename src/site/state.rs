//! The mutable site state threaded through a build.

use std::collections::HashMap;
use std::path::PathBuf;

use indexmap::IndexMap;
use serde_json::Value;

use super::content::{ContentMap, load_content};
use super::error::BuildError;
use super::hooks::{Plugin, PluginError, PluginRegistry, Stage};
use super::parser::{Page, ParserRegistry};
use super::paths::qualified_url;
use super::template::{TemplateCatalog, load_templates};

/// Free-form site configuration, readable by plugins and templates.
pub type SiteData = HashMap<String, Value>;

/// Pages keyed identically to the content records they were parsed from.
pub type PageMap = IndexMap<String, Page>;

/// Final output text keyed by output path.
pub type OutputMap = IndexMap<String, String>;

/// The single aggregate a build reads and writes.
///
/// A build owns its `Site` exclusively; plugins receive `&mut Site` for the
/// duration of their own call and may change any field.
pub struct Site {
    /// Base URL of the published site
    pub url: String,
    /// Site root directory (holds `content/` and `templates/`)
    pub path: PathBuf,
    /// Configuration mapping; the `plugins` key selects stage plugins
    pub data: SiteData,
    /// Content parsers by extension
    pub parsers: ParserRegistry,
    /// Plugins the stage lists may name
    pub plugins: PluginRegistry,
    /// Templates by key
    pub templates: TemplateCatalog,
    /// Loaded content records
    pub content: ContentMap,
    /// Parsed pages
    pub pages: PageMap,
    /// Rendered output
    pub output: OutputMap,
}

impl Site {
    /// Create a site rooted at `path` with the default `.html` parser and the
    /// built-in plugins available.
    pub fn new(url: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            path: path.into(),
            data: SiteData::new(),
            parsers: ParserRegistry::with_defaults(),
            plugins: PluginRegistry::with_builtins(),
            templates: TemplateCatalog::new(),
            content: ContentMap::new(),
            pages: PageMap::new(),
            output: OutputMap::new(),
        }
    }

    /// Directory holding content files.
    pub fn content_dir(&self) -> PathBuf {
        self.path.join("content")
    }

    /// Directory holding template modules.
    pub fn template_dir(&self) -> PathBuf {
        self.path.join("templates")
    }

    /// Merge configuration values; existing keys are overwritten.
    pub fn configure<I>(&mut self, data: I) -> &mut Self
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        self.data.extend(data);
        self
    }

    /// Apply a plugin right away, outside of any stage.
    pub fn apply<P: Plugin + ?Sized>(&mut self, plugin: &P) -> Result<&mut Self, PluginError> {
        plugin.apply(self)?;
        Ok(self)
    }

    /// Absolute URL for a resource given as a path from the site root.
    ///
    /// `url_for("/blog/post/")` with url `https://example.com/` yields
    /// `https://example.com/blog/post/`.
    pub fn url_for(&self, resource: &str) -> String {
        qualified_url(&self.url, resource)
    }

    /// Load content files and template modules.
    ///
    /// Only content files with a parser registered at this moment are read.
    /// Loaded records and templates are merged into the existing maps.
    pub async fn load(&mut self) -> Result<(), BuildError> {
        let content = load_content(&self.content_dir(), &self.parsers).await?;
        let templates = load_templates(&self.template_dir(), &self.url).await?;

        tracing::info!(
            content = content.len(),
            templates = templates.len(),
            "loaded site files"
        );
        tracing::debug!(extensions = ?self.parsers.extensions(), "content filtered by parser");
        if templates.is_empty() && self.templates.is_empty() {
            tracing::warn!(dir = %self.template_dir().display(), "no templates found");
        }
        self.content.extend(content);
        self.templates.extend(templates);
        Ok(())
    }

    /// Run the whole pipeline.
    ///
    /// preload → load → preparse → parse → prebuild → build → postbuild.
    /// The first error aborts the build; whatever reached `output` before it
    /// is left in place but should not be relied on.
    pub async fn make(&mut self) -> Result<(), BuildError> {
        self.run_stage(Stage::Preload)?;
        self.load().await?;
        self.run_stage(Stage::Preparse)?;
        self.parse()?;
        self.run_stage(Stage::Prebuild)?;
        self.build()?;
        self.run_stage(Stage::Postbuild)?;

        tracing::info!(outputs = self.output.len(), "build finished");
        Ok(())
    }
}
