//! Pluggable content parsers.
//!
//! The parser registry maps a file extension (with its leading dot) to the
//! parser that turns a content file into a [`Page`]. It also decides which
//! content files the loader reads at all: files whose extension has no parser
//! are never loaded.
//!
//! # Adding a Parser
//!
//! ```ignore
//! struct TxtParser;
//!
//! impl Parser for TxtParser {
//!     fn parse(&self, file: &ContentFile) -> Result<Page, ParseError> {
//!         Ok(Page::new(format!("<pre>{}</pre>", file.text), file.meta.to_data()))
//!     }
//! }
//!
//! site.parsers.register(".txt", TxtParser)?;
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use super::content::ContentFile;

/// String-keyed page metadata (front matter merged over file metadata).
pub type Metadata = serde_json::Map<String, Value>;

/// The parsed form of a content file.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Page {
    /// Page body, usually an HTML fragment.
    pub content: String,
    /// Page metadata available to templates as `page.*`.
    pub data: Metadata,
}

impl Page {
    pub fn new(content: impl Into<String>, data: Metadata) -> Self {
        Self {
            content: content.into(),
            data,
        }
    }
}

/// Error produced by a parser for a single content file.
#[derive(thiserror::Error, Debug)]
pub enum ParseError {
    #[allow(dead_code)]
    #[error("invalid content: {0}")]
    Invalid(String),
}

/// Error registering a parser.
#[derive(thiserror::Error, Debug)]
pub enum ParserError {
    #[error("parser extension must start with '.': {0:?}")]
    InvalidExtension(String),
}

/// Turns a loaded content file into a page.
pub trait Parser: Send + Sync {
    fn parse(&self, file: &ContentFile) -> Result<Page, ParseError>;
}

impl<F> Parser for F
where
    F: Fn(&ContentFile) -> Result<Page, ParseError> + Send + Sync,
{
    fn parse(&self, file: &ContentFile) -> Result<Page, ParseError> {
        self(file)
    }
}

/// Pass-through parser: the raw text is the page content.
pub struct HtmlParser;

impl Parser for HtmlParser {
    fn parse(&self, file: &ContentFile) -> Result<Page, ParseError> {
        Ok(Page::new(file.text.clone(), file.meta.to_data()))
    }
}

/// Registry of content parsers keyed by extension.
#[derive(Clone, Default)]
pub struct ParserRegistry {
    parsers: HashMap<String, Arc<dyn Parser>>,
}

impl ParserRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the default `.html` pass-through parser.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.parsers.insert(".html".to_string(), Arc::new(HtmlParser));
        registry
    }

    /// Register a parser for an extension such as `.md`.
    ///
    /// Replaces any parser already registered for that extension. Content
    /// loaded before the call is not re-filtered.
    pub fn register<P: Parser + 'static>(
        &mut self,
        ext: impl Into<String>,
        parser: P,
    ) -> Result<(), ParserError> {
        let ext = ext.into();
        if !ext.starts_with('.') {
            return Err(ParserError::InvalidExtension(ext));
        }
        self.parsers.insert(ext, Arc::new(parser));
        Ok(())
    }

    /// Check if a parser is registered for an extension.
    pub fn has(&self, ext: &str) -> bool {
        self.parsers.contains_key(ext)
    }

    /// Find the parser for an extension.
    pub fn resolve(&self, ext: &str) -> Option<Arc<dyn Parser>> {
        self.parsers.get(ext).cloned()
    }

    /// Get all registered extensions, sorted.
    pub fn extensions(&self) -> Vec<&str> {
        let mut exts: Vec<&str> = self.parsers.keys().map(String::as_str).collect();
        exts.sort_unstable();
        exts
    }
}
