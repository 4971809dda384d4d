//! Content loading.
//!
//! Walks the content root and reads every file that has a registered parser.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use indexmap::IndexMap;
use serde_json::Value;

use super::error::BuildError;
use super::parser::{Metadata, ParserRegistry};
use super::paths::{extension, relative_key};
use super::walk::walk_files;

/// Content records keyed by path relative to the content root.
pub type ContentMap = IndexMap<String, ContentFile>;

/// Basic filesystem metadata captured alongside the file text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileMeta {
    /// File size in bytes
    pub size: u64,
    /// Last modification time, if the platform reports one
    pub modified: Option<SystemTime>,
}

impl FileMeta {
    fn from_metadata(metadata: &std::fs::Metadata) -> Self {
        Self {
            size: metadata.len(),
            modified: metadata.modified().ok(),
        }
    }

    /// Convert to page metadata: `size` in bytes and `modified` in seconds
    /// since the Unix epoch.
    pub fn to_data(&self) -> Metadata {
        let mut data = Metadata::new();
        data.insert("size".to_string(), Value::from(self.size));
        if let Some(secs) = self
            .modified
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs())
        {
            data.insert("modified".to_string(), Value::from(secs));
        }
        data
    }
}

/// A content file as read from disk.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentFile {
    /// Raw file text
    pub text: String,
    /// Filesystem metadata
    pub meta: FileMeta,
}

/// Load every content file under `root` that has a parser in `parsers`.
///
/// Files without a matching parser are skipped without error. Any failure to
/// read a directory or a selected file aborts the whole load.
pub async fn load_content(root: &Path, parsers: &ParserRegistry) -> Result<ContentMap, BuildError> {
    let mut content = ContentMap::new();

    for path in walk_files(root).await? {
        let Some(key) = relative_key(root, &path) else {
            continue;
        };

        if !parsers.has(extension(&key)) {
            tracing::trace!(path = %key, "skipping content without a parser");
            continue;
        }

        let metadata = tokio::fs::metadata(&path)
            .await
            .map_err(|e| BuildError::io(&path, e))?;
        let text = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| BuildError::io(&path, e))?;

        tracing::debug!(path = %key, size = metadata.len(), "loaded content");
        content.insert(
            key,
            ContentFile {
                text,
                meta: FileMeta::from_metadata(&metadata),
            },
        );
    }

    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::site::parser::HtmlParser;

    fn write(root: &Path, relative: &str, text: &str) {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, text).unwrap();
    }

    #[tokio::test]
    async fn test_load_content_filters_by_parser() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "index.html", "<p>home</p>");
        write(dir.path(), "blog/post.md", "# Post");
        write(dir.path(), "blog/nested/page.html", "<p>nested</p>");
        write(dir.path(), "image.png", "not really a png");
        write(dir.path(), "README", "no extension");

        let content = load_content(dir.path(), &ParserRegistry::with_defaults())
            .await
            .unwrap();

        let keys: Vec<&str> = content.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["/index.html", "/blog/nested/page.html"]);
        assert_eq!(content["/index.html"].text, "<p>home</p>");
        assert_eq!(content["/index.html"].meta.size, 11);
    }

    #[tokio::test]
    async fn test_load_content_with_extra_parser() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "blog/post.md", "# Post");
        write(dir.path(), "notes.txt", "plain");

        let mut parsers = ParserRegistry::new();
        parsers.register(".md", HtmlParser).unwrap();

        let content = load_content(dir.path(), &parsers).await.unwrap();

        assert_eq!(content.len(), 1);
        assert!(content.contains_key("/blog/post.md"));
    }

    #[tokio::test]
    async fn test_load_content_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_content(&dir.path().join("content"), &ParserRegistry::with_defaults()).await;

        assert!(matches!(result, Err(BuildError::Io { .. })));
    }

    #[test]
    fn test_file_meta_to_data() {
        let meta = FileMeta {
            size: 42,
            modified: Some(UNIX_EPOCH + std::time::Duration::from_secs(1_700_000_000)),
        };
        let data = meta.to_data();

        assert_eq!(data.get("size"), Some(&Value::from(42)));
        assert_eq!(data.get("modified"), Some(&Value::from(1_700_000_000u64)));

        let data = FileMeta { size: 1, modified: None }.to_data();
        assert!(!data.contains_key("modified"));
    }
}
