//! Key and path conversion utilities.
//!
//! Every map in the site state is keyed by a "site key": a path relative to
//! some root, always starting with `/` and always using `/` as separator,
//! regardless of platform. This module converts between:
//! - Filesystem paths under a root and site keys
//! - Page keys and the template keys used to render them
//! - Page keys and output keys

use std::path::{Path, PathBuf};

/// Extension marking a file in the template root as a template module.
pub const TEMPLATE_EXT: &str = ".tera";

/// File stem of the per-directory fallback template.
pub const DEFAULT_TEMPLATE: &str = "_default";

/// Extension of rendered output documents.
pub const OUTPUT_EXT: &str = ".html";

/// Reserved index filename used for directory-style URLs.
pub const INDEX_FILE: &str = "index.html";

/// Split a key into `(base, extension)`, the extension keeping its leading dot.
///
/// A dot that starts the final path segment (e.g. `/.hidden`) does not begin an
/// extension.
///
/// # Examples
/// ```ignore
/// split_extension("/a/b.md") => ("/a/b", ".md")
/// split_extension("/a/b") => ("/a/b", "")
/// split_extension("/a.d/b") => ("/a.d/b", "")
/// split_extension("/.hidden") => ("/.hidden", "")
/// ```
pub fn split_extension(key: &str) -> (&str, &str) {
    let name_start = key.rfind('/').map_or(0, |i| i + 1);
    match key[name_start..].rfind('.') {
        None | Some(0) => (key, ""),
        Some(dot) => key.split_at(name_start + dot),
    }
}

/// The extension of a key, including the leading dot (empty if none).
pub fn extension(key: &str) -> &str {
    split_extension(key).1
}

/// The parent directory of a key, without a trailing slash.
///
/// The root directory is the empty string, so `format!("{dir}/x")` always
/// yields a valid key.
pub fn dirname(key: &str) -> &str {
    key.rfind('/').map_or("", |i| &key[..i])
}

/// Convert a path under `root` to a site key.
///
/// Returns `None` if `path` is not below `root`.
///
/// # Examples
/// ```ignore
/// relative_key("/site/content", "/site/content/blog/post.md") => Some("/blog/post.md")
/// ```
pub fn relative_key(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let mut key = String::new();
    for component in relative.components() {
        key.push('/');
        key.push_str(&component.as_os_str().to_string_lossy());
    }
    Some(key)
}

/// Template key for a page rendered with a template of the same name.
///
/// `/blog/post.md` -> `/blog/post.tera`
pub fn exact_template_key(page_key: &str) -> String {
    let (base, _) = split_extension(page_key);
    format!("{base}{TEMPLATE_EXT}")
}

/// Template key of the fallback template in the page's own directory.
///
/// `/blog/post.md` -> `/blog/_default.tera`
pub fn fallback_template_key(page_key: &str) -> String {
    format!("{}/{DEFAULT_TEMPLATE}{TEMPLATE_EXT}", dirname(page_key))
}

/// Output key for a page: its key with the extension replaced.
///
/// `/blog/post.md` -> `/blog/post.html`
pub fn output_key(page_key: &str) -> String {
    let (base, _) = split_extension(page_key);
    format!("{base}{OUTPUT_EXT}")
}

/// Convert an output key to a file path in the output directory.
///
/// `/blog/post/index.html` -> `output_dir/blog/post/index.html`
pub fn key_to_output_path(key: &str, output_dir: &Path) -> PathBuf {
    key.split('/')
        .filter(|segment| !segment.is_empty())
        .fold(output_dir.to_path_buf(), |path, segment| path.join(segment))
}

/// Join a base URL and a path from the site root with exactly one `/`.
///
/// `qualified_url("https://example.com/", "/blog/")` -> `https://example.com/blog/`
pub fn qualified_url(base: &str, resource: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        resource.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_extension() {
        assert_eq!(split_extension("/a/b.md"), ("/a/b", ".md"));
        assert_eq!(split_extension("/a/b.tar.gz"), ("/a/b.tar", ".gz"));
        assert_eq!(split_extension("/a/b"), ("/a/b", ""));
        assert_eq!(split_extension("/a.d/b"), ("/a.d/b", ""));
        assert_eq!(split_extension("/.hidden"), ("/.hidden", ""));
    }

    #[test]
    fn test_dirname() {
        assert_eq!(dirname("/a/b.md"), "/a");
        assert_eq!(dirname("/post.md"), "");
        assert_eq!(dirname("/a/b/c.md"), "/a/b");
    }

    #[test]
    fn test_relative_key_nested() {
        assert_eq!(
            relative_key(Path::new("/site/content"), Path::new("/site/content/blog/post.md")),
            Some("/blog/post.md".to_string())
        );
    }

    #[test]
    fn test_relative_key_outside_root() {
        assert_eq!(
            relative_key(Path::new("/site/content"), Path::new("/elsewhere/post.md")),
            None
        );
    }

    #[test]
    fn test_template_keys() {
        assert_eq!(exact_template_key("/a/b.md"), "/a/b.tera");
        assert_eq!(fallback_template_key("/a/b.md"), "/a/_default.tera");
        assert_eq!(fallback_template_key("/post.md"), "/_default.tera");
    }

    #[test]
    fn test_output_key() {
        assert_eq!(output_key("/a/b.md"), "/a/b.html");
        assert_eq!(output_key("/index.html"), "/index.html");
    }

    #[test]
    fn test_key_to_output_path() {
        let output = Path::new("/site/output");
        assert_eq!(
            key_to_output_path("/blog/post/index.html", output),
            PathBuf::from("/site/output/blog/post/index.html")
        );
        assert_eq!(
            key_to_output_path("/index.html", output),
            PathBuf::from("/site/output/index.html")
        );
    }

    #[test]
    fn test_qualified_url() {
        assert_eq!(qualified_url("https://example.com/", "/blog/"), "https://example.com/blog/");
        assert_eq!(qualified_url("https://example.com", "style.css"), "https://example.com/style.css");
        assert_eq!(qualified_url("", "/a.html"), "/a.html");
    }
}
