//! Site configuration.
//!
//! A site is configured by an `ssg.yaml` file in its root directory. `url` is
//! the published base URL; every other top-level key is handed to the site as
//! free-form data for plugins and templates to read.

mod load;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use load::CONFIG_FILE;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to encode config file path as a unicode string: {0}")]
    EncodePath(PathBuf),

    #[error("failed to deserialize config: {0}")]
    Deserialize(#[from] config::ConfigError),
}

/// The contents of `ssg.yaml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Base URL of the published site
    #[serde(default)]
    pub url: String,
    /// Every other key (`plugins`, `markdown`, `math`, ...)
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

impl SiteConfig {
    /// Entries to merge into the site's configuration mapping.
    pub fn into_data(self) -> impl Iterator<Item = (String, Value)> {
        self.data.into_iter()
    }
}

/// Configuration written by `ssg init`.
pub const DEFAULT_CONFIG: &str = r#"url: "https://example.com"

plugins:
  preload:
    - markdown
  postbuild:
    - pretty-links

markdown:
  highlight: true
  extensions:
    - footnotes
    - heading_attributes
    - strikethrough
    - tables
    - tasklists

# Enable the math plugin under `postbuild` to render formulas:
# math:
#   inline: math-inline
#   display: math-display
"#;
