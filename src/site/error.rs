//! Build error types.

use std::path::{Path, PathBuf};

use super::hooks::{PluginError, Stage};
use super::parser::ParseError;
use super::template::TemplateError;

/// Errors that abort a build.
///
/// The pipeline never retries and never reports partial success: the first
/// error encountered is returned unchanged to the caller of [`Site::make`].
///
/// [`Site::make`]: super::Site::make
#[derive(thiserror::Error, Debug)]
pub enum BuildError {
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to load templates from {root}: {source}")]
    TemplateLoad { root: PathBuf, source: tera::Error },

    #[error("No template found for: {0}")]
    MissingTemplate(String),

    #[error("failed to parse {path}: {source}")]
    Parse { path: String, source: ParseError },

    #[error("failed to render {path}: {source}")]
    Render { path: String, source: TemplateError },

    #[error("plugin '{plugin}' failed during {stage}: {source}")]
    Plugin {
        stage: Stage,
        plugin: String,
        source: PluginError,
    },

    #[error("unknown plugin '{plugin}' in {stage} stage")]
    UnknownPlugin { stage: Stage, plugin: String },

    #[error("invalid plugin configuration: {0}")]
    PluginConfig(String),
}

impl BuildError {
    /// Create a filesystem error for a path.
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
