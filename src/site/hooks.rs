//! Plugin stages.
//!
//! Plugins run at four fixed points of a build. Which plugins run is read
//! from the site configuration under the reserved `plugins` key:
//!
//! ```yaml
//! plugins:
//!   preload: [markdown]
//!   postbuild: [math, pretty-links]
//! ```
//!
//! Each name is looked up in the site's [`PluginRegistry`]. Within a stage,
//! plugins run in the order they are listed.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use super::error::BuildError;
use super::parser::ParserError;
use super::state::Site;
use crate::plugins::{MarkdownPlugin, MathPlugin, PrettyLinksPlugin};

/// Configuration key holding the per-stage plugin lists.
pub const PLUGINS_KEY: &str = "plugins";

/// A point in the build at which plugins run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Before content and templates are loaded
    Preload,
    /// After loading, before content is parsed
    Preparse,
    /// After parsing, before pages are rendered
    Prebuild,
    /// After all pages are rendered into the output map
    Postbuild,
}

impl Stage {
    /// The stage's name in the `plugins` configuration.
    pub fn name(self) -> &'static str {
        match self {
            Stage::Preload => "preload",
            Stage::Preparse => "preparse",
            Stage::Prebuild => "prebuild",
            Stage::Postbuild => "postbuild",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors raised by a plugin.
#[derive(thiserror::Error, Debug)]
pub enum PluginError {
    #[error("invalid value for '{key}': {message}")]
    Config { key: String, message: String },

    #[error(transparent)]
    Parser(#[from] ParserError),

    #[error("markup error in {path}: {message}")]
    Markup { path: String, message: String },
}

impl PluginError {
    /// Create a configuration error for a key.
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Config {
            key: key.into(),
            message: message.into(),
        }
    }
}

/// A site transformation run at a pipeline stage.
///
/// Plugins get exclusive access to the site for the duration of `apply` and
/// may register parsers, edit the content, page and output maps, and read or
/// write configuration.
pub trait Plugin: Send + Sync {
    /// Name used to select this plugin in the stage configuration.
    fn name(&self) -> &'static str;

    /// Transform the site in place.
    fn apply(&self, site: &mut Site) -> Result<(), PluginError>;
}

/// Plugins available to the stage configuration, by name.
#[derive(Clone, Default)]
pub struct PluginRegistry {
    plugins: HashMap<&'static str, Arc<dyn Plugin>>,
}

impl PluginRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the built-in plugins:
    /// `markdown`, `pretty-links` and `math`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(MarkdownPlugin);
        registry.register(PrettyLinksPlugin);
        registry.register(MathPlugin::default());
        registry
    }

    /// Register a plugin under its name, replacing any previous one.
    pub fn register<P: Plugin + 'static>(&mut self, plugin: P) {
        self.plugins.insert(plugin.name(), Arc::new(plugin));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Plugin>> {
        self.plugins.get(name).cloned()
    }
}

impl Site {
    /// The plugins configured for a stage, in order.
    ///
    /// A missing `plugins` key or a missing stage entry means no plugins.
    pub fn stage_plugins(&self, stage: Stage) -> Result<Vec<Arc<dyn Plugin>>, BuildError> {
        let Some(stages) = self.data.get(PLUGINS_KEY) else {
            return Ok(Vec::new());
        };
        let stages = stages.as_object().ok_or_else(|| {
            BuildError::PluginConfig(format!("'{PLUGINS_KEY}' must be a mapping of stage names"))
        })?;

        let names = match stages.get(stage.name()) {
            None | Some(Value::Null) => return Ok(Vec::new()),
            Some(Value::Array(names)) => names,
            Some(_) => {
                return Err(BuildError::PluginConfig(format!(
                    "'{PLUGINS_KEY}.{stage}' must be a list of plugin names"
                )));
            }
        };

        names
            .iter()
            .map(|name| {
                let name = name.as_str().ok_or_else(|| {
                    BuildError::PluginConfig(format!(
                        "'{PLUGINS_KEY}.{stage}' entries must be plugin names, got {name}"
                    ))
                })?;
                self.plugins.get(name).ok_or_else(|| BuildError::UnknownPlugin {
                    stage,
                    plugin: name.to_string(),
                })
            })
            .collect()
    }

    /// Run every plugin configured for `stage`, in order.
    ///
    /// The stage list is read once, when the stage starts. A failing plugin
    /// stops the stage; later plugins do not run.
    pub fn run_stage(&mut self, stage: Stage) -> Result<(), BuildError> {
        let plugins = self.stage_plugins(stage)?;
        tracing::info!(%stage, plugins = plugins.len(), "running stage");

        for plugin in plugins {
            tracing::debug!(%stage, plugin = plugin.name(), "applying plugin");
            self.apply(&*plugin).map_err(|source| BuildError::Plugin {
                stage,
                plugin: plugin.name().to_string(),
                source,
            })?;
        }

        Ok(())
    }
}
