pub mod build;
pub mod init;
pub mod serve;

use std::path::{Path, PathBuf};

use crate::config::CONFIG_FILE;

/// Directory the built site is written to, relative to the site root.
pub const OUTPUT_DIR: &str = "output";

/// Directory copied verbatim over the output, relative to the site root.
pub const STATIC_DIR: &str = "static";

/// Absolute path of the config file named on the command line, defaulting to
/// `ssg.yaml` in the current directory.
pub fn config_path_from_arg(config_file: Option<&Path>) -> Result<PathBuf, anyhow::Error> {
    let config_path = config_file.unwrap_or(Path::new(CONFIG_FILE));
    Ok(if config_path.is_relative() {
        std::env::current_dir()?.join(config_path)
    } else {
        config_path.to_path_buf()
    })
}

/// Get the site root from a config file path (its parent directory).
pub fn base_path_from_config(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}
