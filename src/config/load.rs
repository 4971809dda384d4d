//! Loading `ssg.yaml` through the `config` crate.

use std::path::Path;

use super::{ConfigError, SiteConfig};

/// Name of the config file in the site root.
pub const CONFIG_FILE: &str = "ssg.yaml";

/// Prefix of environment variables overriding config keys
/// (`SSG_URL`, `SSG_MATH__INLINE`, ...).
const ENV_PREFIX: &str = "SSG";

impl SiteConfig {
    /// Load the config from a file path. A missing file yields the defaults
    /// (plus any environment overrides).
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let path_str = path
            .as_os_str()
            .to_str()
            .ok_or_else(|| ConfigError::EncodePath(path.to_path_buf()))?;

        let config = config::Config::builder()
            .add_source(config::File::new(path_str, config::FileFormat::Yaml).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        Ok(config.try_deserialize::<SiteConfig>()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(
            &path,
            "url: https://example.org\nplugins:\n  postbuild: [pretty-links]\n",
        )
        .unwrap();

        let config = SiteConfig::load_from_file(&path).unwrap();

        assert_eq!(config.url, "https://example.org");
        assert_eq!(
            config.data["plugins"]["postbuild"],
            serde_json::json!(["pretty-links"])
        );
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = SiteConfig::load_from_file(&dir.path().join(CONFIG_FILE)).unwrap();

        assert!(!config.data.contains_key("plugins"));
    }

    #[test]
    fn test_invalid_yaml_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "url: [unclosed\n").unwrap();

        assert!(matches!(
            SiteConfig::load_from_file(&path),
            Err(ConfigError::Deserialize(_))
        ));
    }
}
