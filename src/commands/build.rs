use std::path::{Path, PathBuf};

use crate::{
    BuildArgs,
    commands::{OUTPUT_DIR, STATIC_DIR, base_path_from_config, config_path_from_arg},
    config::SiteConfig,
    site::{OutputMap, Site, paths::key_to_output_path, walk_files},
};

/// What a build wrote to disk.
pub struct BuildResult {
    pub output_dir: PathBuf,
    pub pages: usize,
    pub static_files: usize,
}

pub async fn run(args: &BuildArgs) -> Result<(), anyhow::Error> {
    let config_path = config_path_from_arg(args.config_file.as_deref())?;
    let base_path = base_path_from_config(&config_path);

    let site = make_site(&config_path, &base_path).await?;

    if args.dry_run {
        println!("Would write {} file(s):", site.output.len());
        for key in site.output.keys() {
            println!("  {key} -> {}", site.url_for(key));
        }
        return Ok(());
    }

    let result = write_site(&site, &base_path).await?;
    println!(
        "Built site to {} ({} pages, {} static files)",
        result.output_dir.display(),
        result.pages,
        result.static_files
    );

    Ok(())
}

/// Load the config and run the full pipeline over the site at `base_path`.
pub async fn make_site(config_path: &Path, base_path: &Path) -> Result<Site, anyhow::Error> {
    let config = SiteConfig::load_from_file(config_path)?;

    let mut site = Site::new(config.url.clone(), base_path);
    site.configure(config.into_data());
    site.make().await?;

    Ok(site)
}

/// Replace `output/` with the site's output entries, then copy `static/`
/// over it.
pub async fn write_site(site: &Site, base_path: &Path) -> Result<BuildResult, anyhow::Error> {
    let output_dir = base_path.join(OUTPUT_DIR);

    if tokio::fs::try_exists(&output_dir).await? {
        tokio::fs::remove_dir_all(&output_dir).await?;
    }
    tokio::fs::create_dir_all(&output_dir).await?;

    let pages = write_output(&site.output, &output_dir).await?;
    let static_files = copy_static(&base_path.join(STATIC_DIR), &output_dir).await?;

    Ok(BuildResult {
        output_dir,
        pages,
        static_files,
    })
}

/// Write every output entry below `output_dir`, creating directories as
/// needed.
async fn write_output(output: &OutputMap, output_dir: &Path) -> Result<usize, anyhow::Error> {
    for (key, text) in output {
        let path = key_to_output_path(key, output_dir);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, text).await?;
        tracing::debug!(output = %key, path = %path.display(), "wrote output");
    }

    Ok(output.len())
}

/// Copy the tree under `static_dir` into `output_dir`, overwriting files of
/// the same name. A missing `static_dir` copies nothing.
async fn copy_static(static_dir: &Path, output_dir: &Path) -> Result<usize, anyhow::Error> {
    if !tokio::fs::metadata(static_dir)
        .await
        .is_ok_and(|meta| meta.is_dir())
    {
        return Ok(0);
    }

    let files = walk_files(static_dir).await?;
    for file in &files {
        let relative = file.strip_prefix(static_dir)?;
        let target = output_dir.join(relative);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::copy(file, &target).await?;
    }

    tracing::debug!(files = files.len(), "copied static files");
    Ok(files.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CONFIG_FILE;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, text: &str) {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, text).unwrap();
    }

    #[tokio::test]
    async fn test_write_output_creates_directories() {
        let dir = TempDir::new().unwrap();
        let mut output = OutputMap::new();
        output.insert("/index.html".to_string(), "home".to_string());
        output.insert("/blog/post/index.html".to_string(), "post".to_string());

        let count = write_output(&output, dir.path()).await.unwrap();

        assert_eq!(count, 2);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("blog/post/index.html")).unwrap(),
            "post"
        );
    }

    #[tokio::test]
    async fn test_copy_static_overwrites() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "static/css/site.css", "body {}");
        write(dir.path(), "static/index.html", "static wins");
        write(dir.path(), "output/index.html", "rendered");

        let count = copy_static(&dir.path().join("static"), &dir.path().join("output"))
            .await
            .unwrap();

        assert_eq!(count, 2);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("output/index.html")).unwrap(),
            "static wins"
        );
        assert!(dir.path().join("output/css/site.css").is_file());
    }

    #[tokio::test]
    async fn test_copy_static_missing_dir() {
        let dir = TempDir::new().unwrap();
        let count = copy_static(&dir.path().join("static"), dir.path())
            .await
            .unwrap();

        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_build_site_from_config() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            CONFIG_FILE,
            "url: https://example.com\nplugins:\n  preload: [markdown]\n  postbuild: [pretty-links]\n",
        );
        write(dir.path(), "content/about.md", "# About\n");
        write(dir.path(), "templates/_default.tera", "{{ site.url }}|{{ content }}");
        write(dir.path(), "output/stale.html", "old");

        let config_path = dir.path().join(CONFIG_FILE);
        let site = make_site(&config_path, dir.path()).await.unwrap();
        let result = write_site(&site, dir.path()).await.unwrap();

        assert_eq!(result.pages, 1);
        assert_eq!(result.static_files, 0);
        let html = std::fs::read_to_string(dir.path().join("output/about/index.html")).unwrap();
        assert!(html.starts_with("https://example.com|<h1 id=\"about\">"));
        assert!(!dir.path().join("output/stale.html").exists());
    }
}
