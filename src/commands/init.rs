use std::path::Path;

use crate::{
    InitArgs,
    commands::STATIC_DIR,
    config::{CONFIG_FILE, DEFAULT_CONFIG},
};

/// Starter template every page falls back to.
const DEFAULT_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>{{ page.title | default(value="Untitled") }}</title>
</head>
<body>
{{ content }}
</body>
</html>
"#;

const WELCOME_PAGE: &str = "---\ntitle: Welcome\n---\n# Welcome\n\nEdit `content/index.md` to get started.\n";

pub async fn run(args: &InitArgs) -> Result<(), anyhow::Error> {
    let path = match &args.name {
        Some(name) if name.is_relative() => std::env::current_dir()?.join(name),
        Some(name) => name.clone(),
        None => std::env::current_dir()?,
    };

    if tokio::fs::try_exists(path.join(CONFIG_FILE)).await? {
        return Err(anyhow::anyhow!(
            "A site already exists in {path}",
            path = path.display()
        ));
    }

    println!("Initializing site in {}", path.display());
    scaffold(&path).await?;
    println!(
        "Created config file {config_file}",
        config_file = path.join(CONFIG_FILE).display()
    );

    Ok(())
}

/// Create the directory layout, config, starter template and first page.
async fn scaffold(path: &Path) -> Result<(), anyhow::Error> {
    for dir in ["content", "templates", STATIC_DIR] {
        tokio::fs::create_dir_all(path.join(dir)).await?;
    }

    tokio::fs::write(path.join(CONFIG_FILE), DEFAULT_CONFIG).await?;
    tokio::fs::write(path.join("templates/_default.tera"), DEFAULT_TEMPLATE).await?;
    tokio::fs::write(path.join("content/index.md"), WELCOME_PAGE).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::build::make_site;

    #[tokio::test]
    async fn test_scaffold_builds() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("blog");

        scaffold(&root).await.unwrap();
        assert!(root.join(STATIC_DIR).is_dir());

        let site = make_site(&root.join(CONFIG_FILE), &root).await.unwrap();
        let html = &site.output["/index.html"];
        assert!(html.contains("<title>Welcome</title>"));
        assert!(html.contains("<h1 id=\"welcome\">Welcome</h1>"));
    }
}
