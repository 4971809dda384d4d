//! Recursive directory enumeration shared by the content and template loaders.

use std::path::{Path, PathBuf};

use super::error::BuildError;

/// List every regular file below `root`.
///
/// Entries of a directory are visited in file-name order and a directory's own
/// files come before the files of its subdirectories, so repeated runs over an
/// unchanged tree produce the same order. Symlinks are neither followed nor
/// listed.
pub async fn walk_files(root: &Path) -> Result<Vec<PathBuf>, BuildError> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .map_err(|e| BuildError::io(&dir, e))?;

        let mut listed = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| BuildError::io(&dir, e))?
        {
            let path = entry.path();
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| BuildError::io(&path, e))?;
            listed.push((path, file_type));
        }
        listed.sort_by(|(a, _), (b, _)| a.cmp(b));

        let mut subdirs = Vec::new();
        for (path, file_type) in listed {
            if file_type.is_dir() {
                subdirs.push(path);
            } else if file_type.is_file() {
                files.push(path);
            }
        }

        // Reversed so the stack pops subdirectories in name order
        pending.extend(subdirs.into_iter().rev());
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_walk_files_recurses_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("b/inner")).unwrap();
        std::fs::create_dir_all(dir.path().join("a")).unwrap();
        std::fs::write(dir.path().join("z.md"), "").unwrap();
        std::fs::write(dir.path().join("a/one.md"), "").unwrap();
        std::fs::write(dir.path().join("b/two.md"), "").unwrap();
        std::fs::write(dir.path().join("b/inner/three.md"), "").unwrap();

        let files = walk_files(dir.path()).await.unwrap();
        let relative: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();

        assert_eq!(
            relative,
            vec![
                PathBuf::from("z.md"),
                PathBuf::from("a/one.md"),
                PathBuf::from("b/two.md"),
                PathBuf::from("b/inner/three.md"),
            ]
        );
    }

    #[tokio::test]
    async fn test_walk_files_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let result = walk_files(&dir.path().join("missing")).await;
        assert!(matches!(result, Err(BuildError::Io { .. })));
    }
}
