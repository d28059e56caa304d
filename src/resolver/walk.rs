//! Terraform file discovery.

use crate::config::Config;
use crate::error::Result;
use crate::resolver::TERRAFORM_EXTENSION;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Recursively collects `.tf` files below a root directory.
pub struct TerraformWalker {
    exclude_patterns: Vec<glob::Pattern>,
    max_depth: usize,
}

impl TerraformWalker {
    /// Create a walker from the scan configuration.
    ///
    /// Exclusion patterns that are not valid globs are logged and ignored.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        let exclude_patterns = config
            .scan
            .exclude_patterns
            .iter()
            .filter_map(|p| match glob::Pattern::new(p) {
                Ok(pattern) => Some(pattern),
                Err(e) => {
                    tracing::warn!(pattern = %p, error = %e, "Ignoring invalid exclude pattern");
                    None
                }
            })
            .collect();

        Self {
            exclude_patterns,
            max_depth: config.scan.max_depth,
        }
    }

    /// List all Terraform files under `root`, in lexicographic walk order.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryNotFound` if `root` is not a directory, and
    /// `DirectoryWalk` if any entry below it cannot be read (a dangling
    /// symlink, a symlink loop, a permission error). No partial list is
    /// ever returned.
    pub fn collect(&self, root: &Path) -> Result<Vec<PathBuf>> {
        if !root.is_dir() {
            return Err(crate::err!(DirectoryNotFound {
                path: root.to_path_buf(),
            }));
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(root)
            .follow_links(true)
            .max_depth(self.max_depth)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !self.is_excluded(e.path()))
        {
            let entry = entry.map_err(|e| crate::err!(DirectoryWalk {
                path: e.path().unwrap_or(root).to_path_buf(),
                message: e.to_string(),
            }))?;

            if entry.file_type().is_file() && is_terraform_file(entry.path()) {
                tracing::debug!(file = %entry.path().display(), "Found Terraform file");
                files.push(entry.into_path());
            }
        }

        Ok(files)
    }

    fn is_excluded(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        let excluded = self.exclude_patterns.iter().any(|p| p.matches(name));
        if excluded {
            tracing::debug!(path = %path.display(), "Skipping excluded path");
        }
        excluded
    }
}

fn is_terraform_file(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(TERRAFORM_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "# test").unwrap();
    }

    #[test]
    fn test_collects_sorted_terraform_files() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "variables.tf");
        touch(dir.path(), "main.tf");
        touch(dir.path(), "outputs.tf");
        touch(dir.path(), "modules/subnet/outputs.tf");
        touch(dir.path(), "README.md");
        touch(dir.path(), "versions.tf.json");

        let files = TerraformWalker::new(&Config::default()).collect(dir.path()).unwrap();
        let relative: Vec<_> = files
            .iter()
            .map(|f| f.strip_prefix(dir.path()).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();

        assert_eq!(
            relative,
            vec!["main.tf", "modules/subnet/outputs.tf", "outputs.tf", "variables.tf"]
        );
    }

    #[test]
    fn test_skips_excluded_directories() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "main.tf");
        touch(dir.path(), ".terraform/modules/vpc/main.tf");

        let files = TerraformWalker::new(&Config::default()).collect(dir.path()).unwrap();
        assert_eq!(files, vec![dir.path().join("main.tf")]);
    }

    #[test]
    fn test_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let result = TerraformWalker::new(&Config::default()).collect(&dir.path().join("absent"));
        assert!(matches!(result, Err(crate::SchemaError::DirectoryNotFound { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_symlink_fails_the_walk() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "main.tf");
        touch(dir.path(), "outputs.tf");
        std::os::unix::fs::symlink(dir.path().join("gone.tf"), dir.path().join("linked.tf")).unwrap();

        let result = TerraformWalker::new(&Config::default()).collect(dir.path());
        match result {
            Err(crate::SchemaError::DirectoryWalk { path, .. }) => {
                assert_eq!(path, dir.path().join("linked.tf"));
            }
            other => panic!("expected DirectoryWalk, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_loop_fails_the_walk() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "modules/a/outputs.tf");
        std::os::unix::fs::symlink(dir.path().join("modules"), dir.path().join("modules/a/back")).unwrap();

        let result = TerraformWalker::new(&Config::default()).collect(dir.path());
        assert!(matches!(result, Err(crate::SchemaError::DirectoryWalk { .. })));
    }

    #[test]
    fn test_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let files = TerraformWalker::new(&Config::default()).collect(dir.path()).unwrap();
        assert!(files.is_empty());
    }
}
