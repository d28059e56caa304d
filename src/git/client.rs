//! Git client implementation.
//!
//! Clones into a fresh temporary directory per run. The directory is
//! removed when the returned [`CloneDir`] is dropped unless the
//! configuration asks to keep it.

use crate::config::Config;
use crate::error::{Result, SchemaError};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Prefix of every temporary clone directory.
const CLONE_DIR_PREFIX: &str = "terraform-module";

/// A cloned repository on disk.
#[derive(Debug)]
pub enum CloneDir {
    /// Removed from disk when dropped
    Scoped(TempDir),
    /// Left on disk after the run
    Kept(PathBuf),
}

impl CloneDir {
    /// Root of the working tree.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Scoped(dir) => dir.path(),
            Self::Kept(path) => path,
        }
    }
}

/// Git client performing shallow clones of module repositories.
pub struct GitClient {
    keep_clone: bool,
}

impl GitClient {
    /// Create a new Git client with the given configuration.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            keep_clone: config.git.keep_clone,
        }
    }

    /// Shallow-clone (`depth = 1`) a repository into a new temporary directory.
    ///
    /// The URL is normalized to end in `.git` first. libgit2's local
    /// transport cannot fetch shallow, so `file://` URLs and filesystem
    /// paths are cloned in full.
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary directory cannot be created or the
    /// clone fails; the error carries git's message.
    pub async fn shallow_clone(&self, url: &str) -> Result<CloneDir> {
        let url = super::normalize_clone_url(url);

        let temp_dir = tempfile::Builder::new()
            .prefix(CLONE_DIR_PREFIX)
            .tempdir()
            .map_err(|e| SchemaError::io(std::env::temp_dir(), e, file!(), line!()))?;

        tracing::info!(url = %url, path = %temp_dir.path().display(), "Cloning repository to extract source code");

        let target_path = temp_dir.path().to_path_buf();
        clone_repository_impl(&url, &target_path).await?;

        tracing::debug!(path = %target_path.display(), keep = self.keep_clone, "Repository cloned successfully");

        if self.keep_clone {
            #[allow(deprecated)]
            let kept = temp_dir.into_path();
            Ok(CloneDir::Kept(kept))
        } else {
            Ok(CloneDir::Scoped(temp_dir))
        }
    }
}

async fn clone_repository_impl(url: &str, target_path: &Path) -> Result<()> {
    let url = url.to_string();
    let target_path = target_path.to_path_buf();

    // Run git2 operations in a blocking task
    tokio::task::spawn_blocking(move || {
        let mut builder = git2::build::RepoBuilder::new();
        let mut fetch_options = git2::FetchOptions::new();

        if !is_local_url(&url) {
            fetch_options.depth(1);
        }
        builder.fetch_options(fetch_options);

        builder
            .clone(&url, &target_path)
            .map_err(|e| crate::err!(GitClone {
                url: url.clone(),
                message: e.message().to_string(),
            }))?;

        Ok(())
    })
    .await
    .map_err(|e| SchemaError::internal(format!("Clone task failed: {e}"), file!(), line!()))?
}

fn is_local_url(url: &str) -> bool {
    url.starts_with("file://") || Path::new(url).is_absolute()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A bare repository at `<root>/<name>.git` with one commit holding `files`.
    fn bare_repository(root: &Path, name: &str, files: &[(&str, &str)]) -> PathBuf {
        let path = root.join(format!("{name}.git"));
        let repo = git2::Repository::init_bare(&path).unwrap();

        let mut tree = repo.treebuilder(None).unwrap();
        for (file, content) in files {
            let blob = repo.blob(content.as_bytes()).unwrap();
            tree.insert(file, blob, 0o100_644).unwrap();
        }
        let tree = repo.find_tree(tree.write().unwrap()).unwrap();
        let signature = git2::Signature::now("tfschema", "tfschema@example.com").unwrap();
        repo.commit(Some("HEAD"), &signature, &signature, "initial", &tree, &[])
            .unwrap();
        path
    }

    #[test]
    fn test_local_url_detection() {
        assert!(is_local_url("file:///tmp/repo.git"));
        assert!(is_local_url("/srv/git/repo.git"));
        assert!(!is_local_url("https://github.com/org/repo.git"));
        assert!(!is_local_url("git@github.com:org/repo.git"));
    }

    #[tokio::test]
    async fn test_clone_existing_repository() {
        let root = tempfile::tempdir().unwrap();
        bare_repository(root.path(), "vpc", &[("main.tf", "# main"), ("outputs.tf", "output \"id\" {}")]);

        let client = GitClient::new(&Config::default());
        let url = format!("file://{}/vpc", root.path().display());
        let checkout = client.shallow_clone(&url).await.unwrap();

        assert!(matches!(checkout, CloneDir::Scoped(_)));
        assert_eq!(
            std::fs::read_to_string(checkout.path().join("outputs.tf")).unwrap(),
            "output \"id\" {}"
        );

        let path = checkout.path().to_path_buf();
        drop(checkout);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_kept_clone_survives_drop() {
        let root = tempfile::tempdir().unwrap();
        bare_repository(root.path(), "vpc", &[("main.tf", "# main")]);

        let mut config = Config::default();
        config.git.keep_clone = true;
        let url = format!("file://{}/vpc", root.path().display());
        let checkout = GitClient::new(&config).shallow_clone(&url).await.unwrap();

        let path = checkout.path().to_path_buf();
        assert!(matches!(checkout, CloneDir::Kept(_)));
        drop(checkout);
        assert!(path.join("main.tf").exists());
        std::fs::remove_dir_all(path).unwrap();
    }

    #[tokio::test]
    async fn test_clone_failure_is_reported() {
        let client = GitClient::new(&Config::default());
        let missing = tempfile::tempdir().unwrap();
        bare_repository(missing.path(), "present", &[("main.tf", "# main")]);
        let url = format!("file://{}/does-not-exist", missing.path().display());

        let err = client.shallow_clone(&url).await.unwrap_err();
        match err {
            SchemaError::GitClone { url: failed, message, .. } => {
                assert!(failed.ends_with("does-not-exist.git"));
                assert!(!message.is_empty());
            }
            other => panic!("expected GitClone, got {other:?}"),
        }
    }

    #[test]
    fn test_scoped_clone_dir_is_removed_on_drop() {
        let temp = tempfile::Builder::new().prefix(CLONE_DIR_PREFIX).tempdir().unwrap();
        let path = temp.path().to_path_buf();
        let dir = CloneDir::Scoped(temp);
        assert_eq!(dir.path(), path.as_path());
        assert!(path.exists());
        drop(dir);
        assert!(!path.exists());
    }
}
