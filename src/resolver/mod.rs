//! Module source resolution.
//!
//! Turns a [`ModuleReference`] into the list of Terraform files to analyze:
//!
//! - **Local** modules are a directory relative to the working directory.
//! - **Registry** modules are looked up in the Terraform registry, and the
//!   repository named by the metadata is shallow-cloned into a temporary
//!   directory.
//!
//! Every failure on the way degrades to an empty file list. An empty list
//! means there is nothing to analyze; partial lists are never returned.
//!
//! # Example
//!
//! ```rust,no_run
//! use tfmodule_schema::resolver::ModuleSourceResolver;
//! use tfmodule_schema::types::{ModuleReference, SourceMode};
//! use tfmodule_schema::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let resolver = ModuleSourceResolver::new(&Config::default(), std::env::current_dir()?)?;
//!     let module = ModuleReference::new("terraform-aws-modules/vpc/aws", "5.1.0");
//!     let resolved = resolver.resolve(&module, SourceMode::Registry).await;
//!     println!("Found {} Terraform files", resolved.files.len());
//!     Ok(())
//! }
//! ```

mod registry;
mod walk;

pub use registry::{ModuleMetadata, RegistryClient};
pub use walk::TerraformWalker;

use crate::config::Config;
use crate::error::{Result, SchemaError};
use crate::git::{CloneDir, GitClient};
use crate::types::{ModuleReference, SourceMode, TerraformFile};
use std::path::{Path, PathBuf};

/// File extension of Terraform source files.
pub const TERRAFORM_EXTENSION: &str = "tf";

/// The outcome of resolving a module.
#[derive(Debug, Default)]
pub struct ResolvedModule {
    /// Absolute paths of the module's Terraform files
    pub files: Vec<PathBuf>,

    /// Registry description, when one was published
    pub description: Option<String>,

    /// Clone backing `files` for registry modules; dropping it may remove them
    pub checkout: Option<CloneDir>,
}

impl ResolvedModule {
    /// Nothing to analyze.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether no files were found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Resolves module references to Terraform source files.
pub struct ModuleSourceResolver {
    working_dir: PathBuf,
    walker: TerraformWalker,
    registry: RegistryClient,
    git_client: GitClient,
}

impl ModuleSourceResolver {
    /// Create a resolver. Local module paths are resolved against `working_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry HTTP client cannot be built.
    pub fn new(config: &Config, working_dir: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            working_dir: working_dir.into(),
            walker: TerraformWalker::new(config),
            registry: RegistryClient::new(config)?,
            git_client: GitClient::new(config),
        })
    }

    /// Resolve a module, degrading every failure to an empty result.
    ///
    /// Failures are reported through `tracing`.
    pub async fn resolve(&self, module: &ModuleReference, mode: SourceMode) -> ResolvedModule {
        match self.try_resolve(module, mode).await {
            Ok(resolved) => resolved,
            Err(e) => {
                tracing::warn!(module = %module, error = %e, "Could not resolve module source");
                ResolvedModule::empty()
            }
        }
    }

    /// Resolve a module, returning the first failure.
    ///
    /// # Errors
    ///
    /// Returns an error if the local directory is missing, the registry
    /// request fails or names no source, or the clone fails.
    pub async fn try_resolve(&self, module: &ModuleReference, mode: SourceMode) -> Result<ResolvedModule> {
        match mode {
            SourceMode::Local => self.resolve_local(module),
            SourceMode::Registry => self.resolve_registry(module).await,
        }
    }

    fn resolve_local(&self, module: &ModuleReference) -> Result<ResolvedModule> {
        let module_path = self.working_dir.join(&module.source);
        tracing::debug!(path = %module_path.display(), "Resolving local module");

        let files = self.walker.collect(&module_path)?;
        Ok(ResolvedModule {
            files,
            ..ResolvedModule::default()
        })
    }

    async fn resolve_registry(&self, module: &ModuleReference) -> Result<ResolvedModule> {
        let metadata = self.registry.metadata(module).await?;

        let source = metadata
            .source
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| crate::err!(MissingModuleSource {
                module_source: module.source.clone(),
            }))?;

        if let Some(description) = metadata.description.as_deref().filter(|d| !d.is_empty()) {
            tracing::info!(module = %module, description = %description, "Module description");
        }

        let checkout = self.git_client.shallow_clone(&source).await?;
        let files = self.walker.collect(checkout.path())?;

        Ok(ResolvedModule {
            files,
            description: metadata.description,
            checkout: Some(checkout),
        })
    }
}

/// Read the contents of every file, in order.
///
/// Bytes that are not valid UTF-8 are replaced with U+FFFD rather than
/// failing the file.
///
/// # Errors
///
/// Returns an error naming the first file that cannot be read.
pub async fn read_files(paths: &[PathBuf]) -> Result<Vec<TerraformFile>> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        files.push(read_file(path).await?);
    }
    Ok(files)
}

async fn read_file(path: &Path) -> Result<TerraformFile> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| SchemaError::io(path, e, file!(), line!()))?;
    let content = match String::from_utf8(bytes) {
        Ok(content) => content,
        Err(e) => {
            tracing::debug!(file = %path.display(), "File is not valid UTF-8, decoding lossily");
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        }
    };
    Ok(TerraformFile {
        path: path.to_path_buf(),
        content,
    })
}
