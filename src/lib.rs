//! # tfmodule-schema
//!
//! Infers the output types of a Terraform module with a language model and
//! writes them as a Pulumi schema `outputs` document.
//!
//! The tool never parses HCL itself. It gathers a module's `.tf` files,
//! hands them to a chat model constrained to a strict JSON schema, and maps
//! each inferred Terraform type onto a small fixed set of schema shapes.
//!
//! ## Features
//!
//! - **Local and registry modules**: read a directory, or look a module up
//!   in the Terraform registry and shallow-clone its repository
//! - **Strict structured responses**: the model must answer
//!   `{outputs: [{output_name, output_type}]}`
//! - **Degraded retry**: an oversized request is retried once with only
//!   the `outputs.tf` files
//! - **Always a valid document**: every failure after argument checking
//!   ends in `{"outputs": {}}` rather than a missing or partial file
//!
//! ## Example
//!
//! ```rust,no_run
//! use tfmodule_schema::inference::OpenAiClient;
//! use tfmodule_schema::types::{ModuleReference, RunOptions, SourceMode};
//! use tfmodule_schema::{Config, SchemaInferrer};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     let client = OpenAiClient::new(&config, config.api_key()?)?;
//!     let inferrer = SchemaInferrer::new(config, std::env::current_dir()?, client)?;
//!
//!     let module = ModuleReference::new("terraform-aws-modules/vpc/aws", "5.1.0");
//!     let document = inferrer
//!         .infer(&module, SourceMode::Registry, RunOptions::default())
//!         .await;
//!     println!("Inferred {} outputs", document.outputs().len());
//!     Ok(())
//! }
//! ```

#![warn(
    clippy::all,
    missing_docs,
    rust_2018_idioms
)]

pub mod cli;
pub mod config;
pub mod error;
pub mod git;
pub mod inference;
pub mod resolver;
pub mod schema;
pub mod types;

// Re-export commonly used types at crate root
pub use config::Config;
pub use error::{Result, SchemaError};
pub use schema::{SchemaDocument, SchemaFragment, SchemaMapper};
pub use types::{InferredOutput, ModuleReference, RunOptions, SourceMode, TerraformFile};

use cli::Invocation;
use inference::{DegradedRetryPolicy, InferenceClient, InferenceRequestBuilder};
use resolver::ModuleSourceResolver;
use schema::SchemaWriter;
use std::path::{Path, PathBuf};

/// Runs the whole pipeline: resolve, infer, map, write.
///
/// Every step is awaited in sequence. Failures after construction never
/// surface as errors from [`SchemaInferrer::infer`]; they are logged and
/// the result degrades to [`SchemaDocument::empty`].
///
/// # Example
///
/// ```rust,no_run
/// use tfmodule_schema::cli::Invocation;
/// use tfmodule_schema::inference::OpenAiClient;
/// use tfmodule_schema::types::{ModuleReference, RunOptions, SourceMode};
/// use tfmodule_schema::{Config, SchemaInferrer};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let config = Config::default();
///     let client = OpenAiClient::new(&config, "sk-...")?;
///     let inferrer = SchemaInferrer::new(config, "/work", client)?;
///
///     let invocation = Invocation {
///         module: ModuleReference::local("modules/vpc"),
///         mode: SourceMode::Local,
///         output_file: "vpc.json".into(),
///     };
///     inferrer.run(&invocation, RunOptions::default()).await?;
///     Ok(())
/// }
/// ```
pub struct SchemaInferrer<C> {
    working_dir: PathBuf,
    resolver: ModuleSourceResolver,
    builder: InferenceRequestBuilder,
    retry: DegradedRetryPolicy,
    writer: SchemaWriter,
    client: C,
}

impl<C: InferenceClient> SchemaInferrer<C> {
    /// Create an inferrer. Local module paths and output files are resolved
    /// against `working_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built.
    pub fn new(config: Config, working_dir: impl Into<PathBuf>, client: C) -> Result<Self> {
        let working_dir = working_dir.into();
        Ok(Self {
            resolver: ModuleSourceResolver::new(&config, working_dir.clone())?,
            builder: InferenceRequestBuilder::new(&config),
            retry: DegradedRetryPolicy,
            writer: SchemaWriter::new(&config),
            working_dir,
            client,
        })
    }

    /// Absolute path of an output file name.
    #[must_use]
    pub fn output_path(&self, output_file: &Path) -> PathBuf {
        self.working_dir.join(output_file)
    }

    /// The model client in use.
    pub const fn client(&self) -> &C {
        &self.client
    }

    /// Infer the schema document for a module.
    pub async fn infer(&self, module: &ModuleReference, mode: SourceMode, options: RunOptions) -> SchemaDocument {
        let resolved = self.resolver.resolve(module, mode).await;
        if resolved.is_empty() {
            tracing::warn!(module = %module, "No Terraform files found to analyze");
            return SchemaDocument::empty();
        }

        tracing::info!(files = resolved.files.len(), "Found Terraform files in the module");

        let files = match resolver::read_files(&resolved.files).await {
            Ok(files) => files,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read Terraform files");
                return SchemaDocument::empty();
            }
        };

        let outcome = match self.retry.run(&self.client, &self.builder, &files).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(error = %e, "Output type inference failed");
                return SchemaDocument::empty();
            }
        };

        tracing::info!(
            outputs = outcome.response.outputs.len(),
            degraded = outcome.degraded,
            "Model inferred output types"
        );

        let fragments = SchemaMapper::new(options).map(&outcome.response.outputs);
        if options.generate_schema_override {
            SchemaDocument::with_override(module, fragments)
        } else {
            SchemaDocument::plain(fragments)
        }
    }

    /// Infer the document for an invocation and write it to its output file.
    ///
    /// # Errors
    ///
    /// Returns an error only if the document cannot be written.
    pub async fn run(&self, invocation: &Invocation, options: RunOptions) -> Result<SchemaDocument> {
        let output_path = self.output_path(&invocation.output_file);
        let document = self.infer(&invocation.module, invocation.mode, options).await;

        tracing::info!(path = %output_path.display(), "Writing output");
        self.writer.write(&document, &output_path).await?;
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::{ChatMessage, Completion, ResponseFormat};
    use async_trait::async_trait;

    struct Unreachable;

    #[async_trait]
    impl InferenceClient for Unreachable {
        async fn complete(&self, _: &[ChatMessage], _: &ResponseFormat) -> Result<Completion> {
            panic!("model must not be called");
        }
    }

    #[test]
    fn test_inferrer_creation() {
        let inferrer = SchemaInferrer::new(Config::default(), "/work", Unreachable).unwrap();
        assert_eq!(inferrer.output_path(Path::new("out.json")), PathBuf::from("/work/out.json"));
    }

    #[tokio::test]
    async fn test_missing_module_skips_model() {
        let dir = tempfile::tempdir().unwrap();
        let inferrer = SchemaInferrer::new(Config::default(), dir.path(), Unreachable).unwrap();

        let document = inferrer
            .infer(
                &ModuleReference::local("missing"),
                SourceMode::Local,
                RunOptions { generate_schema_override: true, skip_strings: true },
            )
            .await;
        assert_eq!(document, SchemaDocument::empty());
    }
}
