//! The persisted schema document.

use crate::config::Config;
use crate::error::{Result, SchemaError};
use crate::schema::OutputFragments;
use crate::types::ModuleReference;
use serde::Serialize;
use std::path::Path;

/// `{"outputs": {...}}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OutputsSchema {
    /// Fragments keyed by output name
    pub outputs: OutputFragments,
}

/// The three shapes the output file can take.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SchemaDocument {
    /// `{"outputs": {...}}`, also used as the empty fallback
    Plain(OutputsSchema),

    /// Outputs wrapped with the module's provenance
    #[serde(rename_all = "camelCase")]
    Override {
        /// Module source as given on the command line
        source: String,
        /// Module version as given on the command line
        maximum_version: String,
        /// The outputs schema
        partial_schema: OutputsSchema,
    },
}

impl SchemaDocument {
    /// The fallback written when nothing could be inferred.
    #[must_use]
    pub fn empty() -> Self {
        Self::Plain(OutputsSchema::default())
    }

    /// A plain outputs document.
    #[must_use]
    pub fn plain(outputs: OutputFragments) -> Self {
        Self::Plain(OutputsSchema { outputs })
    }

    /// Outputs wrapped for use as a schema override of `module`.
    #[must_use]
    pub fn with_override(module: &ModuleReference, outputs: OutputFragments) -> Self {
        Self::Override {
            source: module.source.clone(),
            maximum_version: module.version.clone(),
            partial_schema: OutputsSchema { outputs },
        }
    }

    /// The fragments, whichever shape the document has.
    #[must_use]
    pub fn outputs(&self) -> &OutputFragments {
        match self {
            Self::Plain(schema) | Self::Override { partial_schema: schema, .. } => &schema.outputs,
        }
    }
}

/// Renders and writes schema documents.
#[derive(Debug, Clone, Copy)]
pub struct SchemaWriter {
    pretty: bool,
}

impl SchemaWriter {
    /// Create a writer from the output configuration.
    #[must_use]
    pub const fn new(config: &Config) -> Self {
        Self {
            pretty: config.output.pretty,
        }
    }

    /// Render a document as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render(&self, document: &SchemaDocument) -> Result<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(document)
        } else {
            serde_json::to_string(document)
        };
        json.map_err(|e| SchemaError::internal(format!("Failed to serialize schema: {e}"), file!(), line!()))
    }

    /// Render and write a document in one call.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering or writing fails.
    pub async fn write(&self, document: &SchemaDocument, path: &Path) -> Result<()> {
        let rendered = self.render(document)?;
        tokio::fs::write(path, rendered)
            .await
            .map_err(|e| SchemaError::io(path, e, file!(), line!()))?;
        tracing::info!(path = %path.display(), outputs = document.outputs().len(), "Schema written");
        Ok(())
    }
}
