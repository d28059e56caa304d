//! Core data types used throughout tfmodule-schema.
//!
//! This module defines the fundamental data structures for representing:
//! - Module references (local directories or registry coordinates)
//! - Terraform source files handed to the model
//! - Outputs inferred by the model
//! - Per-run options taken from the command line

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::Display;
use std::path::PathBuf;

/// Identifies the module whose outputs are inferred.
///
/// `source` is either a path relative to the working directory or a
/// registry coordinate such as `terraform-aws-modules/vpc/aws`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleReference {
    /// Local path or `namespace/name/provider` registry coordinate
    pub source: String,

    /// Registry version; empty when unspecified
    #[serde(default)]
    pub version: String,
}

impl ModuleReference {
    /// Create a reference to a module.
    #[must_use]
    pub fn new(source: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            version: version.into(),
        }
    }

    /// Create a reference to a local module directory (no version).
    #[must_use]
    pub fn local(source: impl Into<String>) -> Self {
        Self::new(source, "")
    }

    /// Whether a version was given.
    #[must_use]
    pub fn has_version(&self) -> bool {
        !self.version.is_empty()
    }
}

impl Display for ModuleReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.has_version() {
            write!(f, "{}@{}", self.source, self.version)
        } else {
            write!(f, "{}", self.source)
        }
    }
}

/// Where module source code comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceMode {
    /// A directory relative to the working directory
    Local,
    /// A Terraform registry module, cloned from its source repository
    Registry,
}

/// A Terraform source file and its full contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerraformFile {
    /// Absolute path of the file
    pub path: PathBuf,
    /// File contents
    pub content: String,
}

impl TerraformFile {
    /// Whether this is a conventional `outputs.tf` file.
    ///
    /// Matches on the path suffix, so `modules/net/outputs.tf` qualifies.
    #[must_use]
    pub fn is_outputs_file(&self) -> bool {
        self.path.to_string_lossy().ends_with("outputs.tf")
    }
}

/// One output as inferred by the model.
///
/// `output_type` is expected to be one of `string`, `number`, `bool`,
/// `list(string)`, `list(any)`, `map(string)`, `map(any)`, `any` or
/// `unknown`, but is not validated; unrecognized values map to `Any`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferredOutput {
    /// Output variable name
    #[serde(default, deserialize_with = "null_as_empty")]
    pub output_name: String,

    /// Terraform type expression
    #[serde(default, deserialize_with = "null_as_empty")]
    pub output_type: String,
}

impl InferredOutput {
    /// Create an inferred output.
    #[must_use]
    pub fn new(output_name: impl Into<String>, output_type: impl Into<String>) -> Self {
        Self {
            output_name: output_name.into(),
            output_type: output_type.into(),
        }
    }
}

/// The structured document the model is constrained to return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferenceResponse {
    /// Outputs in the order the model listed them
    pub outputs: Vec<InferredOutput>,
}

/// Options that change how inferred outputs become the schema document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Wrap the schema with `source`/`maximumVersion` provenance
    pub generate_schema_override: bool,
    /// Omit outputs typed `string`
    pub skip_strings: bool,
}

/// Missing and `null` strings both become `""`.
fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_reference_display() {
        assert_eq!(
            ModuleReference::new("terraform-aws-modules/vpc/aws", "5.1.0").to_string(),
            "terraform-aws-modules/vpc/aws@5.1.0"
        );
        assert_eq!(ModuleReference::local("./modules/vpc").to_string(), "./modules/vpc");
        assert!(!ModuleReference::local("./modules/vpc").has_version());
    }

    #[test]
    fn test_outputs_file_detection() {
        let file = |p: &str| TerraformFile {
            path: PathBuf::from(p),
            content: String::new(),
        };
        assert!(file("/tmp/module/outputs.tf").is_outputs_file());
        assert!(file("/tmp/module/nested/outputs.tf").is_outputs_file());
        assert!(!file("/tmp/module/main.tf").is_outputs_file());
        assert!(!file("/tmp/module/outputs.tf.json").is_outputs_file());
    }

    #[test]
    fn test_inferred_output_missing_fields_default_to_empty() {
        let response: InferenceResponse = serde_json::from_str(
            r#"{"outputs": [{"output_name": "vpc_id"}, {"output_type": null}]}"#,
        )
        .unwrap();

        assert_eq!(response.outputs[0], InferredOutput::new("vpc_id", ""));
        assert_eq!(response.outputs[1], InferredOutput::new("", ""));
    }

    #[test]
    fn test_inference_response_requires_outputs() {
        let result = serde_json::from_str::<InferenceResponse>(r#"{"results": []}"#);
        assert!(result.is_err());
    }
}
