//! Mapping inferred Terraform types onto Pulumi schema fragments.
//!
//! | Terraform type | Fragment |
//! |---|---|
//! | `string` | `{"type": "string"}` |
//! | `number` | `{"type": "number"}` |
//! | `bool` | `{"type": "boolean"}` |
//! | `list(string)` | `{"type": "array", "items": {"type": "string"}}` |
//! | `list(any)` | `{"type": "array", "items": {"$ref": "pulumi.json#/Any"}}` |
//! | `map(string)` | `{"type": "object", "additionalProperties": {"type": "string"}}` |
//! | `map(any)` | `{"type": "object", "additionalProperties": {"$ref": "pulumi.json#/Any"}}` |
//! | anything else | `{"$ref": "pulumi.json#/Any"}` |

mod document;

pub use document::{OutputsSchema, SchemaDocument, SchemaWriter};

use crate::types::{InferredOutput, RunOptions};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Reference to Pulumi's catch-all type.
pub const PULUMI_ANY_REF: &str = "pulumi.json#/Any";

/// Schema `type` values produced by the mapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaKind {
    /// `string`
    String,
    /// `number`
    Number,
    /// `boolean`
    Boolean,
    /// `array`, with `items`
    Array,
    /// `object`, with `additionalProperties`
    Object,
}

/// The schema describing one output's type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaFragment {
    /// `type`
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<SchemaKind>,

    /// Element schema of an array
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SchemaFragment>>,

    /// Value schema of a map
    #[serde(
        rename = "additionalProperties",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub additional_properties: Option<Box<SchemaFragment>>,

    /// `$ref` to a named type
    #[serde(rename = "$ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

impl SchemaFragment {
    fn empty() -> Self {
        Self {
            kind: None,
            items: None,
            additional_properties: None,
            reference: None,
        }
    }

    /// A plain `{"type": kind}` fragment.
    #[must_use]
    pub fn of(kind: SchemaKind) -> Self {
        Self {
            kind: Some(kind),
            ..Self::empty()
        }
    }

    /// An array whose elements are `items`.
    #[must_use]
    pub fn array(items: Self) -> Self {
        Self {
            kind: Some(SchemaKind::Array),
            items: Some(Box::new(items)),
            ..Self::empty()
        }
    }

    /// An object whose values are `values`.
    #[must_use]
    pub fn map(values: Self) -> Self {
        Self {
            kind: Some(SchemaKind::Object),
            additional_properties: Some(Box::new(values)),
            ..Self::empty()
        }
    }

    /// The `pulumi.json#/Any` reference.
    #[must_use]
    pub fn any() -> Self {
        Self {
            reference: Some(PULUMI_ANY_REF.to_string()),
            ..Self::empty()
        }
    }
}

/// Map a Terraform type string to its fragment. Total: unrecognized input
/// maps to [`SchemaFragment::any`].
#[must_use]
pub fn map_output_type(output_type: &str) -> SchemaFragment {
    match output_type {
        "string" => SchemaFragment::of(SchemaKind::String),
        "number" => SchemaFragment::of(SchemaKind::Number),
        "bool" => SchemaFragment::of(SchemaKind::Boolean),
        "list(string)" => SchemaFragment::array(SchemaFragment::of(SchemaKind::String)),
        "list(any)" => SchemaFragment::array(SchemaFragment::any()),
        "map(string)" => SchemaFragment::map(SchemaFragment::of(SchemaKind::String)),
        "map(any)" => SchemaFragment::map(SchemaFragment::any()),
        _ => SchemaFragment::any(),
    }
}

/// Output name to fragment, in first-seen order.
pub type OutputFragments = IndexMap<String, SchemaFragment>;

/// Converts inferred outputs into schema fragments.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaMapper {
    options: RunOptions,
}

impl SchemaMapper {
    /// Create a mapper for the given run options.
    #[must_use]
    pub const fn new(options: RunOptions) -> Self {
        Self { options }
    }

    /// Map every output in order. With `skip_strings`, `string` outputs are
    /// left out. A repeated name keeps its first position and takes the
    /// last fragment.
    #[must_use]
    pub fn map(&self, outputs: &[InferredOutput]) -> OutputFragments {
        let mut fragments = OutputFragments::with_capacity(outputs.len());
        for output in outputs {
            if self.options.skip_strings && output.output_type == "string" {
                tracing::debug!(output = %output.output_name, "Skipping string output");
                continue;
            }
            if output.output_name.is_empty() {
                tracing::warn!(output_type = %output.output_type, "Model returned an output without a name");
            }
            fragments.insert(output.output_name.clone(), map_output_type(&output.output_type));
        }
        fragments
    }
}
