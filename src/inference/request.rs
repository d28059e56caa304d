//! Conversation and response-format construction.

use crate::config::Config;
use crate::inference::{ChatMessage, Conversation, ResponseFormat};
use crate::types::TerraformFile;
use serde_json::json;

/// Establishes the model as a Terraform module expert.
pub const SYSTEM_PROMPT: &str = "\
You are a Terraform module expert.
You will be given the source code of a terraform module in the form of file paths and their contents
and you will analyze the types of the outputs of that module. The types are usually in a file called outputs.tf
but you should use the whole module to infer the types of the outputs.
";

/// Asks for the output types of the module that follows.
pub const TASK_PROMPT: &str = "\
Please analyze the source code of the following Terraform module and provide the types of the outputs.
The module source code is as follows:
";

/// Builds inference requests from Terraform files.
#[derive(Debug, Clone)]
pub struct InferenceRequestBuilder {
    schema_name: String,
}

impl InferenceRequestBuilder {
    /// Create a builder from configuration.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            schema_name: config.inference.schema_name.clone(),
        }
    }

    /// Build the conversation: system framing, task framing, then one user
    /// message per file in the given order.
    #[must_use]
    pub fn build(&self, files: &[TerraformFile]) -> Conversation {
        let mut messages = Vec::with_capacity(files.len() + 2);
        messages.push(ChatMessage::system(SYSTEM_PROMPT));
        messages.push(ChatMessage::user(TASK_PROMPT));
        messages.extend(
            files
                .iter()
                .map(|f| ChatMessage::user(format!("File: {}\n{}", f.path.display(), f.content))),
        );
        messages
    }

    /// The strict schema for `{outputs: [{output_name, output_type}]}`.
    #[must_use]
    pub fn response_format(&self) -> ResponseFormat {
        ResponseFormat {
            name: self.schema_name.clone(),
            schema: output_schema(),
            strict: true,
        }
    }
}

fn output_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "outputs": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "output_name": {
                            "type": "string",
                            "description": "The name of the output variable."
                        },
                        "output_type": {
                            "type": "string",
                            "description": "The type of the output variable which can be one of [string, number, bool, list(string), list(any), map(string), map(any), any, unknown]"
                        }
                    },
                    "required": ["output_name", "output_type"],
                    "additionalProperties": false
                }
            }
        },
        "required": ["outputs"],
        "additionalProperties": false
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::Role;
    use std::path::PathBuf;

    fn tf(path: &str, content: &str) -> TerraformFile {
        TerraformFile {
            path: PathBuf::from(path),
            content: content.to_string(),
        }
    }

    #[test]
    fn test_conversation_layout() {
        let builder = InferenceRequestBuilder::new(&Config::default());
        let conversation = builder.build(&[
            tf("/m/main.tf", "resource \"aws_vpc\" \"this\" {}"),
            tf("/m/outputs.tf", "output \"vpc_id\" { value = aws_vpc.this.id }"),
        ]);

        assert_eq!(conversation.len(), 4);
        assert_eq!(conversation[0].role, Role::System);
        assert!(conversation[0].content.contains("Terraform module expert"));
        assert_eq!(conversation[1].role, Role::User);
        assert!(conversation[1].content.contains("provide the types of the outputs"));
        assert_eq!(conversation[2].content, "File: /m/main.tf\nresource \"aws_vpc\" \"this\" {}");
        assert!(conversation[3].content.starts_with("File: /m/outputs.tf\n"));
        assert!(conversation.iter().skip(1).all(|m| m.role == Role::User));
    }

    #[test]
    fn test_empty_file_list_keeps_framing() {
        let conversation = InferenceRequestBuilder::new(&Config::default()).build(&[]);
        assert_eq!(conversation.len(), 2);
    }

    #[test]
    fn test_response_format_is_strict() {
        let format = InferenceRequestBuilder::new(&Config::default()).response_format();
        assert_eq!(format.name, "output_schema");
        assert!(format.strict);

        let schema = &format.schema;
        assert_eq!(schema["additionalProperties"], json!(false));
        assert_eq!(schema["required"], json!(["outputs"]));
        let item = &schema["properties"]["outputs"]["items"];
        assert_eq!(item["additionalProperties"], json!(false));
        assert_eq!(item["required"], json!(["output_name", "output_type"]));
    }
}
