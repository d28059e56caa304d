//! Output type inference with a language model.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────┐   Conversation +    ┌──────────────────────┐
//! │ InferenceRequestBuilder   │ ──ResponseFormat──▶ │ InferenceClient      │
//! │  system + task framing    │                     │  (trait; OpenAI impl)│
//! │  one message per .tf file │                     └──────────┬───────────┘
//! └───────────────────────────┘                                │ Completion
//!               ▲                                              ▼
//!               │ narrowed files          ┌──────────────────────────────┐
//!               └──────────────────────── │ DegradedRetryPolicy          │
//!                  on ContextLength-      │  retry once with outputs.tf  │
//!                  Exceeded               └──────────────────────────────┘
//! ```
//!
//! The model is constrained to a strict JSON schema, so the completion is
//! decoded directly into an [`InferenceResponse`] without re-validation.

mod openai;
mod request;
mod retry;

pub use openai::OpenAiClient;
pub use request::{InferenceRequestBuilder, SYSTEM_PROMPT, TASK_PROMPT};
pub use retry::{DegradedRetryPolicy, InferenceOutcome};

use crate::error::{Result, SchemaError};
use crate::types::InferenceResponse;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions framing the model's job
    System,
    /// Task and module source
    User,
}

/// One message of the conversation sent to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Author
    pub role: Role,
    /// Text content
    pub content: String,
}

impl ChatMessage {
    /// A system message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    /// A user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }
}

/// Ordered messages of one inference request.
pub type Conversation = Vec<ChatMessage>;

/// Strict JSON schema the response must conform to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseFormat {
    /// Schema name reported to the model service
    pub name: String,
    /// The JSON schema
    pub schema: serde_json::Value,
    /// Whether decoding must follow the schema exactly
    pub strict: bool,
}

/// Content returned by a successful model call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completion {
    /// Text parts of the reply, in order
    pub parts: Vec<String>,
}

impl Completion {
    /// A completion with a single text part.
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self { parts: vec![content.into()] }
    }

    /// Decode the first part as the structured response.
    ///
    /// # Errors
    ///
    /// Returns `EmptyCompletion` if there is no content and
    /// `MalformedResponse` if it does not decode.
    pub fn into_response(self) -> Result<InferenceResponse> {
        let Some(first) = self.parts.into_iter().next() else {
            return Err(SchemaError::EmptyCompletion { src_path: file!(), src_line: line!() });
        };

        serde_json::from_str(&first).map_err(|e| crate::err!(MalformedResponse {
            message: e.to_string(),
        }))
    }
}

/// A chat-completion service with schema-constrained output.
///
/// Implementations report an oversized request as
/// [`SchemaError::ContextLengthExceeded`] (see [`classify_failure`]) and
/// every other failure as [`SchemaError::Inference`].
#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// Send the conversation and return the model's reply.
    ///
    /// # Errors
    ///
    /// Returns a classified inference failure.
    async fn complete(&self, conversation: &[ChatMessage], format: &ResponseFormat) -> Result<Completion>;
}

/// Classify a model service failure by its message.
///
/// The service reports no structured code we can rely on, so a
/// context-length overflow is recognized from the message text. This is
/// the only place that match happens.
#[must_use]
pub fn classify_failure(message: impl Into<String>) -> SchemaError {
    let message = message.into();
    let lower = message.to_lowercase();
    if lower.contains("context_length_exceeded") || lower.contains("maximum context length") {
        crate::err!(ContextLengthExceeded { message })
    } else {
        crate::err!(Inference { message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::InferredOutput;

    #[test]
    fn test_classify_context_length() {
        let e = classify_failure(
            "400 Bad Request: This model's maximum context length is 128000 tokens. (context_length_exceeded)",
        );
        assert!(e.is_request_too_large());

        let e = classify_failure("Error code: context_length_exceeded");
        assert!(e.is_request_too_large());
    }

    #[test]
    fn test_classify_other_failures() {
        for message in ["429 Too Many Requests: Rate limit reached", "invalid api key", ""] {
            let e = classify_failure(message);
            assert!(!e.is_request_too_large());
            assert!(matches!(e, SchemaError::Inference { .. }));
        }
    }

    #[test]
    fn test_classified_failure_keeps_message() {
        match classify_failure("context_length_exceeded: 130000 tokens") {
            SchemaError::ContextLengthExceeded { message, .. } => {
                assert_eq!(message, "context_length_exceeded: 130000 tokens");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        match classify_failure("503 Service Unavailable") {
            SchemaError::Inference { message, .. } => assert_eq!(message, "503 Service Unavailable"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_completion_into_response() {
        let completion = Completion::text(
            r#"{"outputs":[{"output_name":"vpc_id","output_type":"string"}]}"#,
        );
        let response = completion.into_response().unwrap();
        assert_eq!(response.outputs, vec![InferredOutput::new("vpc_id", "string")]);
    }

    #[test]
    fn test_empty_completion() {
        let err = Completion::default().into_response().unwrap_err();
        assert!(matches!(err, SchemaError::EmptyCompletion { .. }));
    }

    #[test]
    fn test_malformed_completion() {
        let err = Completion::text("not json").into_response().unwrap_err();
        assert!(matches!(err, SchemaError::MalformedResponse { .. }));
    }

    #[test]
    fn test_message_serialization() {
        let value = serde_json::to_value(ChatMessage::system("hi")).unwrap();
        assert_eq!(value, serde_json::json!({ "role": "system", "content": "hi" }));
    }
}
