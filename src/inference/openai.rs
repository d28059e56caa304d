//! OpenAI chat completions client.

use crate::config::Config;
use crate::error::Result;
use crate::inference::{classify_failure, ChatMessage, Completion, InferenceClient, ResponseFormat};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    response_format: WireResponseFormat<'a>,
}

#[derive(Serialize)]
struct WireResponseFormat<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    json_schema: &'a ResponseFormat,
}

#[derive(Deserialize, Debug)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize, Debug)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize, Debug)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ApiErrorBody {
    error: ApiError,
}

#[derive(Deserialize, Debug)]
struct ApiError {
    message: String,
    #[serde(default)]
    code: Option<String>,
}

/// Chat completions client using `response_format: json_schema`.
pub struct OpenAiClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl OpenAiClient {
    /// Create a client. The API key is passed in explicitly; see
    /// [`Config::api_key`].
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &Config, api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.inference.timeout_secs))
            .user_agent(concat!("tfmodule-schema/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| crate::err!(Http {
                message: format!("Failed to create HTTP client: {e}"),
                status_code: None,
            }))?;

        Ok(Self {
            client,
            base_url: config.inference.api_base_url.trim_end_matches('/').to_string(),
            model: config.inference.model.clone(),
            api_key: api_key.into(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl InferenceClient for OpenAiClient {
    async fn complete(&self, conversation: &[ChatMessage], format: &ResponseFormat) -> Result<Completion> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages: conversation,
            response_format: WireResponseFormat {
                kind: "json_schema",
                json_schema: format,
            },
        };

        tracing::debug!(
            model = %self.model,
            messages = conversation.len(),
            "Sending chat completion request"
        );

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| classify_failure(format!("Request to model service failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<ApiErrorBody>(&body) {
                Ok(ApiErrorBody { error: ApiError { message, code: Some(code) } }) => {
                    format!("{status}: {message} ({code})")
                }
                Ok(ApiErrorBody { error: ApiError { message, code: None } }) => format!("{status}: {message}"),
                Err(_) => format!("{status}: {body}"),
            };
            return Err(classify_failure(message));
        }

        let body: ChatCompletionResponse = response.json().await.map_err(|e| crate::err!(MalformedResponse {
            message: format!("Invalid chat completion body: {e}"),
        }))?;

        let mut parts = Vec::new();
        let mut refusal = None;
        for choice in body.choices {
            match choice.message.content {
                Some(content) if !content.is_empty() => parts.push(content),
                _ => refusal = refusal.or(choice.message.refusal),
            }
        }

        if parts.is_empty() {
            if let Some(refusal) = refusal {
                return Err(classify_failure(format!("Model refused: {refusal}")));
            }
        }

        tracing::debug!(parts = parts.len(), "Chat completion received");
        Ok(Completion { parts })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SchemaError;
    use crate::inference::InferenceRequestBuilder;
    use serde_json::json;
    use wiremock::{matchers::*, Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> OpenAiClient {
        let mut config = Config::default();
        config.inference.api_base_url = format!("{}/v1/", server.uri());
        OpenAiClient::new(&config, "sk-test").unwrap()
    }

    fn request_parts() -> (Vec<ChatMessage>, ResponseFormat) {
        let builder = InferenceRequestBuilder::new(&Config::default());
        (builder.build(&[]), builder.response_format())
    }

    #[tokio::test]
    async fn test_structured_completion() -> crate::Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "model": "gpt-4o",
                "response_format": {
                    "type": "json_schema",
                    "json_schema": { "name": "output_schema", "strict": true }
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{
                    "index": 0,
                    "message": {
                        "role": "assistant",
                        "content": "{\"outputs\":[{\"output_name\":\"vpc_id\",\"output_type\":\"string\"}]}",
                        "refusal": null
                    }
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let (conversation, format) = request_parts();
        let completion = client_for(&server).complete(&conversation, &format).await?;
        let response = completion.into_response()?;
        assert_eq!(response.outputs.len(), 1);
        assert_eq!(response.outputs[0].output_name, "vpc_id");
        Ok(())
    }

    #[tokio::test]
    async fn test_context_length_error_is_classified() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": {
                    "message": "This model's maximum context length is 128000 tokens. However, your messages resulted in 250000 tokens.",
                    "type": "invalid_request_error",
                    "param": "messages",
                    "code": "context_length_exceeded"
                }
            })))
            .mount(&server)
            .await;

        let (conversation, format) = request_parts();
        let err = client_for(&server).complete(&conversation, &format).await.unwrap_err();
        assert!(err.is_request_too_large());
    }

    #[tokio::test]
    async fn test_other_error_is_not_too_large() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": { "message": "Incorrect API key provided", "code": "invalid_api_key" }
            })))
            .mount(&server)
            .await;

        let (conversation, format) = request_parts();
        let err = client_for(&server).complete(&conversation, &format).await.unwrap_err();
        assert!(matches!(err, SchemaError::Inference { .. }));
    }

    #[tokio::test]
    async fn test_no_choices_is_empty_completion() -> crate::Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
            .mount(&server)
            .await;

        let (conversation, format) = request_parts();
        let completion = client_for(&server).complete(&conversation, &format).await?;
        assert!(completion.parts.is_empty());
        assert!(matches!(completion.into_response(), Err(SchemaError::EmptyCompletion { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_refusal_is_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "role": "assistant", "content": null, "refusal": "I can't help with that." } }]
            })))
            .mount(&server)
            .await;

        let (conversation, format) = request_parts();
        let err = client_for(&server).complete(&conversation, &format).await.unwrap_err();
        assert!(err.to_string().contains("I can't help with that."));
    }
}
