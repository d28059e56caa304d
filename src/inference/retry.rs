//! Single-shot degradation for oversized requests.
//!
//! Output types live almost entirely in `outputs.tf`, so when the whole
//! module does not fit in the model's context the request is repeated once
//! with only those files. There is no further retry or backoff.

use crate::error::Result;
use crate::inference::{InferenceClient, InferenceRequestBuilder};
use crate::types::{InferenceResponse, TerraformFile};

/// Result of an inference run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferenceOutcome {
    /// The model's structured response
    pub response: InferenceResponse,
    /// Whether the response came from the narrowed retry
    pub degraded: bool,
}

/// Retries once with `outputs.tf` files after a context-length failure.
#[derive(Debug, Clone, Copy, Default)]
pub struct DegradedRetryPolicy;

impl DegradedRetryPolicy {
    /// Keep only files whose path ends with `outputs.tf`, in order.
    #[must_use]
    pub fn narrow(&self, files: &[TerraformFile]) -> Vec<TerraformFile> {
        files.iter().filter(|f| f.is_outputs_file()).cloned().collect()
    }

    /// Run inference over `files`, falling back to the narrowed file set
    /// once if the first request is too large.
    ///
    /// # Errors
    ///
    /// Returns the first request's error unless it was a context-length
    /// overflow; otherwise the narrowed request's error. If no `outputs.tf`
    /// file exists the first overflow is returned without a retry.
    pub async fn run<C>(
        &self,
        client: &C,
        builder: &InferenceRequestBuilder,
        files: &[TerraformFile],
    ) -> Result<InferenceOutcome>
    where
        C: InferenceClient + ?Sized,
    {
        match request(client, builder, files).await {
            Ok(response) => Ok(InferenceOutcome { response, degraded: false }),
            Err(e) if e.is_request_too_large() => {
                let narrowed = self.narrow(files);
                if narrowed.is_empty() {
                    tracing::warn!(error = %e, "Request too large and no outputs.tf file to fall back to");
                    return Err(e);
                }

                tracing::warn!(
                    files = files.len(),
                    narrowed = narrowed.len(),
                    "Request too large, retrying with outputs.tf files only"
                );
                let response = request(client, builder, &narrowed).await?;
                Ok(InferenceOutcome { response, degraded: true })
            }
            Err(e) => Err(e),
        }
    }
}

async fn request<C>(client: &C, builder: &InferenceRequestBuilder, files: &[TerraformFile]) -> Result<InferenceResponse>
where
    C: InferenceClient + ?Sized,
{
    let conversation = builder.build(files);
    let completion = client.complete(&conversation, &builder.response_format()).await?;
    completion.into_response()
}
