//! Streaming client for the Vertex AI `streamGenerateContent` endpoint.

use std::sync::Arc;
use std::time::Duration;

use bytes::BytesMut;
use futures::StreamExt;

use super::types::{CandidateChunk, GenerateContentRequest};
use super::{TextGenerationRequest, TextGenerationResponse};
use crate::auth::TokenProvider;
use crate::config::Settings;
use crate::error::{Error, Result};

/// Compute the upstream endpoint URL for a published model.
///
/// Pure data derived from configuration; stable for the client's lifetime.
pub fn endpoint_url(project: &str, region: &str, model: &str) -> String {
    format!(
        "https://{region}-aiplatform.googleapis.com/v1/projects/{project}/locations/{region}/publishers/google/models/{model}:streamGenerateContent"
    )
}

/// Client for one published Gemini model.
///
/// Holds the process-wide connection pool and credential handle; safe to
/// share across concurrent requests. Each `predict` call is independent and
/// keeps no state beyond its local buffer.
pub struct GeminiClient {
    http: reqwest::Client,
    tokens: Arc<dyn TokenProvider>,
    url: String,
    timeout: Duration,
}

impl GeminiClient {
    pub fn new(settings: &Settings, http: reqwest::Client, tokens: Arc<dyn TokenProvider>) -> Self {
        Self::with_url(
            endpoint_url(&settings.project_id, &settings.region, &settings.model_id),
            http,
            tokens,
            settings.timeout,
        )
    }

    /// Client against an explicit endpoint URL. Tests point this at a mock
    /// server.
    pub fn with_url(
        url: String,
        http: reqwest::Client,
        tokens: Arc<dyn TokenProvider>,
        timeout: Duration,
    ) -> Self {
        Self {
            http,
            tokens,
            url,
            timeout,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Perform exactly one upstream generation call and reassemble the
    /// streamed response.
    ///
    /// The upstream emits one JSON array progressively, with no framing
    /// between chunks, so the body is drained completely before parsing.
    /// The timeout spans the whole call, including the drain; on expiry the
    /// partial buffer is abandoned.
    pub async fn predict(&self, request: &TextGenerationRequest) -> Result<TextGenerationResponse> {
        let token = self.tokens.token().await?;
        let body = GenerateContentRequest::from_request(request);

        let response = self
            .http
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .bearer_auth(token.expose_secret())
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| Error::UpstreamTransport(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(Error::UpstreamTransport(format!(
                "upstream returned {status}: {error_body}"
            )));
        }

        let mut buffer = BytesMut::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk =
                chunk.map_err(|e| Error::UpstreamTransport(format!("stream read failed: {e}")))?;
            buffer.extend_from_slice(&chunk);
        }

        let text = assemble_text(&buffer)?;

        Ok(TextGenerationResponse {
            input_chars: request.prompt.chars().count(),
            output_chars: text.chars().count(),
            text,
        })
    }
}

/// Parse the fully drained body as a JSON array of candidate chunks and
/// concatenate each chunk's first candidate's first part, in array order.
fn assemble_text(buffer: &[u8]) -> Result<String> {
    let chunks: Vec<CandidateChunk> = serde_json::from_slice(buffer).map_err(|e| {
        Error::UpstreamFormat(format!("response is not a candidate-chunk array: {e}"))
    })?;

    let mut text = String::new();
    for chunk in chunks {
        if let Some(candidate) = chunk.candidates.into_iter().next() {
            if let Some(part) = candidate.content.parts.into_iter().next() {
                text.push_str(&part.text);
            }
        }
    }
    Ok(text)
}
