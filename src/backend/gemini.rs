//! Backend for Google's Gemini `generateContent` API.
//!
//! The prompt goes in a single user turn; the output schema is sent as
//! `generationConfig.responseSchema` with `responseMimeType` set to
//! `application/json`. A 200 reply that carries no usable text (prompt
//! blocked, no candidates, generation stopped early by a safety or token
//! limit) is reported as [`PantryError::BackendError`] with the reason in
//! the body, so it is never mistaken for a model that answered badly.

use super::{pick_metadata, send_json, Backend, GenerateRequest, GenerateResponse};
use crate::error::{PantryError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Backend for Gemini models.
#[derive(Clone)]
pub struct GeminiBackend {
    api_key: String,
}

impl std::fmt::Debug for GeminiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiBackend")
            .field("api_key", &"***")
            .finish()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig<'a>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    response_mime_type: &'static str,
    response_schema: &'a Value,
    temperature: f64,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<ContentResponse>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Debug, Deserialize)]
struct PartResponse {
    #[serde(default)]
    text: String,
}

impl GeminiBackend {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
        }
    }

    fn build_body(request: &GenerateRequest) -> GeminiRequest<'_> {
        GeminiRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part {
                    text: &request.prompt,
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: &request.output_schema,
                temperature: request.config.temperature,
                max_output_tokens: request.config.max_tokens,
            },
        }
    }

    /// Concatenate the text parts of the first candidate.
    fn extract_text(envelope: &Value, status: u16) -> Result<String> {
        let refused = |body: String| PantryError::BackendError {
            status,
            body,
            retry_after: None,
        };

        let parsed: GeminiResponse = serde_json::from_value(envelope.clone())
            .map_err(|e| refused(format!("malformed generateContent envelope: {}", e)))?;

        if let Some(reason) = parsed.prompt_feedback.and_then(|f| f.block_reason) {
            tracing::warn!(reason = %reason, "gemini blocked the prompt");
            return Err(refused(format!("prompt blocked: {}", reason)));
        }

        let candidate = parsed
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| refused("no candidates in reply".to_string()))?;

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();

        match candidate.finish_reason.as_deref() {
            Some(reason) if text.trim().is_empty() && reason != "STOP" => {
                tracing::warn!(reason, "gemini stopped without producing text");
                Err(refused(format!("generation stopped: {}", reason)))
            }
            _ => Ok(text),
        }
    }
}

#[async_trait]
impl Backend for GeminiBackend {
    async fn generate(
        &self,
        client: &Client,
        base_url: &str,
        request: &GenerateRequest,
    ) -> Result<GenerateResponse> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            base_url.trim_end_matches('/'),
            request.model
        );
        let body = Self::build_body(request);
        let req = client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body);
        let (envelope, status) = send_json(req, &url).await?;

        Ok(GenerateResponse {
            text: Self::extract_text(&envelope, status)?,
            status,
            metadata: pick_metadata(&envelope, &["usageMetadata", "modelVersion", "promptFeedback"]),
        })
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}
