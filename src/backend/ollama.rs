//! Backend for Ollama's native API.
//!
//! [`OllamaBackend`] posts to `/api/generate` with `stream: false` and passes
//! the expected output schema as the `format` field, which Ollama uses to
//! constrain decoding to matching JSON.

use super::{pick_metadata, send_json, Backend, GenerateRequest, GenerateResponse};
use crate::error::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

/// Backend for a local or remote Ollama server.
#[derive(Debug, Clone, Default)]
pub struct OllamaBackend;

impl OllamaBackend {
    /// Build the Ollama `options` object from the LlmConfig.
    fn build_options(request: &GenerateRequest) -> Value {
        let mut opts = json!({
            "temperature": request.config.temperature,
            "num_predict": request.config.max_tokens,
        });
        if let Some(ref custom) = request.config.options {
            if let (Some(base), Some(extra)) = (opts.as_object_mut(), custom.as_object()) {
                for (k, v) in extra {
                    base.insert(k.clone(), v.clone());
                }
            }
        }
        opts
    }

    /// Build the JSON body for `/api/generate`.
    fn build_body(request: &GenerateRequest) -> Value {
        json!({
            "model": request.model,
            "prompt": request.prompt,
            "stream": false,
            "format": request.output_schema,
            "options": Self::build_options(request),
        })
    }
}

#[async_trait]
impl Backend for OllamaBackend {
    async fn generate(
        &self,
        client: &Client,
        base_url: &str,
        request: &GenerateRequest,
    ) -> Result<GenerateResponse> {
        let url = format!("{}/api/generate", base_url.trim_end_matches('/'));
        let body = Self::build_body(request);
        let (envelope, status) = send_json(client.post(&url).json(&body), &url).await?;

        let text = envelope
            .get("response")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();

        Ok(GenerateResponse {
            text,
            status,
            metadata: pick_metadata(
                &envelope,
                &["model", "total_duration", "eval_count", "eval_duration", "prompt_eval_count"],
            ),
        })
    }

    fn name(&self) -> &'static str {
        "ollama"
    }
}
