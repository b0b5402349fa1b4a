//! Backend for OpenAI-compatible APIs.
//!
//! Covers OpenAI, vLLM, llama.cpp server, LM Studio, Groq, and Ollama's
//! `/v1/` endpoint. Uses `/v1/chat/completions` with a `json_schema`
//! response format. Strict mode is off because strict schemas may not have
//! an array at the root, which the match reply does.

use super::{pick_metadata, send_json, Backend, GenerateRequest, GenerateResponse};
use crate::error::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

/// Backend for any OpenAI-compatible API.
#[derive(Clone, Default)]
pub struct OpenAiBackend {
    /// Optional API key. If set, sent as `Authorization: Bearer {key}`.
    api_key: Option<String>,
}

impl std::fmt::Debug for OpenAiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiBackend")
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .finish()
    }
}

impl OpenAiBackend {
    pub fn new() -> Self {
        Self { api_key: None }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    fn build_body(request: &GenerateRequest) -> Value {
        json!({
            "model": request.model,
            "messages": [{"role": "user", "content": request.prompt}],
            "temperature": request.config.temperature,
            "max_tokens": request.config.max_tokens,
            "stream": false,
            "response_format": {
                "type": "json_schema",
                "json_schema": {
                    "name": request.operation,
                    "schema": request.output_schema,
                    "strict": false,
                },
            },
        })
    }
}

#[async_trait]
impl Backend for OpenAiBackend {
    async fn generate(
        &self,
        client: &Client,
        base_url: &str,
        request: &GenerateRequest,
    ) -> Result<GenerateResponse> {
        let url = format!("{}/v1/chat/completions", base_url.trim_end_matches('/'));
        let mut req = client.post(&url).json(&Self::build_body(request));
        if let Some(ref key) = self.api_key {
            req = req.header("Authorization", format!("Bearer {}", key));
        }
        let (envelope, status) = send_json(req, &url).await?;

        let text = envelope
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();

        Ok(GenerateResponse {
            text,
            status,
            metadata: pick_metadata(&envelope, &["id", "model", "usage"]),
        })
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LlmConfig;

    #[test]
    fn test_openai_body() {
        let request = GenerateRequest {
            operation: "assessRecipientNeeds".into(),
            model: "gpt-4o-mini".into(),
            prompt: "Assess".into(),
            input: json!({}),
            output_schema: json!({"type": "object"}),
            config: LlmConfig::default(),
        };
        let body = OpenAiBackend::build_body(&request);
        assert_eq!(body["messages"][0]["content"], "Assess");
        assert_eq!(body["response_format"]["type"], "json_schema");
        assert_eq!(body["response_format"]["json_schema"]["name"], "assessRecipientNeeds");
        assert_eq!(body["response_format"]["json_schema"]["schema"]["type"], "object");
    }

    #[test]
    fn test_debug_masks_key() {
        let backend = OpenAiBackend::new().with_api_key("sk-abcdef123");
        assert!(!format!("{:?}", backend).contains("abcdef"));
    }
}
