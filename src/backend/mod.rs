//! Backend trait and normalized request/response types.
//!
//! The [`Backend`] trait abstracts over text-generation providers. Every
//! call carries the three artifacts a structured generation needs: the
//! operation name, the rendered prompt (with the validated input alongside
//! for providers that want it), and the JSON-Schema of the expected output.
//!
//! ```text
//! flow ──► GenerateRequest ──► Backend::generate() ──► GenerateResponse
//!                                     │
//!              ┌──────────────┬───────┴──────┬──────────────┐
//!        OllamaBackend   GeminiBackend   OpenAiBackend   MockBackend
//!        /api/generate   :generateContent /v1/chat/...   scripted replies
//! ```
//!
//! Backends only report transport outcomes. Connection failures and
//! timeouts become [`PantryError::BackendUnavailable`], non-success statuses
//! become [`PantryError::BackendError`]. Judging the reply text is left to
//! the caller.

pub mod gemini;
pub mod mock;
pub mod ollama;
#[cfg(feature = "openai")]
pub mod openai;

pub use gemini::GeminiBackend;
pub use mock::{MockBackend, MockReply};
pub use ollama::OllamaBackend;
#[cfg(feature = "openai")]
pub use openai::OpenAiBackend;

use crate::config::LlmConfig;
use crate::error::{PantryError, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use std::time::Duration;

/// A normalized generation request, provider-agnostic.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    /// Name of the operation (e.g. `"suggestRecipientMatches"`).
    pub operation: String,

    /// Model identifier (e.g. `"llama3.2:3b"`, `"gemini-2.0-flash"`).
    pub model: String,

    /// The rendered prompt text.
    pub prompt: String,

    /// The validated input value the prompt was rendered from.
    pub input: Value,

    /// JSON-Schema of the expected reply.
    pub output_schema: Value,

    /// Sampling configuration.
    pub config: LlmConfig,
}

/// A normalized generation response.
#[derive(Debug, Clone)]
pub struct GenerateResponse {
    /// The generated text content. May be empty.
    pub text: String,

    /// HTTP status code (for diagnostics/logging).
    pub status: u16,

    /// Provider-specific metadata (token counts, timing, model info).
    pub metadata: Option<Value>,
}

/// Abstraction over text-generation providers.
///
/// This trait is object-safe and designed to be used as `Arc<dyn Backend>`.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Execute one structured generation call.
    async fn generate(
        &self,
        client: &Client,
        base_url: &str,
        request: &GenerateRequest,
    ) -> Result<GenerateResponse>;

    /// Human-readable name for logging and diagnostics.
    fn name(&self) -> &'static str;
}

/// Send a JSON request and return the decoded JSON envelope and status.
pub(crate) async fn send_json(req: RequestBuilder, url: &str) -> Result<(Value, u16)> {
    let resp = req.send().await.map_err(|e| {
        tracing::error!(url, error = %e, "backend request failed");
        PantryError::BackendUnavailable(format!("failed to reach {}: {}", url, e))
    })?;

    let status = resp.status().as_u16();

    if !resp.status().is_success() {
        let retry_after = resp
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_retry_after);
        let body = resp.text().await.unwrap_or_default();
        tracing::error!(url, status, body = %body, "backend returned an error status");
        return Err(PantryError::BackendError {
            status,
            body,
            retry_after,
        });
    }

    let envelope: Value = resp.json().await.map_err(|e| {
        if e.is_timeout() {
            PantryError::BackendUnavailable(format!("timed out reading reply from {}: {}", url, e))
        } else {
            PantryError::BackendError {
                status,
                body: format!("malformed response envelope: {}", e),
                retry_after: None,
            }
        }
    })?;
    Ok((envelope, status))
}

/// Parse a `Retry-After` header value as whole seconds.
pub(crate) fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

/// Copy the listed top-level keys of a provider envelope into a metadata object.
pub(crate) fn pick_metadata(envelope: &Value, keys: &[&str]) -> Option<Value> {
    let mut meta = serde_json::Map::new();
    for key in keys {
        if let Some(v) = envelope.get(*key) {
            meta.insert((*key).to_string(), v.clone());
        }
    }
    if meta.is_empty() {
        None
    } else {
        Some(Value::Object(meta))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Raw HTTP/1.1 response with a correct `Content-Length`.
    pub(crate) fn http_response(status_line: &str, headers: &[&str], body: &str) -> String {
        let mut out = format!("HTTP/1.1 {}\r\n", status_line);
        for header in headers {
            out.push_str(header);
            out.push_str("\r\n");
        }
        out.push_str(&format!(
            "Content-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        ));
        out
    }

    /// Serve `response` to the first connection on a local port and return
    /// the base URL.
    pub(crate) async fn serve_once(response: String) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            read_request(&mut socket).await;
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        });
        format!("http://{}", addr)
    }

    /// Consume headers and body so closing the socket does not reset it.
    async fn read_request(socket: &mut tokio::net::TcpStream) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap_or(0);
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf);
            if let Some(head_end) = text.find("\r\n\r\n") {
                let body_len = text[..head_end]
                    .lines()
                    .filter_map(|l| l.split_once(':'))
                    .find(|(k, _)| k.trim().eq_ignore_ascii_case("content-length"))
                    .and_then(|(_, v)| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= head_end + 4 + body_len {
                    return;
                }
            }
        }
    }

    async fn post_to(base: &str) -> Result<(Value, u16)> {
        let client = Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        let url = format!("{}/api/generate", base);
        send_json(client.post(&url).json(&json!({"prompt": "x"})), &url).await
    }

    #[test]
    fn test_parse_retry_after() {
        assert_eq!(parse_retry_after("30"), Some(Duration::from_secs(30)));
        assert_eq!(parse_retry_after(" 5 "), Some(Duration::from_secs(5)));
        assert_eq!(parse_retry_after("Wed, 21 Oct 2015 07:28:00 GMT"), None);
    }

    #[test]
    fn test_pick_metadata() {
        let envelope = json!({"model": "m", "eval_count": 12, "response": "..."});
        let meta = pick_metadata(&envelope, &["model", "eval_count", "missing"]).unwrap();
        assert_eq!(meta, json!({"model": "m", "eval_count": 12}));
        assert!(pick_metadata(&envelope, &["nope"]).is_none());
    }

    #[tokio::test]
    async fn test_unreachable_host_is_unavailable() {
        let client = Client::builder()
            .timeout(Duration::from_secs(2))
            .build()
            .unwrap();
        let url = "http://127.0.0.1:9/api/generate";
        let err = send_json(client.post(url).json(&json!({})), url)
            .await
            .unwrap_err();
        assert!(matches!(err, PantryError::BackendUnavailable(_)));
    }

    #[tokio::test]
    async fn test_error_status_carries_body_and_retry_after() {
        let base = serve_once(http_response(
            "503 Service Unavailable",
            &["Retry-After: 7"],
            "overloaded",
        ))
        .await;
        match post_to(&base).await {
            Err(PantryError::BackendError {
                status,
                body,
                retry_after,
            }) => {
                assert_eq!(status, 503);
                assert_eq!(body, "overloaded");
                assert_eq!(retry_after, Some(Duration::from_secs(7)));
            }
            other => panic!("expected backend error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_success_with_non_json_body_is_backend_error() {
        let base = serve_once(http_response("200 OK", &["Content-Type: application/json"], "not json")).await;
        match post_to(&base).await {
            Err(PantryError::BackendError { status, body, .. }) => {
                assert_eq!(status, 200);
                assert!(body.starts_with("malformed response envelope"), "{}", body);
            }
            other => panic!("expected backend error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_success_returns_envelope_and_status() {
        let base = serve_once(http_response("200 OK", &[], r#"{"response": "[]"}"#)).await;
        let (envelope, status) = post_to(&base).await.unwrap();
        assert_eq!(status, 200);
        assert_eq!(envelope, json!({"response": "[]"}));
    }
}
