//! Execution context shared across flow invocations.
//!
//! [`ExecCtx`] carries the HTTP client, backend, endpoint, model, sampling
//! configuration, fallback policy and optional event handler. Build it once
//! and share it across every flow call.

use crate::backend::{Backend, GeminiBackend, MockBackend, OllamaBackend};
#[cfg(feature = "openai")]
use crate::backend::OpenAiBackend;
use crate::config::{BackendKind, LlmConfig};
use crate::error::{PantryError, Result};
use crate::events::EventHandler;
use crate::fallback::FallbackPolicy;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

/// Shared execution context for flow invocations.
///
/// # Example
///
/// ```
/// use pantrylink::{ExecCtx, FallbackPolicy};
///
/// let ctx = ExecCtx::builder("http://localhost:11434")
///     .model("llama3.2:3b")
///     .fallback(FallbackPolicy::Error)
///     .build()
///     .unwrap();
/// assert_eq!(ctx.model, "llama3.2:3b");
/// ```
pub struct ExecCtx {
    /// HTTP client (cheap to clone -- uses `Arc` internally).
    pub client: Client,
    /// Base URL for the provider (e.g. `http://localhost:11434`).
    pub base_url: String,
    /// Text-generation backend. Default: [`OllamaBackend`].
    pub backend: Arc<dyn Backend>,
    /// Model identifier sent with every request.
    pub model: String,
    /// Sampling configuration sent with every request.
    pub config: LlmConfig,
    /// What to do with empty or invalid replies. Default: substitute.
    pub fallback: FallbackPolicy,
    /// Optional event handler for lifecycle events.
    pub event_handler: Option<Arc<dyn EventHandler>>,
}

impl ExecCtx {
    /// Create a new builder.
    pub fn builder(base_url: impl Into<String>) -> ExecCtxBuilder {
        ExecCtxBuilder {
            client: None,
            base_url: base_url.into(),
            backend: None,
            model: None,
            config: None,
            fallback: None,
            event_handler: None,
            timeout: None,
        }
    }
}

impl std::fmt::Debug for ExecCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecCtx")
            .field("base_url", &self.base_url)
            .field("backend", &self.backend.name())
            .field("model", &self.model)
            .field("config", &self.config)
            .field("fallback", &self.fallback)
            .field("has_event_handler", &self.event_handler.is_some())
            .finish()
    }
}

/// Builder for [`ExecCtx`].
pub struct ExecCtxBuilder {
    client: Option<Client>,
    base_url: String,
    backend: Option<Arc<dyn Backend>>,
    model: Option<String>,
    config: Option<LlmConfig>,
    fallback: Option<FallbackPolicy>,
    event_handler: Option<Arc<dyn EventHandler>>,
    timeout: Option<Duration>,
}

impl ExecCtxBuilder {
    /// Configure a builder from `PANTRYLINK_*` environment variables.
    ///
    /// | Variable | Meaning | Default |
    /// |---|---|---|
    /// | `PANTRYLINK_BACKEND` | `ollama`, `gemini`, `openai` or `mock` | `ollama` |
    /// | `PANTRYLINK_BASE_URL` | provider endpoint | per backend |
    /// | `PANTRYLINK_MODEL` | model identifier | per backend |
    /// | `PANTRYLINK_API_KEY` | key for Gemini or OpenAI | none |
    /// | `PANTRYLINK_TIMEOUT_SECS` | request timeout | 60 |
    /// | `PANTRYLINK_FALLBACK` | `substitute` or `error` | `substitute` |
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let kind = match var("PANTRYLINK_BACKEND") {
            Some(raw) => raw.parse::<BackendKind>()?,
            None => BackendKind::Ollama,
        };
        let base_url = var("PANTRYLINK_BASE_URL").unwrap_or_else(|| kind.default_base_url().to_string());
        let api_key = var("PANTRYLINK_API_KEY");

        let backend: Arc<dyn Backend> = match kind {
            BackendKind::Ollama => Arc::new(OllamaBackend),
            BackendKind::Gemini => {
                let key = api_key.ok_or_else(|| {
                    PantryError::InvalidConfig("PANTRYLINK_API_KEY is required for gemini".into())
                })?;
                Arc::new(GeminiBackend::new(key))
            }
            #[cfg(feature = "openai")]
            BackendKind::OpenAi => match api_key {
                Some(key) => Arc::new(OpenAiBackend::new().with_api_key(key)),
                None => Arc::new(OpenAiBackend::new()),
            },
            #[cfg(not(feature = "openai"))]
            BackendKind::OpenAi => {
                return Err(PantryError::InvalidConfig(
                    "the openai backend requires the `openai` feature".into(),
                ))
            }
            BackendKind::Mock => Arc::new(MockBackend::fixed("[]")),
        };

        let mut builder = ExecCtx::builder(base_url)
            .backend(backend)
            .model(var("PANTRYLINK_MODEL").unwrap_or_else(|| kind.default_model().to_string()));

        if let Some(raw) = var("PANTRYLINK_TIMEOUT_SECS") {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                PantryError::InvalidConfig(format!("PANTRYLINK_TIMEOUT_SECS '{}' is not a number", raw))
            })?;
            builder = builder.timeout(Duration::from_secs(secs));
        }
        if let Some(raw) = var("PANTRYLINK_FALLBACK") {
            builder = builder.fallback(raw.parse()?);
        }
        Ok(builder)
    }

    /// Set the HTTP client. If not set, a default client is created.
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Set the backend. Default: [`OllamaBackend`].
    pub fn backend(mut self, backend: Arc<dyn Backend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Use Google Gemini with the given API key.
    pub fn gemini(mut self, api_key: impl Into<String>) -> Self {
        self.backend = Some(Arc::new(GeminiBackend::new(api_key)));
        self
    }

    /// Use the OpenAI-compatible backend with API key authentication.
    #[cfg(feature = "openai")]
    pub fn openai_with_key(mut self, api_key: impl Into<String>) -> Self {
        self.backend = Some(Arc::new(OpenAiBackend::new().with_api_key(api_key)));
        self
    }

    /// Set the model. Default: the backend's usual model.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the sampling configuration. Default: [`LlmConfig::default()`].
    pub fn config(mut self, config: LlmConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the fallback policy. Default: [`FallbackPolicy::Substitute`].
    pub fn fallback(mut self, policy: FallbackPolicy) -> Self {
        self.fallback = Some(policy);
        self
    }

    /// Set the event handler.
    pub fn event_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.event_handler = Some(handler);
        self
    }

    /// Set the request timeout. Default: 60 seconds.
    ///
    /// Ignored when a custom `Client` is provided via `.client()`.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the execution context.
    pub fn build(self) -> Result<ExecCtx> {
        let client = match self.client {
            Some(client) => client,
            None => Client::builder()
                .timeout(self.timeout.unwrap_or(Duration::from_secs(60)))
                .build()
                .map_err(|e| PantryError::InvalidConfig(format!("failed to build HTTP client: {}", e)))?,
        };
        let backend = self.backend.unwrap_or_else(|| Arc::new(OllamaBackend));
        let model = match self.model {
            Some(model) => model,
            None => backend
                .name()
                .parse::<BackendKind>()
                .map(|kind| kind.default_model().to_string())
                .unwrap_or_default(),
        };
        if model.trim().is_empty() {
            return Err(PantryError::InvalidConfig(format!(
                "no model configured for backend '{}'",
                backend.name()
            )));
        }

        Ok(ExecCtx {
            client,
            base_url: normalize_base_url(&self.base_url),
            backend,
            model,
            config: self.config.unwrap_or_default(),
            fallback: self.fallback.unwrap_or_default(),
            event_handler: self.event_handler,
        })
    }
}

/// Strip known provider path suffixes from a base URL.
/// This prevents double-pathing when backends append their own paths.
/// e.g., "https://api.openai.com/v1" -> "https://api.openai.com"
/// e.g., "http://localhost:11434/api" -> "http://localhost:11434"
fn normalize_base_url(url: &str) -> String {
    let trimmed = url.trim_end_matches('/');
    // Longest first.
    for suffix in &[
        "/v1/chat/completions",
        "/v1/chat",
        "/v1beta",
        "/v1",
        "/api/generate",
        "/api",
    ] {
        if let Some(stripped) = trimmed.strip_suffix(suffix) {
            return stripped.to_string();
        }
    }
    trimmed.to_string()
}
