//! Sampling configuration and backend selection.
//!
//! [`LlmConfig`] travels with every request; [`BackendKind`] names a
//! provider and supplies its default base URL and model.

use crate::error::PantryError;
use serde_json::Value;
use std::str::FromStr;

/// Sampling configuration for generation requests.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Temperature (0.0 = deterministic, 1.0 = creative).
    pub temperature: f64,

    /// Maximum tokens to generate.
    pub max_tokens: u32,

    /// Custom options merged into the Ollama options object.
    pub options: Option<Value>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 2048,
            options: None,
        }
    }
}

impl LlmConfig {
    pub fn with_temperature(mut self, temp: f64) -> Self {
        self.temperature = temp;
        self
    }

    pub fn with_max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = tokens;
        self
    }

    pub fn with_options(mut self, options: Value) -> Self {
        self.options = Some(options);
        self
    }
}

/// Which provider a context talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Ollama,
    Gemini,
    OpenAi,
    /// Always replies `[]`, so every call takes the fallback path.
    Mock,
}

impl BackendKind {
    pub fn default_base_url(&self) -> &'static str {
        match self {
            BackendKind::Ollama => "http://localhost:11434",
            BackendKind::Gemini => crate::backend::gemini::DEFAULT_BASE_URL,
            BackendKind::OpenAi => "https://api.openai.com",
            BackendKind::Mock => "http://unused",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            BackendKind::Ollama => "llama3.2:3b",
            BackendKind::Gemini => "gemini-2.0-flash",
            BackendKind::OpenAi => "gpt-4o-mini",
            BackendKind::Mock => "mock",
        }
    }
}

impl FromStr for BackendKind {
    type Err = PantryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ollama" => Ok(BackendKind::Ollama),
            "gemini" | "googleai" => Ok(BackendKind::Gemini),
            "openai" => Ok(BackendKind::OpenAi),
            "mock" => Ok(BackendKind::Mock),
            other => Err(PantryError::InvalidConfig(format!(
                "unknown backend '{}' (expected ollama, gemini, openai or mock)",
                other
            ))),
        }
    }
}
