//! Mock backend for testing without a live model.
//!
//! [`MockBackend`] plays back scripted replies in order, cycling when it
//! runs out, and records every request it receives. Replies can be text or
//! injected transport failures.
//!
//! # Example
//!
//! ```
//! use pantrylink::backend::{MockBackend, MockReply};
//!
//! let ok = MockBackend::fixed("[]");
//! let down = MockBackend::new(vec![MockReply::Unavailable("connection refused".into())]);
//! assert_eq!(ok.calls(), 0);
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::Client;

use super::{Backend, GenerateRequest, GenerateResponse};
use crate::error::{PantryError, Result};

/// One scripted outcome.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// A successful reply with this text.
    Text(String),
    /// A network-level failure.
    Unavailable(String),
    /// A non-success HTTP status with a body.
    Status(u16, String),
}

/// A test backend that returns scripted replies in order.
#[derive(Debug)]
pub struct MockBackend {
    replies: Vec<MockReply>,
    index: AtomicUsize,
    requests: Mutex<Vec<GenerateRequest>>,
}

impl MockBackend {
    /// Replies are returned in order. When exhausted, cycles from the beginning.
    pub fn new(replies: Vec<MockReply>) -> Self {
        assert!(!replies.is_empty(), "MockBackend requires at least one reply");
        Self {
            replies,
            index: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A mock that always answers with the same text.
    pub fn fixed(text: impl Into<String>) -> Self {
        Self::new(vec![MockReply::Text(text.into())])
    }

    /// A mock whose backend is always unreachable.
    pub fn unavailable() -> Self {
        Self::new(vec![MockReply::Unavailable("connection refused".into())])
    }

    /// Number of `generate` calls received so far.
    pub fn calls(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }

    /// The most recent request, if any.
    pub fn last_request(&self) -> Option<GenerateRequest> {
        self.requests.lock().ok().and_then(|r| r.last().cloned())
    }

    fn next_reply(&self) -> MockReply {
        let idx = self.index.fetch_add(1, Ordering::Relaxed) % self.replies.len();
        self.replies[idx].clone()
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn generate(
        &self,
        _client: &Client,
        _base_url: &str,
        request: &GenerateRequest,
    ) -> Result<GenerateResponse> {
        if let Ok(mut seen) = self.requests.lock() {
            seen.push(request.clone());
        }
        match self.next_reply() {
            MockReply::Text(text) => Ok(GenerateResponse {
                text,
                status: 200,
                metadata: None,
            }),
            MockReply::Unavailable(reason) => Err(PantryError::BackendUnavailable(reason)),
            MockReply::Status(status, body) => Err(PantryError::BackendError {
                status,
                body,
                retry_after: None,
            }),
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
