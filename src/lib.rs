//! # PantryLink
//!
//! Recipient matching and needs assessment for food bank inventory, backed
//! by a structured text-generation model.
//!
//! Every call follows the same path: a validated **request** is rendered
//! into a **prompt**, sent with the expected output **schema** to a
//! **backend**, and the reply is **parsed** and checked against that schema.
//! When the backend answers with something unusable, the matching and
//! assessment flows return a fixed **fallback** result marked as degraded.
//! When the backend cannot be reached, the caller gets an error.
//!
//! ## Core Concepts
//!
//! - **[`MatchRequest`]**, **[`AssessmentRequest`]**, **[`SuitabilityRequest`]**:
//!   immutable, validated inputs.
//! - **[`ExecCtx`]**: shared execution context (HTTP client, backend, model,
//!   fallback policy, optional event handler).
//! - **[`Backend`]**: object-safe trait over providers (Ollama, Gemini,
//!   OpenAI-compatible, and a scripted [`MockBackend`]).
//! - **[`flow`]**: the entry points [`suggest_matches`], [`assess_needs`] and
//!   [`analyze_suitability`], each returning a [`FlowOutcome`].
//! - **[`InvocationTrigger`]**: single-flight guard for UI-triggered calls.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pantrylink::{suggest_matches, ExecCtx, MatchRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let ctx = ExecCtx::builder("http://localhost:11434").build()?;
//!
//!     let request = MatchRequest::builder()
//!         .food_item_id("item-001")
//!         .expiration_date("2024-08-01")
//!         .dietary_tags(["vegetarian"])
//!         .weight_kg(5.0)
//!         .pickup_location(40.0, -75.0)
//!         .build()?;
//!
//!     let outcome = suggest_matches(&ctx, &request).await?;
//!     for m in outcome.value.matches() {
//!         println!("{} {}/100: {}", m.recipient_id, m.match_score, m.reason);
//!     }
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod events;
pub mod exec_ctx;
pub mod fallback;
pub mod flow;
pub mod inventory;
pub mod invocation;
pub mod parsing;
pub mod prompt;
pub mod request;
pub mod schema;
pub mod session;
pub mod types;

pub use backend::{Backend, GeminiBackend, MockBackend, MockReply, OllamaBackend};
#[cfg(feature = "openai")]
pub use backend::OpenAiBackend;
pub use config::{BackendKind, LlmConfig};
pub use diagnostics::FlowDiagnostics;
pub use error::{PantryError, Result};
pub use exec_ctx::{ExecCtx, ExecCtxBuilder};
pub use fallback::FallbackPolicy;
pub use flow::{
    analyze_suitability, assess_needs, suggest_matches, suggest_matches_for_item, Flow, FlowOutcome,
};
pub use inventory::Inventory;
pub use invocation::{Fired, InvocationState, InvocationTrigger};
pub use request::{AssessmentRequest, MatchRequest, MatchRequestBuilder, SuitabilityRequest};
pub use schema::Schema;
pub use session::{Role, Session};
pub use types::{
    AssessmentResult, FoodItem, FoodItemStatus, GeoPoint, MatchResult, Recipient, RecipientMatch,
    SuitabilityResult, Urgency,
};
