//! One structured generation call, end to end.
//!
//! A [`Flow`] names an operation and ties together its request type, its
//! input and output schemas, its prompt template and its canned fallback.
//! [`run`] drives a flow through the fixed sequence
//!
//! ```text
//! request ──► input schema ──► prompt ──► Backend::generate ──► extract_json
//!                                                                   │
//!                      caller ◄── decode ◄── output schema ◄────────┘
//! ```
//!
//! Transport failures surface as errors and are never replaced. Content
//! failures (empty reply, unparseable JSON, schema violation) are replaced
//! by the flow's fallback when the context's [`FallbackPolicy`] is
//! `Substitute` and the flow has one; the outcome is then marked degraded.

use crate::backend::GenerateRequest;
use crate::diagnostics::FlowDiagnostics;
use crate::error::{PantryError, Result};
use crate::events::{emit, Event};
use crate::exec_ctx::ExecCtx;
use crate::fallback::{self, FallbackPolicy};
use crate::parsing::{extract_json, is_blank};
use crate::prompt;
use crate::request::{schema_to_validation, AssessmentRequest, MatchRequest, SuitabilityRequest};
use crate::schema::{self, Schema};
use crate::session::Session;
use crate::types::{AssessmentResult, FoodItem, MatchResult, SuitabilityResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Instant;

/// A named structured-generation operation.
pub trait Flow {
    type Input: Serialize;
    type Output: DeserializeOwned;

    /// Operation name sent to the backend.
    const OPERATION: &'static str;

    fn input_schema() -> Schema;

    fn output_schema() -> Schema;

    fn render_prompt(input: &Self::Input) -> String;

    /// Result to use when the reply is empty or invalid. `None` means the
    /// content error is returned instead.
    fn fallback() -> Option<Self::Output> {
        None
    }
}

/// Suggest recipients for one food item.
pub struct MatchFlow;

impl Flow for MatchFlow {
    type Input = MatchRequest;
    type Output = MatchResult;
    const OPERATION: &'static str = "suggestRecipientMatches";

    fn input_schema() -> Schema {
        schema::match_input_schema()
    }

    fn output_schema() -> Schema {
        schema::match_output_schema()
    }

    fn render_prompt(input: &MatchRequest) -> String {
        prompt::render_match_prompt(input)
    }

    fn fallback() -> Option<MatchResult> {
        Some(fallback::match_fallback())
    }
}

/// Turn a free-text needs description into structured needs.
pub struct AssessmentFlow;

impl Flow for AssessmentFlow {
    type Input = AssessmentRequest;
    type Output = AssessmentResult;
    const OPERATION: &'static str = "assessRecipientNeeds";

    fn input_schema() -> Schema {
        schema::assessment_input_schema()
    }

    fn output_schema() -> Schema {
        schema::assessment_output_schema()
    }

    fn render_prompt(input: &AssessmentRequest) -> String {
        prompt::render_assessment_prompt(input)
    }

    fn fallback() -> Option<AssessmentResult> {
        Some(fallback::assessment_fallback())
    }
}

/// Score how well a set of items fits one recipient. No fallback.
pub struct SuitabilityFlow;

impl Flow for SuitabilityFlow {
    type Input = SuitabilityRequest;
    type Output = SuitabilityResult;
    const OPERATION: &'static str = "analyzeRecipientNeeds";

    fn input_schema() -> Schema {
        schema::suitability_input_schema()
    }

    fn output_schema() -> Schema {
        schema::suitability_output_schema()
    }

    fn render_prompt(input: &SuitabilityRequest) -> String {
        prompt::render_suitability_prompt(input)
    }
}

/// A flow result and how it was obtained.
#[derive(Debug, Clone)]
pub struct FlowOutcome<T> {
    pub value: T,
    pub diagnostics: FlowDiagnostics,
}

impl<T> FlowOutcome<T> {
    /// Whether `value` is the canned fallback rather than the backend's answer.
    pub fn is_degraded(&self) -> bool {
        self.diagnostics.degraded
    }

    pub fn into_value(self) -> T {
        self.value
    }
}

/// Run `F` once against the context's backend.
pub async fn run<F: Flow>(ctx: &ExecCtx, input: &F::Input) -> Result<FlowOutcome<F::Output>> {
    let operation = F::OPERATION;
    let backend = ctx.backend.name();
    emit(&ctx.event_handler, Event::FlowStart { operation, backend });

    let result = invoke::<F>(ctx, input).await;

    let (ok, degraded) = match &result {
        Ok(outcome) => (true, outcome.is_degraded()),
        Err(_) => (false, false),
    };
    emit(
        &ctx.event_handler,
        Event::FlowEnd {
            operation,
            ok,
            degraded,
        },
    );
    result
}

async fn invoke<F: Flow>(ctx: &ExecCtx, input: &F::Input) -> Result<FlowOutcome<F::Output>> {
    let operation = F::OPERATION;
    let started = Instant::now();
    let mut diag = FlowDiagnostics {
        backend: ctx.backend.name(),
        ..Default::default()
    };

    let input_value = serde_json::to_value(input)?;
    F::input_schema()
        .validate(&input_value)
        .map_err(schema_to_validation)?;

    let prompt = F::render_prompt(input);
    tracing::debug!(
        operation,
        backend = diag.backend,
        model = %ctx.model,
        prompt_chars = prompt.len(),
        "dispatching prompt"
    );
    emit(
        &ctx.event_handler,
        Event::BackendCall {
            operation,
            model: ctx.model.clone(),
            prompt_chars: prompt.len(),
        },
    );

    let request = GenerateRequest {
        operation: operation.to_string(),
        model: ctx.model.clone(),
        prompt,
        input: input_value,
        output_schema: F::output_schema().to_json_schema(),
        config: ctx.config.clone(),
    };

    let response = ctx
        .backend
        .generate(&ctx.client, &ctx.base_url, &request)
        .await
        .map_err(|e| {
            tracing::error!(operation, backend = diag.backend, error = %e, "backend call failed");
            e
        })?;

    diag.status = Some(response.status);
    diag.metadata = response.metadata;
    tracing::debug!(operation, status = response.status, reply_chars = response.text.len(), "reply received");

    let parsed = decode_reply::<F>(&response.text, &mut diag);
    diag.elapsed = started.elapsed();

    match parsed {
        Ok(value) => Ok(FlowOutcome {
            value,
            diagnostics: diag,
        }),
        Err(err) if err.is_content_error() => {
            diag.violation = Some(err.to_string());
            let substitute = match ctx.fallback {
                FallbackPolicy::Substitute => F::fallback(),
                FallbackPolicy::Error => None,
            };
            match substitute {
                Some(value) => {
                    tracing::warn!(operation, reason = %err, "reply unusable, returning fallback result");
                    emit(
                        &ctx.event_handler,
                        Event::Fallback {
                            operation,
                            reason: err.to_string(),
                        },
                    );
                    diag.degraded = true;
                    Ok(FlowOutcome {
                        value,
                        diagnostics: diag,
                    })
                }
                None => {
                    tracing::error!(operation, reason = %err, "reply unusable");
                    Err(err)
                }
            }
        }
        Err(err) => Err(err),
    }
}

/// Pull JSON out of the reply, check it against the output schema and decode.
fn decode_reply<F: Flow>(text: &str, diag: &mut FlowDiagnostics) -> Result<F::Output> {
    let extracted = extract_json(text)?;
    diag.strategy = Some(extracted.strategy);
    diag.repaired = extracted.repaired;
    if is_blank(&extracted.value) {
        return Err(PantryError::EmptyReply);
    }
    F::output_schema().validate(&extracted.value)?;
    Ok(serde_json::from_value(extracted.value)?)
}

// ── Entry points ──

pub async fn suggest_matches(ctx: &ExecCtx, request: &MatchRequest) -> Result<FlowOutcome<MatchResult>> {
    run::<MatchFlow>(ctx, request).await
}

pub async fn assess_needs(
    ctx: &ExecCtx,
    request: &AssessmentRequest,
) -> Result<FlowOutcome<AssessmentResult>> {
    run::<AssessmentFlow>(ctx, request).await
}

pub async fn analyze_suitability(
    ctx: &ExecCtx,
    request: &SuitabilityRequest,
) -> Result<FlowOutcome<SuitabilityResult>> {
    run::<SuitabilityFlow>(ctx, request).await
}

/// Suggest recipients for an inventory item on behalf of `session`.
///
/// Only staff and admins may match, and only items that are not already
/// allocated or picked up.
pub async fn suggest_matches_for_item(
    ctx: &ExecCtx,
    session: &Session,
    item: &FoodItem,
) -> Result<FlowOutcome<MatchResult>> {
    session.require_matching()?;
    if !item.status.is_matchable() {
        return Err(PantryError::validation(
            "status",
            format!("item '{}' is {} and cannot be matched", item.id, item.status),
        ));
    }
    let request = MatchRequest::from_item(item)?;
    suggest_matches(ctx, &request).await
}
