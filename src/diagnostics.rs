//! What happened during one flow run.
//!
//! [`FlowDiagnostics`] is attached to every
//! [`FlowOutcome`](crate::flow::FlowOutcome). It records which backend
//! answered and with what status and provider metadata, how the JSON was
//! pulled out of the reply, and whether the result had to be replaced by
//! the canned fallback.

use std::time::Duration;

/// Records what happened while producing a flow result.
///
/// # Example
///
/// ```
/// use pantrylink::diagnostics::FlowDiagnostics;
///
/// let diag = FlowDiagnostics::default();
/// assert!(diag.ok());
/// ```
#[derive(Debug, Clone, Default)]
pub struct FlowDiagnostics {
    /// Name of the backend that served the call.
    pub backend: &'static str,

    /// HTTP status of the reply. `None` if the call never completed.
    pub status: Option<u16>,

    /// Provider metadata from the reply (token counts, model version).
    pub metadata: Option<serde_json::Value>,

    /// Extraction strategy that produced the JSON value
    /// (`"direct"`, `"code_block"`, `"bracketed"`). `None` if nothing parsed.
    pub strategy: Option<&'static str>,

    /// Whether the repair pass was needed to parse the reply.
    pub repaired: bool,

    /// The content error found in the reply, if any. When set on a returned
    /// outcome, the value is the fallback.
    pub violation: Option<String>,

    /// Whether the returned value is the canned fallback.
    pub degraded: bool,

    /// Wall time from dispatch to result.
    pub elapsed: Duration,
}

impl FlowDiagnostics {
    /// Quick check: did the backend's own reply pass validation?
    pub fn ok(&self) -> bool {
        self.violation.is_none()
    }
}
