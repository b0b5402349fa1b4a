use std::time::Duration;
use thiserror::Error;

/// Errors produced by the matching pipeline and its collaborators.
#[derive(Error, Debug)]
pub enum PantryError {
    /// Caller input was missing or malformed. Never sent to a backend.
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    /// A payload did not match its declared schema.
    ///
    /// `path` uses `$` for the root, e.g. `$[1].matchScore`.
    #[error("schema violation at {path}: {reason}")]
    SchemaViolation { path: String, reason: String },

    /// The backend answered but the reply held no usable content.
    #[error("backend returned an empty reply")]
    EmptyReply,

    /// The backend could not be reached (connection refused, timeout, etc.).
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The backend answered with a non-success status.
    #[error("backend error {status}: {body}")]
    BackendError {
        /// HTTP status code (e.g. 400, 429, 500).
        status: u16,
        /// Response body text.
        body: String,
        /// Parsed `Retry-After` header value, if present.
        retry_after: Option<Duration>,
    },

    /// JSON (de)serialization failed at the serde level.
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// The session role may not perform the operation.
    #[error("role '{role}' may not {action}")]
    PermissionDenied { role: String, action: String },

    /// A food item status change that the lifecycle does not allow.
    #[error("cannot move item from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    /// No inventory record with that id.
    #[error("food item '{0}' not found")]
    NotFound(String),

    /// Invalid configuration detected at build time.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Catch-all for other errors.
    #[error("{0}")]
    Other(String),
}

impl PantryError {
    pub(crate) fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        PantryError::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn schema(path: impl Into<String>, reason: impl Into<String>) -> Self {
        PantryError::SchemaViolation {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error describes bad reply content rather than a transport
    /// failure. These are the errors absorbed by the fallback path.
    pub fn is_content_error(&self) -> bool {
        matches!(
            self,
            PantryError::SchemaViolation { .. } | PantryError::EmptyReply | PantryError::Json(_)
        )
    }

    /// Whether the user can reasonably try the same action again.
    pub fn is_retryable(&self) -> bool {
        match self {
            PantryError::BackendUnavailable(_) => true,
            PantryError::BackendError { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<anyhow::Error> for PantryError {
    fn from(err: anyhow::Error) -> Self {
        PantryError::Other(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PantryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_names_field() {
        let err = PantryError::validation("weightKg", "must be greater than 0");
        assert_eq!(err.to_string(), "invalid weightKg: must be greater than 0");
    }

    #[test]
    fn schema_message_names_path() {
        let err = PantryError::schema("$[0].matchScore", "expected a number");
        assert_eq!(
            err.to_string(),
            "schema violation at $[0].matchScore: expected a number"
        );
    }

    #[test]
    fn content_errors_are_classified() {
        assert!(PantryError::EmptyReply.is_content_error());
        assert!(PantryError::schema("$", "x").is_content_error());
        assert!(!PantryError::BackendUnavailable("down".into()).is_content_error());
    }

    #[test]
    fn retryable_statuses() {
        let rate_limited = PantryError::BackendError {
            status: 429,
            body: String::new(),
            retry_after: None,
        };
        let bad_request = PantryError::BackendError {
            status: 400,
            body: String::new(),
            retry_after: None,
        };
        assert!(rate_limited.is_retryable());
        assert!(!bad_request.is_retryable());
        assert!(PantryError::BackendUnavailable("timeout".into()).is_retryable());
        assert!(!PantryError::validation("x", "y").is_retryable());
    }

    #[test]
    fn anyhow_converts_to_other() {
        let err: PantryError = anyhow::anyhow!("boom").into();
        assert!(matches!(err, PantryError::Other(ref m) if m == "boom"));
    }
}
