//! Canned results for degraded success.
//!
//! When a backend answers but the reply is empty or does not fit the output
//! schema, a flow can substitute a fixed illustrative result instead of
//! failing the user's action. Whether that happens is decided by
//! [`FallbackPolicy`] on the execution context. Backend outages never use
//! these results.

use crate::error::PantryError;
use crate::types::{AssessmentResult, MatchResult, RecipientMatch, Urgency};
use std::str::FromStr;

/// What to do with an empty or invalid backend reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackPolicy {
    /// Return the flow's canned result and mark the outcome degraded.
    #[default]
    Substitute,
    /// Surface the content error to the caller.
    Error,
}

impl FromStr for FallbackPolicy {
    type Err = PantryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "substitute" | "fallback" => Ok(FallbackPolicy::Substitute),
            "error" | "strict" => Ok(FallbackPolicy::Error),
            other => Err(PantryError::InvalidConfig(format!(
                "unknown fallback policy '{}' (expected substitute or error)",
                other
            ))),
        }
    }
}

/// Three illustrative suggestions, best first.
pub fn match_fallback() -> MatchResult {
    MatchResult::ranked(vec![
        RecipientMatch::new(
            "Community Kitchen",
            95.0,
            "High urgency and can handle the weight. Close proximity.",
        ),
        RecipientMatch::new(
            "Northside Shelter",
            80.0,
            "Accepts all dietary tags, but further away.",
        ),
        RecipientMatch::new(
            "Family of 4 (JDoe)",
            72.0,
            "Good fit for family size, but has conflicting pickup window.",
        ),
    ])
}

pub fn assessment_fallback() -> AssessmentResult {
    AssessmentResult {
        dietary_restrictions: vec!["vegetarian".into(), "nut-free".into()],
        food_preferences: vec![
            "fresh vegetables".into(),
            "pasta".into(),
            "canned soup".into(),
        ],
        urgency_level: Urgency::Medium,
        notes: "Family of four with two young children. Prefers non-spicy food.".into(),
    }
}
