//! Prompt templates and rendering.
//!
//! Templates use `{name}` placeholders filled from [`PromptVars`]. Use `{{`
//! for a literal `{` and `}}` for a literal `}`. Rendering is a single left
//! to right pass: substituted values are copied as-is and never scanned for
//! placeholders, so caller text that contains braces lands in the prompt
//! verbatim. Unknown placeholders are left untouched.

use crate::request::{AssessmentRequest, MatchRequest, SuitabilityRequest};
use std::collections::BTreeMap;

/// Named values substituted into a template.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PromptVars {
    data: BTreeMap<String, String>,
}

impl PromptVars {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(|s| s.as_str())
    }
}

/// Render `template` with `vars`.
///
/// # Example
///
/// ```
/// use pantrylink::prompt::{render, PromptVars};
///
/// let vars = PromptVars::new().insert("name", "Alice");
/// let result = render("Hello {name}, here is JSON: {{\"key\": \"val\"}}", &vars);
/// assert_eq!(result, r#"Hello Alice, here is JSON: {"key": "val"}"#);
/// ```
pub fn render(template: &str, vars: &PromptVars) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(pos) = rest.find(['{', '}']) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if tail.starts_with("{{") {
            out.push('{');
            rest = &tail[2..];
        } else if tail.starts_with("}}") {
            out.push('}');
            rest = &tail[2..];
        } else if tail.starts_with('{') {
            match tail[1..].find('}') {
                Some(end) => {
                    let key = &tail[1..1 + end];
                    match vars.get(key) {
                        Some(value) => out.push_str(value),
                        None => out.push_str(&tail[..end + 2]),
                    }
                    rest = &tail[end + 2..];
                }
                None => {
                    out.push_str(tail);
                    rest = "";
                }
            }
        } else {
            out.push('}');
            rest = &tail[1..];
        }
    }

    out.push_str(rest);
    out
}

/// Join items as a comma-separated list, or `none` when empty.
pub fn comma_list(items: &[String]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(", ")
    }
}

pub const MATCH_TEMPLATE: &str = "\
You are an AI assistant helping staff members of a food bank to allocate food items to recipient organizations.

Given the following information about a food item, suggest a list of potential recipient or partner organizations, ranked by how well they match the food item's characteristics.

Food Item ID: {foodItemId}
Expiration Date: {expirationDate}
Dietary Tags: {dietaryTags}
Weight: {weightKg} kg
Pickup Location: Latitude: {latitude}, Longitude: {longitude}

Consider the following factors when suggesting matches:
- Expiration date: Prioritize recipients who can use the food item before it expires.
- Dietary constraints: Only suggest recipients whose dietary needs align with the food item's dietary tags.
- Urgency: Prioritize recipients with urgent needs.
- Family size/quantity fit: Suggest recipients whose needs align with the quantity of the food item.
- Distance/pickup window: Prioritize recipients who are close to the pickup location and have a compatible pickup window.

Return a JSON array of recipient objects, where each object has the following keys:
- recipientId: The ID of the recipient or partner organization.
- matchScore: A number from 0 to 100 indicating how well the recipient matches the food item (higher is better).
- reason: A brief explanation of why the recipient is a good match.

Example: [{{\"recipientId\": \"...\", \"matchScore\": 90, \"reason\": \"...\"}}]

Return only JSON. Make sure that the returned JSON is parseable.";

pub const ASSESSMENT_TEMPLATE: &str = "\
You are an AI assistant helping to assess recipient needs for a food bank.

Analyze the following description of the recipient's needs to extract dietary restrictions, food preferences, urgency level, and any other relevant information.

Recipient Needs Description: {needsDescription}

Based on this description, identify:
- dietaryRestrictions: A list of specific dietary restrictions (e.g., gluten-free, vegetarian, dairy-free).
- foodPreferences: A list of preferred food items or types (e.g., fresh produce, canned goods, specific cuisines).
- urgencyLevel: One of \"low\", \"medium\" or \"high\", based on the description.
- notes: Any additional notes or relevant information that may be helpful for matching the recipient with appropriate food donations.

Return only a JSON object with exactly these keys.";

pub const SUITABILITY_TEMPLATE: &str = "\
You are an AI assistant helping to match food donations with recipients in need.

Analyze the following information about the recipient and available food items to determine how well they match.
Provide a suitability score (0-100), a detailed rationale, and suggestions for improvement.

Recipient Information: {recipientInfo}
Food Item Information: {foodItemInfo}

Consider factors such as dietary restrictions, expiration dates, quantity, and recipient urgency.
Be specific in your rationale, explaining which factors contribute most to the suitability score.
If the match is not ideal, suggest adjustments to either the food items (e.g., combining items, adjusting quantities) or recipient criteria (e.g., relaxing dietary restrictions if possible) to improve the match.

Return only a JSON object with the keys suitabilityScore, recommendationRationale and suggestedAdjustments.";

pub fn render_match_prompt(request: &MatchRequest) -> String {
    let location = request.pickup_location();
    let vars = PromptVars::new()
        .insert("foodItemId", request.food_item_id())
        .insert("expirationDate", request.expiration_date().format("%Y-%m-%d").to_string())
        .insert("dietaryTags", comma_list(request.dietary_tags()))
        .insert("weightKg", request.weight_kg().to_string())
        .insert("latitude", location.latitude.to_string())
        .insert("longitude", location.longitude.to_string());
    render(MATCH_TEMPLATE, &vars)
}

pub fn render_assessment_prompt(request: &AssessmentRequest) -> String {
    let vars = PromptVars::new().insert("needsDescription", request.needs_description());
    render(ASSESSMENT_TEMPLATE, &vars)
}

pub fn render_suitability_prompt(request: &SuitabilityRequest) -> String {
    let vars = PromptVars::new()
        .insert("recipientInfo", request.recipient_info())
        .insert("foodItemInfo", request.food_item_info());
    render(SUITABILITY_TEMPLATE, &vars)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn match_request() -> MatchRequest {
        MatchRequest::builder()
            .food_item_id("item-001")
            .expiration_date("2024-08-01")
            .dietary_tags(["vegetarian", "nut-free"])
            .weight_kg(5.0)
            .pickup_location(40.0, -75.0)
            .build()
            .unwrap()
    }

    #[test]
    fn test_render_basic() {
        let vars = PromptVars::new().insert("name", "Alice").insert("thing", "data");
        assert_eq!(render("Hello {name}, process {thing}", &vars), "Hello Alice, process data");
    }

    #[test]
    fn test_render_no_placeholders() {
        assert_eq!(render("static prompt", &PromptVars::new()), "static prompt");
    }

    #[test]
    fn test_render_escaped_braces() {
        let vars = PromptVars::new().insert("schema", "string");
        let result = render("Type is {schema}, format: {{\"type\": {{\"x\": 1}}}}", &vars);
        assert_eq!(result, r#"Type is string, format: {"type": {"x": 1}}"#);
    }

    #[test]
    fn test_render_unknown_placeholder_kept() {
        assert_eq!(render("keep {missing} as is", &PromptVars::new()), "keep {missing} as is");
    }

    #[test]
    fn test_render_values_are_not_rescanned() {
        let vars = PromptVars::new()
            .insert("a", "{b} and {{literal}}")
            .insert("b", "SHOULD NOT APPEAR");
        assert_eq!(render("x={a}", &vars), "x={b} and {{literal}}");
    }

    #[test]
    fn test_render_unclosed_brace() {
        assert_eq!(render("open { without close", &PromptVars::new()), "open { without close");
    }

    #[test]
    fn match_prompt_embeds_every_field() {
        let prompt = render_match_prompt(&match_request());
        assert!(prompt.contains("Food Item ID: item-001"));
        assert!(prompt.contains("Expiration Date: 2024-08-01"));
        assert!(prompt.contains("Dietary Tags: vegetarian, nut-free"));
        assert!(prompt.contains("Weight: 5 kg"));
        assert!(prompt.contains("Latitude: 40, Longitude: -75"));
        assert!(prompt.contains("JSON"));
        assert!(prompt.contains(r#"[{"recipientId": "...", "matchScore": 90, "reason": "..."}]"#));
    }

    #[test]
    fn match_prompt_without_tags() {
        let req = MatchRequest::builder()
            .food_item_id("item-002")
            .expiration_date("2024-09-10")
            .dietary_tags(Vec::<String>::new())
            .weight_kg(12.5)
            .pickup_location(39.95, -75.16)
            .build()
            .unwrap();
        let prompt = render_match_prompt(&req);
        assert!(prompt.contains("Dietary Tags: none"));
        assert!(prompt.contains("Weight: 12.5 kg"));
    }

    #[test]
    fn assessment_prompt_contains_description_verbatim() {
        let text = "Family of 4 {two kids}, peanut allergy; needs food by Friday!";
        let req = AssessmentRequest::new(text).unwrap();
        let prompt = render_assessment_prompt(&req);
        assert!(prompt.contains(text));
        assert!(prompt.contains("Return only a JSON object"));
    }

    #[test]
    fn rendering_is_idempotent() {
        let req = match_request();
        assert_eq!(render_match_prompt(&req), render_match_prompt(&req));

        let assess = AssessmentRequest::new("elderly couple, low sodium").unwrap();
        assert_eq!(render_assessment_prompt(&assess), render_assessment_prompt(&assess));
    }

    #[test]
    fn suitability_prompt_embeds_both_parts() {
        let req = SuitabilityRequest::new("Family of 5, urgent", "Rice, 10 kg").unwrap();
        let prompt = render_suitability_prompt(&req);
        assert!(prompt.contains("Recipient Information: Family of 5, urgent"));
        assert!(prompt.contains("Food Item Information: Rice, 10 kg"));
    }
}
