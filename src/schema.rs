//! Runtime shape checks for the two trust boundaries.
//!
//! A [`Schema`] describes a JSON payload: the request shape a caller hands
//! us and the reply shape we expect back from the backend. It does two
//! jobs:
//!
//! - [`Schema::validate`] walks a `serde_json::Value` and fails with
//!   [`PantryError::SchemaViolation`] naming the first offending path
//!   (`$`, `$.urgencyLevel`, `$[2].matchScore`, ...).
//! - [`Schema::to_json_schema`] renders the JSON-Schema document that is
//!   sent to the backend as the expected output format.
//!
//! Object schemas ignore keys they do not declare. Optional fields accept
//! `null` or absence.

use crate::error::{PantryError, Result};
use serde_json::{json, Map, Value};
use std::collections::HashSet;

/// A declared payload shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    /// A string; `non_empty` rejects whitespace-only text.
    String { non_empty: bool },
    /// A finite number with optional inclusive bounds.
    Number { min: Option<f64>, max: Option<f64> },
    /// A string drawn from a fixed set (compared case-insensitively).
    Enum(Vec<String>),
    /// A homogeneous array.
    Array { items: Box<Schema>, unique: bool },
    /// An object with named fields.
    Object(Vec<Field>),
}

/// A named member of an object schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub schema: Schema,
    pub required: bool,
    pub description: String,
}

impl Schema {
    pub fn string() -> Self {
        Schema::String { non_empty: false }
    }

    pub fn non_empty_string() -> Self {
        Schema::String { non_empty: true }
    }

    pub fn number() -> Self {
        Schema::Number {
            min: None,
            max: None,
        }
    }

    pub fn number_in_range(min: f64, max: f64) -> Self {
        Schema::Number {
            min: Some(min),
            max: Some(max),
        }
    }

    pub fn one_of(values: &[&str]) -> Self {
        Schema::Enum(values.iter().map(|v| v.to_string()).collect())
    }

    pub fn array_of(items: Schema) -> Self {
        Schema::Array {
            items: Box::new(items),
            unique: false,
        }
    }

    pub fn set_of(items: Schema) -> Self {
        Schema::Array {
            items: Box::new(items),
            unique: true,
        }
    }

    pub fn object() -> Self {
        Schema::Object(Vec::new())
    }

    /// Add a required field. No-op on non-object schemas.
    pub fn field(self, name: &str, schema: Schema, description: &str) -> Self {
        self.push_field(name, schema, description, true)
    }

    /// Add an optional field. No-op on non-object schemas.
    pub fn optional(self, name: &str, schema: Schema, description: &str) -> Self {
        self.push_field(name, schema, description, false)
    }

    fn push_field(mut self, name: &str, schema: Schema, description: &str, required: bool) -> Self {
        if let Schema::Object(ref mut fields) = self {
            fields.push(Field {
                name: name.to_string(),
                schema,
                required,
                description: description.to_string(),
            });
        }
        self
    }

    /// Check `value` against this schema.
    pub fn validate(&self, value: &Value) -> Result<()> {
        self.validate_at(value, "$")
    }

    fn validate_at(&self, value: &Value, path: &str) -> Result<()> {
        match self {
            Schema::String { non_empty } => {
                let s = value
                    .as_str()
                    .ok_or_else(|| PantryError::schema(path, expected("a string", value)))?;
                if *non_empty && s.trim().is_empty() {
                    return Err(PantryError::schema(path, "must not be empty"));
                }
                Ok(())
            }
            Schema::Number { min, max } => {
                let n = value
                    .as_f64()
                    .ok_or_else(|| PantryError::schema(path, expected("a number", value)))?;
                if !n.is_finite() {
                    return Err(PantryError::schema(path, "must be finite"));
                }
                if let Some(lo) = min {
                    if n < *lo {
                        return Err(PantryError::schema(path, format!("{} is below {}", n, lo)));
                    }
                }
                if let Some(hi) = max {
                    if n > *hi {
                        return Err(PantryError::schema(path, format!("{} is above {}", n, hi)));
                    }
                }
                Ok(())
            }
            Schema::Enum(allowed) => {
                let s = value
                    .as_str()
                    .ok_or_else(|| PantryError::schema(path, expected("a string", value)))?;
                let needle = s.trim();
                if allowed.iter().any(|a| a.eq_ignore_ascii_case(needle)) {
                    Ok(())
                } else {
                    Err(PantryError::schema(
                        path,
                        format!("'{}' is not one of {:?}", s, allowed),
                    ))
                }
            }
            Schema::Array { items, unique } => {
                let arr = value
                    .as_array()
                    .ok_or_else(|| PantryError::schema(path, expected("an array", value)))?;
                let mut seen = HashSet::new();
                for (i, item) in arr.iter().enumerate() {
                    let item_path = format!("{}[{}]", path, i);
                    items.validate_at(item, &item_path)?;
                    if *unique && !seen.insert(item.to_string()) {
                        return Err(PantryError::schema(item_path, "duplicate entry"));
                    }
                }
                Ok(())
            }
            Schema::Object(fields) => {
                let obj = value
                    .as_object()
                    .ok_or_else(|| PantryError::schema(path, expected("an object", value)))?;
                for field in fields {
                    let field_path = format!("{}.{}", path, field.name);
                    match obj.get(&field.name) {
                        None | Some(Value::Null) if field.required => {
                            return Err(PantryError::schema(field_path, "required field is missing"));
                        }
                        None | Some(Value::Null) => {}
                        Some(v) => field.schema.validate_at(v, &field_path)?,
                    }
                }
                Ok(())
            }
        }
    }

    /// Render as a JSON-Schema document for the backend.
    pub fn to_json_schema(&self) -> Value {
        match self {
            Schema::String { .. } => json!({"type": "string"}),
            Schema::Number { min, max } => {
                let mut out = json!({"type": "number"});
                if let Some(lo) = min {
                    out["minimum"] = json!(lo);
                }
                if let Some(hi) = max {
                    out["maximum"] = json!(hi);
                }
                out
            }
            Schema::Enum(values) => json!({"type": "string", "enum": values}),
            Schema::Array { items, .. } => json!({
                "type": "array",
                "items": items.to_json_schema(),
            }),
            Schema::Object(fields) => {
                let mut properties = Map::new();
                let mut required = Vec::new();
                for field in fields {
                    let mut prop = field.schema.to_json_schema();
                    if !field.description.is_empty() {
                        prop["description"] = json!(field.description);
                    }
                    properties.insert(field.name.clone(), prop);
                    if field.required {
                        required.push(Value::String(field.name.clone()));
                    }
                }
                json!({
                    "type": "object",
                    "properties": properties,
                    "required": required,
                })
            }
        }
    }
}

fn expected(what: &str, got: &Value) -> String {
    let kind = match got {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    };
    format!("expected {}, got {}", what, kind)
}

// ── Declared shapes for each flow ──

pub fn match_input_schema() -> Schema {
    Schema::object()
        .field("foodItemId", Schema::non_empty_string(), "The ID of the food item to find matches for.")
        .field("expirationDate", Schema::non_empty_string(), "The expiration date of the food item (ISO format).")
        .field(
            "dietaryTags",
            Schema::set_of(Schema::non_empty_string()),
            "Dietary tags associated with the food item (e.g. vegetarian, gluten-free).",
        )
        .field("weightKg", Schema::number(), "The weight of the food item in kilograms.")
        .field(
            "pickupLocation",
            Schema::object()
                .field("latitude", Schema::number_in_range(-90.0, 90.0), "Latitude of the pickup location.")
                .field("longitude", Schema::number_in_range(-180.0, 180.0), "Longitude of the pickup location."),
            "The pickup location of the food item.",
        )
}

pub fn match_output_schema() -> Schema {
    Schema::array_of(
        Schema::object()
            .field("recipientId", Schema::non_empty_string(), "The ID of the recipient or partner organization.")
            .field(
                "matchScore",
                Schema::number_in_range(0.0, 100.0),
                "How well the recipient matches the food item, 0-100 (higher is better).",
            )
            .field("reason", Schema::string(), "Why the recipient is a good match."),
    )
}

pub fn assessment_input_schema() -> Schema {
    Schema::object().field(
        "needsDescription",
        Schema::non_empty_string(),
        "Free-form description of the recipient's dietary restrictions, preferences, and urgency.",
    )
}

pub fn assessment_output_schema() -> Schema {
    Schema::object()
        .field(
            "dietaryRestrictions",
            Schema::array_of(Schema::string()),
            "Dietary restrictions derived from the needs description.",
        )
        .field(
            "foodPreferences",
            Schema::array_of(Schema::string()),
            "Food preferences extracted from the needs description.",
        )
        .field(
            "urgencyLevel",
            Schema::one_of(&["low", "medium", "high"]),
            "The urgency level of the recipient's need.",
        )
        .field("notes", Schema::string(), "Any additional relevant information.")
}

pub fn suitability_input_schema() -> Schema {
    Schema::object()
        .field("recipientInfo", Schema::non_empty_string(), "Family size, dietary restrictions, and urgency of the recipient.")
        .field("foodItemInfo", Schema::non_empty_string(), "Expiration date, category, and quantity of the available food.")
}

pub fn suitability_output_schema() -> Schema {
    Schema::object()
        .field(
            "suitabilityScore",
            Schema::number_in_range(0.0, 100.0),
            "How well the food items match the recipient needs (0-100).",
        )
        .field(
            "recommendationRationale",
            Schema::string(),
            "Why the food items are or are not a good match.",
        )
        .optional(
            "suggestedAdjustments",
            Schema::string(),
            "Adjustments to the items or criteria that would improve the match.",
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn violation_path(result: Result<()>) -> String {
        match result {
            Err(PantryError::SchemaViolation { path, .. }) => path,
            other => panic!("expected schema violation, got {:?}", other),
        }
    }

    #[test]
    fn valid_match_reply_passes_unchanged() {
        let reply = json!([
            {"recipientId": "Eastside Pantry", "matchScore": 88, "reason": "Nearby"},
            {"recipientId": "Hope Shelter", "matchScore": 61.5, "reason": "Vegetarian menu"}
        ]);
        let before = reply.clone();
        match_output_schema().validate(&reply).unwrap();
        assert_eq!(reply, before);
    }

    #[test]
    fn score_out_of_range_names_path() {
        let reply = json!([
            {"recipientId": "a", "matchScore": 50, "reason": ""},
            {"recipientId": "b", "matchScore": 140, "reason": ""}
        ]);
        assert_eq!(violation_path(match_output_schema().validate(&reply)), "$[1].matchScore");
    }

    #[test]
    fn missing_required_key() {
        let reply = json!({"dietaryRestrictions": [], "foodPreferences": [], "notes": ""});
        assert_eq!(
            violation_path(assessment_output_schema().validate(&reply)),
            "$.urgencyLevel"
        );
    }

    #[test]
    fn urgency_enum_is_enforced() {
        let reply = json!({
            "dietaryRestrictions": [],
            "foodPreferences": [],
            "urgencyLevel": "critical",
            "notes": ""
        });
        assert_eq!(
            violation_path(assessment_output_schema().validate(&reply)),
            "$.urgencyLevel"
        );
    }

    #[test]
    fn urgency_enum_ignores_case() {
        let reply = json!({
            "dietaryRestrictions": ["halal"],
            "foodPreferences": [],
            "urgencyLevel": "High",
            "notes": ""
        });
        assert!(assessment_output_schema().validate(&reply).is_ok());
    }

    #[test]
    fn wrong_root_type() {
        let err = match_output_schema().validate(&json!({"recipientId": "x"})).unwrap_err();
        assert!(err.to_string().contains("expected an array, got an object"));
    }

    #[test]
    fn optional_field_may_be_absent_or_null() {
        let schema = suitability_output_schema();
        assert!(schema
            .validate(&json!({"suitabilityScore": 70, "recommendationRationale": "ok"}))
            .is_ok());
        assert!(schema
            .validate(&json!({"suitabilityScore": 70, "recommendationRationale": "ok", "suggestedAdjustments": null}))
            .is_ok());
        assert_eq!(
            violation_path(schema.validate(
                &json!({"suitabilityScore": 70, "recommendationRationale": "ok", "suggestedAdjustments": 3})
            )),
            "$.suggestedAdjustments"
        );
    }

    #[test]
    fn set_rejects_duplicates() {
        let input = json!({
            "foodItemId": "item-9",
            "expirationDate": "2024-08-01",
            "dietaryTags": ["vegan", "vegan"],
            "weightKg": 2,
            "pickupLocation": {"latitude": 1.0, "longitude": 2.0}
        });
        assert_eq!(violation_path(match_input_schema().validate(&input)), "$.dietaryTags[1]");
    }

    #[test]
    fn latitude_bounds() {
        let input = json!({
            "foodItemId": "item-9",
            "expirationDate": "2024-08-01",
            "dietaryTags": [],
            "weightKg": 2,
            "pickupLocation": {"latitude": 91.0, "longitude": 2.0}
        });
        assert_eq!(
            violation_path(match_input_schema().validate(&input)),
            "$.pickupLocation.latitude"
        );
    }

    #[test]
    fn json_schema_rendering() {
        let rendered = assessment_output_schema().to_json_schema();
        assert_eq!(rendered["type"], "object");
        assert_eq!(rendered["properties"]["urgencyLevel"]["enum"], json!(["low", "medium", "high"]));
        assert_eq!(rendered["properties"]["dietaryRestrictions"]["items"]["type"], "string");
        assert_eq!(
            rendered["required"],
            json!(["dietaryRestrictions", "foodPreferences", "urgencyLevel", "notes"])
        );

        let scores = match_output_schema().to_json_schema();
        assert_eq!(scores["items"]["properties"]["matchScore"]["maximum"], 100.0);
    }

    #[test]
    fn optional_fields_are_not_required_in_rendering() {
        let rendered = suitability_output_schema().to_json_schema();
        assert_eq!(
            rendered["required"],
            json!(["suitabilityScore", "recommendationRationale"])
        );
    }
}
